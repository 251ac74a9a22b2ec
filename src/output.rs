//! Writing `nation|revenue` result lines

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use log::info;

use crate::error::{QueryError, Result};
use crate::tables::NationRevenue;

/// Significant digits printed for revenue values
pub const REVENUE_PRECISION: usize = 15;

/// Format like `printf("%.15g")`: fixed notation for moderate exponents,
/// scientific otherwise, with trailing zeros removed.
pub fn format_revenue(value: f64) -> String {
    format_significant(value, REVENUE_PRECISION)
}

fn format_significant(value: f64, precision: usize) -> String {
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }
    if !value.is_finite() {
        return if value.is_nan() {
            "nan".to_string()
        } else if value > 0.0 {
            "inf".to_string()
        } else {
            "-inf".to_string()
        };
    }

    let precision = precision.max(1);
    // The exponent after rounding to `precision` digits decides the notation
    let scientific = format!("{:.*e}", precision - 1, value);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some((mantissa, exponent)) => (mantissa, exponent.parse::<i32>().unwrap_or(0)),
        None => (scientific.as_str(), 0),
    };

    if exponent < -4 || exponent >= precision as i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!(
            "{}e{}{:02}",
            trim_fraction(mantissa),
            sign,
            exponent.unsigned_abs()
        )
    } else {
        let decimals = (precision as i32 - 1 - exponent) as usize;
        trim_fraction(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

/// Write one `nation|revenue` line per result, in order.
pub fn write_results<W: Write>(writer: &mut W, results: &[NationRevenue]) -> io::Result<()> {
    for row in results {
        writeln!(writer, "{}|{}", row.nation, format_revenue(row.revenue))?;
    }
    writer.flush()
}

/// Write the results to `path`, replacing any existing file.
pub fn output_results(path: &Path, results: &[NationRevenue]) -> Result<()> {
    let output_error = |source| QueryError::Output {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(output_error)?;
    let mut writer = BufWriter::new(file);
    write_results(&mut writer, results).map_err(output_error)?;
    info!("wrote {} result rows to {}", results.len(), path.display());
    Ok(())
}
