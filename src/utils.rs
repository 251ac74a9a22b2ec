//! Row parsing and column access helpers

use arrow::array::{Array, Float64Array, Int64Array, RecordBatch};

use crate::error::{QueryError, Result};

/// Field separator of `.tbl` files
pub const FIELD_DELIMITER: char = '|';

/// Split a row into its fields.
///
/// TPC-H rows end with a delimiter, so the last token is usually empty and
/// counts toward the field total like any other.
pub fn split_fields(line: &str) -> Vec<&str> {
    line.split(FIELD_DELIMITER).collect()
}

/// Strip a trailing `\n` or `\r\n` from a raw line and decode it.
///
/// Returns `None` for lines that are not valid UTF-8.
pub fn decode_line(raw: &[u8]) -> Option<&str> {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    std::str::from_utf8(raw).ok()
}

/// Digits with at most one decimal point. Signs and exponents are not numbers here.
pub fn is_number(s: &str) -> bool {
    if s.is_empty() {
        return false;
    }
    let mut decimal_found = false;
    for c in s.bytes() {
        match c {
            b'.' if decimal_found => return false,
            b'.' => decimal_found = true,
            b'0'..=b'9' => {}
            _ => return false,
        }
    }
    true
}

/// Parse an integer key field; only plain digits that fit in `i64` qualify.
pub fn parse_key(s: &str) -> Option<i64> {
    if s.is_empty() || !s.bytes().all(|c| c.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Parse a decimal field such as `l_extendedprice` or `l_discount`.
pub fn parse_decimal(s: &str) -> Option<f64> {
    if !is_number(s) {
        return None;
    }
    s.parse().ok()
}

fn column_index(batch: &RecordBatch, name: &str) -> Result<usize> {
    batch
        .schema()
        .fields()
        .iter()
        .position(|f| f.name() == name)
        .ok_or_else(|| QueryError::MissingColumn(name.to_string()))
}

/// Get an Int64 column by name
pub fn get_i64_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Int64Array> {
    let idx = column_index(batch, name)?;
    batch
        .column(idx)
        .as_any()
        .downcast_ref::<Int64Array>()
        .ok_or_else(|| QueryError::ColumnType {
            name: name.to_string(),
            expected: "Int64",
        })
}

/// Get a Float64 column by name
pub fn get_f64_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Float64Array> {
    let idx = column_index(batch, name)?;
    batch
        .column(idx)
        .as_any()
        .downcast_ref::<Float64Array>()
        .ok_or_else(|| QueryError::ColumnType {
            name: name.to_string(),
            expected: "Float64",
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::ArrayRef;
    use arrow::datatypes::{DataType, Field, Schema};
    use std::sync::Arc;

    #[test]
    fn test_split_keeps_trailing_empty_field() {
        let fields = split_fields("0|AFRICA|lar deposits|");
        assert_eq!(fields, vec!["0", "AFRICA", "lar deposits", ""]);
    }

    #[test]
    fn test_decode_line_strips_terminators() {
        assert_eq!(decode_line(b"1|a|\n"), Some("1|a|"));
        assert_eq!(decode_line(b"1|a|\r\n"), Some("1|a|"));
        assert_eq!(decode_line(b"1|a|"), Some("1|a|"));
        assert_eq!(decode_line(b"\xff\xfe|\n"), None);
    }

    #[test]
    fn test_is_number() {
        assert!(is_number("0"));
        assert!(is_number("12345"));
        assert!(is_number("901.00"));
        assert!(is_number(".5"));
        assert!(!is_number(""));
        assert!(!is_number("1.2.3"));
        assert!(!is_number("-1"));
        assert!(!is_number("1e5"));
        assert!(!is_number("12a"));
    }

    #[test]
    fn test_parse_key() {
        assert_eq!(parse_key("42"), Some(42));
        assert_eq!(parse_key("6000000000"), Some(6_000_000_000));
        assert_eq!(parse_key("4.2"), None);
        assert_eq!(parse_key(""), None);
        assert_eq!(parse_key("99999999999999999999"), None);
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("1000.00"), Some(1000.0));
        assert_eq!(parse_decimal("0.05"), Some(0.05));
        assert_eq!(parse_decimal("7"), Some(7.0));
        assert_eq!(parse_decimal("0.0.5"), None);
        assert_eq!(parse_decimal("NaN"), None);
    }

    #[test]
    fn test_column_helpers() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("k", DataType::Int64, false),
            Field::new("v", DataType::Float64, false),
        ]));
        let columns: Vec<ArrayRef> = vec![
            Arc::new(Int64Array::from(vec![1, 2])),
            Arc::new(Float64Array::from(vec![0.5, 1.5])),
        ];
        let batch = RecordBatch::try_new(schema, columns).unwrap();

        assert_eq!(get_i64_column(&batch, "k").unwrap().values().to_vec(), vec![1, 2]);
        assert_eq!(get_f64_column(&batch, "v").unwrap().values().to_vec(), vec![0.5, 1.5]);
        assert!(matches!(
            get_f64_column(&batch, "k"),
            Err(QueryError::ColumnType { .. })
        ));
        assert!(matches!(
            get_i64_column(&batch, "missing"),
            Err(QueryError::MissingColumn(_))
        ));
    }
}
