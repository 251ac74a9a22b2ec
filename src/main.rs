use std::error::Error;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use tpch_q5::config::{default_worker_count, DEFAULT_END_DATE, DEFAULT_REGION, DEFAULT_START_DATE};
use tpch_q5::output::{output_results, write_results};
use tpch_q5::reader::read_tpch_data;
use tpch_q5::{execute_tpch_q5, QueryError, QueryParams};

/// TPC-H Query 5: revenue per nation for local suppliers in one region
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// Region name to filter on (exact match)
    #[arg(long = "r_name", default_value = DEFAULT_REGION)]
    r_name: String,

    /// First order date included (YYYY-MM-DD)
    #[arg(long = "start_date", default_value = DEFAULT_START_DATE)]
    start_date: String,

    /// First order date excluded (YYYY-MM-DD)
    #[arg(long = "end_date", default_value = DEFAULT_END_DATE)]
    end_date: String,

    /// Worker threads for loading and scanning lineitem [default: number of cores]
    #[arg(long)]
    threads: Option<usize>,

    /// Directory containing region.tbl, nation.tbl, customer.tbl, orders.tbl,
    /// supplier.tbl and lineitem.tbl
    #[arg(long = "table_path")]
    table_path: PathBuf,

    /// File to write `nation|revenue` lines to; stdout when omitted
    #[arg(long = "result_path")]
    result_path: Option<PathBuf>,
}

fn run(args: Args) -> Result<(), QueryError> {
    let params = QueryParams::new(
        args.r_name,
        args.start_date,
        args.end_date,
        args.threads.unwrap_or_else(default_worker_count),
    )?;
    log::info!("Running TPC-H Q5 with {:?}", params);

    let start = Instant::now();
    let tables = read_tpch_data(&args.table_path, params.num_workers)?;
    let loaded = Instant::now();
    let results = execute_tpch_q5(&params, &tables)?;
    let executed = Instant::now();

    match &args.result_path {
        Some(path) => output_results(path, &results)?,
        None => write_results(&mut io::stdout().lock(), &results).map_err(|source| {
            QueryError::Output {
                path: PathBuf::from("<stdout>"),
                source,
            }
        })?,
    }

    log::info!(
        "Load took {:.2?}, query took {:.2?}, total {:.2?}",
        loaded - start,
        executed - loaded,
        start.elapsed()
    );
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_default_env()
        .format_timestamp_micros()
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            let mut source = err.source();
            while let Some(cause) = source {
                eprintln!("  caused by: {cause}");
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}
