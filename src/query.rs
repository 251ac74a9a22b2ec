//! Query orchestration - ties together all components

use std::path::Path;
use std::time::Instant;

use log::info;

use crate::aggregator::aggregate_partitions;
use crate::config::QueryParams;
use crate::error::Result;
use crate::filter::preprocess;
use crate::merger::merge_and_sort;
use crate::reader::read_tpch_data;
use crate::tables::{NationRevenue, TpchTables};

/// Execute TPC-H Query 5 over already loaded tables
///
/// Returns revenue per nation sorted by revenue descending. Each loaded
/// line-item partition is scanned by its own worker.
pub fn execute_tpch_q5(params: &QueryParams, tables: &TpchTables) -> Result<Vec<NationRevenue>> {
    params.validate()?;
    let start = Instant::now();

    let ctx = preprocess(params, tables);

    // Nothing can qualify; skip spawning workers
    if ctx.is_empty() {
        info!(
            "no qualifying orders or suppliers for region {:?} in [{}, {})",
            params.region, params.start_date, params.end_date
        );
        return Ok(Vec::new());
    }

    let partials = aggregate_partitions(&ctx, &tables.lineitem)?;
    let results = merge_and_sort(partials);

    info!(
        "q5 for region {:?} in [{}, {}) produced {} nations in {:.2?}",
        params.region,
        params.start_date,
        params.end_date,
        results.len(),
        start.elapsed()
    );
    Ok(results)
}

/// Load the tables from `table_dir` and execute TPC-H Query 5
pub fn run_tpch_q5(params: &QueryParams, table_dir: &Path) -> Result<Vec<NationRevenue>> {
    params.validate()?;
    let tables = read_tpch_data(table_dir, params.num_workers)?;
    execute_tpch_q5(params, &tables)
}
