//! Hash-join aggregation of line-item partitions into revenue per nation
//!
//! Every worker owns one partition and one accumulator. The shared
//! [`FilterContext`] is only borrowed immutably, so nothing is written
//! concurrently and no locking is needed.

use std::collections::BTreeMap;
use std::thread;

use arrow::array::RecordBatch;
use log::debug;
use rustc_hash::FxHashMap;

use crate::error::{QueryError, Result};
use crate::expressions::disc_price;
use crate::filter::FilterContext;
use crate::tables::{L_DISCOUNT, L_EXTENDEDPRICE, L_ORDERKEY, L_SUPPKEY};
use crate::utils::{get_f64_column, get_i64_column};

const AGGREGATE_PHASE: &str = "aggregator";

/// Revenue keyed by nation name, iterated in ascending name order
pub type NationRevenueMap = BTreeMap<String, f64>;

/// Accumulates the revenue of qualifying line items for one worker.
///
/// Sums are kept per nation key while scanning and only turned into
/// name-keyed entries at the end.
pub struct Aggregator<'a> {
    ctx: &'a FilterContext,
    by_nation: FxHashMap<i64, f64>,
    accepted_rows: usize,
    scanned_rows: usize,
}

impl<'a> Aggregator<'a> {
    pub fn new(ctx: &'a FilterContext) -> Self {
        Self {
            ctx,
            by_nation: FxHashMap::default(),
            accepted_rows: 0,
            scanned_rows: 0,
        }
    }

    /// Scan one batch of line items.
    ///
    /// A row counts only when its order and supplier both qualify and the
    /// customer's nation equals the supplier's nation.
    pub fn aggregate_batch(&mut self, batch: &RecordBatch) -> Result<()> {
        let orderkeys = get_i64_column(batch, L_ORDERKEY)?.values();
        let suppkeys = get_i64_column(batch, L_SUPPKEY)?.values();
        let prices = get_f64_column(batch, L_EXTENDEDPRICE)?.values();
        let discounts = get_f64_column(batch, L_DISCOUNT)?.values();

        let rows = orderkeys
            .iter()
            .zip(suppkeys.iter())
            .zip(prices.iter())
            .zip(discounts.iter());

        for (((&orderkey, &suppkey), &price), &discount) in rows {
            self.scanned_rows += 1;

            if !self.ctx.order_keys.contains(&orderkey) {
                continue;
            }
            if !self.ctx.supplier_keys.contains(&suppkey) {
                continue;
            }
            let (Some(customer_nation), Some(supplier_nation)) = (
                self.ctx.nation_of_order(orderkey),
                self.ctx.nation_of_supplier(suppkey),
            ) else {
                continue;
            };
            if customer_nation != supplier_nation {
                continue;
            }

            *self.by_nation.entry(supplier_nation).or_insert(0.0) += disc_price(price, discount);
            self.accepted_rows += 1;
        }

        Ok(())
    }

    pub fn accepted_rows(&self) -> usize {
        self.accepted_rows
    }

    pub fn scanned_rows(&self) -> usize {
        self.scanned_rows
    }

    /// Finish the scan and key the sums by nation name.
    pub fn into_revenue_by_nation(self) -> NationRevenueMap {
        let mut revenue = NationRevenueMap::new();
        for (nationkey, sum) in self.by_nation {
            if let Some(name) = self.ctx.nation_name(nationkey) {
                *revenue.entry(name.to_string()).or_insert(0.0) += sum;
            }
        }
        revenue
    }
}

/// Aggregate a single partition on the calling thread.
pub fn aggregate_partition(ctx: &FilterContext, partition: &RecordBatch) -> Result<NationRevenueMap> {
    let mut aggregator = Aggregator::new(ctx);
    aggregator.aggregate_batch(partition)?;
    debug!(
        "{}: accepted {} of {} line items",
        thread::current().name().unwrap_or("aggregator"),
        aggregator.accepted_rows(),
        aggregator.scanned_rows()
    );
    Ok(aggregator.into_revenue_by_nation())
}

/// Aggregate every partition on its own worker thread.
///
/// Blocks until all workers are done and returns their accumulators in
/// partition order.
pub fn aggregate_partitions(
    ctx: &FilterContext,
    partitions: &[RecordBatch],
) -> Result<Vec<NationRevenueMap>> {
    thread::scope(|scope| -> Result<Vec<NationRevenueMap>> {
        let mut handles = Vec::with_capacity(partitions.len());
        for (worker, partition) in partitions.iter().enumerate() {
            let handle = thread::Builder::new()
                .name(format!("q5-aggregator-{worker}"))
                .spawn_scoped(scope, move || aggregate_partition(ctx, partition))
                .map_err(|source| QueryError::WorkerSpawn {
                    phase: AGGREGATE_PHASE,
                    source,
                })?;
            handles.push(handle);
        }

        let mut partials = Vec::with_capacity(handles.len());
        for (worker, handle) in handles.into_iter().enumerate() {
            let partial = handle.join().map_err(|_| QueryError::WorkerPanicked {
                phase: AGGREGATE_PHASE,
                worker,
            })??;
            partials.push(partial);
        }
        Ok(partials)
    })
}
