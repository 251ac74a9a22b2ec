//! Dimension-table preprocessing into hash lookups for the line-item scan

use log::debug;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::config::QueryParams;
use crate::tables::{Customer, Nation, Order, Region, Supplier, TpchTables};

/// Qualifying keys and key → nation mappings for one query run.
///
/// Built once before the scan and only read afterwards. The nation of an
/// order is always the nation of its customer.
#[derive(Debug, Clone, Default)]
pub struct FilterContext {
    pub region_keys: FxHashSet<i64>,
    pub nation_keys: FxHashSet<i64>,
    pub nation_names: FxHashMap<i64, String>,
    pub customer_keys: FxHashSet<i64>,
    pub customer_nation: FxHashMap<i64, i64>,
    pub order_keys: FxHashSet<i64>,
    pub order_nation: FxHashMap<i64, i64>,
    pub supplier_keys: FxHashSet<i64>,
    pub supplier_nation: FxHashMap<i64, i64>,
}

impl FilterContext {
    /// Build the context for `region` and orders dated in `[start_date, end_date)`.
    ///
    /// Stages run in dependency order: regions, nations, customers, orders
    /// (which need the customer mapping), suppliers.
    #[allow(clippy::too_many_arguments)]
    pub fn build(
        region: &str,
        start_date: &str,
        end_date: &str,
        regions: &[Region],
        nations: &[Nation],
        customers: &[Customer],
        orders: &[Order],
        suppliers: &[Supplier],
    ) -> Self {
        let mut ctx = Self::default();

        for r in regions {
            if r.r_name == region {
                ctx.region_keys.insert(r.r_regionkey);
            }
        }

        for n in nations {
            if ctx.region_keys.contains(&n.n_regionkey) {
                ctx.nation_keys.insert(n.n_nationkey);
                ctx.nation_names.insert(n.n_nationkey, n.n_name.clone());
            }
        }

        for c in customers {
            if ctx.nation_keys.contains(&c.c_nationkey) {
                ctx.customer_keys.insert(c.c_custkey);
                ctx.customer_nation.insert(c.c_custkey, c.c_nationkey);
            }
        }

        for o in orders {
            let in_range = o.o_orderdate.as_str() >= start_date && o.o_orderdate.as_str() < end_date;
            if !in_range {
                continue;
            }
            if let Some(&nation) = ctx.customer_nation.get(&o.o_custkey) {
                ctx.order_keys.insert(o.o_orderkey);
                ctx.order_nation.insert(o.o_orderkey, nation);
            }
        }

        for s in suppliers {
            if ctx.nation_keys.contains(&s.s_nationkey) {
                ctx.supplier_keys.insert(s.s_suppkey);
                ctx.supplier_nation.insert(s.s_suppkey, s.s_nationkey);
            }
        }

        debug!(
            "filter context for {:?} [{}, {}): regions={} nations={} customers={} orders={} suppliers={}",
            region,
            start_date,
            end_date,
            ctx.region_keys.len(),
            ctx.nation_keys.len(),
            ctx.customer_keys.len(),
            ctx.order_keys.len(),
            ctx.supplier_keys.len()
        );
        ctx
    }

    /// Customer nation of a qualifying order
    #[inline]
    pub fn nation_of_order(&self, orderkey: i64) -> Option<i64> {
        self.order_nation.get(&orderkey).copied()
    }

    /// Nation of a qualifying supplier
    #[inline]
    pub fn nation_of_supplier(&self, suppkey: i64) -> Option<i64> {
        self.supplier_nation.get(&suppkey).copied()
    }

    pub fn nation_name(&self, nationkey: i64) -> Option<&str> {
        self.nation_names.get(&nationkey).map(String::as_str)
    }

    /// True when no line item can qualify
    pub fn is_empty(&self) -> bool {
        self.order_keys.is_empty() || self.supplier_keys.is_empty()
    }
}

/// Build the [`FilterContext`] for `params` from the loaded dimension tables.
pub fn preprocess(params: &QueryParams, tables: &TpchTables) -> FilterContext {
    FilterContext::build(
        &params.region,
        &params.start_date,
        &params.end_date,
        &tables.region,
        &tables.nation,
        &tables.customer,
        &tables.orders,
        &tables.supplier,
    )
}
