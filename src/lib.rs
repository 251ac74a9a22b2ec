//! Parallel TPC-H Query 5 (local supplier volume) over `.tbl` files
//!
//! Pipeline: [`reader`] loads the dimension tables sequentially and
//! `lineitem` in byte-range partitions, [`filter`] turns the dimension
//! tables into hash lookups, [`aggregator`] scans each partition on its own
//! worker, and [`merger`] combines the partial sums into the ordered result.

pub mod aggregator;
pub mod config;
pub mod error;
pub mod expressions;
pub mod filter;
pub mod merger;
pub mod output;
pub mod query;
pub mod reader;
pub mod tables;
pub mod utils;

pub use config::QueryParams;
pub use error::{QueryError, Result};
pub use query::{execute_tpch_q5, run_tpch_q5};
pub use tables::{NationRevenue, TpchTables};
