//! Row types for the six Q5 tables and the columnar line-item partition

use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Builder, Int64Builder, RecordBatch};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};

use crate::error::Result;
use crate::utils::{parse_decimal, parse_key};

pub const L_ORDERKEY: &str = "l_orderkey";
pub const L_SUPPKEY: &str = "l_suppkey";
pub const L_EXTENDEDPRICE: &str = "l_extendedprice";
pub const L_DISCOUNT: &str = "l_discount";

/// A row type that can be decoded from the fields of one `.tbl` line.
pub trait TblRow: Sized {
    /// Rows with fewer fields than this are dropped.
    const MIN_FIELDS: usize;

    /// Decode the already split fields, or `None` when a numeric field is invalid.
    /// Only called with at least `MIN_FIELDS` fields.
    fn from_fields(fields: &[&str]) -> Option<Self>;

    fn parse_line(line: &str) -> Option<Self> {
        let fields = crate::utils::split_fields(line);
        if fields.len() < Self::MIN_FIELDS {
            return None;
        }
        Self::from_fields(&fields)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub r_regionkey: i64,
    pub r_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Nation {
    pub n_nationkey: i64,
    pub n_name: String,
    pub n_regionkey: i64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Customer {
    pub c_custkey: i64,
    pub c_nationkey: i64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Supplier {
    pub s_suppkey: i64,
    pub s_nationkey: i64,
}

/// `o_orderdate` stays a string; canonical dates compare correctly as text.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub o_orderkey: i64,
    pub o_custkey: i64,
    pub o_orderdate: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineItem {
    pub l_orderkey: i64,
    pub l_suppkey: i64,
    pub l_extendedprice: f64,
    pub l_discount: f64,
}

impl TblRow for Region {
    const MIN_FIELDS: usize = 4;

    fn from_fields(fields: &[&str]) -> Option<Self> {
        Some(Self {
            r_regionkey: parse_key(fields[0])?,
            r_name: fields[1].to_string(),
        })
    }
}

impl TblRow for Nation {
    const MIN_FIELDS: usize = 4;

    fn from_fields(fields: &[&str]) -> Option<Self> {
        Some(Self {
            n_nationkey: parse_key(fields[0])?,
            n_name: fields[1].to_string(),
            n_regionkey: parse_key(fields[2])?,
        })
    }
}

impl TblRow for Customer {
    const MIN_FIELDS: usize = 8;

    fn from_fields(fields: &[&str]) -> Option<Self> {
        Some(Self {
            c_custkey: parse_key(fields[0])?,
            c_nationkey: parse_key(fields[3])?,
        })
    }
}

impl TblRow for Supplier {
    const MIN_FIELDS: usize = 7;

    fn from_fields(fields: &[&str]) -> Option<Self> {
        Some(Self {
            s_suppkey: parse_key(fields[0])?,
            s_nationkey: parse_key(fields[3])?,
        })
    }
}

impl TblRow for Order {
    const MIN_FIELDS: usize = 9;

    fn from_fields(fields: &[&str]) -> Option<Self> {
        Some(Self {
            o_orderkey: parse_key(fields[0])?,
            o_custkey: parse_key(fields[1])?,
            o_orderdate: fields[4].to_string(),
        })
    }
}

impl TblRow for LineItem {
    const MIN_FIELDS: usize = 16;

    fn from_fields(fields: &[&str]) -> Option<Self> {
        Some(Self {
            l_orderkey: parse_key(fields[0])?,
            l_suppkey: parse_key(fields[2])?,
            l_extendedprice: parse_decimal(fields[5])?,
            l_discount: parse_decimal(fields[6])?,
        })
    }
}

/// Schema of one in-memory line-item partition (only the columns Q5 reads)
pub fn lineitem_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new(L_ORDERKEY, DataType::Int64, false),
        Field::new(L_SUPPKEY, DataType::Int64, false),
        Field::new(L_EXTENDEDPRICE, DataType::Float64, false),
        Field::new(L_DISCOUNT, DataType::Float64, false),
    ]))
}

/// Accumulates parsed line items column by column for one partition
pub struct LineItemBatchBuilder {
    orderkey: Int64Builder,
    suppkey: Int64Builder,
    extendedprice: Float64Builder,
    discount: Float64Builder,
}

impl LineItemBatchBuilder {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            orderkey: Int64Builder::with_capacity(capacity),
            suppkey: Int64Builder::with_capacity(capacity),
            extendedprice: Float64Builder::with_capacity(capacity),
            discount: Float64Builder::with_capacity(capacity),
        }
    }

    pub fn append(&mut self, row: &LineItem) {
        self.orderkey.append_value(row.l_orderkey);
        self.suppkey.append_value(row.l_suppkey);
        self.extendedprice.append_value(row.l_extendedprice);
        self.discount.append_value(row.l_discount);
    }

    pub fn finish(mut self) -> Result<RecordBatch> {
        let columns: Vec<ArrayRef> = vec![
            Arc::new(self.orderkey.finish()),
            Arc::new(self.suppkey.finish()),
            Arc::new(self.extendedprice.finish()),
            Arc::new(self.discount.finish()),
        ];
        Ok(RecordBatch::try_new(lineitem_schema(), columns)?)
    }
}

/// Build one partition from already parsed rows.
pub fn lineitem_batch(rows: &[LineItem]) -> Result<RecordBatch> {
    let mut builder = LineItemBatchBuilder::with_capacity(rows.len());
    for row in rows {
        builder.append(row);
    }
    builder.finish()
}

/// All tables Q5 touches, loaded once and read-only afterwards.
///
/// `lineitem` holds one batch per loader worker, in partition order.
#[derive(Debug, Clone, Default)]
pub struct TpchTables {
    pub region: Vec<Region>,
    pub nation: Vec<Nation>,
    pub customer: Vec<Customer>,
    pub supplier: Vec<Supplier>,
    pub orders: Vec<Order>,
    pub lineitem: Vec<RecordBatch>,
}

impl TpchTables {
    pub fn lineitem_rows(&self) -> usize {
        self.lineitem.iter().map(|batch| batch.num_rows()).sum()
    }
}

/// Final result row
#[derive(Debug, Clone, PartialEq)]
pub struct NationRevenue {
    pub nation: String,
    pub revenue: f64,
}
