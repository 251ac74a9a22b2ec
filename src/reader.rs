//! `.tbl` loaders: sequential for the dimension tables, byte-range
//! partitioned across worker threads for `lineitem`

use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Instant;

use arrow::array::RecordBatch;
use log::{debug, info, warn};

use crate::config::validate_worker_count;
use crate::error::{QueryError, Result};
use crate::tables::{
    Customer, LineItem, LineItemBatchBuilder, Nation, Order, Region, Supplier, TblRow, TpchTables,
};
use crate::utils::decode_line;

pub const REGION_FILE: &str = "region.tbl";
pub const NATION_FILE: &str = "nation.tbl";
pub const CUSTOMER_FILE: &str = "customer.tbl";
pub const ORDERS_FILE: &str = "orders.tbl";
pub const SUPPLIER_FILE: &str = "supplier.tbl";
pub const LINEITEM_FILE: &str = "lineitem.tbl";

const LOAD_PHASE: &str = "lineitem loader";

/// Rough size of one lineitem row, used to presize column builders
const APPROX_LINEITEM_ROW_BYTES: u64 = 128;

const READ_BUFFER_SIZE: usize = 1 << 20;

fn open_table(path: &Path) -> Result<File> {
    File::open(path).map_err(|source| QueryError::TableOpen {
        path: path.to_path_buf(),
        source,
    })
}

fn read_error(path: &Path) -> impl FnOnce(std::io::Error) -> QueryError + '_ {
    move |source| QueryError::TableRead {
        path: path.to_path_buf(),
        source,
    }
}

/// Load a whole table sequentially, dropping rows that fail to parse.
pub fn load_table<T: TblRow>(path: &Path) -> Result<Vec<T>> {
    let mut reader = BufReader::with_capacity(READ_BUFFER_SIZE, open_table(path)?);
    let mut rows = Vec::new();
    let mut line = Vec::new();
    let mut dropped = 0usize;

    loop {
        line.clear();
        let n = reader
            .read_until(b'\n', &mut line)
            .map_err(read_error(path))?;
        if n == 0 {
            break;
        }
        match decode_line(&line).and_then(T::parse_line) {
            Some(row) => rows.push(row),
            None => dropped += 1,
        }
    }

    debug!(
        "loaded {} rows from {} ({} malformed rows dropped)",
        rows.len(),
        path.display(),
        dropped
    );
    Ok(rows)
}

pub fn load_region(path: &Path) -> Result<Vec<Region>> {
    load_table(path)
}

pub fn load_nation(path: &Path) -> Result<Vec<Nation>> {
    load_table(path)
}

pub fn load_customer(path: &Path) -> Result<Vec<Customer>> {
    load_table(path)
}

pub fn load_supplier(path: &Path) -> Result<Vec<Supplier>> {
    load_table(path)
}

pub fn load_orders(path: &Path) -> Result<Vec<Order>> {
    load_table(path)
}

/// Half-open byte range `[start, end)` of a file assigned to one worker.
///
/// A worker owns every line whose first byte falls inside its range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// Split `file_size` bytes into `num_workers` contiguous ranges of equal size
/// (the last one may be shorter). Ranges past the end of the file are empty.
pub fn partition_ranges(file_size: u64, num_workers: usize) -> Vec<ByteRange> {
    let workers = num_workers.max(1) as u64;
    let chunk_size = file_size.div_ceil(workers);
    (0..workers)
        .map(|i| {
            let start = (i * chunk_size).min(file_size);
            let end = (start + chunk_size).min(file_size);
            ByteRange { start, end }
        })
        .collect()
}

/// Parse the lines owned by `range` into one columnar partition.
///
/// A worker that does not start at offset 0 first skips to the next line
/// boundary, looking one byte back so a range starting exactly on a line
/// start keeps that line. Reading continues while the position is inside the
/// range; the line crossing `end` is read to completion.
fn load_lineitem_range(path: &Path, range: ByteRange) -> Result<RecordBatch> {
    let mut builder =
        LineItemBatchBuilder::with_capacity(((range.end - range.start) / APPROX_LINEITEM_ROW_BYTES) as usize);
    if range.is_empty() {
        return builder.finish();
    }

    let mut reader = BufReader::with_capacity(READ_BUFFER_SIZE, open_table(path)?);
    let mut line = Vec::new();
    let mut pos = range.start;

    if range.start > 0 {
        reader
            .seek(SeekFrom::Start(range.start - 1))
            .map_err(read_error(path))?;
        let skipped = reader
            .read_until(b'\n', &mut line)
            .map_err(read_error(path))?;
        pos = range.start - 1 + skipped as u64;
    }

    let mut parsed = 0usize;
    let mut dropped = 0usize;
    while pos < range.end {
        line.clear();
        let n = reader
            .read_until(b'\n', &mut line)
            .map_err(read_error(path))?;
        if n == 0 {
            break;
        }
        pos += n as u64;
        match decode_line(&line).and_then(LineItem::parse_line) {
            Some(row) => {
                builder.append(&row);
                parsed += 1;
            }
            None => dropped += 1,
        }
    }

    debug!(
        "lineitem bytes {}..{}: {} rows ({} malformed rows dropped)",
        range.start, range.end, parsed, dropped
    );
    builder.finish()
}

/// Load `lineitem` with one worker thread per byte range.
///
/// Returns one batch per worker in range order; together they hold every
/// valid line of the file exactly once.
pub fn load_lineitem_partitioned(path: &Path, num_workers: usize) -> Result<Vec<RecordBatch>> {
    validate_worker_count(num_workers)?;

    let file_size = open_table(path)?
        .metadata()
        .map_err(read_error(path))?
        .len();
    if file_size < num_workers as u64 {
        warn!(
            "{} workers requested for a {} byte file; some partitions will be empty",
            num_workers, file_size
        );
    }
    let ranges = partition_ranges(file_size, num_workers);

    thread::scope(|scope| -> Result<Vec<RecordBatch>> {
        let mut handles = Vec::with_capacity(ranges.len());
        for (worker, &range) in ranges.iter().enumerate() {
            let handle = thread::Builder::new()
                .name(format!("lineitem-loader-{worker}"))
                .spawn_scoped(scope, move || load_lineitem_range(path, range))
                .map_err(|source| QueryError::WorkerSpawn {
                    phase: LOAD_PHASE,
                    source,
                })?;
            handles.push(handle);
        }

        let mut partitions = Vec::with_capacity(handles.len());
        for (worker, handle) in handles.into_iter().enumerate() {
            let partition = handle.join().map_err(|_| QueryError::WorkerPanicked {
                phase: LOAD_PHASE,
                worker,
            })??;
            partitions.push(partition);
        }
        Ok(partitions)
    })
}

/// Load all six tables from `table_dir`.
///
/// Any missing table fails the whole load; no partially loaded state is returned.
pub fn read_tpch_data(table_dir: &Path, num_workers: usize) -> Result<TpchTables> {
    let start = Instant::now();
    let table = |name: &str| -> PathBuf { table_dir.join(name) };

    let tables = TpchTables {
        region: load_region(&table(REGION_FILE))?,
        nation: load_nation(&table(NATION_FILE))?,
        customer: load_customer(&table(CUSTOMER_FILE))?,
        orders: load_orders(&table(ORDERS_FILE))?,
        supplier: load_supplier(&table(SUPPLIER_FILE))?,
        lineitem: load_lineitem_partitioned(&table(LINEITEM_FILE), num_workers)?,
    };

    info!(
        "loaded tables from {} in {:.2?}: region={} nation={} customer={} orders={} supplier={} lineitem={} ({} partitions)",
        table_dir.display(),
        start.elapsed(),
        tables.region.len(),
        tables.nation.len(),
        tables.customer.len(),
        tables.orders.len(),
        tables.supplier.len(),
        tables.lineitem_rows(),
        tables.lineitem.len()
    );
    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::L_ORDERKEY;
    use crate::utils::get_i64_column;
    use std::fs;
    use tempfile::TempDir;

    fn lineitem_line(orderkey: i64) -> String {
        format!(
            "{orderkey}|1|{}|1|10|1000.00|0.05|0.00|N|O|1995-01-01|1995-01-01|1995-01-01|NONE|AIR|c|\n",
            orderkey % 7
        )
    }

    fn orderkeys(partitions: &[RecordBatch]) -> Vec<i64> {
        partitions
            .iter()
            .flat_map(|batch| get_i64_column(batch, L_ORDERKEY).unwrap().values().to_vec())
            .collect()
    }

    #[test]
    fn test_partition_ranges_cover_file() {
        for (size, workers) in [(0u64, 1usize), (0, 4), (10, 3), (100, 8), (7, 7), (3, 8), (1000, 1)] {
            let ranges = partition_ranges(size, workers);
            assert_eq!(ranges.len(), workers);
            assert_eq!(ranges[0].start, 0);
            assert_eq!(ranges.last().unwrap().end, size);
            for pair in ranges.windows(2) {
                assert_eq!(pair[0].end, pair[1].start);
            }
        }
    }

    #[test]
    fn test_partition_ranges_even_split() {
        let ranges = partition_ranges(10, 3);
        assert_eq!(
            ranges,
            vec![
                ByteRange { start: 0, end: 4 },
                ByteRange { start: 4, end: 8 },
                ByteRange { start: 8, end: 10 },
            ]
        );
    }

    #[test]
    fn test_load_table_drops_malformed_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(NATION_FILE);
        fs::write(
            &path,
            "0|ALGERIA|0|comment|\n\
             1|ARGENTINA|1\n\
             x|BRAZIL|1|comment|\n\
             3|CANADA|one|comment|\n\
             \n\
             8|INDIA|2|comment|\r\n\
             18|CHINA|2|comment|",
        )
        .unwrap();

        let nations = load_nation(&path).unwrap();
        let names: Vec<&str> = nations.iter().map(|n| n.n_name.as_str()).collect();
        assert_eq!(names, vec!["ALGERIA", "INDIA", "CHINA"]);
    }

    #[test]
    fn test_missing_table_fails() {
        let dir = TempDir::new().unwrap();
        let err = load_region(&dir.path().join(REGION_FILE)).unwrap_err();
        assert!(matches!(err, QueryError::TableOpen { .. }));

        let err = load_lineitem_partitioned(&dir.path().join(LINEITEM_FILE), 4).unwrap_err();
        assert!(matches!(err, QueryError::TableOpen { .. }));
    }

    #[test]
    fn test_partitioned_load_reads_each_line_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(LINEITEM_FILE);
        let contents: String = (1..=25).map(lineitem_line).collect();
        fs::write(&path, &contents).unwrap();
        let expected: Vec<i64> = (1..=25).collect();

        // boundaries land on line starts, mid-line and on newlines
        for workers in (1..=16).chain([25, 64]) {
            let partitions = load_lineitem_partitioned(&path, workers).unwrap();
            assert_eq!(partitions.len(), workers);
            assert_eq!(orderkeys(&partitions), expected, "workers = {workers}");
        }
    }

    #[test]
    fn test_partitioned_load_one_byte_per_worker() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(LINEITEM_FILE);
        let contents = "1|0|1|0|0|1.5|0|0|N|O|d|d|d|i|m|c|\n\
                        2|0|1|0|0|2.5|0|0|N|O|d|d|d|i|m|c|\n\
                        3|0|1|0|0|3.5|0|0|N|O|d|d|d|i|m|c|\n";
        fs::write(&path, contents).unwrap();

        for workers in [contents.len() - 1, contents.len(), contents.len() + 3] {
            let partitions = load_lineitem_partitioned(&path, workers).unwrap();
            assert_eq!(partitions.len(), workers);
            assert_eq!(orderkeys(&partitions), vec![1, 2, 3], "workers = {workers}");
        }
    }

    #[test]
    fn test_partitioned_load_without_trailing_newline() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(LINEITEM_FILE);
        let mut contents: String = (1..=4).map(lineitem_line).collect();
        contents.pop();
        fs::write(&path, &contents).unwrap();

        for workers in 1..=6 {
            let partitions = load_lineitem_partitioned(&path, workers).unwrap();
            assert_eq!(orderkeys(&partitions), vec![1, 2, 3, 4]);
        }
    }

    #[test]
    fn test_partitioned_load_skips_malformed_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(LINEITEM_FILE);
        let contents = format!(
            "{}1|2|3\n{}5|1|1|1|10|abc|0.05|0.00|N|O|d|d|d|i|m|c|\n{}",
            lineitem_line(1),
            lineitem_line(2),
            lineitem_line(3)
        );
        fs::write(&path, contents).unwrap();

        for workers in [1, 2, 8] {
            let partitions = load_lineitem_partitioned(&path, workers).unwrap();
            assert_eq!(orderkeys(&partitions), vec![1, 2, 3]);
        }
    }

    #[test]
    fn test_empty_lineitem_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(LINEITEM_FILE);
        fs::write(&path, "").unwrap();

        let partitions = load_lineitem_partitioned(&path, 3).unwrap();
        assert_eq!(partitions.len(), 3);
        assert!(partitions.iter().all(|batch| batch.num_rows() == 0));
    }

    #[test]
    fn test_zero_workers_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(LINEITEM_FILE);
        fs::write(&path, lineitem_line(1)).unwrap();
        assert!(matches!(
            load_lineitem_partitioned(&path, 0),
            Err(QueryError::InvalidWorkerCount(0))
        ));
    }
}
