//! Query parameters and their validation

use chrono::NaiveDate;

use crate::error::{QueryError, Result};

/// Canonical date layout; string order equals date order only for this layout.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Default TPC-H Q5 substitution parameters
pub const DEFAULT_REGION: &str = "ASIA";
pub const DEFAULT_START_DATE: &str = "1994-01-01";
pub const DEFAULT_END_DATE: &str = "1995-01-01";

/// Parameters of one query run.
///
/// `start_date` is inclusive and `end_date` exclusive. An empty or inverted
/// range is valid and simply matches no orders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParams {
    pub region: String,
    pub start_date: String,
    pub end_date: String,
    pub num_workers: usize,
}

impl QueryParams {
    pub fn new(
        region: impl Into<String>,
        start_date: impl Into<String>,
        end_date: impl Into<String>,
        num_workers: usize,
    ) -> Result<Self> {
        let params = Self {
            region: region.into(),
            start_date: start_date.into(),
            end_date: end_date.into(),
            num_workers,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        validate_worker_count(self.num_workers)?;
        validate_date("start_date", &self.start_date)?;
        validate_date("end_date", &self.end_date)?;
        Ok(())
    }
}

impl Default for QueryParams {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            start_date: DEFAULT_START_DATE.to_string(),
            end_date: DEFAULT_END_DATE.to_string(),
            num_workers: default_worker_count(),
        }
    }
}

/// Number of workers to use when none is given: one per available core.
pub fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

pub fn validate_worker_count(num_workers: usize) -> Result<()> {
    if num_workers == 0 {
        return Err(QueryError::InvalidWorkerCount(num_workers));
    }
    Ok(())
}

fn validate_date(name: &'static str, value: &str) -> Result<()> {
    // chrono accepts "1994-1-1", which would break string comparison
    let canonical = value.len() == 10 && NaiveDate::parse_from_str(value, DATE_FORMAT).is_ok();
    if !canonical {
        return Err(QueryError::InvalidDate {
            name,
            value: value.to_string(),
        });
    }
    Ok(())
}
