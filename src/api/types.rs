//! API response and query types.

use serde::{Deserialize, Serialize};

use crate::optimize::DayRecord;

/// Day record with its 1-based position in the week.
#[derive(Debug, Serialize)]
pub struct DayEntry<'a> {
    pub day: usize,
    #[serde(flatten)]
    pub record: &'a DayRecord,
}

/// Optional range query parameters for the days endpoint.
#[derive(Debug, Deserialize)]
pub struct DaysQuery {
    /// First day (1-based, inclusive).
    pub from: Option<usize>,
    /// Last day (1-based, inclusive).
    pub to: Option<usize>,
}

/// Error response body for 400-class errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
