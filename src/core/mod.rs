//! Core business logic - framework-agnostic operations over the store.
//!
//! Every function takes the store handle explicitly and returns structured data;
//! formatting for people is left to the caller.

/// Attendance upserts and per-student presence summaries
pub mod attendance;
/// Class CRUD and class listings joined with subject/teacher names
pub mod class;
/// Exam registry over the blob store
pub mod exam;
/// Grade entries and weighted averages
pub mod grade;
/// Row counts for the dashboard
pub mod overview;
/// Student CRUD and roster ordering
pub mod student;
/// Subject CRUD
pub mod subject;
/// Teacher CRUD
pub mod teacher;
/// CSV import of students and CSV export of any table
pub mod transfer;

use crate::errors::{Error, Result};

/// Trims `value` and rejects it when nothing is left.
pub(crate) fn required_text(value: &str, what: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput {
            message: format!("{what} cannot be empty"),
        });
    }
    Ok(trimmed.to_string())
}

/// Trims `value`, mapping blank text to `None`.
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Rounds to a fixed number of decimal places.
///
/// Exact halves go to the even neighbour, so `6.25` becomes `6.2` and `87.125`
/// becomes `87.12`.
#[must_use]
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round_ties_even() / factor
}
