//! Report filter validation and record selection.
//!
//! Selection is a pure predicate over an in-memory record list; the same
//! predicate backs the list API, the JSON summary and both exports, so a
//! given filter can never select different record sets on different
//! surfaces.

use chrono::NaiveDate;
use thiserror::Error;

use crate::record::ExpenseRecord;

/// Filter options for record listing and reporting.
///
/// An explicit date range and a (year, month) selection are mutually
/// exclusive: when either range bound is present, the year/month fields are
/// ignored entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportFilter {
    /// Restrict to a single owner tag (exact match).
    pub owner: Option<String>,
    /// Inclusive lower date bound.
    pub start_date: Option<NaiveDate>,
    /// Inclusive upper date bound.
    pub end_date: Option<NaiveDate>,
    /// Restrict to a calendar year (ignored when a range bound is set).
    pub year: Option<i32>,
    /// Restrict to a calendar month of `year` (requires `year`).
    pub month: Option<u32>,
    /// Restrict to an exact category label (case-sensitive).
    pub category: Option<String>,
    /// Case-insensitive substring match on the merchant name.
    pub search: Option<String>,
}

/// Filter validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    /// `start_date` is after `end_date`.
    #[error("Invalid date range: {start} is after {end}")]
    InvalidDateRange {
        /// Lower bound.
        start: NaiveDate,
        /// Upper bound.
        end: NaiveDate,
    },

    /// Month outside 1..=12.
    #[error("Invalid month: {0}")]
    InvalidMonth(u32),

    /// Month given without a year.
    #[error("Month filter requires a year")]
    MonthWithoutYear,
}

impl ReportFilter {
    /// Validates the filter shape.
    ///
    /// # Errors
    ///
    /// Returns an error for an impossible range or a malformed month.
    pub fn validate(&self) -> Result<(), FilterError> {
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(FilterError::InvalidDateRange { start, end });
            }
        }
        if let Some(month) = self.month {
            if !(1..=12).contains(&month) {
                return Err(FilterError::InvalidMonth(month));
            }
            if self.year.is_none() {
                return Err(FilterError::MonthWithoutYear);
            }
        }
        Ok(())
    }

    /// Resolves the effective inclusive date bounds.
    ///
    /// An explicit range (either bound alone is allowed) overrides the
    /// year/month selection entirely.
    #[must_use]
    pub fn date_bounds(&self) -> (Option<NaiveDate>, Option<NaiveDate>) {
        if self.start_date.is_some() || self.end_date.is_some() {
            return (self.start_date, self.end_date);
        }
        match (self.year, self.month) {
            (Some(year), Some(month)) => (
                NaiveDate::from_ymd_opt(year, month, 1),
                last_day_of_month(year, month),
            ),
            (Some(year), None) => (
                NaiveDate::from_ymd_opt(year, 1, 1),
                NaiveDate::from_ymd_opt(year, 12, 31),
            ),
            _ => (None, None),
        }
    }

    /// Whether the record passes every active filter rule.
    #[must_use]
    pub fn matches(&self, record: &ExpenseRecord) -> bool {
        if let Some(owner) = &self.owner {
            if &record.owner != owner {
                return false;
            }
        }

        let (start, end) = self.date_bounds();
        if let Some(start) = start {
            if record.transaction_date < start {
                return false;
            }
        }
        if let Some(end) = end {
            if record.transaction_date > end {
                return false;
            }
        }

        if let Some(category) = &self.category {
            if record.category.label() != category {
                return false;
            }
        }

        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            if !record.merchant.to_lowercase().contains(&needle) {
                return false;
            }
        }

        true
    }
}

/// Selects the records matching the filter. Pure; input order is preserved.
#[must_use]
pub fn select(records: &[ExpenseRecord], filter: &ReportFilter) -> Vec<ExpenseRecord> {
    records
        .iter()
        .filter(|record| filter.matches(record))
        .cloned()
        .collect()
}

fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    first_of_next.and_then(|d| d.pred_opt())
}
