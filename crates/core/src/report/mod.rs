//! Single-pass aggregation engine and report summary service.

pub mod engine;
pub mod service;
pub mod types;

#[cfg(test)]
mod tests;

pub use engine::{
    aggregate, aggregate_by_month_year, aggregate_year, expense_lines, month_label,
    month_year_label, parse_month_year_label,
};
pub use service::{ReportMeta, ReportService};
pub use types::{Bucket, CategoryBucket, ExpenseLine, ExpenseSummary, PeriodBucket,
    PeriodCategoryBucket};
