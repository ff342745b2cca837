//! Report service: the single entry point the API surfaces call.
//!
//! Summary, spreadsheet and document all start from the same selected
//! records and the same engine pass, so the three surfaces reproduce the
//! same derived numbers to the cent.

use chrono::NaiveDate;

use crate::export::{self, ExportError};
use crate::filter::ReportFilter;
use crate::record::ExpenseRecord;

use super::engine::{aggregate_by_month_year, aggregate_year, expense_lines};
use super::types::ExpenseSummary;

/// Report header metadata for the PDF document.
#[derive(Debug, Clone)]
pub struct ReportMeta {
    /// Owner tag the report was filtered to, if any.
    pub owner: Option<String>,
    /// Human-readable description of the reporting period.
    pub period: String,
    /// Date the report was generated.
    pub generated_on: NaiveDate,
}

impl ReportMeta {
    /// Builds header metadata from the filter that produced the record set.
    #[must_use]
    pub fn from_filter(filter: &ReportFilter, generated_on: NaiveDate) -> Self {
        let period = match (filter.start_date, filter.end_date, filter.year, filter.month) {
            (Some(start), Some(end), _, _) => format!("{start} to {end}"),
            (Some(start), None, _, _) => format!("From {start}"),
            (None, Some(end), _, _) => format!("Through {end}"),
            (None, None, Some(year), Some(month)) => {
                NaiveDate::from_ymd_opt(year, month, 1).map_or_else(
                    || year.to_string(),
                    |d| super::engine::month_year_label(d),
                )
            }
            (None, None, Some(year), None) => format!("Calendar year {year}"),
            (None, None, None, _) => "All records".to_string(),
        };
        Self {
            owner: filter.owner.clone(),
            period,
            generated_on,
        }
    }
}

/// Service producing summaries and export artifacts.
pub struct ReportService;

impl ReportService {
    /// Generates the JSON-shaped summary for the given selected records.
    ///
    /// When the filter names a year without an explicit range or month, the
    /// period axis is the full twelve-month axis of that year; otherwise
    /// periods are "MonthName Year" labels sorted chronologically.
    #[must_use]
    pub fn summarize(records: &[ExpenseRecord], filter: &ReportFilter) -> ExpenseSummary {
        let lines = expense_lines(records);
        match (filter.year, filter.month, filter.start_date, filter.end_date) {
            (Some(year), None, None, None) => aggregate_year(&lines, year),
            _ => aggregate_by_month_year(&lines),
        }
    }

    /// Renders the Excel workbook for the given selected records.
    ///
    /// # Errors
    ///
    /// Returns an error if the workbook cannot be rendered.
    pub fn spreadsheet(records: &[ExpenseRecord]) -> Result<Vec<u8>, ExportError> {
        let lines = expense_lines(records);
        let summary = aggregate_by_month_year(&lines);
        export::excel::render_workbook(&lines, &summary)
    }

    /// Renders the paginated PDF ledger for the given selected records.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be rendered.
    pub fn document(records: &[ExpenseRecord], meta: &ReportMeta) -> Result<Vec<u8>, ExportError> {
        let lines = expense_lines(records);
        let summary = aggregate_by_month_year(&lines);
        export::pdf::render_document(&lines, &summary, meta)
    }
}
