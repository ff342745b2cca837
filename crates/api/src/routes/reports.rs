//! Tax report routes: JSON summary and file exports.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};

use crate::AppState;
use crate::routes::records::internal_error;
use kvitto_core::filter::{self, ReportFilter};
use kvitto_core::record::ExpenseRecord;
use kvitto_core::report::{ExpenseSummary, ReportMeta, ReportService};
use kvitto_db::RecordRepository;

/// Creates the report routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/reports/summary", get(summary))
        .route("/reports/export/spreadsheet", get(export_spreadsheet))
        .route("/reports/export/document", get(export_document))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for report routes.
///
/// Reports may span all owners, so the owner arrives as an optional query
/// parameter rather than the `X-Owner` header the record routes require.
#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    /// Owner tag; omit for a cross-owner report.
    pub owner: Option<String>,
    /// Calendar year.
    pub year: Option<i32>,
    /// Month 1-12, requires `year`.
    pub month: Option<u32>,
    /// Explicit range start (overrides year/month).
    pub start_date: Option<NaiveDate>,
    /// Explicit range end (overrides year/month).
    pub end_date: Option<NaiveDate>,
    /// Exact category label.
    pub category: Option<String>,
    /// Case-insensitive merchant substring.
    pub search: Option<String>,
}

impl ReportQuery {
    fn into_filter(self) -> ReportFilter {
        ReportFilter {
            owner: self.owner,
            start_date: self.start_date,
            end_date: self.end_date,
            year: self.year,
            month: self.month,
            category: self.category,
            search: self.search,
        }
    }
}

/// One aggregated bucket in the summary response.
#[derive(Debug, Serialize)]
struct BucketResponse {
    /// Grouping key: period label, category label, or both.
    #[serde(skip_serializing_if = "Option::is_none")]
    period: Option<String>,
    /// Category label, for category groupings.
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<String>,
    /// Sum of tax-inclusive totals.
    total: String,
    /// Sum of tax portions.
    tax: String,
    /// Pre-tax sum.
    pre_tax: String,
    /// Number of records.
    count: usize,
}

/// JSON summary response.
#[derive(Debug, Serialize)]
struct SummaryResponse {
    /// Human-readable reporting period.
    period: String,
    /// Owner tag, when the report is owner-scoped.
    #[serde(skip_serializing_if = "Option::is_none")]
    owner: Option<String>,
    /// Sum of tax-inclusive totals.
    total_amount: String,
    /// Sum of tax portions.
    total_tax: String,
    /// Pre-tax sum.
    total_pre_tax: String,
    /// Number of records in the report.
    record_count: usize,
    /// Totals per period, in axis order.
    by_period: Vec<BucketResponse>,
    /// Totals per category, largest total first.
    by_category: Vec<BucketResponse>,
    /// Totals per period and category pair.
    by_period_and_category: Vec<BucketResponse>,
}

fn money(value: Decimal) -> String {
    format!("{value:.2}")
}

fn summary_response(summary: &ExpenseSummary, meta: &ReportMeta) -> SummaryResponse {
    SummaryResponse {
        period: meta.period.clone(),
        owner: meta.owner.clone(),
        total_amount: money(summary.total_amount),
        total_tax: money(summary.total_tax),
        total_pre_tax: money(summary.total_pre_tax()),
        record_count: summary.record_count,
        by_period: summary
            .by_period
            .iter()
            .map(|p| BucketResponse {
                period: Some(p.period.clone()),
                category: None,
                total: money(p.bucket.total),
                tax: money(p.bucket.tax),
                pre_tax: money(p.bucket.pre_tax()),
                count: p.bucket.count,
            })
            .collect(),
        by_category: summary
            .by_category
            .iter()
            .map(|c| BucketResponse {
                period: None,
                category: Some(c.category.clone()),
                total: money(c.bucket.total),
                tax: money(c.bucket.tax),
                pre_tax: money(c.bucket.pre_tax()),
                count: c.bucket.count,
            })
            .collect(),
        by_period_and_category: summary
            .by_period_and_category
            .iter()
            .map(|pc| BucketResponse {
                period: Some(pc.period.clone()),
                category: Some(pc.category.clone()),
                total: money(pc.bucket.total),
                tax: money(pc.bucket.tax),
                pre_tax: money(pc.bucket.pre_tax()),
                count: pc.bucket.count,
            })
            .collect(),
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Validates the filter and loads the matching records.
async fn load_selection(
    state: &AppState,
    query: ReportQuery,
) -> Result<(Vec<ExpenseRecord>, ReportFilter), axum::response::Response> {
    let report_filter = query.into_filter();
    if let Err(e) = report_filter.validate() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_filter",
                "message": e.to_string()
            })),
        )
            .into_response());
    }

    let repo = RecordRepository::new(state.db.clone());
    let records = match repo.list(report_filter.owner.as_deref()).await {
        Ok(records) => records,
        Err(e) => {
            error!(error = %e, "Failed to load records for report");
            return Err(internal_error());
        }
    };

    Ok((filter::select(&records, &report_filter), report_filter))
}

fn attachment_headers(content_type: &'static str, filename: String) -> [(header::HeaderName, String); 2] {
    [
        (header::CONTENT_TYPE, content_type.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        ),
    ]
}

fn export_filename(meta: &ReportMeta, extension: &str) -> String {
    let period: String = meta
        .period
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();
    format!("expense-report-{period}.{extension}")
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/reports/summary`
/// Aggregated totals for the selected records.
async fn summary(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> impl IntoResponse {
    let (records, report_filter) = match load_selection(&state, query).await {
        Ok(selection) => selection,
        Err(response) => return response,
    };

    let meta = ReportMeta::from_filter(&report_filter, Utc::now().date_naive());
    let expense_summary = ReportService::summarize(&records, &report_filter);

    (
        StatusCode::OK,
        Json(summary_response(&expense_summary, &meta)),
    )
        .into_response()
}

/// GET `/reports/export/spreadsheet`
/// Excel workbook export of the selected records.
async fn export_spreadsheet(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> impl IntoResponse {
    let (records, report_filter) = match load_selection(&state, query).await {
        Ok(selection) => selection,
        Err(response) => return response,
    };

    let meta = ReportMeta::from_filter(&report_filter, Utc::now().date_naive());
    match ReportService::spreadsheet(&records) {
        Ok(bytes) => {
            info!(records = records.len(), "Spreadsheet export generated");
            (
                StatusCode::OK,
                attachment_headers(
                    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
                    export_filename(&meta, "xlsx"),
                ),
                bytes,
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "Spreadsheet export failed");
            internal_error()
        }
    }
}

/// GET `/reports/export/document`
/// Paginated PDF export of the selected records.
async fn export_document(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> impl IntoResponse {
    let (records, report_filter) = match load_selection(&state, query).await {
        Ok(selection) => selection,
        Err(response) => return response,
    };

    let meta = ReportMeta::from_filter(&report_filter, Utc::now().date_naive());
    match ReportService::document(&records, &meta) {
        Ok(bytes) => {
            info!(records = records.len(), "Document export generated");
            (
                StatusCode::OK,
                attachment_headers("application/pdf", export_filename(&meta, "pdf")),
                bytes,
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "Document export failed");
            internal_error()
        }
    }
}
