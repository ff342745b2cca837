//! Expense record CRUD routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::{AppState, extractors::OwnerContext};
use kvitto_core::filter::{self, ReportFilter};
use kvitto_core::record::{Category, ExpenseRecord, RecordError};
use kvitto_core::tax::derive_tax;
use kvitto_db::RecordRepository;

/// Creates the record routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/records", get(list_records))
        .route("/records", post(create_record))
        .route("/records/{id}", get(get_record))
        .route("/records/{id}", put(update_record))
        .route("/records/{id}", delete(delete_record))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for listing records.
#[derive(Debug, Deserialize)]
pub struct RecordQuery {
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

/// Request body for creating or replacing a record.
#[derive(Debug, Deserialize)]
pub struct RecordRequest {
    /// Merchant name.
    pub merchant: String,
    /// Transaction date.
    pub transaction_date: NaiveDate,
    /// Tax-inclusive total.
    pub amount: Decimal,
    /// Tax portion, when captured from the receipt.
    #[serde(default)]
    pub tax: Option<Decimal>,
    /// Category label.
    pub category: String,
    /// Free-text notes.
    #[serde(default)]
    pub notes: Option<String>,
}

/// Response for an expense record.
#[derive(Debug, Serialize)]
pub struct RecordResponse {
    /// Record ID.
    pub id: Uuid,
    /// Owner tag.
    pub owner: String,
    /// Merchant name.
    pub merchant: String,
    /// Transaction date.
    pub transaction_date: NaiveDate,
    /// Tax-inclusive total.
    pub amount: String,
    /// Stored tax portion, if captured.
    pub tax: Option<String>,
    /// Tax portion used for reporting (stored or derived).
    pub effective_tax: String,
    /// Pre-tax portion used for reporting.
    pub pre_tax: String,
    /// Category label.
    pub category: String,
    /// Free-text notes.
    pub notes: Option<String>,
    /// Receipt image storage key, if an image is attached.
    pub image_key: Option<String>,
}

impl RecordResponse {
    fn from_record(record: &ExpenseRecord) -> Self {
        let effective_tax = derive_tax(record.amount, record.tax);
        Self {
            id: record.id,
            owner: record.owner.clone(),
            merchant: record.merchant.clone(),
            transaction_date: record.transaction_date,
            amount: format!("{:.2}", record.amount),
            tax: record.tax.map(|t| format!("{t:.2}")),
            effective_tax: format!("{effective_tax:.2}"),
            pre_tax: format!("{:.2}", record.amount - effective_tax),
            category: record.category.label().to_string(),
            notes: record.notes.clone(),
            image_key: record.image_key.clone(),
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

pub(crate) fn internal_error() -> axum::response::Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": "internal_error",
            "message": "An error occurred"
        })),
    )
        .into_response()
}

pub(crate) fn record_not_found(id: Uuid) -> axum::response::Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "record_not_found",
            "message": format!("No expense record with id {id}")
        })),
    )
        .into_response()
}

fn validation_error(err: &RecordError) -> axum::response::Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": "validation_failed",
            "message": err.to_string()
        })),
    )
        .into_response()
}

fn build_record(id: Uuid, owner: &str, image_key: Option<String>, req: RecordRequest) -> ExpenseRecord {
    ExpenseRecord {
        id,
        owner: owner.to_string(),
        image_key,
        merchant: req.merchant,
        transaction_date: req.transaction_date,
        amount: req.amount,
        tax: req.tax,
        category: Category::from_label(&req.category),
        notes: req.notes,
    }
}

fn build_filter(owner: Option<String>, query: RecordQuery) -> ReportFilter {
    ReportFilter {
        owner,
        start_date: query.start_date,
        end_date: query.end_date,
        year: query.year,
        month: query.month,
        category: query.category,
        search: query.search,
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/records`
/// List the owner's records, newest transaction first.
async fn list_records(
    State(state): State<AppState>,
    owner: OwnerContext,
    Query(query): Query<RecordQuery>,
) -> impl IntoResponse {
    let report_filter = build_filter(Some(owner.tag().to_string()), query);
    if let Err(e) = report_filter.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_filter",
                "message": e.to_string()
            })),
        )
            .into_response();
    }

    let repo = RecordRepository::new(state.db.clone());
    match repo.list(Some(owner.tag())).await {
        Ok(records) => {
            let selected = filter::select(&records, &report_filter);
            let response: Vec<RecordResponse> =
                selected.iter().map(RecordResponse::from_record).collect();
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to list records");
            internal_error()
        }
    }
}

/// POST `/records`
/// Create an expense record.
async fn create_record(
    State(state): State<AppState>,
    owner: OwnerContext,
    Json(payload): Json<RecordRequest>,
) -> impl IntoResponse {
    let record = build_record(Uuid::new_v4(), owner.tag(), None, payload);
    if let Err(e) = record.validate() {
        return validation_error(&e);
    }

    let repo = RecordRepository::new(state.db.clone());
    match repo.insert(&record).await {
        Ok(created) => {
            info!(record_id = %created.id, owner = %created.owner, "Expense record created");
            (StatusCode::CREATED, Json(RecordResponse::from_record(&created))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to create record");
            internal_error()
        }
    }
}

/// GET `/records/{id}`
/// Fetch a single record.
async fn get_record(
    State(state): State<AppState>,
    owner: OwnerContext,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = RecordRepository::new(state.db.clone());
    match repo.find_by_id(id, owner.tag()).await {
        Ok(Some(record)) => {
            (StatusCode::OK, Json(RecordResponse::from_record(&record))).into_response()
        }
        Ok(None) => record_not_found(id),
        Err(e) => {
            error!(error = %e, "Failed to fetch record");
            internal_error()
        }
    }
}

/// PUT `/records/{id}`
/// Replace all editable fields of a record. The receipt image association is
/// managed through the receipt routes and survives the replacement.
async fn update_record(
    State(state): State<AppState>,
    owner: OwnerContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<RecordRequest>,
) -> impl IntoResponse {
    let repo = RecordRepository::new(state.db.clone());

    let existing = match repo.find_by_id(id, owner.tag()).await {
        Ok(Some(record)) => record,
        Ok(None) => return record_not_found(id),
        Err(e) => {
            error!(error = %e, "Failed to fetch record");
            return internal_error();
        }
    };

    let record = build_record(id, owner.tag(), existing.image_key, payload);
    if let Err(e) = record.validate() {
        return validation_error(&e);
    }

    match repo.update(&record).await {
        Ok(updated) => {
            info!(record_id = %id, "Expense record updated");
            (StatusCode::OK, Json(RecordResponse::from_record(&updated))).into_response()
        }
        Err(kvitto_db::RecordRepoError::NotFound(_)) => record_not_found(id),
        Err(e) => {
            error!(error = %e, "Failed to update record");
            internal_error()
        }
    }
}

/// DELETE `/records/{id}`
/// Delete a record. The stored receipt image, if any, is removed as well.
async fn delete_record(
    State(state): State<AppState>,
    owner: OwnerContext,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = RecordRepository::new(state.db.clone());

    let existing = match repo.find_by_id(id, owner.tag()).await {
        Ok(Some(record)) => record,
        Ok(None) => return record_not_found(id),
        Err(e) => {
            error!(error = %e, "Failed to fetch record");
            return internal_error();
        }
    };

    if let (Some(storage), Some(key)) = (&state.storage, existing.image_key.as_deref()) {
        // Best effort: a missing object must not block the delete.
        if let Err(e) = storage.delete(key).await {
            error!(error = %e, key, "Failed to delete receipt image");
        }
    }

    match repo.delete(id, owner.tag()).await {
        Ok(true) => {
            info!(record_id = %id, "Expense record deleted");
            StatusCode::NO_CONTENT.into_response()
        }
        Ok(false) => record_not_found(id),
        Err(e) => {
            error!(error = %e, "Failed to delete record");
            internal_error()
        }
    }
}
