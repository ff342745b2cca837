//! Receipt image routes: presigned upload/download and vision analysis.

use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::{AppState, extractors::OwnerContext};
use crate::routes::records::{internal_error, record_not_found};
use kvitto_core::storage::{StorageError, UploadRequest};
use kvitto_core::vision::{ExtractedReceipt, VisionError};
use kvitto_db::RecordRepository;

/// Creates the receipt routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/records/{id}/receipt/upload", post(request_upload))
        .route("/records/{id}/receipt/confirm", post(confirm_upload))
        .route("/records/{id}/receipt", get(download_receipt))
        .route("/records/{id}/receipt", delete(delete_receipt))
        .route("/receipts/analyze", post(analyze_receipt))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for requesting an upload URL.
#[derive(Debug, Deserialize)]
pub struct RequestUploadRequest {
    /// Original filename.
    pub filename: String,
    /// MIME type of the image.
    pub content_type: String,
    /// Image size in bytes.
    pub image_size: u64,
}

/// Response for an upload URL request.
#[derive(Debug, Serialize)]
pub struct RequestUploadResponse {
    /// Presigned upload URL.
    pub upload_url: String,
    /// HTTP method to use (PUT).
    pub upload_method: String,
    /// Required headers for the upload.
    pub upload_headers: std::collections::HashMap<String, String>,
    /// When the URL expires (ISO 8601).
    pub expires_at: String,
    /// Storage key for confirmation.
    pub storage_key: String,
}

/// Request body for confirming an upload.
#[derive(Debug, Deserialize)]
pub struct ConfirmUploadRequest {
    /// Storage key from the upload request.
    pub storage_key: String,
}

/// Response for a receipt download URL.
#[derive(Debug, Serialize)]
pub struct DownloadResponse {
    /// Presigned download URL.
    pub download_url: String,
    /// When the URL expires (ISO 8601).
    pub expires_at: String,
}

// ============================================================================
// Helper Functions
// ============================================================================

fn storage_unavailable() -> axum::response::Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({
            "error": "storage_not_configured",
            "message": "Receipt image storage is not configured"
        })),
    )
        .into_response()
}

fn storage_error_response(err: &StorageError) -> axum::response::Response {
    match err {
        StorageError::ImageTooLarge { .. } => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "image_too_large",
                "message": err.to_string()
            })),
        )
            .into_response(),
        StorageError::InvalidMimeType { .. } => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_mime_type",
                "message": err.to_string()
            })),
        )
            .into_response(),
        StorageError::NotFound { .. } => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "image_not_found",
                "message": err.to_string()
            })),
        )
            .into_response(),
        _ => {
            error!(error = %err, "Storage operation failed");
            internal_error()
        }
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/records/{id}/receipt/upload`
/// Request a presigned upload URL for a record's receipt image.
async fn request_upload(
    State(state): State<AppState>,
    owner: OwnerContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<RequestUploadRequest>,
) -> impl IntoResponse {
    let Some(storage) = &state.storage else {
        return storage_unavailable();
    };

    let repo = RecordRepository::new(state.db.clone());
    match repo.find_by_id(id, owner.tag()).await {
        Ok(Some(_)) => {}
        Ok(None) => return record_not_found(id),
        Err(e) => {
            error!(error = %e, "Failed to fetch record");
            return internal_error();
        }
    }

    let upload = UploadRequest {
        owner: owner.tag().to_string(),
        record_id: id,
        filename: payload.filename,
        content_type: payload.content_type,
        image_size: payload.image_size,
    };
    let storage_key = kvitto_core::storage::ReceiptStore::generate_storage_key(&upload);

    match storage.presign_upload(&upload).await {
        Ok(presigned) => {
            info!(record_id = %id, key = %storage_key, "Receipt upload URL issued");
            let response = RequestUploadResponse {
                upload_url: presigned.url,
                upload_method: presigned.method,
                upload_headers: presigned.headers,
                expires_at: presigned.expires_at.to_rfc3339(),
                storage_key,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => storage_error_response(&e),
    }
}

/// POST `/records/{id}/receipt/confirm`
/// Confirm a completed upload and attach the image to the record.
async fn confirm_upload(
    State(state): State<AppState>,
    owner: OwnerContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<ConfirmUploadRequest>,
) -> impl IntoResponse {
    let Some(storage) = &state.storage else {
        return storage_unavailable();
    };

    // The object must actually exist before the key is recorded.
    if let Err(e) = storage.verify_upload(&payload.storage_key).await {
        return storage_error_response(&e);
    }

    let repo = RecordRepository::new(state.db.clone());
    match repo
        .set_image_key(id, owner.tag(), Some(payload.storage_key.clone()))
        .await
    {
        Ok(_) => {
            info!(record_id = %id, key = %payload.storage_key, "Receipt image attached");
            (
                StatusCode::OK,
                Json(json!({ "image_key": payload.storage_key })),
            )
                .into_response()
        }
        Err(kvitto_db::RecordRepoError::NotFound(_)) => record_not_found(id),
        Err(e) => {
            error!(error = %e, "Failed to attach receipt image");
            internal_error()
        }
    }
}

/// GET `/records/{id}/receipt`
/// Get a presigned download URL for a record's receipt image.
async fn download_receipt(
    State(state): State<AppState>,
    owner: OwnerContext,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let Some(storage) = &state.storage else {
        return storage_unavailable();
    };

    let repo = RecordRepository::new(state.db.clone());
    let record = match repo.find_by_id(id, owner.tag()).await {
        Ok(Some(record)) => record,
        Ok(None) => return record_not_found(id),
        Err(e) => {
            error!(error = %e, "Failed to fetch record");
            return internal_error();
        }
    };

    let Some(key) = record.image_key.as_deref() else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "no_receipt_image",
                "message": "The record has no receipt image attached"
            })),
        )
            .into_response();
    };

    match storage.presign_download(key).await {
        Ok(presigned) => {
            let response = DownloadResponse {
                download_url: presigned.url,
                expires_at: presigned.expires_at.to_rfc3339(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => storage_error_response(&e),
    }
}

/// DELETE `/records/{id}/receipt`
/// Detach and delete a record's receipt image.
async fn delete_receipt(
    State(state): State<AppState>,
    owner: OwnerContext,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let Some(storage) = &state.storage else {
        return storage_unavailable();
    };

    let repo = RecordRepository::new(state.db.clone());
    let record = match repo.find_by_id(id, owner.tag()).await {
        Ok(Some(record)) => record,
        Ok(None) => return record_not_found(id),
        Err(e) => {
            error!(error = %e, "Failed to fetch record");
            return internal_error();
        }
    };

    let Some(key) = record.image_key.clone() else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "no_receipt_image",
                "message": "The record has no receipt image attached"
            })),
        )
            .into_response();
    };

    if let Err(e) = storage.delete(&key).await {
        return storage_error_response(&e);
    }

    match repo.set_image_key(id, owner.tag(), None).await {
        Ok(_) => {
            info!(record_id = %id, key = %key, "Receipt image removed");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(kvitto_db::RecordRepoError::NotFound(_)) => record_not_found(id),
        Err(e) => {
            error!(error = %e, "Failed to detach receipt image");
            internal_error()
        }
    }
}

/// POST `/receipts/analyze`
/// Analyze an uploaded receipt image and return a draft of the extracted
/// fields. The draft is advisory; nothing is stored.
async fn analyze_receipt(
    State(state): State<AppState>,
    _owner: OwnerContext,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let Some(analyzer) = &state.analyzer else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "error": "vision_not_configured",
                "message": "Receipt analysis is not configured"
            })),
        )
            .into_response();
    };

    let mut image: Option<(Vec<u8>, String)> = None;
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) if field.name() == Some("image") => {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                match field.bytes().await {
                    Ok(bytes) => image = Some((bytes.to_vec(), content_type)),
                    Err(e) => {
                        error!(error = %e, "Failed to read multipart field");
                        return internal_error();
                    }
                }
            }
            Ok(Some(_)) => {}
            Ok(None) => break,
            Err(e) => {
                error!(error = %e, "Malformed multipart request");
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "error": "invalid_multipart",
                        "message": "Malformed multipart request"
                    })),
                )
                    .into_response();
            }
        }
    }

    let Some((bytes, content_type)) = image else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "missing_image",
                "message": "An 'image' multipart field is required"
            })),
        )
            .into_response();
    };

    match analyzer.analyze(&bytes, &content_type).await {
        Ok(extracted) => {
            info!(content_type = %content_type, "Receipt analyzed");
            (StatusCode::OK, Json(analysis_response(&extracted))).into_response()
        }
        Err(VisionError::UnsupportedContentType(t)) => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "unsupported_content_type",
                "message": format!("'{t}' is not an accepted receipt image type")
            })),
        )
            .into_response(),
        Err(e @ (VisionError::Endpoint { .. } | VisionError::Request(_))) => {
            error!(error = %e, "Vision endpoint call failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({
                    "error": "vision_unavailable",
                    "message": "The vision service could not process the image"
                })),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "Receipt analysis failed");
            internal_error()
        }
    }
}

fn analysis_response(extracted: &ExtractedReceipt) -> serde_json::Value {
    json!({
        "merchant": extracted.merchant,
        "transaction_date": extracted.transaction_date,
        "amount": extracted.amount.map(|a| format!("{a:.2}")),
        "tax": extracted.tax.map(|t| format!("{t:.2}")),
        "category": extracted.category,
        "notes": extracted.notes,
    })
}
