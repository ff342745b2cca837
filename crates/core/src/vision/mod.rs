//! Receipt field extraction via a vision-capable chat model.
//!
//! Extraction is advisory: the analyzer returns a best-effort draft of the
//! receipt fields for the caller to review, never a stored record. Missing or
//! unreadable fields come back as `None` rather than failing the request.

pub mod client;
pub mod types;

pub use client::ReceiptAnalyzer;
pub use types::ExtractedReceipt;

use thiserror::Error;

/// Errors raised while analyzing a receipt image.
#[derive(Debug, Error)]
pub enum VisionError {
    /// The HTTP request to the model endpoint failed.
    #[error("vision request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The model endpoint returned a non-success status.
    #[error("vision endpoint returned status {status}: {body}")]
    Endpoint {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// The model response did not contain usable text content.
    #[error("vision response missing content: {0}")]
    MissingContent(String),

    /// The model text could not be parsed as an extraction payload.
    #[error("vision response was not valid extraction JSON: {0}")]
    InvalidPayload(String),

    /// The uploaded payload is not an accepted receipt image type.
    #[error("unsupported receipt content type: {0}")]
    UnsupportedContentType(String),
}
