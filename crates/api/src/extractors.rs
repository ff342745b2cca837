//! Request extractors.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
};
use serde_json::json;

use crate::AppState;

/// Header carrying the owner profile tag.
pub const OWNER_HEADER: &str = "x-owner";

/// The owner profile a request operates on.
///
/// Records are scoped by an explicit owner tag carried in the `X-Owner`
/// header. There is no ambient login session; every record route names its
/// owner on each request.
#[derive(Debug, Clone)]
pub struct OwnerContext(pub String);

impl OwnerContext {
    /// The owner tag.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.0
    }
}

impl FromRequestParts<AppState> for OwnerContext {
    type Rejection = (StatusCode, Json<serde_json::Value>);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let owner = parts
            .headers
            .get(OWNER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .unwrap_or_default();

        if owner.is_empty() {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "missing_owner",
                    "message": "The X-Owner header is required"
                })),
            ));
        }

        if !state.is_known_profile(owner) {
            return Err((
                StatusCode::FORBIDDEN,
                Json(json!({
                    "error": "unknown_owner",
                    "message": format!("'{owner}' is not a configured profile")
                })),
            ));
        }

        Ok(Self(owner.to_string()))
    }
}
