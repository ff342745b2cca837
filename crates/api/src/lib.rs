//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - REST API routes
//! - Owner context extraction
//! - Response types

pub mod extractors;
pub mod routes;

use axum::Router;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use kvitto_core::storage::ReceiptStore;
use kvitto_core::vision::ReceiptAnalyzer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// Receipt image store (optional; upload routes return 503 without it).
    pub storage: Option<Arc<ReceiptStore>>,
    /// Vision analyzer (optional; analyze route returns 503 without it).
    pub analyzer: Option<Arc<ReceiptAnalyzer>>,
    /// Known owner profile tags. Empty accepts any non-empty tag.
    pub profiles: Arc<Vec<String>>,
}

impl AppState {
    /// Whether the given owner tag is acceptable under the configured profiles.
    #[must_use]
    pub fn is_known_profile(&self, owner: &str) -> bool {
        !owner.is_empty() && (self.profiles.is_empty() || self.profiles.iter().any(|p| p == owner))
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
