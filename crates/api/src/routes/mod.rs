//! API route definitions.

use axum::Router;

use crate::AppState;

pub mod health;
pub mod receipts;
pub mod records;
pub mod reports;

/// Creates the API router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(records::routes())
        .merge(receipts::routes())
        .merge(reports::routes())
}
