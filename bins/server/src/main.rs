//! Kvitto API Server
//!
//! Main entry point for the Kvitto backend service.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kvitto_api::{AppState, create_router};
use kvitto_core::storage::{ReceiptStore, StorageConfig};
use kvitto_core::vision::ReceiptAnalyzer;
use kvitto_db::connect;
use kvitto_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kvitto=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Connect to database
    let db = connect(&config.database.url).await?;
    info!("Connected to database");

    // Receipt image storage is optional; upload routes answer 503 without it.
    let storage = match &config.storage {
        Some(settings) => {
            let store = ReceiptStore::from_config(StorageConfig::from_settings(settings)?)?;
            info!(
                provider = store.provider_name(),
                bucket = store.bucket(),
                "Receipt storage configured"
            );
            Some(Arc::new(store))
        }
        None => {
            warn!("Receipt storage not configured; image routes disabled");
            None
        }
    };

    // Vision analyzer is optional; the analyze route answers 503 without it.
    let analyzer = match &config.vision {
        Some(settings) => {
            info!(model = %settings.model, "Receipt analysis configured");
            Some(Arc::new(ReceiptAnalyzer::new(settings.clone())))
        }
        None => {
            warn!("Vision model not configured; receipt analysis disabled");
            None
        }
    };

    // Create application state
    let state = AppState {
        db: Arc::new(db),
        storage,
        analyzer,
        profiles: Arc::new(config.profiles.clone()),
    };

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
