// ==============================================================================
// main.rs - Analytics API Gateway Entry Point
// ==============================================================================
// Description: Axum web server exposing statistical analyses over the
//              document store
// ==============================================================================

use anyhow::{Context, Result};
use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use analytics_gateway::config::Config;
use analytics_gateway::handlers;
use analytics_gateway::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    info!("Starting Analytics API Gateway v1.0.0");

    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env().context("Failed to load configuration")?;

    // Initialize application state (pooled store client)
    let state = AppState::new(&config)
        .await
        .context("Failed to initialize application state")?;

    // Build router with all endpoints
    let app = build_router(state);

    // Bind server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("API Gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    // Run server
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

fn build_router(state: AppState) -> Router {
    // Origins are configured via CORS_ALLOWED_ORIGINS env var (comma-separated)
    let cors_origins = std::env::var("CORS_ALLOWED_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:3000".to_string());
    let allowed_origins: Vec<_> = cors_origins
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route("/pca", post(handlers::run_pca))
        .route("/plsr", post(handlers::run_plsr))
        .route("/distance", post(handlers::run_distance))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use analytics_gateway::frame::SparseRecord;
    use analytics_gateway::store::{ClinicalRecord, RecordStore, StoreError};
    use std::collections::HashMap;
    use std::sync::Arc;

    struct NullStore;

    #[async_trait::async_trait]
    impl RecordStore for NullStore {
        async fn fetch_molecular(
            &self,
            collection: &str,
            _genes: &[String],
        ) -> Result<Vec<SparseRecord>, StoreError> {
            Err(StoreError::UnknownCollection(collection.to_string()))
        }

        async fn fetch_clinical(
            &self,
            collection: &str,
            _patients: Option<&[String]>,
            _features: &[String],
        ) -> Result<Vec<ClinicalRecord>, StoreError> {
            Err(StoreError::UnknownCollection(collection.to_string()))
        }

        async fn fetch_sample_map(
            &self,
            dataset: &str,
        ) -> Result<HashMap<String, String>, StoreError> {
            Err(StoreError::UnknownCollection(format!("{dataset}_samplemap")))
        }
    }

    #[test]
    fn test_router_builds() {
        // Smoke test to ensure router compiles
        let state = AppState::with_store(Arc::new(NullStore));
        let _router = build_router(state);
    }
}
