pub mod analysis;
pub mod files;
pub mod gateway;
pub mod health;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use depot_analysis::AnalysisService;
use depot_files::FileService;

use crate::config::GatewayConfig;
use crate::error::ServerError;

/// Shared state for the storage service handlers.
#[derive(Clone)]
pub struct StorageState {
    pub files: Arc<FileService>,
}

/// Shared state for the analysis service handlers.
#[derive(Clone)]
pub struct AnalysisState {
    pub analysis: Arc<AnalysisService>,
}

/// Shared state for the gateway handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub http: reqwest::Client,
    pub storage_url: String,
    pub analysis_url: String,
}

impl GatewayState {
    /// Build gateway state from configuration, trimming trailing slashes
    /// off the upstream URLs.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, ServerError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| ServerError::Config(format!("gateway http client: {e}")))?;
        Ok(Self {
            http,
            storage_url: config.storage_url.trim_end_matches('/').to_owned(),
            analysis_url: config.analysis_url.trim_end_matches('/').to_owned(),
        })
    }
}

/// Build the storage service router.
pub fn storage_router(state: StorageState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/v1/files", post(files::upload))
        .route("/v1/files/{id}", get(files::download))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Build the analysis service router.
pub fn analysis_router(state: AnalysisState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/v1/analysis/{id}", post(analysis::analyze))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Build the gateway router.
pub fn gateway_router(state: GatewayState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/v1/upload", post(gateway::upload))
        .route("/v1/file/{id}", get(gateway::download))
        .route("/v1/analyze/{id}", post(gateway::analyze))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
