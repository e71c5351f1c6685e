//! HTTP interface for ad-hoc heart-rate statistics.
//!
//! This layer is thin glue around the conversion core:
//! - `GET /health` - liveness check
//! - `GET /api/observations` - serves the generated observation file
//! - `POST /api/heart-data` - analyzes an inline heart-rate array
//! - `POST /api/upload` - analyzes a tab-separated OpenSignals export
//!
//! The converter itself never goes through HTTP; it runs as a batch CLI
//! and the server only reads what it wrote.

use crate::analysis::{self, HeartRateAnalysis, HEART_RATE_COLUMN};
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind to (0 for random)
    pub port: u16,
    /// Path of the generated observation collection
    pub observations_path: PathBuf,
}

impl ServerConfig {
    /// Create a new server configuration
    pub fn new(port: u16, observations_path: PathBuf) -> Self {
        Self {
            port,
            observations_path,
        }
    }
}

/// Shared server state
pub struct ServerState {
    observations_path: PathBuf,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// Inline heart-rate payload
#[derive(Debug, Deserialize)]
pub struct HeartDataRequest {
    #[serde(default)]
    pub heart_rate: Vec<f64>,
}

/// Analysis of an inline heart-rate array
#[derive(Serialize)]
pub struct AnalysisResponse {
    pub analysis: HeartRateAnalysis,
}

/// Analysis of an uploaded export, echoing the filtered series
#[derive(Serialize)]
pub struct UploadResponse {
    pub heart_rate: Vec<f64>,
    pub analysis: HeartRateAnalysis,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn bad_request(error: String, code: &str) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error,
            code: code.to_string(),
        }),
    )
}

/// GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /api/observations
///
/// Serves the observation collection produced by the converter.
async fn observations(
    State(state): State<Arc<ServerState>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let content = std::fs::read_to_string(&state.observations_path).map_err(|e| {
        tracing::warn!("Could not read {:?}: {e}", state.observations_path);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "Unable to read ECG data.".to_string(),
                code: "OBSERVATIONS_UNAVAILABLE".to_string(),
            }),
        )
    })?;

    let value: serde_json::Value = serde_json::from_str(&content).map_err(|e| {
        tracing::error!("Observation file is not valid JSON: {e}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "Observation data is corrupted.".to_string(),
                code: "OBSERVATIONS_CORRUPT".to_string(),
            }),
        )
    })?;

    Ok(Json(value))
}

/// POST /api/heart-data
async fn heart_data(
    Json(request): Json<HeartDataRequest>,
) -> Result<Json<AnalysisResponse>, ApiError> {
    if request.heart_rate.is_empty() {
        return Err(bad_request(
            "No heart rate data provided".to_string(),
            "NO_DATA",
        ));
    }

    let valid = analysis::filter_valid(&request.heart_rate);
    if valid.is_empty() {
        return Err(bad_request(
            "No valid heart rate data found".to_string(),
            "NO_VALID_DATA",
        ));
    }

    let analysis = analysis::analyze(&valid)
        .map_err(|e| bad_request(e.to_string(), "ANALYSIS_FAILED"))?;

    Ok(Json(AnalysisResponse { analysis }))
}

/// POST /api/upload
///
/// Accepts a tab-separated OpenSignals export as the request body and
/// analyzes its heart-rate column.
async fn upload(body: String) -> Result<Json<UploadResponse>, ApiError> {
    let rates = analysis::parse_tabular_column(&body, HEART_RATE_COLUMN)
        .map_err(|e| bad_request(format!("Error processing file: {e}"), "BAD_UPLOAD"))?;

    let valid = analysis::filter_valid(&rates);
    if valid.is_empty() {
        return Err(bad_request(
            "No valid heart rate data found".to_string(),
            "NO_VALID_DATA",
        ));
    }

    let analysis = analysis::analyze(&valid)
        .map_err(|e| bad_request(e.to_string(), "ANALYSIS_FAILED"))?;

    Ok(Json(UploadResponse {
        heart_rate: valid,
        analysis,
    }))
}

/// Run the HTTP server
pub async fn run(
    config: ServerConfig,
) -> anyhow::Result<(SocketAddr, tokio::sync::oneshot::Sender<()>)> {
    let state = Arc::new(ServerState {
        observations_path: config.observations_path,
    });

    let app = Router::new()
        .route("/health", get(health))
        .route("/api/observations", get(observations))
        .route("/api/heart-data", post(heart_data))
        .route("/api/upload", post(upload))
        .layer(
            // The dashboard is a static page served from anywhere local;
            // the API carries no credentials, so CORS stays permissive.
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    tracing::info!("ECG bridge server listening on http://{}", actual_addr);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                tracing::info!("Server shutdown signal received");
            })
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok((actual_addr, shutdown_tx))
}
