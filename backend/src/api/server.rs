//! HTTP Server for the healthdata API.
//!
//! # API Endpoints
//!
//! | Method | Path           | Description                                  |
//! |--------|----------------|----------------------------------------------|
//! | GET    | `/health`      | Health check                                 |
//! | GET    | `/api/fetch`   | Raw records (mock or upstream)               |
//! | POST   | `/api/process` | Clean, transform, validate and analyze       |
//! | POST   | `/api/submit`  | Submit an analysis summary (mock or upstream)|

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use std::{net::SocketAddr, sync::Arc};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use super::mock::{mock_receipt, mock_records};
use super::types::{
    error_response, FetchResponse, ProcessRequest, ProcessResponse, SubmitReply, SubmitResponse,
};
use crate::client::{DataFetcher, DataSubmitter};
use crate::config::Config;
use crate::error::{ServerError, ServerResult, ValidationError};
use crate::models::{parse_records, SubmissionPayload};
use crate::transform::pipeline::{run, ProcessOptions};
use crate::validation::parse_required_fields;

/// Shared, read-only state for the handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub fetcher: DataFetcher,
    pub submitter: DataSubmitter,
}

impl AppState {
    pub fn new(config: Config) -> ServerResult<Self> {
        Ok(Self {
            fetcher: DataFetcher::new(&config)?,
            submitter: DataSubmitter::new(&config)?,
            config: Arc::new(config),
        })
    }
}

/// Build the application router.
pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/fetch", get(fetch_records))
        .route("/api/process", post(process_records))
        .route("/api/submit", post(submit_results))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(config: Config, port: u16) -> ServerResult<()> {
    config.validate()?;
    info!(?config, "loaded configuration");

    let app = app_router(AppState::new(config)?);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "healthdata server listening");
    info!("GET  /api/fetch   - fetch raw records");
    info!("POST /api/process - clean, transform, analyze");
    info!("POST /api/submit  - submit analysis results");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "healthdata",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "fetch": "GET /api/fetch",
            "process": "POST /api/process",
            "submit": "POST /api/submit"
        }
    }))
}

/// Fetch raw records, from the built-in set or the upstream API.
async fn fetch_records(State(state): State<AppState>) -> ServerResult<Json<FetchResponse>> {
    let data = if state.config.mock_mode {
        mock_records(Utc::now())
    } else {
        state.fetcher.fetch_records(&state.config.fetch_endpoint).await?
    };

    info!(count = data.len(), mock = state.config.mock_mode, "serving records");
    Ok(Json(FetchResponse::new(data)))
}

/// Run the pipeline over the posted batch.
async fn process_records(
    payload: Result<Json<ProcessRequest>, JsonRejection>,
) -> ServerResult<Json<ProcessResponse>> {
    let Json(request) = payload.map_err(|rejection| {
        ServerError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    })?;

    let options = match &request.required_fields {
        Some(names) => ProcessOptions::default().with_required_fields(
            parse_required_fields(names.as_slice())
                .map_err(|e: ValidationError| ServerError::BadRequest(e.to_string()))?,
        ),
        None => ProcessOptions::default(),
    };

    let records = parse_records(request.data)?;
    let output = run(records, &options)?;

    Ok(Json(ProcessResponse::from(output)))
}

/// Submit an analysis summary.
async fn submit_results(
    State(state): State<AppState>,
    payload: Result<Json<SubmissionPayload>, JsonRejection>,
) -> ServerResult<Json<SubmitResponse>> {
    let Json(payload) = payload.map_err(|rejection| {
        warn!(reason = %rejection.body_text(), "rejected submission payload");
        ServerError::BadRequest("Invalid payload. Required: analysis, status".to_string())
    })?;

    let response = if state.config.mock_mode {
        let receipt = mock_receipt(&payload, Utc::now());
        info!(id = %receipt.id, records = receipt.records_processed, "mock submission accepted");
        SubmitReply::Receipt(receipt)
    } else {
        SubmitReply::Upstream(state.submitter.submit_with_retry(&payload).await?)
    };

    Ok(Json(SubmitResponse::new(response)))
}

impl ServerError {
    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Pipeline(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServerError::Fetch(_) | ServerError::Submit(_) => StatusCode::BAD_GATEWAY,
            ServerError::Config(_) | ServerError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %message, "request failed");
        } else {
            warn!(status = status.as_u16(), error = %message, "request rejected");
        }
        (status, Json(error_response(&message))).into_response()
    }
}
