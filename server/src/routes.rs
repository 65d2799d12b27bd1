//! HTTP handlers for the scrape API.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use maplead_core::{JobParameters, Record};
use maplead_scraper::{JobStatus, StopOutcome};
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
const DOWNLOAD_DISPOSITION: &str = "attachment; filename=\"leads.xlsx\"";

/// Body of a successful start.
#[derive(Debug, Serialize)]
pub struct StartResponse {
    /// Always `"started"`
    pub status: &'static str,
    /// Id of the new job
    pub job_id: Uuid,
}

/// Body of a stop request.
#[derive(Debug, Serialize)]
pub struct StopResponse {
    /// `"stopping"` or `"not running"`
    pub status: &'static str,
}

pub(crate) async fn root() -> Json<Value> {
    Json(json!({ "message": "Google Maps Lead Scraper API" }))
}

pub(crate) async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn start_scrape(
    State(state): State<AppState>,
    body: Result<Json<JobParameters>, JsonRejection>,
) -> Result<Json<StartResponse>, ApiError> {
    let Json(params) = body?;
    tracing::info!(
        keyword = %params.business_keyword,
        location = %params.location,
        "Start requested"
    );
    let job_id = state.controller.start(params)?;
    Ok(Json(StartResponse {
        status: "started",
        job_id,
    }))
}

pub(crate) async fn stop_scrape(State(state): State<AppState>) -> Json<StopResponse> {
    let status = match state.controller.stop() {
        StopOutcome::Stopping => "stopping",
        StopOutcome::NotRunning => "not running",
    };
    Json(StopResponse { status })
}

pub(crate) async fn scrape_status(State(state): State<AppState>) -> Json<JobStatus> {
    Json(state.controller.status())
}

pub(crate) async fn scrape_results(State(state): State<AppState>) -> Json<Vec<Record>> {
    Json(state.controller.results())
}

pub(crate) async fn download(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let path = state.controller.output_path();
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ApiError::new("not_found", "No results available"));
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to read {}", path.display());
            return Err(ApiError::new("internal_error", "failed to read export"));
        }
    };

    Ok((
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE),
            (header::CONTENT_DISPOSITION, DOWNLOAD_DISPOSITION),
        ],
        bytes,
    ))
}
