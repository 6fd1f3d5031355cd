//! Axum route handlers for the Results API.

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Map, Value};
use tokio::time::timeout;
use tracing::warn;

use crate::errors::AppError;
use crate::generation::assembler::{GenerationOutcome, GenerationRequest};
use crate::models::generation::GenerationRecord;
use crate::state::AppState;
use crate::storage::PDF_CONTENT_TYPE;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct GenerateBody {
    pub test_id: i64,
    pub student_id: i64,
    pub attempt_id: i64,
    #[serde(default, rename = "override")]
    pub override_record: Option<Map<String, Value>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RegenerateBody {
    #[serde(default, rename = "override")]
    pub override_record: Option<Map<String, Value>>,
}

fn require_positive(name: &str, value: i64) -> Result<(), AppError> {
    if value <= 0 {
        return Err(AppError::Validation(format!("{name} must be a positive id")));
    }
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/results/generate
///
/// Renders the result document for one attempt and returns the new record.
pub async fn handle_generate(
    State(state): State<AppState>,
    Json(body): Json<GenerateBody>,
) -> Result<Json<GenerationOutcome>, AppError> {
    require_positive("test_id", body.test_id)?;
    require_positive("student_id", body.student_id)?;
    require_positive("attempt_id", body.attempt_id)?;

    let request = GenerationRequest {
        test_id: body.test_id,
        student_id: body.student_id,
        attempt_id: body.attempt_id,
        override_record: body.override_record,
    };

    let started_at = Utc::now();
    match timeout(state.config.generation_timeout(), state.generator.generate(request)).await {
        Ok(outcome) => Ok(Json(outcome?)),
        Err(_) => {
            warn!(attempt_id = body.attempt_id, "result generation timed out");
            state
                .generator
                .record_timeout(body.test_id, body.student_id, body.attempt_id, started_at)
                .await;
            Err(AppError::Timeout)
        }
    }
}

/// POST /api/v1/results/:attempt_id/regenerate
///
/// Re-renders for an attempt that has been generated before. The body is
/// optional and may carry override attributes.
pub async fn handle_regenerate(
    State(state): State<AppState>,
    Path(attempt_id): Path<i64>,
    body: Option<Json<RegenerateBody>>,
) -> Result<Json<GenerationOutcome>, AppError> {
    require_positive("attempt_id", attempt_id)?;
    let body = body.map(|Json(b)| b).unwrap_or_default();

    let started_at = Utc::now();
    match timeout(
        state.config.generation_timeout(),
        state.generator.regenerate(attempt_id, body.override_record),
    )
    .await
    {
        Ok(outcome) => Ok(Json(outcome?)),
        Err(_) => {
            warn!(attempt_id, "result regeneration timed out");
            state
                .generator
                .record_regeneration_timeout(attempt_id, started_at)
                .await;
            Err(AppError::Timeout)
        }
    }
}

/// GET /api/v1/results/:attempt_id
///
/// Most recent successful generation for the attempt.
pub async fn handle_get_latest(
    State(state): State<AppState>,
    Path(attempt_id): Path<i64>,
) -> Result<Json<GenerationRecord>, AppError> {
    let record = state
        .generator
        .latest_success(attempt_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No result document for attempt {attempt_id}")))?;
    Ok(Json(record))
}

/// GET /api/v1/results/:attempt_id/document
pub async fn handle_download(
    State(state): State<AppState>,
    Path(attempt_id): Path<i64>,
) -> Result<Response, AppError> {
    let not_found = || AppError::NotFound(format!("No result document for attempt {attempt_id}"));

    let record = state
        .generator
        .latest_success(attempt_id)
        .await?
        .ok_or_else(not_found)?;
    let bytes = state
        .generator
        .read_output(&record)
        .await?
        .ok_or_else(not_found)?;

    let file_name = record
        .output_path
        .as_deref()
        .and_then(|path| path.rsplit('/').next())
        .unwrap_or("result.pdf")
        .to_string();

    Ok((
        [
            (header::CONTENT_TYPE, PDF_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{file_name}\""),
            ),
        ],
        Bytes::from(bytes),
    )
        .into_response())
}
