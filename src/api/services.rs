use axum::{
    Json,
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use chrono::Utc;

use super::{
    error::ApiError,
    models::{HealthResponse, SlotQuery},
    state::AppState,
    utils::{require_aligned, resolve_slot},
};
use crate::ledger::WindKind;
use crate::slots::{FIVE_MINUTES, ONE_HOUR};
use crate::storage::ArtifactKind;

/// Rain at a five-minute slot (GET /api/v1/rain)
///
/// Serves the radar sweep when one exists, otherwise the forecast slice of the
/// newest production run.
pub async fn get_rain(
    State(state): State<AppState>,
    Query(query): Query<SlotQuery>,
) -> Result<Response, ApiError> {
    let ts = require_aligned(resolve_slot(&query, Utc::now())?, FIVE_MINUTES)?;

    let record = state
        .ledger
        .rain_at(&ts)?
        .ok_or_else(|| ApiError::NotFound(format!("rain at {}", ts.to_rfc3339())))?;

    serve_artifact(&state, record.artifact_kind(), &record.id).await
}

/// Wind speed contours at an hourly slot (GET /api/v1/wind/speed)
pub async fn get_wind_speed(
    State(state): State<AppState>,
    Query(query): Query<SlotQuery>,
) -> Result<Response, ApiError> {
    get_wind(state, query, WindKind::Strength).await
}

/// Wind direction image at an hourly slot (GET /api/v1/wind/direction)
pub async fn get_wind_direction(
    State(state): State<AppState>,
    Query(query): Query<SlotQuery>,
) -> Result<Response, ApiError> {
    get_wind(state, query, WindKind::Direction).await
}

async fn get_wind(
    state: AppState,
    query: SlotQuery,
    kind: WindKind,
) -> Result<Response, ApiError> {
    let ts = require_aligned(resolve_slot(&query, Utc::now())?, ONE_HOUR)?;
    let missing =
        || ApiError::NotFound(format!("wind {} at {}", kind.as_str(), ts.to_rfc3339()));

    let version = state.ledger.wind_version()?.ok_or_else(missing)?;
    let record = state.ledger.wind_at(kind, &version, &ts)?.ok_or_else(missing)?;

    serve_artifact(&state, record.artifact_kind(), &record.id).await
}

/// Danger overlay at a five-minute slot (GET /api/v1/danger)
pub async fn get_danger(
    State(state): State<AppState>,
    Query(query): Query<SlotQuery>,
) -> Result<Response, ApiError> {
    let ts = require_aligned(resolve_slot(&query, Utc::now())?, FIVE_MINUTES)?;

    let record = state
        .ledger
        .danger_at(&ts)?
        .ok_or_else(|| ApiError::NotFound(format!("danger at {}", ts.to_rfc3339())))?;

    serve_artifact(&state, record.artifact_kind(), &record.id).await
}

/// Health check with record counts and pipeline counters (GET /health)
pub async fn health(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let stats = state.ledger.stats()?;

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        rain_records: stats.rain_count,
        wind_records: stats.wind_count,
        danger_records: stats.danger_count,
        metrics: state.metrics.snapshot(),
    }))
}

/// Stream a stored artifact; a record without its artifact is a server error
async fn serve_artifact(
    state: &AppState,
    kind: ArtifactKind,
    id: &str,
) -> Result<Response, ApiError> {
    let body: Bytes = state.artifacts.read(kind, id).await?;
    Ok(([(header::CONTENT_TYPE, kind.content_type().to_string())], body).into_response())
}
