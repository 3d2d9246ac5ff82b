use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::web::error::AppError;
use crate::web::models::CheckMonitorsRequest;
use crate::web::routes::require_cron_secret;
use crate::web::AppState;

pub fn create_monitor_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/monitors", get(list_monitors))
        .route("/api/monitors/check", post(check_monitors))
        .route("/api/monitors/{id}", get(get_monitor))
        .route("/api/monitors/{id}/checks", get(list_monitor_checks))
        .route("/api/monitors/{id}/incidents", get(list_monitor_incidents))
}

async fn list_monitors(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let monitors = state.store.list_monitors().await?;
    Ok(Json(json!({ "monitors": monitors })))
}

/// Cron-gated batch trigger: probes enabled monitors. Targeting a single
/// monitor implies a forced check regardless of its interval.
async fn check_monitors(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Option<Json<CheckMonitorsRequest>>,
) -> Result<Json<Value>, AppError> {
    require_cron_secret(&state, &headers)?;
    let request = payload.map(|Json(r)| r).unwrap_or_default();
    let force = request.force || request.monitor_id.is_some();
    let summary = state
        .checks
        .run_check_cycle(force, request.monitor_id)
        .await?;
    Ok(Json(json!({
        "success": true,
        "checked": summary.checked,
        "results": summary.results,
        "timestamp": Utc::now(),
    })))
}

async fn get_monitor(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let monitor = state
        .store
        .monitor_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("monitor {id}")))?;
    Ok(Json(json!({ "monitor": monitor })))
}

#[derive(Deserialize)]
struct ListChecksQuery {
    limit: Option<i64>,
}

async fn list_monitor_checks(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<ListChecksQuery>,
) -> Result<Json<Value>, AppError> {
    let checks = state
        .store
        .list_checks(id, query.limit.unwrap_or(50))
        .await?;
    Ok(Json(json!({ "checks": checks })))
}

async fn list_monitor_incidents(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let incidents = state.store.list_incidents(id).await?;
    Ok(Json(json!({ "incidents": incidents })))
}
