use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::enums::{AlertSeverity, AlertType};
use crate::db::models::Alert;
use crate::web::error::AppError;
use crate::web::models::{AlertSettingsPayload, TestNotificationRequest, TestNotificationResponse};
use crate::web::routes::require_cron_secret;
use crate::web::AppState;

pub fn create_alert_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/alerts", get(list_alerts))
        .route("/api/alerts/evaluate", post(evaluate_alerts))
        .route(
            "/api/alert-settings",
            get(get_alert_settings).post(create_alert_settings),
        )
        .route("/api/alert-settings/{id}", put(update_alert_settings))
        .route("/api/alert-settings/test", post(test_notification))
}

#[derive(Deserialize)]
struct ListAlertsQuery {
    limit: Option<i64>,
}

async fn list_alerts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListAlertsQuery>,
) -> Result<Json<Value>, AppError> {
    let alerts = state
        .store
        .list_recent_alerts(query.limit.unwrap_or(50))
        .await?;
    Ok(Json(json!({ "alerts": alerts })))
}

/// Cron-gated batch trigger: evaluates every registered server once.
async fn evaluate_alerts(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    require_cron_secret(&state, &headers)?;
    let summary = state.evaluation.run_evaluation_cycle().await?;
    Ok(Json(json!({
        "success": true,
        "serversEvaluated": summary.servers_evaluated,
        "alertsCreated": summary.alerts_created,
        "notificationsDispatched": summary.notifications_dispatched,
        "timestamp": Utc::now(),
    })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsScopeQuery {
    server_id: Option<Uuid>,
    group_id: Option<Uuid>,
}

async fn get_alert_settings(
    State(state): State<Arc<AppState>>,
    Query(scope): Query<SettingsScopeQuery>,
) -> Result<Json<Value>, AppError> {
    let settings = state
        .store
        .settings_by_scope(scope.server_id, scope.group_id)
        .await?;
    Ok(Json(json!({ "settings": settings })))
}

async fn create_alert_settings(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AlertSettingsPayload>,
) -> Result<Json<Value>, AppError> {
    if payload.server_id.is_none() && payload.group_id.is_none() {
        return Err(AppError::InvalidInput(
            "Either serverId or groupId is required".to_string(),
        ));
    }
    let settings = state.store.insert_settings(payload.into_settings()).await?;
    Ok(Json(json!({ "settings": settings })))
}

async fn update_alert_settings(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AlertSettingsPayload>,
) -> Result<Json<Value>, AppError> {
    let mut settings = payload.into_settings();
    settings.id = id;
    settings.updated_at = Utc::now();
    let settings = state.store.update_settings(settings).await?;
    Ok(Json(json!({ "settings": settings })))
}

/// Constructs a synthetic alert and delivers it via exactly one channel,
/// surfacing the channel-local error to the caller.
async fn test_notification(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TestNotificationRequest>,
) -> Result<Json<TestNotificationResponse>, AppError> {
    let channel = request.channel;
    let settings = request.settings.into_settings();
    let now = Utc::now();
    let alert = Alert {
        id: Uuid::new_v4(),
        server_id: None,
        monitor_id: None,
        user_id: settings.user_id,
        alert_type: AlertType::CpuHigh,
        severity: AlertSeverity::Warning,
        message: "This is a test alert. Your notification channel is configured correctly!"
            .to_string(),
        current_value: Some(87.5),
        threshold_value: Some(85.0),
        acknowledged: false,
        acknowledged_at: None,
        acknowledged_by: None,
        resolved: false,
        resolved_at: None,
        resolved_by: None,
        created_at: now,
    };

    state
        .notifications
        .send_via(channel, &alert, &settings, "Test Server")
        .await
        .map_err(|e| AppError::InvalidInput(format!("Failed to send test notification: {e}")))?;

    Ok(Json(TestNotificationResponse {
        success: true,
        message: format!("Test notification sent successfully via {channel}"),
    }))
}
