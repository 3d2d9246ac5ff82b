use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info};

use crate::alerting::evaluator;
use crate::db::enums::ServerStatus;
use crate::db::models::{NewAlert, NewMetric};
use crate::web::error::AppError;
use crate::web::models::{IngestMetricsRequest, IngestMetricsResponse};
use crate::web::routes::bearer_token;
use crate::web::AppState;

pub fn create_metrics_router() -> Router<Arc<AppState>> {
    Router::new().route("/api/metrics", post(ingest_metrics))
}

/// Ingestion fast path: store the sample, refresh liveness, and raise a
/// best-effort alert on a critical sample. Uses fixed cutoffs rather
/// than per-entity settings; the batch evaluator is authoritative.
async fn ingest_metrics(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<IngestMetricsRequest>,
) -> Result<Json<IngestMetricsResponse>, AppError> {
    let token = bearer_token(&headers)?;
    let server = state
        .store
        .server_by_api_key(token)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid server token".to_string()))?;

    for (name, value) in [
        ("cpu", payload.cpu),
        ("memory", payload.memory),
        ("disk", payload.disk),
    ] {
        if !value.is_finite() || !(0.0..=100.0).contains(&value) {
            return Err(AppError::InvalidInput(format!(
                "Field {name} must be a percentage between 0 and 100"
            )));
        }
    }

    state
        .store
        .insert_metric(NewMetric {
            server_id: server.id,
            cpu_usage: payload.cpu,
            memory_usage: payload.memory,
            disk_usage: payload.disk,
            network_in: payload.network_in,
            network_out: payload.network_out,
            load_average: payload.load_average,
            uptime_seconds: payload.uptime,
            processes: payload.processes,
        })
        .await?;

    let status = evaluator::classify_ingest_status(payload.cpu, payload.memory, payload.disk);
    state
        .store
        .update_server_liveness(server.id, status, Utc::now())
        .await?;

    if status == ServerStatus::Critical {
        let condition =
            evaluator::ingest_critical_condition(payload.cpu, payload.memory, payload.disk);
        let result = state
            .store
            .insert_alert(NewAlert {
                server_id: Some(server.id),
                monitor_id: None,
                user_id: server.user_id,
                alert_type: condition.alert_type,
                severity: condition.severity,
                message: condition.message,
                current_value: condition.current_value,
                threshold_value: condition.threshold_value,
                resolved: false,
            })
            .await;
        // The sample is already stored; a failed fast-path alert must not
        // fail the ingestion call.
        match result {
            Ok(alert) => {
                info!(server_id = %server.id, alert_type = %alert.alert_type, "Ingestion fast-path alert created");
            }
            Err(e) => {
                error!(server_id = %server.id, error = %e, "Failed to create ingestion fast-path alert");
            }
        }
    }

    Ok(Json(IngestMetricsResponse {
        success: true,
        status,
        message: "Metrics recorded successfully".to_string(),
    }))
}
