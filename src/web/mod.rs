pub mod error;
pub mod models;
pub mod routes;

use axum::http::Method;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::alerting::EvaluationService;
use crate::db::store::Store;
use crate::monitoring::CheckService;
use crate::notifications::NotificationService;
use crate::server::config::ServerConfig;

pub struct AppState {
    pub store: Arc<dyn Store>,
    pub notifications: Arc<NotificationService>,
    pub evaluation: Arc<EvaluationService>,
    pub checks: Arc<CheckService>,
    pub config: Arc<ServerConfig>,
}

pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health))
        .merge(routes::metrics_routes::create_metrics_router())
        .merge(routes::alert_routes::create_alert_router())
        .merge(routes::monitor_routes::create_monitor_router())
        .layer(cors)
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "timestamp": Utc::now() }))
}
