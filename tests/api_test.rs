use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::post;
use axum::Router;
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tower::ServiceExt;
use uuid::Uuid;

use async_trait::async_trait;
use chrono::DateTime;

use montime::alerting::EvaluationService;
use montime::db::enums::{AlertType, MonitorStatus, ServerStatus};
use montime::db::memory::MemoryStore;
use montime::db::models::{
    Alert, AlertSettings, Incident, Metric, Monitor, MonitorCheck, NewAlert, NewIncident,
    NewMetric, NewMonitorCheck, Server,
};
use montime::db::store::{AlertEntity, Store, StoreError};
use montime::monitoring::{CheckService, ProbeRunner};
use montime::notifications::NotificationService;
use montime::server::config::ServerConfig;
use montime::web::{create_router, AppState};

const CRON_SECRET: &str = "test-secret";

fn test_config() -> ServerConfig {
    ServerConfig {
        cron_secret: CRON_SECRET.to_string(),
        listen_addr: "127.0.0.1:0".to_string(),
        evaluation_interval_seconds: 60,
        monitor_check_interval_seconds: 60,
        notify_timeout_seconds: 2,
        log_dir: "logs".to_string(),
    }
}

fn build_app(store: Arc<dyn Store>) -> Router {
    let notifications = Arc::new(NotificationService::new(StdDuration::from_secs(2)).unwrap());
    let evaluation = Arc::new(EvaluationService::new(store.clone(), notifications.clone()));
    let checks = Arc::new(CheckService::new(
        store.clone(),
        ProbeRunner::new(reqwest::Client::new()),
    ));
    create_router(Arc::new(AppState {
        store,
        notifications,
        evaluation,
        checks,
        config: Arc::new(test_config()),
    }))
}

fn seeded_server(api_key: &str, last_seen_minutes_ago: i64) -> Server {
    Server {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        name: "web-1".to_string(),
        api_key: api_key.to_string(),
        group_id: None,
        status: ServerStatus::Online,
        last_seen_at: Some(Utc::now() - Duration::minutes(last_seen_minutes_ago)),
        created_at: Utc::now() - Duration::days(1),
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn ingest_rejects_missing_token() {
    let store = Arc::new(MemoryStore::new());
    let app = build_app(store);

    let response = app
        .oneshot(
            Request::post("/api/metrics")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({ "cpu": 10.0, "memory": 10.0, "disk": 10.0 }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn ingest_records_metric_and_classifies_status() {
    let store = Arc::new(MemoryStore::new());
    store.add_server(seeded_server("key-1", 0)).await;
    let app = build_app(store.clone());

    let response = app
        .oneshot(
            Request::post("/api/metrics")
                .header("content-type", "application/json")
                .header("authorization", "Bearer key-1")
                .body(Body::from(
                    json!({ "cpu": 80.0, "memory": 20.0, "disk": 30.0 }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["status"], json!("warning"));
    // Warning samples never raise the fast-path alert
    assert!(store.alerts().await.is_empty());
}

#[tokio::test]
async fn ingest_critical_sample_raises_fast_path_alert() {
    let store = Arc::new(MemoryStore::new());
    store.add_server(seeded_server("key-1", 0)).await;
    let app = build_app(store.clone());

    let response = app
        .oneshot(
            Request::post("/api/metrics")
                .header("content-type", "application/json")
                .header("authorization", "Bearer key-1")
                .body(Body::from(
                    json!({ "cpu": 50.0, "memory": 95.0, "disk": 30.0 }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], json!("critical"));

    let alerts = store.alerts().await;
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].alert_type, AlertType::MemoryHigh);
    assert_eq!(alerts[0].current_value, Some(95.0));
}

#[tokio::test]
async fn evaluate_endpoint_requires_cron_secret() {
    let store = Arc::new(MemoryStore::new());
    let app = build_app(store);

    let response = app
        .oneshot(
            Request::post("/api/alerts/evaluate")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn evaluate_endpoint_runs_batch_cycle() {
    let store = Arc::new(MemoryStore::new());
    store.add_server(seeded_server("key-1", 10)).await;
    let app = build_app(store.clone());

    let response = app
        .oneshot(
            Request::post("/api/alerts/evaluate")
                .header("x-cron-secret", CRON_SECRET)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["serversEvaluated"], json!(1));
    assert_eq!(body["alertsCreated"], json!(1));

    let alerts = store.alerts().await;
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].alert_type, AlertType::Down);
}

#[tokio::test]
async fn list_alerts_returns_persisted_rows() {
    let store = Arc::new(MemoryStore::new());
    store.add_server(seeded_server("key-1", 10)).await;
    let app = build_app(store.clone());

    app.clone()
        .oneshot(
            Request::post("/api/alerts/evaluate")
                .header("x-cron-secret", CRON_SECRET)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let response = app
        .oneshot(Request::get("/api/alerts").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["alerts"].as_array().unwrap().len(), 1);
    assert_eq!(body["alerts"][0]["alertType"], json!("down"));
}

#[tokio::test]
async fn check_endpoint_requires_cron_secret() {
    let store = Arc::new(MemoryStore::new());
    let app = build_app(store);

    let response = app
        .oneshot(
            Request::post("/api/monitors/check")
                .header("content-type", "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_notification_delivers_via_webhook() {
    // Throwaway receiver standing in for the user's webhook endpoint.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let receiver = Router::new().route("/hook", post(|| async { "ok" }));
        axum::serve(listener, receiver).await.unwrap();
    });

    let store = Arc::new(MemoryStore::new());
    let app = build_app(store);

    let payload = json!({
        "settings": {
            "userId": Uuid::new_v4(),
            "notificationChannels": ["webhook"],
            "webhookUrl": format!("http://{addr}/hook"),
        },
        "channel": "webhook",
    });
    let response = app
        .oneshot(
            Request::post("/api/alert-settings/test")
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(true));
}

#[tokio::test]
async fn test_notification_surfaces_channel_failure() {
    let store = Arc::new(MemoryStore::new());
    let app = build_app(store);

    // Slack channel with no webhook URL configured
    let payload = json!({
        "settings": {
            "userId": Uuid::new_v4(),
            "notificationChannels": ["slack"],
        },
        "channel": "slack",
    });
    let response = app
        .oneshot(
            Request::post("/api/alert-settings/test")
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

/// Store standing in for a half-provisioned deployment: every relation is
/// missing, so every call reports the soft not-configured state.
struct UnprovisionedStore;

fn missing_relation() -> StoreError {
    StoreError::NotConfigured("relation \"alert_settings\" does not exist".to_string())
}

#[async_trait]
impl Store for UnprovisionedStore {
    async fn list_servers(&self) -> Result<Vec<Server>, StoreError> {
        Err(missing_relation())
    }

    async fn server_by_api_key(&self, _api_key: &str) -> Result<Option<Server>, StoreError> {
        Err(missing_relation())
    }

    async fn update_server_liveness(
        &self,
        _server_id: Uuid,
        _status: ServerStatus,
        _last_seen_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        Err(missing_relation())
    }

    async fn insert_metric(&self, _metric: NewMetric) -> Result<Metric, StoreError> {
        Err(missing_relation())
    }

    async fn latest_metric(&self, _server_id: Uuid) -> Result<Option<Metric>, StoreError> {
        Err(missing_relation())
    }

    async fn insert_alert(&self, _alert: NewAlert) -> Result<Alert, StoreError> {
        Err(missing_relation())
    }

    async fn recent_alert_exists(
        &self,
        _entity: AlertEntity,
        _alert_type: AlertType,
        _since: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        Err(missing_relation())
    }

    async fn list_recent_alerts(&self, _limit: i64) -> Result<Vec<Alert>, StoreError> {
        Err(missing_relation())
    }

    async fn settings_for_server(
        &self,
        _server_id: Uuid,
        _group_id: Option<Uuid>,
    ) -> Result<Option<AlertSettings>, StoreError> {
        Err(missing_relation())
    }

    async fn settings_by_scope(
        &self,
        _server_id: Option<Uuid>,
        _group_id: Option<Uuid>,
    ) -> Result<Option<AlertSettings>, StoreError> {
        Err(missing_relation())
    }

    async fn insert_settings(
        &self,
        _settings: AlertSettings,
    ) -> Result<AlertSettings, StoreError> {
        Err(missing_relation())
    }

    async fn update_settings(
        &self,
        _settings: AlertSettings,
    ) -> Result<AlertSettings, StoreError> {
        Err(missing_relation())
    }

    async fn list_monitors(&self) -> Result<Vec<Monitor>, StoreError> {
        Err(missing_relation())
    }

    async fn list_enabled_monitors(&self) -> Result<Vec<Monitor>, StoreError> {
        Err(missing_relation())
    }

    async fn monitor_by_id(&self, _monitor_id: Uuid) -> Result<Option<Monitor>, StoreError> {
        Err(missing_relation())
    }

    async fn record_monitor_check(
        &self,
        _check: NewMonitorCheck,
    ) -> Result<MonitorCheck, StoreError> {
        Err(missing_relation())
    }

    async fn update_monitor_status(
        &self,
        _monitor_id: Uuid,
        _status: MonitorStatus,
        _checked_at: DateTime<Utc>,
        _response_time_ms: i64,
    ) -> Result<(), StoreError> {
        Err(missing_relation())
    }

    async fn list_checks(
        &self,
        _monitor_id: Uuid,
        _limit: i64,
    ) -> Result<Vec<MonitorCheck>, StoreError> {
        Err(missing_relation())
    }

    async fn open_incident(&self, _incident: NewIncident) -> Result<Incident, StoreError> {
        Err(missing_relation())
    }

    async fn latest_open_incident(
        &self,
        _monitor_id: Uuid,
    ) -> Result<Option<Incident>, StoreError> {
        Err(missing_relation())
    }

    async fn resolve_incident(
        &self,
        _incident_id: Uuid,
        _resolved_at: DateTime<Utc>,
        _duration_seconds: i64,
    ) -> Result<(), StoreError> {
        Err(missing_relation())
    }

    async fn list_incidents(&self, _monitor_id: Uuid) -> Result<Vec<Incident>, StoreError> {
        Err(missing_relation())
    }
}

#[tokio::test]
async fn missing_relations_surface_as_service_unavailable() {
    let app = build_app(Arc::new(UnprovisionedStore));

    let response = app
        .clone()
        .oneshot(
            Request::get("/api/alert-settings")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Not configured:"));

    let response = app
        .oneshot(Request::get("/api/monitors").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn alert_settings_crud_round_trip() {
    let store = Arc::new(MemoryStore::new());
    let app = build_app(store);
    let server_id = Uuid::new_v4();

    let payload = json!({
        "userId": Uuid::new_v4(),
        "serverId": server_id,
        "cpuThreshold": 70.0,
        "notificationChannels": ["email", "slack"],
        "emailRecipients": ["ops@example.com"],
    });
    let response = app
        .clone()
        .oneshot(
            Request::post("/api/alert-settings")
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let created = body_json(response).await;
    assert_eq!(created["settings"]["cpuThreshold"], json!(70.0));

    let response = app
        .oneshot(
            Request::get(format!("/api/alert-settings?serverId={server_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let fetched = body_json(response).await;
    assert_eq!(fetched["settings"]["cpuThreshold"], json!(70.0));
    assert_eq!(fetched["settings"]["memoryThreshold"], json!(80.0));
}
