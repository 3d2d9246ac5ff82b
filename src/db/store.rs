use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::db::enums::{AlertType, MonitorStatus, ServerStatus};
use crate::db::models::{
    Alert, AlertSettings, Incident, Metric, Monitor, MonitorCheck, NewAlert, NewIncident,
    NewMetric, NewMonitorCheck, Server,
};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),
    /// The backing relation does not exist yet. Read paths surface this as
    /// a soft "feature not configured" state rather than a hard failure.
    #[error("Store not configured: {0}")]
    NotConfigured(String),
    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            // 42P01: undefined_table
            if db_err.code().as_deref() == Some("42P01") {
                return StoreError::NotConfigured(db_err.message().to_string());
            }
        }
        StoreError::Database(err.to_string())
    }
}

/// Identifies the entity an alert is keyed against, for debounce lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertEntity {
    Server(Uuid),
    Monitor(Uuid),
}

/// Persistence seam for the evaluation engine. Handles are constructed
/// explicitly and passed in, so tests can substitute the in-memory store.
#[async_trait]
pub trait Store: Send + Sync {
    // Servers
    async fn list_servers(&self) -> Result<Vec<Server>, StoreError>;
    async fn server_by_api_key(&self, api_key: &str) -> Result<Option<Server>, StoreError>;
    async fn update_server_liveness(
        &self,
        server_id: Uuid,
        status: ServerStatus,
        last_seen_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    // Metrics (append-only)
    async fn insert_metric(&self, metric: NewMetric) -> Result<Metric, StoreError>;
    async fn latest_metric(&self, server_id: Uuid) -> Result<Option<Metric>, StoreError>;

    // Alerts
    async fn insert_alert(&self, alert: NewAlert) -> Result<Alert, StoreError>;
    async fn recent_alert_exists(
        &self,
        entity: AlertEntity,
        alert_type: AlertType,
        since: DateTime<Utc>,
    ) -> Result<bool, StoreError>;
    async fn list_recent_alerts(&self, limit: i64) -> Result<Vec<Alert>, StoreError>;

    // Alert settings
    async fn settings_for_server(
        &self,
        server_id: Uuid,
        group_id: Option<Uuid>,
    ) -> Result<Option<AlertSettings>, StoreError>;
    async fn settings_by_scope(
        &self,
        server_id: Option<Uuid>,
        group_id: Option<Uuid>,
    ) -> Result<Option<AlertSettings>, StoreError>;
    async fn insert_settings(&self, settings: AlertSettings) -> Result<AlertSettings, StoreError>;
    async fn update_settings(&self, settings: AlertSettings) -> Result<AlertSettings, StoreError>;

    // Monitors
    async fn list_monitors(&self) -> Result<Vec<Monitor>, StoreError>;
    async fn list_enabled_monitors(&self) -> Result<Vec<Monitor>, StoreError>;
    async fn monitor_by_id(&self, monitor_id: Uuid) -> Result<Option<Monitor>, StoreError>;
    async fn record_monitor_check(
        &self,
        check: NewMonitorCheck,
    ) -> Result<MonitorCheck, StoreError>;
    async fn update_monitor_status(
        &self,
        monitor_id: Uuid,
        status: MonitorStatus,
        checked_at: DateTime<Utc>,
        response_time_ms: i64,
    ) -> Result<(), StoreError>;
    async fn list_checks(
        &self,
        monitor_id: Uuid,
        limit: i64,
    ) -> Result<Vec<MonitorCheck>, StoreError>;

    // Incidents
    async fn open_incident(&self, incident: NewIncident) -> Result<Incident, StoreError>;
    async fn latest_open_incident(
        &self,
        monitor_id: Uuid,
    ) -> Result<Option<Incident>, StoreError>;
    async fn resolve_incident(
        &self,
        incident_id: Uuid,
        resolved_at: DateTime<Utc>,
        duration_seconds: i64,
    ) -> Result<(), StoreError>;
    async fn list_incidents(&self, monitor_id: Uuid) -> Result<Vec<Incident>, StoreError>;
}
