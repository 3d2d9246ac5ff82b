use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::enums::{
    AlertSeverity, AlertType, ChannelKind, IncidentStatus, MonitorStatus, MonitorType,
    ServerStatus,
};

/// A registered server pushing metrics via its API key.
/// Corresponds to the `servers` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Server {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    #[serde(skip_serializing)]
    pub api_key: String,
    pub group_id: Option<Uuid>,
    pub status: ServerStatus,
    pub last_seen_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A single metric sample. Immutable once written.
/// Corresponds to the `metrics` table.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Metric {
    pub id: Uuid,
    pub server_id: Uuid,
    pub cpu_usage: f64,
    pub memory_usage: f64,
    pub disk_usage: f64,
    pub network_in: Option<i64>,
    pub network_out: Option<i64>,
    pub load_average: Option<f64>,
    pub uptime_seconds: Option<i64>,
    pub processes: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// Fields required to append a metric sample.
#[derive(Debug, Clone)]
pub struct NewMetric {
    pub server_id: Uuid,
    pub cpu_usage: f64,
    pub memory_usage: f64,
    pub disk_usage: f64,
    pub network_in: Option<i64>,
    pub network_out: Option<i64>,
    pub load_average: Option<f64>,
    pub uptime_seconds: Option<i64>,
    pub processes: Option<i32>,
}

/// An externally probed endpoint. Corresponds to the `monitors` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Monitor {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub monitor_type: MonitorType,
    pub url: String,
    pub port: Option<i32>,
    pub interval_minutes: i32,
    pub timeout_seconds: i32,
    pub expected_status: Option<i32>,
    pub expected_keyword: Option<String>,
    pub enabled: bool,
    pub status: MonitorStatus,
    pub last_checked_at: Option<DateTime<Utc>>,
    pub last_response_time_ms: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Result of one probe execution, persisted for history.
/// Corresponds to the `monitor_checks` table.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MonitorCheck {
    pub id: Uuid,
    pub monitor_id: Uuid,
    pub success: bool,
    pub response_time_ms: i64,
    pub status_code: Option<i32>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMonitorCheck {
    pub monitor_id: Uuid,
    pub success: bool,
    pub response_time_ms: i64,
    pub status_code: Option<i32>,
    pub message: String,
}

/// A persisted alert. Created only by the evaluation engine; acknowledgement
/// and resolution are user actions outside this crate.
/// Corresponds to the `alerts` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: Uuid,
    pub server_id: Option<Uuid>,
    pub monitor_id: Option<Uuid>,
    pub user_id: Uuid,
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub message: String,
    pub current_value: Option<f64>,
    pub threshold_value: Option<f64>,
    pub acknowledged: bool,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub acknowledged_by: Option<Uuid>,
    pub resolved: bool,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Alert {
    /// The id of whichever entity the alert concerns.
    pub fn entity_id(&self) -> Option<Uuid> {
        self.server_id.or(self.monitor_id)
    }
}

#[derive(Debug, Clone)]
pub struct NewAlert {
    pub server_id: Option<Uuid>,
    pub monitor_id: Option<Uuid>,
    pub user_id: Uuid,
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub message: String,
    pub current_value: Option<f64>,
    pub threshold_value: Option<f64>,
    /// Recovery alerts (monitor_up) are inserted already resolved.
    pub resolved: bool,
}

/// Per-server or per-group threshold and channel configuration.
/// Corresponds to the `alert_settings` table. Absence implies
/// [`AlertSettings::defaults_for_user`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertSettings {
    pub id: Uuid,
    pub user_id: Uuid,
    pub server_id: Option<Uuid>,
    pub group_id: Option<Uuid>,
    pub enabled: bool,
    pub cpu_threshold: f64,
    pub memory_threshold: f64,
    pub disk_threshold: f64,
    pub down_threshold_seconds: i64,
    pub notification_channels: Vec<ChannelKind>,
    pub email_recipients: Vec<String>,
    pub slack_webhook_url: Option<String>,
    pub webhook_url: Option<String>,
    pub webhook_headers: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const DEFAULT_CPU_THRESHOLD: f64 = 85.0;
pub const DEFAULT_MEMORY_THRESHOLD: f64 = 80.0;
pub const DEFAULT_DISK_THRESHOLD: f64 = 90.0;
pub const DEFAULT_DOWN_THRESHOLD_SECONDS: i64 = 120;

impl AlertSettings {
    /// The implicit configuration used when no settings row exists:
    /// 85/80/90 thresholds, 120s down window, email channel only.
    pub fn defaults_for_user(user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            server_id: None,
            group_id: None,
            enabled: true,
            cpu_threshold: DEFAULT_CPU_THRESHOLD,
            memory_threshold: DEFAULT_MEMORY_THRESHOLD,
            disk_threshold: DEFAULT_DISK_THRESHOLD,
            down_threshold_seconds: DEFAULT_DOWN_THRESHOLD_SECONDS,
            notification_channels: vec![ChannelKind::Email],
            email_recipients: Vec::new(),
            slack_webhook_url: None,
            webhook_url: None,
            webhook_headers: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A span of downtime for an external monitor, bounded by an up→down
/// transition and the following down→up transition.
/// Corresponds to the `monitor_incidents` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    pub id: Uuid,
    pub monitor_id: Uuid,
    pub user_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub duration_seconds: Option<i64>,
    pub status: IncidentStatus,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct NewIncident {
    pub monitor_id: Uuid,
    pub user_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub message: String,
}
