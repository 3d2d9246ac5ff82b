use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::enums::{ChannelKind, ServerStatus};
use crate::db::models::{
    AlertSettings, DEFAULT_CPU_THRESHOLD, DEFAULT_DISK_THRESHOLD, DEFAULT_DOWN_THRESHOLD_SECONDS,
    DEFAULT_MEMORY_THRESHOLD,
};

/// Body of an ingestion push. `cpu`, `memory` and `disk` are required;
/// everything else is optional agent-side detail.
#[derive(Debug, Deserialize)]
pub struct IngestMetricsRequest {
    pub cpu: f64,
    pub memory: f64,
    pub disk: f64,
    pub network_in: Option<i64>,
    pub network_out: Option<i64>,
    pub load_average: Option<f64>,
    pub uptime: Option<i64>,
    pub processes: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct IngestMetricsResponse {
    pub success: bool,
    pub status: ServerStatus,
    pub message: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct CheckMonitorsRequest {
    #[serde(rename = "monitorId")]
    pub monitor_id: Option<Uuid>,
    #[serde(default)]
    pub force: bool,
}

/// Threshold and channel configuration as sent by clients. Missing
/// numeric fields fall back to the built-in defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertSettingsPayload {
    pub user_id: Uuid,
    pub server_id: Option<Uuid>,
    pub group_id: Option<Uuid>,
    pub enabled: Option<bool>,
    pub cpu_threshold: Option<f64>,
    pub memory_threshold: Option<f64>,
    pub disk_threshold: Option<f64>,
    pub down_threshold_seconds: Option<i64>,
    pub notification_channels: Option<Vec<ChannelKind>>,
    pub email_recipients: Option<Vec<String>>,
    pub slack_webhook_url: Option<String>,
    pub webhook_url: Option<String>,
    pub webhook_headers: Option<serde_json::Value>,
}

impl AlertSettingsPayload {
    pub fn into_settings(self) -> AlertSettings {
        let mut settings = AlertSettings::defaults_for_user(self.user_id);
        settings.server_id = self.server_id;
        settings.group_id = self.group_id;
        settings.enabled = self.enabled.unwrap_or(true);
        settings.cpu_threshold = self.cpu_threshold.unwrap_or(DEFAULT_CPU_THRESHOLD);
        settings.memory_threshold = self.memory_threshold.unwrap_or(DEFAULT_MEMORY_THRESHOLD);
        settings.disk_threshold = self.disk_threshold.unwrap_or(DEFAULT_DISK_THRESHOLD);
        settings.down_threshold_seconds = self
            .down_threshold_seconds
            .unwrap_or(DEFAULT_DOWN_THRESHOLD_SECONDS);
        settings.notification_channels = self
            .notification_channels
            .unwrap_or_else(|| vec![ChannelKind::Email]);
        settings.email_recipients = self.email_recipients.unwrap_or_default();
        settings.slack_webhook_url = self.slack_webhook_url;
        settings.webhook_url = self.webhook_url;
        settings.webhook_headers = self.webhook_headers;
        settings
    }
}

#[derive(Debug, Deserialize)]
pub struct TestNotificationRequest {
    pub settings: AlertSettingsPayload,
    pub channel: ChannelKind,
}

#[derive(Debug, Serialize)]
pub struct TestNotificationResponse {
    pub success: bool,
    pub message: String,
}
