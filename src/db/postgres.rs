use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use std::str::FromStr;
use uuid::Uuid;

use crate::db::enums::{
    AlertSeverity, AlertType, ChannelKind, IncidentStatus, MonitorStatus, MonitorType,
    ServerStatus,
};
use crate::db::models::{
    Alert, AlertSettings, Incident, Metric, Monitor, MonitorCheck, NewAlert, NewIncident,
    NewMetric, NewMonitorCheck, Server,
};
use crate::db::store::{AlertEntity, Store, StoreError};

/// PostgreSQL-backed [`Store`]. Status and type columns are stored as text;
/// rows are fetched into private structs and converted to the typed domain
/// models.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn parse_enum<T: FromStr>(value: &str, what: &str) -> Result<T, StoreError> {
    value
        .parse()
        .map_err(|_| StoreError::Database(format!("unexpected {what} value in store: {value}")))
}

#[derive(FromRow)]
struct ServerRow {
    id: Uuid,
    user_id: Uuid,
    name: String,
    api_key: String,
    group_id: Option<Uuid>,
    status: String,
    last_seen_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ServerRow> for Server {
    type Error = StoreError;

    fn try_from(row: ServerRow) -> Result<Self, Self::Error> {
        Ok(Server {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            api_key: row.api_key,
            group_id: row.group_id,
            status: parse_enum::<ServerStatus>(&row.status, "server status")?,
            last_seen_at: row.last_seen_at,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct MonitorRow {
    id: Uuid,
    user_id: Uuid,
    name: String,
    monitor_type: String,
    url: String,
    port: Option<i32>,
    interval_minutes: i32,
    timeout_seconds: i32,
    expected_status: Option<i32>,
    expected_keyword: Option<String>,
    enabled: bool,
    status: String,
    last_checked_at: Option<DateTime<Utc>>,
    last_response_time_ms: Option<i64>,
    created_at: DateTime<Utc>,
}

impl TryFrom<MonitorRow> for Monitor {
    type Error = StoreError;

    fn try_from(row: MonitorRow) -> Result<Self, Self::Error> {
        Ok(Monitor {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            monitor_type: parse_enum::<MonitorType>(&row.monitor_type, "monitor type")?,
            url: row.url,
            port: row.port,
            interval_minutes: row.interval_minutes,
            timeout_seconds: row.timeout_seconds,
            expected_status: row.expected_status,
            expected_keyword: row.expected_keyword,
            enabled: row.enabled,
            status: parse_enum::<MonitorStatus>(&row.status, "monitor status")?,
            last_checked_at: row.last_checked_at,
            last_response_time_ms: row.last_response_time_ms,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct AlertRow {
    id: Uuid,
    server_id: Option<Uuid>,
    monitor_id: Option<Uuid>,
    user_id: Uuid,
    alert_type: String,
    severity: String,
    message: String,
    current_value: Option<f64>,
    threshold_value: Option<f64>,
    acknowledged: bool,
    acknowledged_at: Option<DateTime<Utc>>,
    acknowledged_by: Option<Uuid>,
    resolved: bool,
    resolved_at: Option<DateTime<Utc>>,
    resolved_by: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl TryFrom<AlertRow> for Alert {
    type Error = StoreError;

    fn try_from(row: AlertRow) -> Result<Self, Self::Error> {
        Ok(Alert {
            id: row.id,
            server_id: row.server_id,
            monitor_id: row.monitor_id,
            user_id: row.user_id,
            alert_type: parse_enum::<AlertType>(&row.alert_type, "alert type")?,
            severity: parse_enum::<AlertSeverity>(&row.severity, "alert severity")?,
            message: row.message,
            current_value: row.current_value,
            threshold_value: row.threshold_value,
            acknowledged: row.acknowledged,
            acknowledged_at: row.acknowledged_at,
            acknowledged_by: row.acknowledged_by,
            resolved: row.resolved,
            resolved_at: row.resolved_at,
            resolved_by: row.resolved_by,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct AlertSettingsRow {
    id: Uuid,
    user_id: Uuid,
    server_id: Option<Uuid>,
    group_id: Option<Uuid>,
    enabled: bool,
    cpu_threshold: f64,
    memory_threshold: f64,
    disk_threshold: f64,
    down_threshold_seconds: i64,
    notification_channels: Vec<String>,
    email_recipients: Vec<String>,
    slack_webhook_url: Option<String>,
    webhook_url: Option<String>,
    webhook_headers: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AlertSettingsRow> for AlertSettings {
    type Error = StoreError;

    fn try_from(row: AlertSettingsRow) -> Result<Self, Self::Error> {
        let mut channels = Vec::with_capacity(row.notification_channels.len());
        for raw in &row.notification_channels {
            channels.push(parse_enum::<ChannelKind>(raw, "notification channel")?);
        }
        Ok(AlertSettings {
            id: row.id,
            user_id: row.user_id,
            server_id: row.server_id,
            group_id: row.group_id,
            enabled: row.enabled,
            cpu_threshold: row.cpu_threshold,
            memory_threshold: row.memory_threshold,
            disk_threshold: row.disk_threshold,
            down_threshold_seconds: row.down_threshold_seconds,
            notification_channels: channels,
            email_recipients: row.email_recipients,
            slack_webhook_url: row.slack_webhook_url,
            webhook_url: row.webhook_url,
            webhook_headers: row.webhook_headers,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct IncidentRow {
    id: Uuid,
    monitor_id: Uuid,
    user_id: Uuid,
    started_at: DateTime<Utc>,
    resolved_at: Option<DateTime<Utc>>,
    duration_seconds: Option<i64>,
    status: String,
    message: String,
}

impl TryFrom<IncidentRow> for Incident {
    type Error = StoreError;

    fn try_from(row: IncidentRow) -> Result<Self, Self::Error> {
        Ok(Incident {
            id: row.id,
            monitor_id: row.monitor_id,
            user_id: row.user_id,
            started_at: row.started_at,
            resolved_at: row.resolved_at,
            duration_seconds: row.duration_seconds,
            status: parse_enum::<IncidentStatus>(&row.status, "incident status")?,
            message: row.message,
        })
    }
}

const SERVER_COLUMNS: &str =
    "id, user_id, name, api_key, group_id, status, last_seen_at, created_at";
const MONITOR_COLUMNS: &str = "id, user_id, name, monitor_type, url, port, interval_minutes, \
     timeout_seconds, expected_status, expected_keyword, enabled, status, last_checked_at, \
     last_response_time_ms, created_at";
const ALERT_COLUMNS: &str = "id, server_id, monitor_id, user_id, alert_type, severity, message, \
     current_value, threshold_value, acknowledged, acknowledged_at, acknowledged_by, resolved, \
     resolved_at, resolved_by, created_at";
const SETTINGS_COLUMNS: &str = "id, user_id, server_id, group_id, enabled, cpu_threshold, \
     memory_threshold, disk_threshold, down_threshold_seconds, notification_channels, \
     email_recipients, slack_webhook_url, webhook_url, webhook_headers, created_at, updated_at";
const INCIDENT_COLUMNS: &str =
    "id, monitor_id, user_id, started_at, resolved_at, duration_seconds, status, message";

#[async_trait]
impl Store for PgStore {
    async fn list_servers(&self) -> Result<Vec<Server>, StoreError> {
        let rows = sqlx::query_as::<_, ServerRow>(&format!(
            "SELECT {SERVER_COLUMNS} FROM servers ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Server::try_from).collect()
    }

    async fn server_by_api_key(&self, api_key: &str) -> Result<Option<Server>, StoreError> {
        let row = sqlx::query_as::<_, ServerRow>(&format!(
            "SELECT {SERVER_COLUMNS} FROM servers WHERE api_key = $1"
        ))
        .bind(api_key)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Server::try_from).transpose()
    }

    async fn update_server_liveness(
        &self,
        server_id: Uuid,
        status: ServerStatus,
        last_seen_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE servers SET status = $1, last_seen_at = $2 WHERE id = $3")
            .bind(status.as_str())
            .bind(last_seen_at)
            .bind(server_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("server {server_id}")));
        }
        Ok(())
    }

    async fn insert_metric(&self, metric: NewMetric) -> Result<Metric, StoreError> {
        let id = Uuid::new_v4();
        let created_at = Utc::now();
        sqlx::query(
            "INSERT INTO metrics (id, server_id, cpu_usage, memory_usage, disk_usage, \
             network_in, network_out, load_average, uptime_seconds, processes, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(id)
        .bind(metric.server_id)
        .bind(metric.cpu_usage)
        .bind(metric.memory_usage)
        .bind(metric.disk_usage)
        .bind(metric.network_in)
        .bind(metric.network_out)
        .bind(metric.load_average)
        .bind(metric.uptime_seconds)
        .bind(metric.processes)
        .bind(created_at)
        .execute(&self.pool)
        .await?;
        Ok(Metric {
            id,
            server_id: metric.server_id,
            cpu_usage: metric.cpu_usage,
            memory_usage: metric.memory_usage,
            disk_usage: metric.disk_usage,
            network_in: metric.network_in,
            network_out: metric.network_out,
            load_average: metric.load_average,
            uptime_seconds: metric.uptime_seconds,
            processes: metric.processes,
            created_at,
        })
    }

    async fn latest_metric(&self, server_id: Uuid) -> Result<Option<Metric>, StoreError> {
        let row = sqlx::query_as::<_, Metric>(
            "SELECT id, server_id, cpu_usage, memory_usage, disk_usage, network_in, \
             network_out, load_average, uptime_seconds, processes, created_at \
             FROM metrics WHERE server_id = $1 ORDER BY created_at DESC LIMIT 1",
        )
        .bind(server_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn insert_alert(&self, alert: NewAlert) -> Result<Alert, StoreError> {
        let id = Uuid::new_v4();
        let created_at = Utc::now();
        let resolved_at = alert.resolved.then_some(created_at);
        sqlx::query(
            "INSERT INTO alerts (id, server_id, monitor_id, user_id, alert_type, severity, \
             message, current_value, threshold_value, acknowledged, resolved, resolved_at, \
             created_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, false, $10, $11, $12)",
        )
        .bind(id)
        .bind(alert.server_id)
        .bind(alert.monitor_id)
        .bind(alert.user_id)
        .bind(alert.alert_type.as_str())
        .bind(alert.severity.as_str())
        .bind(&alert.message)
        .bind(alert.current_value)
        .bind(alert.threshold_value)
        .bind(alert.resolved)
        .bind(resolved_at)
        .bind(created_at)
        .execute(&self.pool)
        .await?;
        Ok(Alert {
            id,
            server_id: alert.server_id,
            monitor_id: alert.monitor_id,
            user_id: alert.user_id,
            alert_type: alert.alert_type,
            severity: alert.severity,
            message: alert.message,
            current_value: alert.current_value,
            threshold_value: alert.threshold_value,
            acknowledged: false,
            acknowledged_at: None,
            acknowledged_by: None,
            resolved: alert.resolved,
            resolved_at,
            resolved_by: None,
            created_at,
        })
    }

    async fn recent_alert_exists(
        &self,
        entity: AlertEntity,
        alert_type: AlertType,
        since: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let (column, id) = match entity {
            AlertEntity::Server(id) => ("server_id", id),
            AlertEntity::Monitor(id) => ("monitor_id", id),
        };
        let exists: (bool,) = sqlx::query_as(&format!(
            "SELECT EXISTS(SELECT 1 FROM alerts WHERE {column} = $1 AND alert_type = $2 \
             AND created_at >= $3)"
        ))
        .bind(id)
        .bind(alert_type.as_str())
        .bind(since)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists.0)
    }

    async fn list_recent_alerts(&self, limit: i64) -> Result<Vec<Alert>, StoreError> {
        let rows = sqlx::query_as::<_, AlertRow>(&format!(
            "SELECT {ALERT_COLUMNS} FROM alerts ORDER BY created_at DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Alert::try_from).collect()
    }

    async fn settings_for_server(
        &self,
        server_id: Uuid,
        group_id: Option<Uuid>,
    ) -> Result<Option<AlertSettings>, StoreError> {
        // Server-scoped settings win over group-scoped ones.
        let row = sqlx::query_as::<_, AlertSettingsRow>(&format!(
            "SELECT {SETTINGS_COLUMNS} FROM alert_settings WHERE server_id = $1 LIMIT 1"
        ))
        .bind(server_id)
        .fetch_optional(&self.pool)
        .await?;
        if let Some(row) = row {
            return Ok(Some(AlertSettings::try_from(row)?));
        }
        let Some(group_id) = group_id else {
            return Ok(None);
        };
        let row = sqlx::query_as::<_, AlertSettingsRow>(&format!(
            "SELECT {SETTINGS_COLUMNS} FROM alert_settings WHERE group_id = $1 LIMIT 1"
        ))
        .bind(group_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(AlertSettings::try_from).transpose()
    }

    async fn settings_by_scope(
        &self,
        server_id: Option<Uuid>,
        group_id: Option<Uuid>,
    ) -> Result<Option<AlertSettings>, StoreError> {
        let row = match (server_id, group_id) {
            (Some(sid), _) => {
                sqlx::query_as::<_, AlertSettingsRow>(&format!(
                    "SELECT {SETTINGS_COLUMNS} FROM alert_settings WHERE server_id = $1 LIMIT 1"
                ))
                .bind(sid)
                .fetch_optional(&self.pool)
                .await?
            }
            (None, Some(gid)) => {
                sqlx::query_as::<_, AlertSettingsRow>(&format!(
                    "SELECT {SETTINGS_COLUMNS} FROM alert_settings WHERE group_id = $1 LIMIT 1"
                ))
                .bind(gid)
                .fetch_optional(&self.pool)
                .await?
            }
            (None, None) => {
                sqlx::query_as::<_, AlertSettingsRow>(&format!(
                    "SELECT {SETTINGS_COLUMNS} FROM alert_settings ORDER BY created_at LIMIT 1"
                ))
                .fetch_optional(&self.pool)
                .await?
            }
        };
        row.map(AlertSettings::try_from).transpose()
    }

    async fn insert_settings(&self, settings: AlertSettings) -> Result<AlertSettings, StoreError> {
        let channels: Vec<String> = settings
            .notification_channels
            .iter()
            .map(|c| c.as_str().to_string())
            .collect();
        sqlx::query(
            "INSERT INTO alert_settings (id, user_id, server_id, group_id, enabled, \
             cpu_threshold, memory_threshold, disk_threshold, down_threshold_seconds, \
             notification_channels, email_recipients, slack_webhook_url, webhook_url, \
             webhook_headers, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)",
        )
        .bind(settings.id)
        .bind(settings.user_id)
        .bind(settings.server_id)
        .bind(settings.group_id)
        .bind(settings.enabled)
        .bind(settings.cpu_threshold)
        .bind(settings.memory_threshold)
        .bind(settings.disk_threshold)
        .bind(settings.down_threshold_seconds)
        .bind(&channels)
        .bind(&settings.email_recipients)
        .bind(&settings.slack_webhook_url)
        .bind(&settings.webhook_url)
        .bind(&settings.webhook_headers)
        .bind(settings.created_at)
        .bind(settings.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(settings)
    }

    async fn update_settings(&self, settings: AlertSettings) -> Result<AlertSettings, StoreError> {
        let channels: Vec<String> = settings
            .notification_channels
            .iter()
            .map(|c| c.as_str().to_string())
            .collect();
        let result = sqlx::query(
            "UPDATE alert_settings SET enabled = $1, cpu_threshold = $2, memory_threshold = $3, \
             disk_threshold = $4, down_threshold_seconds = $5, notification_channels = $6, \
             email_recipients = $7, slack_webhook_url = $8, webhook_url = $9, \
             webhook_headers = $10, updated_at = $11 WHERE id = $12",
        )
        .bind(settings.enabled)
        .bind(settings.cpu_threshold)
        .bind(settings.memory_threshold)
        .bind(settings.disk_threshold)
        .bind(settings.down_threshold_seconds)
        .bind(&channels)
        .bind(&settings.email_recipients)
        .bind(&settings.slack_webhook_url)
        .bind(&settings.webhook_url)
        .bind(&settings.webhook_headers)
        .bind(settings.updated_at)
        .bind(settings.id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!(
                "alert settings {}",
                settings.id
            )));
        }
        Ok(settings)
    }

    async fn list_monitors(&self) -> Result<Vec<Monitor>, StoreError> {
        let rows = sqlx::query_as::<_, MonitorRow>(&format!(
            "SELECT {MONITOR_COLUMNS} FROM monitors ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Monitor::try_from).collect()
    }

    async fn list_enabled_monitors(&self) -> Result<Vec<Monitor>, StoreError> {
        let rows = sqlx::query_as::<_, MonitorRow>(&format!(
            "SELECT {MONITOR_COLUMNS} FROM monitors WHERE enabled ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Monitor::try_from).collect()
    }

    async fn monitor_by_id(&self, monitor_id: Uuid) -> Result<Option<Monitor>, StoreError> {
        let row = sqlx::query_as::<_, MonitorRow>(&format!(
            "SELECT {MONITOR_COLUMNS} FROM monitors WHERE id = $1"
        ))
        .bind(monitor_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Monitor::try_from).transpose()
    }

    async fn record_monitor_check(
        &self,
        check: NewMonitorCheck,
    ) -> Result<MonitorCheck, StoreError> {
        let id = Uuid::new_v4();
        let created_at = Utc::now();
        sqlx::query(
            "INSERT INTO monitor_checks (id, monitor_id, success, response_time_ms, \
             status_code, message, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(id)
        .bind(check.monitor_id)
        .bind(check.success)
        .bind(check.response_time_ms)
        .bind(check.status_code)
        .bind(&check.message)
        .bind(created_at)
        .execute(&self.pool)
        .await?;
        Ok(MonitorCheck {
            id,
            monitor_id: check.monitor_id,
            success: check.success,
            response_time_ms: check.response_time_ms,
            status_code: check.status_code,
            message: check.message,
            created_at,
        })
    }

    async fn update_monitor_status(
        &self,
        monitor_id: Uuid,
        status: MonitorStatus,
        checked_at: DateTime<Utc>,
        response_time_ms: i64,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE monitors SET status = $1, last_checked_at = $2, last_response_time_ms = $3 \
             WHERE id = $4",
        )
        .bind(status.as_str())
        .bind(checked_at)
        .bind(response_time_ms)
        .bind(monitor_id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("monitor {monitor_id}")));
        }
        Ok(())
    }

    async fn list_checks(
        &self,
        monitor_id: Uuid,
        limit: i64,
    ) -> Result<Vec<MonitorCheck>, StoreError> {
        let rows = sqlx::query_as::<_, MonitorCheck>(
            "SELECT id, monitor_id, success, response_time_ms, status_code, message, created_at \
             FROM monitor_checks WHERE monitor_id = $1 ORDER BY created_at DESC LIMIT $2",
        )
        .bind(monitor_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn open_incident(&self, incident: NewIncident) -> Result<Incident, StoreError> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO monitor_incidents (id, monitor_id, user_id, started_at, status, \
             message) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(id)
        .bind(incident.monitor_id)
        .bind(incident.user_id)
        .bind(incident.started_at)
        .bind(IncidentStatus::Open.as_str())
        .bind(&incident.message)
        .execute(&self.pool)
        .await?;
        Ok(Incident {
            id,
            monitor_id: incident.monitor_id,
            user_id: incident.user_id,
            started_at: incident.started_at,
            resolved_at: None,
            duration_seconds: None,
            status: IncidentStatus::Open,
            message: incident.message,
        })
    }

    async fn latest_open_incident(
        &self,
        monitor_id: Uuid,
    ) -> Result<Option<Incident>, StoreError> {
        let row = sqlx::query_as::<_, IncidentRow>(&format!(
            "SELECT {INCIDENT_COLUMNS} FROM monitor_incidents WHERE monitor_id = $1 \
             AND status = 'open' ORDER BY started_at DESC LIMIT 1"
        ))
        .bind(monitor_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Incident::try_from).transpose()
    }

    async fn resolve_incident(
        &self,
        incident_id: Uuid,
        resolved_at: DateTime<Utc>,
        duration_seconds: i64,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE monitor_incidents SET status = 'resolved', resolved_at = $1, \
             duration_seconds = $2 WHERE id = $3",
        )
        .bind(resolved_at)
        .bind(duration_seconds)
        .bind(incident_id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("incident {incident_id}")));
        }
        Ok(())
    }

    async fn list_incidents(&self, monitor_id: Uuid) -> Result<Vec<Incident>, StoreError> {
        let rows = sqlx::query_as::<_, IncidentRow>(&format!(
            "SELECT {INCIDENT_COLUMNS} FROM monitor_incidents WHERE monitor_id = $1 \
             ORDER BY started_at DESC"
        ))
        .bind(monitor_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Incident::try_from).collect()
    }
}
