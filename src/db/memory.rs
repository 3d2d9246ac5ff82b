use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db::enums::{AlertType, IncidentStatus, MonitorStatus, ServerStatus};
use crate::db::models::{
    Alert, AlertSettings, Incident, Metric, Monitor, MonitorCheck, NewAlert, NewIncident,
    NewMetric, NewMonitorCheck, Server,
};
use crate::db::store::{AlertEntity, Store, StoreError};

#[derive(Default)]
struct Inner {
    servers: Vec<Server>,
    metrics: Vec<Metric>,
    alerts: Vec<Alert>,
    settings: Vec<AlertSettings>,
    monitors: Vec<Monitor>,
    checks: Vec<MonitorCheck>,
    incidents: Vec<Incident>,
}

/// In-memory [`Store`] used for deterministic tests and local development.
/// Everything lives behind one RwLock; contention is irrelevant at test scale.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_server(&self, server: Server) {
        self.inner.write().await.servers.push(server);
    }

    pub async fn add_monitor(&self, monitor: Monitor) {
        self.inner.write().await.monitors.push(monitor);
    }

    pub async fn add_settings(&self, settings: AlertSettings) {
        self.inner.write().await.settings.push(settings);
    }

    pub async fn alerts(&self) -> Vec<Alert> {
        self.inner.read().await.alerts.clone()
    }

    pub async fn incidents(&self) -> Vec<Incident> {
        self.inner.read().await.incidents.clone()
    }

    pub async fn checks(&self) -> Vec<MonitorCheck> {
        self.inner.read().await.checks.clone()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_servers(&self) -> Result<Vec<Server>, StoreError> {
        Ok(self.inner.read().await.servers.clone())
    }

    async fn server_by_api_key(&self, api_key: &str) -> Result<Option<Server>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .servers
            .iter()
            .find(|s| s.api_key == api_key)
            .cloned())
    }

    async fn update_server_liveness(
        &self,
        server_id: Uuid,
        status: ServerStatus,
        last_seen_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let server = inner
            .servers
            .iter_mut()
            .find(|s| s.id == server_id)
            .ok_or_else(|| StoreError::NotFound(format!("server {server_id}")))?;
        server.status = status;
        server.last_seen_at = Some(last_seen_at);
        Ok(())
    }

    async fn insert_metric(&self, metric: NewMetric) -> Result<Metric, StoreError> {
        let row = Metric {
            id: Uuid::new_v4(),
            server_id: metric.server_id,
            cpu_usage: metric.cpu_usage,
            memory_usage: metric.memory_usage,
            disk_usage: metric.disk_usage,
            network_in: metric.network_in,
            network_out: metric.network_out,
            load_average: metric.load_average,
            uptime_seconds: metric.uptime_seconds,
            processes: metric.processes,
            created_at: Utc::now(),
        };
        self.inner.write().await.metrics.push(row.clone());
        Ok(row)
    }

    async fn latest_metric(&self, server_id: Uuid) -> Result<Option<Metric>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .metrics
            .iter()
            .filter(|m| m.server_id == server_id)
            .max_by_key(|m| m.created_at)
            .cloned())
    }

    async fn insert_alert(&self, alert: NewAlert) -> Result<Alert, StoreError> {
        let now = Utc::now();
        let row = Alert {
            id: Uuid::new_v4(),
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
            resolved_at: alert.resolved.then_some(now),
            resolved_by: None,
            created_at: now,
        };
        self.inner.write().await.alerts.push(row.clone());
        Ok(row)
    }

    async fn recent_alert_exists(
        &self,
        entity: AlertEntity,
        alert_type: AlertType,
        since: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        Ok(self.inner.read().await.alerts.iter().any(|a| {
            let entity_match = match entity {
                AlertEntity::Server(id) => a.server_id == Some(id),
                AlertEntity::Monitor(id) => a.monitor_id == Some(id),
            };
            entity_match && a.alert_type == alert_type && a.created_at >= since
        }))
    }

    async fn list_recent_alerts(&self, limit: i64) -> Result<Vec<Alert>, StoreError> {
        let mut alerts = self.inner.read().await.alerts.clone();
        alerts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        alerts.truncate(limit.max(0) as usize);
        Ok(alerts)
    }

    async fn settings_for_server(
        &self,
        server_id: Uuid,
        group_id: Option<Uuid>,
    ) -> Result<Option<AlertSettings>, StoreError> {
        let inner = self.inner.read().await;
        let by_server = inner
            .settings
            .iter()
            .find(|s| s.server_id == Some(server_id));
        if by_server.is_some() {
            return Ok(by_server.cloned());
        }
        Ok(group_id
            .and_then(|gid| inner.settings.iter().find(|s| s.group_id == Some(gid)))
            .cloned())
    }

    async fn settings_by_scope(
        &self,
        server_id: Option<Uuid>,
        group_id: Option<Uuid>,
    ) -> Result<Option<AlertSettings>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .settings
            .iter()
            .find(|s| match (server_id, group_id) {
                (Some(sid), _) => s.server_id == Some(sid),
                (None, Some(gid)) => s.group_id == Some(gid),
                (None, None) => true,
            })
            .cloned())
    }

    async fn insert_settings(&self, settings: AlertSettings) -> Result<AlertSettings, StoreError> {
        self.inner.write().await.settings.push(settings.clone());
        Ok(settings)
    }

    async fn update_settings(&self, settings: AlertSettings) -> Result<AlertSettings, StoreError> {
        let mut inner = self.inner.write().await;
        let slot = inner
            .settings
            .iter_mut()
            .find(|s| s.id == settings.id)
            .ok_or_else(|| StoreError::NotFound(format!("alert settings {}", settings.id)))?;
        *slot = settings.clone();
        Ok(settings)
    }

    async fn list_monitors(&self) -> Result<Vec<Monitor>, StoreError> {
        Ok(self.inner.read().await.monitors.clone())
    }

    async fn list_enabled_monitors(&self) -> Result<Vec<Monitor>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .monitors
            .iter()
            .filter(|m| m.enabled)
            .cloned()
            .collect())
    }

    async fn monitor_by_id(&self, monitor_id: Uuid) -> Result<Option<Monitor>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .monitors
            .iter()
            .find(|m| m.id == monitor_id)
            .cloned())
    }

    async fn record_monitor_check(
        &self,
        check: NewMonitorCheck,
    ) -> Result<MonitorCheck, StoreError> {
        let row = MonitorCheck {
            id: Uuid::new_v4(),
            monitor_id: check.monitor_id,
            success: check.success,
            response_time_ms: check.response_time_ms,
            status_code: check.status_code,
            message: check.message,
            created_at: Utc::now(),
        };
        self.inner.write().await.checks.push(row.clone());
        Ok(row)
    }

    async fn update_monitor_status(
        &self,
        monitor_id: Uuid,
        status: MonitorStatus,
        checked_at: DateTime<Utc>,
        response_time_ms: i64,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let monitor = inner
            .monitors
            .iter_mut()
            .find(|m| m.id == monitor_id)
            .ok_or_else(|| StoreError::NotFound(format!("monitor {monitor_id}")))?;
        monitor.status = status;
        monitor.last_checked_at = Some(checked_at);
        monitor.last_response_time_ms = Some(response_time_ms);
        Ok(())
    }

    async fn list_checks(
        &self,
        monitor_id: Uuid,
        limit: i64,
    ) -> Result<Vec<MonitorCheck>, StoreError> {
        let mut checks: Vec<MonitorCheck> = self
            .inner
            .read()
            .await
            .checks
            .iter()
            .filter(|c| c.monitor_id == monitor_id)
            .cloned()
            .collect();
        checks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        checks.truncate(limit.max(0) as usize);
        Ok(checks)
    }

    async fn open_incident(&self, incident: NewIncident) -> Result<Incident, StoreError> {
        let row = Incident {
            id: Uuid::new_v4(),
            monitor_id: incident.monitor_id,
            user_id: incident.user_id,
            started_at: incident.started_at,
            resolved_at: None,
            duration_seconds: None,
            status: IncidentStatus::Open,
            message: incident.message,
        };
        self.inner.write().await.incidents.push(row.clone());
        Ok(row)
    }

    async fn latest_open_incident(
        &self,
        monitor_id: Uuid,
    ) -> Result<Option<Incident>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .incidents
            .iter()
            .filter(|i| i.monitor_id == monitor_id && i.status == IncidentStatus::Open)
            .max_by_key(|i| i.started_at)
            .cloned())
    }

    async fn resolve_incident(
        &self,
        incident_id: Uuid,
        resolved_at: DateTime<Utc>,
        duration_seconds: i64,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let incident = inner
            .incidents
            .iter_mut()
            .find(|i| i.id == incident_id)
            .ok_or_else(|| StoreError::NotFound(format!("incident {incident_id}")))?;
        incident.status = IncidentStatus::Resolved;
        incident.resolved_at = Some(resolved_at);
        incident.duration_seconds = Some(duration_seconds);
        Ok(())
    }

    async fn list_incidents(&self, monitor_id: Uuid) -> Result<Vec<Incident>, StoreError> {
        let mut incidents: Vec<Incident> = self
            .inner
            .read()
            .await
            .incidents
            .iter()
            .filter(|i| i.monitor_id == monitor_id)
            .cloned()
            .collect();
        incidents.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(incidents)
    }
}
