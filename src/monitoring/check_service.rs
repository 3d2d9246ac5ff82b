use chrono::Utc;
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{interval, Duration};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::db::enums::MonitorStatus;
use crate::db::models::{Monitor, NewMonitorCheck};
use crate::db::store::{Store, StoreError};
use crate::monitoring::incident::IncidentTracker;
use crate::monitoring::probe::ProbeRunner;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    pub monitor_id: Uuid,
    pub name: String,
    pub status: MonitorStatus,
    pub success: bool,
    pub response_time_ms: i64,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckSummary {
    pub checked: usize,
    pub results: Vec<CheckResult>,
}

/// Drives active checks for external monitors: runs the probe, records
/// the check row, updates monitor status and feeds the incident tracker.
/// Per-monitor locks keep overlapping runs from opening duplicate
/// incidents.
pub struct CheckService {
    store: Arc<dyn Store>,
    runner: ProbeRunner,
    tracker: IncidentTracker,
    entity_locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl CheckService {
    pub fn new(store: Arc<dyn Store>, runner: ProbeRunner) -> Self {
        let tracker = IncidentTracker::new(store.clone());
        Self {
            store,
            runner,
            tracker,
            entity_locks: DashMap::new(),
        }
    }

    fn entity_lock(&self, id: Uuid) -> Arc<Mutex<()>> {
        self.entity_locks
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Checks enabled monitors whose interval has elapsed. `force` skips
    /// the interval gate; `only` restricts the run to one monitor.
    pub async fn run_check_cycle(
        &self,
        force: bool,
        only: Option<Uuid>,
    ) -> Result<CheckSummary, StoreError> {
        let monitors = match only {
            Some(id) => self
                .store
                .monitor_by_id(id)
                .await?
                .into_iter()
                .filter(|m| m.enabled)
                .collect(),
            None => self.store.list_enabled_monitors().await?,
        };

        let mut summary = CheckSummary::default();
        for monitor in monitors {
            let lock = self.entity_lock(monitor.id);
            let _guard = lock.lock().await;

            if !force && !interval_elapsed(&monitor) {
                continue;
            }

            match self.check_monitor(&monitor).await {
                Ok(result) => {
                    summary.checked += 1;
                    summary.results.push(result);
                }
                Err(e) => {
                    error!(monitor_id = %monitor.id, error = %e, "Failed to check monitor");
                }
            }
        }

        info!(checked = summary.checked, "Monitor check cycle complete");
        Ok(summary)
    }

    async fn check_monitor(&self, monitor: &Monitor) -> Result<CheckResult, StoreError> {
        let outcome = self.runner.run(monitor).await;
        debug!(
            monitor_id = %monitor.id,
            success = outcome.success,
            response_time_ms = outcome.response_time_ms,
            "Probe finished"
        );

        self.store
            .record_monitor_check(NewMonitorCheck {
                monitor_id: monitor.id,
                success: outcome.success,
                response_time_ms: outcome.response_time_ms,
                status_code: outcome.status_code,
                message: outcome.message.clone(),
            })
            .await?;

        let now = Utc::now();
        let (new_status, alert) = self.tracker.observe(monitor, &outcome, now).await?;
        self.store
            .update_monitor_status(monitor.id, new_status, now, outcome.response_time_ms)
            .await?;

        if let Some(alert) = alert {
            self.store.insert_alert(alert).await?;
        }

        Ok(CheckResult {
            monitor_id: monitor.id,
            name: monitor.name.clone(),
            status: new_status,
            success: outcome.success,
            response_time_ms: outcome.response_time_ms,
            message: outcome.message,
        })
    }

    pub fn spawn_periodic(self: &Arc<Self>, period: Duration) -> tokio::task::JoinHandle<()> {
        let service = self.clone();
        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = service.run_check_cycle(false, None).await {
                    error!(error = %e, "Periodic monitor check failed");
                }
            }
        })
    }
}

fn interval_elapsed(monitor: &Monitor) -> bool {
    match monitor.last_checked_at {
        None => true,
        Some(checked) => {
            let minutes = (Utc::now() - checked).num_seconds() as f64 / 60.0;
            minutes >= monitor.interval_minutes as f64
        }
    }
}
