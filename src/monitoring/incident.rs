use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};

use crate::db::enums::{AlertSeverity, AlertType, MonitorStatus};
use crate::db::models::{Monitor, NewAlert, NewIncident};
use crate::db::store::{Store, StoreError};
use crate::monitoring::probe::ProbeOutcome;

/// Downtime state machine for external monitors. Incidents are opened on
/// an up→down transition and the most recent open one is closed on
/// down→up; `unknown` transitions and same-status repeats touch nothing,
/// so the first check after creation never produces an incident.
pub struct IncidentTracker {
    store: Arc<dyn Store>,
}

impl IncidentTracker {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Applies one probe verdict to the monitor's incident state. Returns
    /// the new status plus the alert to persist, if the transition
    /// produced one.
    pub async fn observe(
        &self,
        monitor: &Monitor,
        outcome: &ProbeOutcome,
        now: DateTime<Utc>,
    ) -> Result<(MonitorStatus, Option<NewAlert>), StoreError> {
        let new_status = if outcome.success {
            MonitorStatus::Up
        } else {
            MonitorStatus::Down
        };

        match (monitor.status, new_status) {
            (MonitorStatus::Up, MonitorStatus::Down) => {
                self.store
                    .open_incident(NewIncident {
                        monitor_id: monitor.id,
                        user_id: monitor.user_id,
                        started_at: now,
                        message: outcome.message.clone(),
                    })
                    .await?;
                info!(monitor_id = %monitor.id, "Incident opened, monitor went down");
                Ok((
                    new_status,
                    Some(NewAlert {
                        server_id: None,
                        monitor_id: Some(monitor.id),
                        user_id: monitor.user_id,
                        alert_type: AlertType::MonitorDown,
                        severity: AlertSeverity::Critical,
                        message: format!(
                            "Monitor \"{}\" is DOWN: {}",
                            monitor.name, outcome.message
                        ),
                        current_value: None,
                        threshold_value: None,
                        resolved: false,
                    }),
                ))
            }
            (MonitorStatus::Down, MonitorStatus::Up) => {
                match self.store.latest_open_incident(monitor.id).await? {
                    Some(incident) => {
                        let duration_seconds = (now - incident.started_at).num_seconds();
                        self.store
                            .resolve_incident(incident.id, now, duration_seconds)
                            .await?;
                        info!(
                            monitor_id = %monitor.id,
                            duration_seconds,
                            "Incident resolved, monitor recovered"
                        );
                    }
                    None => {
                        warn!(monitor_id = %monitor.id, "Monitor recovered but no open incident found");
                    }
                }
                // Recovery alerts are inserted already resolved; the
                // original down alert is never mutated.
                Ok((
                    new_status,
                    Some(NewAlert {
                        server_id: None,
                        monitor_id: Some(monitor.id),
                        user_id: monitor.user_id,
                        alert_type: AlertType::MonitorUp,
                        severity: AlertSeverity::Info,
                        message: format!("Monitor \"{}\" is back UP", monitor.name),
                        current_value: None,
                        threshold_value: None,
                        resolved: true,
                    }),
                ))
            }
            _ => Ok((new_status, None)),
        }
    }
}
