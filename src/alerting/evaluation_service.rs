use chrono::Utc;
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{interval, Duration};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::alerting::debounce::DebounceGate;
use crate::alerting::evaluator;
use crate::db::models::{AlertSettings, NewAlert, Server};
use crate::db::store::{AlertEntity, Store, StoreError};
use crate::notifications::service::NotificationService;

/// Outcome of one batch evaluation run.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationSummary {
    pub servers_evaluated: usize,
    pub alerts_created: usize,
    pub notifications_dispatched: usize,
}

/// Periodic batch evaluator for registered servers. Each server is
/// evaluated under its own lock so overlapping runs (cron plus manual
/// trigger) cannot race the debounce read-then-write and create
/// duplicate alerts.
pub struct EvaluationService {
    store: Arc<dyn Store>,
    notifications: Arc<NotificationService>,
    debounce: DebounceGate,
    entity_locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl EvaluationService {
    pub fn new(store: Arc<dyn Store>, notifications: Arc<NotificationService>) -> Self {
        let debounce = DebounceGate::new(store.clone());
        Self {
            store,
            notifications,
            debounce,
            entity_locks: DashMap::new(),
        }
    }

    fn entity_lock(&self, id: Uuid) -> Arc<Mutex<()>> {
        self.entity_locks
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Evaluates every registered server once. Failures for one server are
    /// logged and never abort the rest of the batch.
    pub async fn run_evaluation_cycle(&self) -> Result<EvaluationSummary, StoreError> {
        let servers = self.store.list_servers().await?;
        let mut summary = EvaluationSummary {
            servers_evaluated: servers.len(),
            ..Default::default()
        };

        for server in servers {
            let lock = self.entity_lock(server.id);
            let _guard = lock.lock().await;

            match self.evaluate_server(&server).await {
                Ok(Some(dispatched)) => {
                    summary.alerts_created += 1;
                    if dispatched {
                        summary.notifications_dispatched += 1;
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    error!(server_id = %server.id, error = %e, "Failed to evaluate server");
                }
            }
        }

        info!(
            servers_evaluated = summary.servers_evaluated,
            alerts_created = summary.alerts_created,
            "Alert evaluation cycle complete"
        );
        Ok(summary)
    }

    /// Evaluates one server. Returns `Some(dispatched)` when a new alert
    /// was persisted, `None` when nothing fired.
    async fn evaluate_server(&self, server: &Server) -> Result<Option<bool>, StoreError> {
        let settings = match self
            .store
            .settings_for_server(server.id, server.group_id)
            .await?
        {
            Some(settings) => settings,
            None => AlertSettings::defaults_for_user(server.user_id),
        };

        if !settings.enabled {
            debug!(server_id = %server.id, "Alerting disabled for server, skipping");
            return Ok(None);
        }

        let metric = self.store.latest_metric(server.id).await?;
        let now = Utc::now();
        let condition = evaluator::evaluate(
            metric.as_ref().map(|m| m.cpu_usage),
            metric.as_ref().map(|m| m.memory_usage),
            metric.as_ref().map(|m| m.disk_usage),
            server.last_seen_at,
            &settings,
            now,
        );

        let Some(condition) = condition else {
            return Ok(None);
        };

        let entity = AlertEntity::Server(server.id);
        if !self
            .debounce
            .should_trigger(entity, condition.alert_type, now)
            .await?
        {
            debug!(
                server_id = %server.id,
                alert_type = %condition.alert_type,
                "Alert suppressed by debounce window"
            );
            return Ok(None);
        }

        let alert = self
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
            .await?;
        info!(
            server_id = %server.id,
            alert_type = %alert.alert_type,
            "Alert created"
        );

        // The alert is durable at this point; dispatch is best-effort.
        self.notifications
            .dispatch_alert(&alert, &settings, &server.name)
            .await;
        Ok(Some(!settings.notification_channels.is_empty()))
    }

    /// Spawns the periodic evaluation loop. The first tick fires after one
    /// full period so startup is not dominated by a cold evaluation.
    pub fn spawn_periodic(self: &Arc<Self>, period: Duration) -> tokio::task::JoinHandle<()> {
        let service = self.clone();
        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = service.run_evaluation_cycle().await {
                    error!(error = %e, "Periodic alert evaluation failed");
                }
            }
        })
    }
}
