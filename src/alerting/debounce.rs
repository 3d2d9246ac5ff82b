use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use crate::db::enums::AlertType;
use crate::db::store::{AlertEntity, Store, StoreError};

pub const DEBOUNCE_WINDOW_MINUTES: i64 = 30;

/// Suppresses repeat alerts of the same type for the same entity within a
/// sliding 30-minute window. The window is measured from the most recent
/// persisted alert, so a sustained fault re-fires roughly every 30 minutes
/// rather than once per incident.
pub struct DebounceGate {
    store: Arc<dyn Store>,
}

impl DebounceGate {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Returns `true` when no alert of this `(entity, type)` pair exists
    /// within the window, i.e. a new alert may be persisted.
    pub async fn should_trigger(
        &self,
        entity: AlertEntity,
        alert_type: AlertType,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let since = now - Duration::minutes(DEBOUNCE_WINDOW_MINUTES);
        let suppressed = self
            .store
            .recent_alert_exists(entity, alert_type, since)
            .await?;
        Ok(!suppressed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::enums::AlertSeverity;
    use crate::db::memory::MemoryStore;
    use crate::db::models::NewAlert;
    use uuid::Uuid;

    fn cpu_alert(server_id: Uuid) -> NewAlert {
        NewAlert {
            server_id: Some(server_id),
            monitor_id: None,
            user_id: Uuid::new_v4(),
            alert_type: AlertType::CpuHigh,
            severity: AlertSeverity::Warning,
            message: "CPU usage is high at 87.5%".to_string(),
            current_value: Some(87.5),
            threshold_value: Some(85.0),
            resolved: false,
        }
    }

    #[tokio::test]
    async fn permits_first_alert() {
        let store = Arc::new(MemoryStore::new());
        let gate = DebounceGate::new(store);
        let entity = AlertEntity::Server(Uuid::new_v4());
        assert!(gate
            .should_trigger(entity, AlertType::CpuHigh, Utc::now())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn suppresses_within_window() {
        let store = Arc::new(MemoryStore::new());
        let server_id = Uuid::new_v4();
        store.insert_alert(cpu_alert(server_id)).await.unwrap();

        let gate = DebounceGate::new(store);
        let entity = AlertEntity::Server(server_id);
        assert!(!gate
            .should_trigger(entity, AlertType::CpuHigh, Utc::now())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn permits_after_window_elapses() {
        let store = Arc::new(MemoryStore::new());
        let server_id = Uuid::new_v4();
        store.insert_alert(cpu_alert(server_id)).await.unwrap();

        let gate = DebounceGate::new(store);
        let entity = AlertEntity::Server(server_id);
        let later = Utc::now() + Duration::minutes(DEBOUNCE_WINDOW_MINUTES + 1);
        assert!(gate
            .should_trigger(entity, AlertType::CpuHigh, later)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn different_type_is_not_suppressed() {
        let store = Arc::new(MemoryStore::new());
        let server_id = Uuid::new_v4();
        store.insert_alert(cpu_alert(server_id)).await.unwrap();

        let gate = DebounceGate::new(store);
        let entity = AlertEntity::Server(server_id);
        assert!(gate
            .should_trigger(entity, AlertType::MemoryHigh, Utc::now())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn different_entity_is_not_suppressed() {
        let store = Arc::new(MemoryStore::new());
        store.insert_alert(cpu_alert(Uuid::new_v4())).await.unwrap();

        let gate = DebounceGate::new(store);
        let entity = AlertEntity::Server(Uuid::new_v4());
        assert!(gate
            .should_trigger(entity, AlertType::CpuHigh, Utc::now())
            .await
            .unwrap());
    }
}
