use chrono::{DateTime, Utc};

use crate::db::enums::{AlertSeverity, AlertType, ServerStatus};
use crate::db::models::AlertSettings;

/// A detected fault condition. Transient: it becomes an alert row only
/// after the debounce gate lets it through.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertCondition {
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub message: String,
    pub current_value: Option<f64>,
    pub threshold_value: Option<f64>,
}

/// Maps the latest sample of a server to at most one fault condition.
///
/// Checks are ordered and the first match wins: liveness dominates all
/// resource signals (a down host reports stale data anyway), then CPU,
/// then memory, then disk. The ordering is fixed so tests can rely on it.
pub fn evaluate(
    cpu: Option<f64>,
    memory: Option<f64>,
    disk: Option<f64>,
    last_seen_at: Option<DateTime<Utc>>,
    settings: &AlertSettings,
    now: DateTime<Utc>,
) -> Option<AlertCondition> {
    let seconds_since_last_seen = last_seen_at.map(|t| (now - t).num_seconds());
    let is_down = match seconds_since_last_seen {
        // A server that never reported is treated as down.
        None => true,
        Some(elapsed) => elapsed > settings.down_threshold_seconds,
    };

    if is_down {
        return Some(AlertCondition {
            alert_type: AlertType::Down,
            severity: AlertSeverity::Critical,
            message: format!(
                "Server is not responding. No metrics received in the last {} seconds.",
                settings.down_threshold_seconds
            ),
            current_value: None,
            threshold_value: None,
        });
    }

    if let Some(cpu) = cpu {
        if cpu > settings.cpu_threshold {
            let severity = if cpu > 90.0 {
                AlertSeverity::Critical
            } else {
                AlertSeverity::Warning
            };
            return Some(AlertCondition {
                alert_type: AlertType::CpuHigh,
                severity,
                message: usage_message("CPU", cpu, severity),
                current_value: Some(cpu),
                threshold_value: Some(settings.cpu_threshold),
            });
        }
    }

    if let Some(memory) = memory {
        if memory > settings.memory_threshold {
            let severity = if memory > 90.0 {
                AlertSeverity::Critical
            } else {
                AlertSeverity::Warning
            };
            return Some(AlertCondition {
                alert_type: AlertType::MemoryHigh,
                severity,
                message: usage_message("Memory", memory, severity),
                current_value: Some(memory),
                threshold_value: Some(settings.memory_threshold),
            });
        }
    }

    if let Some(disk) = disk {
        if disk > settings.disk_threshold {
            return Some(AlertCondition {
                alert_type: AlertType::DiskHigh,
                severity: AlertSeverity::Critical,
                message: usage_message("Disk", disk, AlertSeverity::Critical),
                current_value: Some(disk),
                threshold_value: Some(settings.disk_threshold),
            });
        }
    }

    None
}

fn usage_message(resource: &str, value: f64, severity: AlertSeverity) -> String {
    if severity == AlertSeverity::Critical {
        format!("{resource} usage is critically high at {value:.1}%")
    } else {
        format!("{resource} usage is high at {value:.1}%")
    }
}

/// Ingestion-time status classification. Uses fixed 75/90 cutoffs rather
/// than per-entity settings: this is the fast path, the periodic batch
/// evaluator remains the authoritative one.
pub fn classify_ingest_status(cpu: f64, memory: f64, disk: f64) -> ServerStatus {
    if cpu > 90.0 || memory > 90.0 || disk > 90.0 {
        ServerStatus::Critical
    } else if cpu > 75.0 || memory > 75.0 || disk > 75.0 {
        ServerStatus::Warning
    } else {
        ServerStatus::Online
    }
}

/// Best-effort alert raised synchronously on a critical ingestion sample,
/// reporting whichever resource is highest. No threshold payload: the
/// fast path has no per-entity configuration.
pub fn ingest_critical_condition(cpu: f64, memory: f64, disk: f64) -> AlertCondition {
    let (alert_type, resource, current) = if memory > cpu && memory > disk {
        (AlertType::MemoryHigh, "Memory", memory)
    } else if disk > cpu && disk > memory {
        (AlertType::DiskHigh, "Disk", disk)
    } else {
        (AlertType::CpuHigh, "CPU", cpu)
    };
    AlertCondition {
        alert_type,
        severity: AlertSeverity::Critical,
        message: format!("{} usage is critically high at {current:.1}%", resource.to_uppercase()),
        current_value: Some(current),
        threshold_value: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn settings() -> AlertSettings {
        AlertSettings::defaults_for_user(Uuid::new_v4())
    }

    #[test]
    fn stale_server_is_down() {
        let now = Utc::now();
        let condition = evaluate(
            Some(10.0),
            Some(10.0),
            Some(10.0),
            Some(now - Duration::minutes(5)),
            &settings(),
            now,
        )
        .unwrap();
        assert_eq!(condition.alert_type, AlertType::Down);
        assert_eq!(condition.severity, AlertSeverity::Critical);
        assert!(condition.current_value.is_none());
    }

    #[test]
    fn never_seen_server_is_down() {
        let now = Utc::now();
        let condition = evaluate(None, None, None, None, &settings(), now).unwrap();
        assert_eq!(condition.alert_type, AlertType::Down);
    }

    #[test]
    fn down_dominates_resource_breaches() {
        let now = Utc::now();
        let condition = evaluate(
            Some(99.0),
            Some(99.0),
            Some(99.0),
            Some(now - Duration::minutes(5)),
            &settings(),
            now,
        )
        .unwrap();
        assert_eq!(condition.alert_type, AlertType::Down);
    }

    #[test]
    fn cpu_over_90_is_critical() {
        let now = Utc::now();
        let condition = evaluate(
            Some(95.0),
            None,
            None,
            Some(now - Duration::seconds(30)),
            &settings(),
            now,
        )
        .unwrap();
        assert_eq!(condition.alert_type, AlertType::CpuHigh);
        assert_eq!(condition.severity, AlertSeverity::Critical);
        assert_eq!(condition.current_value, Some(95.0));
        assert_eq!(condition.threshold_value, Some(85.0));
        assert_eq!(condition.message, "CPU usage is critically high at 95.0%");
    }

    #[test]
    fn cpu_between_threshold_and_90_is_warning() {
        let now = Utc::now();
        let condition = evaluate(
            Some(87.5),
            None,
            None,
            Some(now - Duration::seconds(30)),
            &settings(),
            now,
        )
        .unwrap();
        assert_eq!(condition.severity, AlertSeverity::Warning);
        assert_eq!(condition.message, "CPU usage is high at 87.5%");
    }

    #[test]
    fn cpu_checked_before_memory_and_disk() {
        let now = Utc::now();
        let condition = evaluate(
            Some(88.0),
            Some(95.0),
            Some(95.0),
            Some(now - Duration::seconds(30)),
            &settings(),
            now,
        )
        .unwrap();
        assert_eq!(condition.alert_type, AlertType::CpuHigh);
    }

    #[test]
    fn memory_breach_is_warning_below_90() {
        let now = Utc::now();
        let condition = evaluate(
            Some(10.0),
            Some(85.0),
            None,
            Some(now - Duration::seconds(30)),
            &settings(),
            now,
        )
        .unwrap();
        assert_eq!(condition.alert_type, AlertType::MemoryHigh);
        assert_eq!(condition.severity, AlertSeverity::Warning);
    }

    #[test]
    fn disk_breach_is_always_critical() {
        let now = Utc::now();
        let condition = evaluate(
            Some(10.0),
            Some(10.0),
            Some(91.0),
            Some(now - Duration::seconds(30)),
            &settings(),
            now,
        )
        .unwrap();
        assert_eq!(condition.alert_type, AlertType::DiskHigh);
        assert_eq!(condition.severity, AlertSeverity::Critical);
    }

    #[test]
    fn healthy_sample_yields_nothing() {
        let now = Utc::now();
        let condition = evaluate(
            Some(10.0),
            Some(10.0),
            Some(10.0),
            Some(now - Duration::seconds(30)),
            &settings(),
            now,
        );
        assert!(condition.is_none());
    }

    #[test]
    fn custom_thresholds_are_respected() {
        let now = Utc::now();
        let mut custom = settings();
        custom.cpu_threshold = 50.0;
        let condition = evaluate(
            Some(60.0),
            None,
            None,
            Some(now - Duration::seconds(30)),
            &custom,
            now,
        )
        .unwrap();
        assert_eq!(condition.alert_type, AlertType::CpuHigh);
        assert_eq!(condition.threshold_value, Some(50.0));
    }

    #[test]
    fn ingest_status_cutoffs() {
        assert_eq!(classify_ingest_status(10.0, 10.0, 10.0), ServerStatus::Online);
        assert_eq!(classify_ingest_status(80.0, 10.0, 10.0), ServerStatus::Warning);
        assert_eq!(classify_ingest_status(10.0, 95.0, 10.0), ServerStatus::Critical);
    }

    #[test]
    fn ingest_condition_reports_dominant_resource() {
        let condition = ingest_critical_condition(80.0, 95.0, 70.0);
        assert_eq!(condition.alert_type, AlertType::MemoryHigh);
        assert_eq!(condition.message, "MEMORY usage is critically high at 95.0%");
        assert_eq!(condition.current_value, Some(95.0));
        assert!(condition.threshold_value.is_none());
    }
}
