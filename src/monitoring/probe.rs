use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::db::enums::MonitorType;
use crate::db::models::Monitor;
use crate::monitoring::probes::{HttpProbe, PingProbe, SslProbe, TcpProbe};

/// Verdict of one active check, including latency measured from call start
/// to verdict on both the success and the failure path.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeOutcome {
    pub success: bool,
    pub response_time_ms: i64,
    pub status_code: Option<i32>,
    pub message: String,
}

impl ProbeOutcome {
    pub fn failure(response_time_ms: i64, message: impl Into<String>) -> Self {
        Self {
            success: false,
            response_time_ms,
            status_code: None,
            message: message.into(),
        }
    }
}

/// One active check implementation per monitor type.
#[async_trait]
pub trait Probe: Send + Sync {
    async fn check(&self, monitor: &Monitor) -> ProbeOutcome;
}

/// Registry of probes keyed by monitor type. New probe types are additive:
/// register an implementation and the runner picks it up.
pub struct ProbeRunner {
    probes: HashMap<MonitorType, Arc<dyn Probe>>,
}

impl ProbeRunner {
    pub fn new(client: reqwest::Client) -> Self {
        let http: Arc<dyn Probe> = Arc::new(HttpProbe::new(client.clone()));
        let mut probes: HashMap<MonitorType, Arc<dyn Probe>> = HashMap::new();
        probes.insert(MonitorType::Http, http.clone());
        probes.insert(MonitorType::Https, http.clone());
        // Keyword monitors are HTTP checks with an expected body substring.
        probes.insert(MonitorType::Keyword, http);
        probes.insert(MonitorType::Ping, Arc::new(PingProbe::new(client.clone())));
        probes.insert(MonitorType::Tcp, Arc::new(TcpProbe::new(client.clone())));
        probes.insert(MonitorType::Ssl, Arc::new(SslProbe::new(client)));
        Self { probes }
    }

    pub fn register(&mut self, monitor_type: MonitorType, probe: Arc<dyn Probe>) {
        self.probes.insert(monitor_type, probe);
    }

    pub async fn run(&self, monitor: &Monitor) -> ProbeOutcome {
        match self.probes.get(&monitor.monitor_type) {
            Some(probe) => probe.check(monitor).await,
            None => ProbeOutcome::failure(
                0,
                format!("No probe registered for monitor type {}", monitor.monitor_type),
            ),
        }
    }
}
