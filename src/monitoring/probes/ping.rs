use async_trait::async_trait;
use std::time::{Duration, Instant};

use crate::db::models::Monitor;
use crate::monitoring::probe::{Probe, ProbeOutcome};

/// Reachability probe: a HEAD request to `http://{host}`. Any completed
/// response counts as reachable regardless of status code. This is an
/// HTTP approximation, not ICMP ping.
pub struct PingProbe {
    client: reqwest::Client,
}

impl PingProbe {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Probe for PingProbe {
    async fn check(&self, monitor: &Monitor) -> ProbeOutcome {
        let url = if monitor.url.starts_with("http") {
            monitor.url.clone()
        } else {
            format!("http://{}", monitor.url)
        };

        let started = Instant::now();
        let result = self
            .client
            .head(&url)
            .timeout(Duration::from_secs(monitor.timeout_seconds.max(0) as u64))
            .send()
            .await;
        let elapsed = started.elapsed().as_millis() as i64;

        match result {
            Ok(_) => ProbeOutcome {
                success: true,
                response_time_ms: elapsed,
                status_code: None,
                message: "Host is reachable".to_string(),
            },
            Err(e) if e.is_timeout() => ProbeOutcome::failure(elapsed, "Request timeout"),
            Err(_) => ProbeOutcome::failure(elapsed, "Host unreachable"),
        }
    }
}
