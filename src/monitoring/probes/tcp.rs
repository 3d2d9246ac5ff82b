use async_trait::async_trait;
use std::time::{Duration, Instant};

use crate::db::models::Monitor;
use crate::monitoring::probe::{Probe, ProbeOutcome};

const DEFAULT_PORT: i32 = 80;

/// Port probe: a HEAD request to `http://{host}:{port}`. Only connection
/// establishment is being tested, so an HTTP-level error on a completed
/// connection still counts as an open port.
pub struct TcpProbe {
    client: reqwest::Client,
}

impl TcpProbe {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Probe for TcpProbe {
    async fn check(&self, monitor: &Monitor) -> ProbeOutcome {
        let port = monitor.port.unwrap_or(DEFAULT_PORT);
        let host = monitor
            .url
            .trim_start_matches("https://")
            .trim_start_matches("http://");
        let url = format!("http://{host}:{port}");

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
                message: format!("Port {port} is open"),
            },
            Err(e) if e.is_timeout() => ProbeOutcome::failure(elapsed, "Connection timeout"),
            Err(_) => ProbeOutcome::failure(elapsed, format!("Port {port} is closed or filtered")),
        }
    }
}
