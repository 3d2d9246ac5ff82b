use async_trait::async_trait;
use std::time::{Duration, Instant};

use crate::db::models::Monitor;
use crate::monitoring::probe::{Probe, ProbeOutcome};

/// GET probe for http/https/keyword monitors. Follows redirects. The
/// expected-status check is evaluated before the keyword check, and the
/// first violated condition supplies the failure message.
pub struct HttpProbe {
    client: reqwest::Client,
}

impl HttpProbe {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn check(&self, monitor: &Monitor) -> ProbeOutcome {
        let started = Instant::now();
        let response = self
            .client
            .get(&monitor.url)
            .timeout(Duration::from_secs(monitor.timeout_seconds.max(0) as u64))
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                let elapsed = started.elapsed().as_millis() as i64;
                let message = if e.is_timeout() {
                    "Request timeout".to_string()
                } else {
                    e.to_string()
                };
                return ProbeOutcome::failure(elapsed, message);
            }
        };

        let status = response.status().as_u16() as i32;
        let body = response.text().await.unwrap_or_default();
        let elapsed = started.elapsed().as_millis() as i64;

        let mut success = true;
        let mut message = format!("HTTP {status}");

        if let Some(expected) = monitor.expected_status {
            if status != expected {
                success = false;
                message = format!("Expected status {expected}, got {status}");
            }
        }

        if success {
            if let Some(keyword) = monitor.expected_keyword.as_deref() {
                if !body.contains(keyword) {
                    success = false;
                    message = format!("Keyword \"{keyword}\" not found in response");
                }
            }
        }

        ProbeOutcome {
            success,
            response_time_ms: elapsed,
            status_code: Some(status),
            message,
        }
    }
}
