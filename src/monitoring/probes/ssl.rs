use async_trait::async_trait;
use std::time::{Duration, Instant};

use crate::db::models::Monitor;
use crate::monitoring::probe::{Probe, ProbeOutcome};

/// Certificate probe. Requires an `https://` URL and succeeds on any
/// 200-399 response: receiving an HTTP response at all means a valid
/// chain was negotiated, the status range filters out origin faults.
pub struct SslProbe {
    client: reqwest::Client,
}

impl SslProbe {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Probe for SslProbe {
    async fn check(&self, monitor: &Monitor) -> ProbeOutcome {
        if !monitor.url.starts_with("https://") {
            // Rejected before any network call is made.
            return ProbeOutcome::failure(0, "URL must use HTTPS for SSL check");
        }

        let started = Instant::now();
        let result = self
            .client
            .get(&monitor.url)
            .timeout(Duration::from_secs(monitor.timeout_seconds.max(0) as u64))
            .send()
            .await;
        let elapsed = started.elapsed().as_millis() as i64;

        match result {
            Ok(response) => {
                let status = response.status();
                let ok = status.is_success() || status.is_redirection();
                ProbeOutcome {
                    success: ok,
                    response_time_ms: elapsed,
                    status_code: Some(status.as_u16() as i32),
                    message: if ok {
                        "SSL certificate is valid".to_string()
                    } else {
                        "SSL certificate issue".to_string()
                    },
                }
            }
            Err(e) if e.is_timeout() => ProbeOutcome::failure(elapsed, "Request timeout"),
            Err(e) => {
                // Surface the handshake failure reason when there is one.
                let message = e.to_string();
                let message = if message.is_empty() {
                    "SSL certificate error".to_string()
                } else {
                    message
                };
                ProbeOutcome::failure(elapsed, message)
            }
        }
    }
}
