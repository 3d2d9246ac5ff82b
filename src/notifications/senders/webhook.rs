use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::json;
use std::str::FromStr;
use tracing::warn;

use crate::db::enums::ChannelKind;
use crate::db::models::{Alert, AlertSettings};
use crate::notifications::senders::{ChannelSender, SenderError};

/// Posts a flat JSON payload to an arbitrary webhook URL, with any
/// configured custom headers merged in.
pub struct WebhookSender {
    client: reqwest::Client,
}

impl WebhookSender {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn custom_headers(settings: &AlertSettings) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let Some(serde_json::Value::Object(map)) = settings.webhook_headers.as_ref() else {
        return headers;
    };
    for (name, value) in map {
        let Some(value) = value.as_str() else { continue };
        match (HeaderName::from_str(name), HeaderValue::from_str(value)) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => {
                warn!(header = name.as_str(), "Skipping invalid webhook header");
            }
        }
    }
    headers
}

#[async_trait]
impl ChannelSender for WebhookSender {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Webhook
    }

    async fn send(
        &self,
        alert: &Alert,
        settings: &AlertSettings,
        entity_name: &str,
    ) -> Result<(), SenderError> {
        let webhook_url = settings
            .webhook_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .ok_or_else(|| SenderError::NotConfigured("No webhook URL configured".to_string()))?;

        let payload = json!({
            "alert_id": alert.id,
            "entity_id": alert.entity_id(),
            "entity_name": entity_name,
            "type": alert.alert_type,
            "severity": alert.severity,
            "message": alert.message,
            "current_value": alert.current_value,
            "threshold_value": alert.threshold_value,
            "timestamp": Utc::now(),
        });

        let response = self
            .client
            .post(webhook_url)
            .headers(custom_headers(settings))
            .json(&payload)
            .send()
            .await
            .map_err(|e| SenderError::Delivery(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SenderError::Delivery(format!(
                "Webhook returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}
