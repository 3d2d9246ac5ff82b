use async_trait::async_trait;
use serde_json::json;

use crate::db::enums::{AlertSeverity, ChannelKind};
use crate::db::models::{Alert, AlertSettings};
use crate::notifications::senders::{ChannelSender, SenderError};

/// Posts a color-coded attachment to a Slack incoming webhook.
pub struct SlackSender {
    client: reqwest::Client,
}

impl SlackSender {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn severity_color(severity: AlertSeverity) -> &'static str {
    match severity {
        AlertSeverity::Critical => "#dc2626",
        AlertSeverity::Warning => "#f59e0b",
        AlertSeverity::Info => "#16a34a",
    }
}

#[async_trait]
impl ChannelSender for SlackSender {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Slack
    }

    async fn send(
        &self,
        alert: &Alert,
        settings: &AlertSettings,
        entity_name: &str,
    ) -> Result<(), SenderError> {
        let webhook_url = settings
            .slack_webhook_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .ok_or_else(|| {
                SenderError::NotConfigured("No Slack webhook URL configured".to_string())
            })?;

        let mut fields = vec![
            json!({ "title": "Entity", "value": entity_name, "short": true }),
            json!({ "title": "Type", "value": alert.alert_type.label(), "short": true }),
        ];
        if let Some(value) = alert.current_value {
            fields.push(json!({
                "title": "Current Value",
                "value": format!("{value:.1}%"),
                "short": true
            }));
        }
        if let Some(threshold) = alert.threshold_value {
            fields.push(json!({
                "title": "Threshold",
                "value": format!("{threshold}%"),
                "short": true
            }));
        }

        let payload = json!({
            "attachments": [{
                "color": severity_color(alert.severity),
                "title": format!("{} - {}", alert.alert_type.label(), entity_name),
                "text": alert.message,
                "fields": fields,
                "ts": alert.created_at.timestamp(),
            }]
        });

        let response = self
            .client
            .post(webhook_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| SenderError::Delivery(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SenderError::Delivery(format!(
                "Slack webhook returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}
