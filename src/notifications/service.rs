use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::db::enums::ChannelKind;
use crate::db::models::{Alert, AlertSettings};
use crate::notifications::senders::{
    ChannelSender, EmailSender, SenderError, SlackSender, WebhookSender,
};

/// Fans a persisted alert out to the configured channels. Each channel is
/// attempted independently; a failing channel is logged and never blocks
/// its siblings or the caller.
pub struct NotificationService {
    senders: HashMap<ChannelKind, Arc<dyn ChannelSender>>,
}

impl NotificationService {
    /// Builds the default sender set. `channel_timeout` bounds every
    /// outbound delivery request so one slow webhook cannot stall an
    /// evaluation cycle.
    pub fn new(channel_timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(channel_timeout)
            .build()?;
        Ok(Self::with_senders(vec![
            Arc::new(EmailSender::new()),
            Arc::new(SlackSender::new(client.clone())),
            Arc::new(WebhookSender::new(client)),
        ]))
    }

    pub fn with_senders(senders: Vec<Arc<dyn ChannelSender>>) -> Self {
        let senders = senders.into_iter().map(|s| (s.kind(), s)).collect();
        Self { senders }
    }

    /// Delivers the alert via every channel in the settings. Never fails:
    /// the alert is already durable and dispatch is best-effort.
    pub async fn dispatch_alert(&self, alert: &Alert, settings: &AlertSettings, entity_name: &str) {
        for channel in &settings.notification_channels {
            match self.send_via(*channel, alert, settings, entity_name).await {
                Ok(()) => {
                    info!(channel = %channel, alert_id = %alert.id, "Notification delivered");
                }
                Err(e) => {
                    warn!(
                        channel = %channel,
                        alert_id = %alert.id,
                        error = %e,
                        "Notification delivery failed"
                    );
                }
            }
        }
    }

    /// Delivers via a single channel, surfacing the channel-local error.
    /// Used by the test-notification endpoint.
    pub async fn send_via(
        &self,
        channel: ChannelKind,
        alert: &Alert,
        settings: &AlertSettings,
        entity_name: &str,
    ) -> Result<(), SenderError> {
        let sender = self.senders.get(&channel).ok_or_else(|| {
            SenderError::NotConfigured(format!("No sender registered for channel {channel}"))
        })?;
        sender.send(alert, settings, entity_name).await
    }
}
