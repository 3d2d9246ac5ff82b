mod email;
mod slack;
mod webhook;

pub use email::EmailSender;
pub use slack::SlackSender;
pub use webhook::WebhookSender;

use async_trait::async_trait;
use thiserror::Error;

use crate::db::enums::ChannelKind;
use crate::db::models::{Alert, AlertSettings};

#[derive(Error, Debug)]
pub enum SenderError {
    #[error("Channel not configured: {0}")]
    NotConfigured(String),
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// One delivery mechanism. Implementations read their own configuration
/// out of the settings object and fail with a channel-local error; the
/// dispatcher decides what to do with it.
#[async_trait]
pub trait ChannelSender: Send + Sync {
    fn kind(&self) -> ChannelKind;

    async fn send(
        &self,
        alert: &Alert,
        settings: &AlertSettings,
        entity_name: &str,
    ) -> Result<(), SenderError>;
}
