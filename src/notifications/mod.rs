pub mod senders;
pub mod service;

pub use senders::{ChannelSender, SenderError};
pub use service::NotificationService;
