//! Outbound mail boundary. Transport is an external collaborator; the trait
//! keeps the handlers testable and failures stay best-effort.

use async_trait::async_trait;
use tracing::info;

/// A notification destined for the configured admin contact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("no admin notification address is configured")]
    NoRecipient,
    #[error("mail transport unavailable: {0}")]
    Transport(String),
}

/// Trait describing the outbound mail hook. Implementations must not block
/// indefinitely; a send either completes or fails, and callers downgrade
/// failure to a user-visible message.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, message: MailMessage) -> Result<(), MailError>;
}

/// Development transport: logs the message instead of delivering it.
#[derive(Debug, Default, Clone)]
pub struct ConsoleMailTransport;

#[async_trait]
impl MailTransport for ConsoleMailTransport {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        info!(
            to = %message.to,
            subject = %message.subject,
            "mail (console transport): {}",
            message.body
        );
        Ok(())
    }
}
