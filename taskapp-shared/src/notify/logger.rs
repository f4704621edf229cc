//! Mailer that only writes emails to the log.

use super::{Email, MailError, Mailer};
use async_trait::async_trait;
use tracing::info;

/// Logs each email and drops it. Used when no mail API key is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

impl LogMailer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: Email) -> Result<(), MailError> {
        info!(
            to = %email.to,
            from = %email.from,
            subject = %email.subject,
            "Email not delivered, no mail API configured"
        );
        Ok(())
    }
}
