/// Transactional email notifications
///
/// [`Notifier`] composes the account emails and hands them to a [`Mailer`].
/// Sends are fire-and-forget: they run on their own tokio task, and a failed
/// send is logged and otherwise ignored, so an email outage never fails the
/// request that triggered it.

mod fake;
mod logger;
mod sendgrid;

pub use fake::FakeMailer;
pub use logger::LogMailer;
pub use sendgrid::SendGridMailer;

use async_trait::async_trait;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Default sender address
pub const DEFAULT_FROM: &str = "mtm12@mail.aub.edu";

/// A plain-text email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub from: String,
    pub subject: String,
    pub text: String,
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Mail API error (status {status}): {message}")]
    ApiError { status: u16, message: String },
}

/// Something that can deliver an [`Email`]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: Email) -> Result<(), MailError>;
}

/// Sends the account lifecycle emails
#[derive(Clone)]
pub struct Notifier {
    mailer: Arc<dyn Mailer>,
    from: String,
}

impl Notifier {
    pub fn new(mailer: Arc<dyn Mailer>, from: impl Into<String>) -> Self {
        Self {
            mailer,
            from: from.into(),
        }
    }

    pub fn welcome_email(&self, to: &str, name: &str) -> Email {
        Email {
            to: to.to_string(),
            from: self.from.clone(),
            subject: "Welcome to Task App".to_string(),
            text: format!(
                "Hello, {}, welcome to the AUB Marketplace applicaton, lemme know how it goes",
                name
            ),
        }
    }

    pub fn cancellation_email(&self, to: &str, name: &str) -> Email {
        Email {
            to: to.to_string(),
            from: self.from.clone(),
            subject: "Account Successfully deleted".to_string(),
            text: format!(
                "Hello, {}, we're sorry to see you leaving. Is there anything we could have done for a better experience?",
                name
            ),
        }
    }

    /// Sends the welcome email in the background
    pub fn send_welcome(&self, to: &str, name: &str) -> JoinHandle<()> {
        self.dispatch(self.welcome_email(to, name))
    }

    /// Sends the account deletion email in the background
    pub fn send_cancellation(&self, to: &str, name: &str) -> JoinHandle<()> {
        self.dispatch(self.cancellation_email(to, name))
    }

    fn dispatch(&self, email: Email) -> JoinHandle<()> {
        let mailer = self.mailer.clone();
        tokio::spawn(async move {
            let to = email.to.clone();
            let subject = email.subject.clone();
            match mailer.send(email).await {
                Ok(()) => info!(to = %to, subject = %subject, "Email sent"),
                Err(e) => error!(to = %to, subject = %subject, error = %e, "Failed to send email"),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_welcome() {
        let mailer = Arc::new(FakeMailer::new());
        let notifier = Notifier::new(mailer.clone(), DEFAULT_FROM);

        notifier.send_welcome("a@x.com", "Ann").await.unwrap();

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "a@x.com");
        assert_eq!(sent[0].from, DEFAULT_FROM);
        assert_eq!(sent[0].subject, "Welcome to Task App");
        assert!(sent[0].text.starts_with("Hello, Ann,"));
    }

    #[tokio::test]
    async fn test_send_cancellation() {
        let mailer = Arc::new(FakeMailer::new());
        let notifier = Notifier::new(mailer.clone(), "team@example.com");

        notifier.send_cancellation("a@x.com", "Ann").await.unwrap();

        let sent = mailer.sent();
        assert_eq!(sent[0].subject, "Account Successfully deleted");
        assert_eq!(sent[0].from, "team@example.com");
        assert!(sent[0].text.contains("sorry to see you leaving"));
    }

    #[tokio::test]
    async fn test_failed_send_is_swallowed() {
        let mailer = Arc::new(FakeMailer::failing());
        let notifier = Notifier::new(mailer.clone(), DEFAULT_FROM);

        // The task completes normally even though delivery failed
        notifier.send_welcome("a@x.com", "Ann").await.unwrap();
        assert!(mailer.sent().is_empty());
    }
}
