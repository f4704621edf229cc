//! In-process mailer for tests.

use super::{Email, MailError, Mailer};
use async_trait::async_trait;
use std::sync::Mutex;
use tracing::debug;

/// Records every email instead of delivering it.
#[derive(Debug, Default)]
pub struct FakeMailer {
    sent: Mutex<Vec<Email>>,
    fail: bool,
}

impl FakeMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mailer whose every send fails.
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// Emails accepted so far, oldest first.
    pub fn sent(&self) -> Vec<Email> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Mailer for FakeMailer {
    async fn send(&self, email: Email) -> Result<(), MailError> {
        if self.fail {
            return Err(MailError::RequestFailed("fake mailer is failing".to_string()));
        }

        debug!(to = %email.to, subject = %email.subject, "Recording email");
        self.sent
            .lock()
            .map_err(|e| MailError::RequestFailed(e.to_string()))?
            .push(email);
        Ok(())
    }
}
