//! Mock email sender for testing.

use crate::providers::EmailSender;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// One captured email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentEmail {
    /// Recipient addresses.
    pub recipients: Vec<String>,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
}

/// Mock email sender that captures outgoing mail.
#[derive(Debug, Clone, Default)]
pub struct MockEmailSender {
    sent: Arc<Mutex<Vec<SentEmail>>>,
    fail: Arc<AtomicBool>,
}

impl MockEmailSender {
    /// Create a sender that accepts everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent send report failure.
    pub fn fail_sends(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Captured emails (for assertions).
    #[must_use]
    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().map(|guard| guard.clone()).unwrap_or_default()
    }
}

impl EmailSender for MockEmailSender {
    fn send_email(
        &self,
        recipients: &[String],
        subject: &str,
        body: &str,
    ) -> impl Future<Output = bool> + Send {
        let sent = Arc::clone(&self.sent);
        let fail = self.fail.load(Ordering::SeqCst);
        let email = SentEmail {
            recipients: recipients.to_vec(),
            subject: subject.to_string(),
            body: body.to_string(),
        };

        async move {
            if fail {
                return false;
            }

            if let Ok(mut guard) = sent.lock() {
                guard.push(email);
            }

            true
        }
    }
}
