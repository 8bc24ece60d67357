//! Email sender trait.

use std::future::Future;

/// Email delivery collaborator.
///
/// Returns `true` when the message was accepted for delivery. Failures are
/// reported, not raised: callers decide whether delivery is load-bearing.
pub trait EmailSender: Send + Sync {
    /// Send a plain-text email to one or more recipients.
    fn send_email(
        &self,
        recipients: &[String],
        subject: &str,
        body: &str,
    ) -> impl Future<Output = bool> + Send;
}
