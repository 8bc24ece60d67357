//! SMTP email sender implementation using Lettre.

use crate::providers::EmailSender;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

/// SMTP email sender.
///
/// # Configuration
///
/// - `smtp_server`: SMTP relay address (e.g., "smtp.sendgrid.net")
/// - `smtp_port`: relay port (usually 587 for STARTTLS)
/// - `smtp_username`/`smtp_password`: relay credentials
/// - `from_email`: sender address
#[derive(Clone)]
pub struct SmtpEmailSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_email: String,
}

impl SmtpEmailSender {
    /// Create a new SMTP sender.
    ///
    /// # Errors
    ///
    /// Returns the relay error message when the server address is invalid.
    pub fn new(
        smtp_server: &str,
        smtp_port: u16,
        smtp_username: String,
        smtp_password: String,
        from_email: String,
    ) -> Result<Self, String> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(smtp_server)
            .map_err(|e| format!("Invalid SMTP relay: {e}"))?
            .port(smtp_port)
            .credentials(Credentials::new(smtp_username, smtp_password))
            .build();

        Ok(Self {
            transport,
            from_email,
        })
    }
}

impl EmailSender for SmtpEmailSender {
    async fn send_email(&self, recipients: &[String], subject: &str, body: &str) -> bool {
        let Ok(from) = self.from_email.parse::<lettre::message::Mailbox>() else {
            tracing::error!(from = %self.from_email, "Invalid sender address");
            return false;
        };

        let mut builder = Message::builder()
            .from(from)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN);

        for recipient in recipients {
            match recipient.parse::<lettre::message::Mailbox>() {
                Ok(mailbox) => builder = builder.to(mailbox),
                Err(e) => {
                    tracing::error!(recipient = %recipient, error = %e, "Invalid recipient address");
                    return false;
                }
            }
        }

        let message = match builder.body(body.to_string()) {
            Ok(message) => message,
            Err(e) => {
                tracing::error!(error = %e, "Failed to build email");
                return false;
            }
        };

        match self.transport.send(message).await {
            Ok(_) => {
                tracing::info!(recipients = ?recipients, subject = %subject, "Sent email");
                true
            }
            Err(e) => {
                tracing::error!(recipients = ?recipients, error = %e, "Failed to send email");
                false
            }
        }
    }
}
