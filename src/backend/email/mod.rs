//! Email Module
//!
//! Outbound transactional email. The [`Mailer`] trait is the delivery seam;
//! the server builds one implementation at startup from `MAIL_DRIVER`:
//!
//! - **`smtp`** - [`SmtpMailer`], lettre over STARTTLS with PLAIN credentials
//! - **`log`** - [`LogMailer`], writes the message to the log and succeeds
//!
//! Bodies come from the named templates in [`templates`].

pub mod smtp;
pub mod templates;

use async_trait::async_trait;
use thiserror::Error;

pub use smtp::SmtpMailer;
pub use templates::{Template, TemplateContext};

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid address {address}: {reason}")]
    Address { address: String, reason: String },

    #[error("failed to build message: {0}")]
    Build(String),

    #[error("SMTP transport error: {0}")]
    Transport(String),

    #[error("SMTP send timed out after {0}s")]
    Timeout(u64),
}

/// A rendered message ready for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError>;
}

/// Development mailer that logs instead of delivering
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            body_len = email.html.len(),
            "email send stub"
        );
        tracing::debug!(to = %email.to, "email body: {}", email.html);
        Ok(())
    }
}
