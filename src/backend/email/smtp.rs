/**
 * SMTP Delivery
 *
 * lettre's async transport over STARTTLS with PLAIN credentials. Every send
 * is bounded by the configured timeout; there are no retries.
 */

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::{Credentials, Mechanism};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::{MailError, Mailer, OutgoingEmail};
use crate::shared::config::SmtpConfig;

#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    timeout: Duration,
}

impl SmtpMailer {
    /// Build the transport from validated configuration.
    pub fn from_config(config: &SmtpConfig) -> Result<Self, MailError> {
        let host = required(&config.host, "SMTP_HOST")?;
        let username = required(&config.username, "SMTP_USERNAME")?;
        let password = required(&config.password, "SMTP_PASSWORD")?;
        let from = required(&config.from, "SMTP_FROM")?;

        let from: Mailbox = from.parse().map_err(|e: lettre::address::AddressError| {
            MailError::Address {
                address: from.to_string(),
                reason: e.to_string(),
            }
        })?;

        let timeout = Duration::from_secs(config.timeout_secs.max(1));
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .map_err(|e| MailError::Transport(e.to_string()))?
            .port(config.port)
            .credentials(Credentials::new(username.to_string(), password.to_string()))
            .authentication(vec![Mechanism::Plain])
            .timeout(Some(timeout))
            .build();

        tracing::info!("SMTP mailer configured for {}:{}", host, config.port);
        Ok(Self {
            transport,
            from,
            timeout,
        })
    }
}

fn required<'a>(value: &'a Option<String>, key: &str) -> Result<&'a str, MailError> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| MailError::Build(format!("{} is not set", key)))
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        let to: Mailbox = email.to.parse().map_err(|e: lettre::address::AddressError| {
            MailError::Address {
                address: email.to.clone(),
                reason: e.to_string(),
            }
        })?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject.clone())
            .header(ContentType::TEXT_HTML)
            .body(email.html)
            .map_err(|e| MailError::Build(e.to_string()))?;

        match tokio::time::timeout(self.timeout, self.transport.send(message)).await {
            Ok(Ok(_)) => {
                tracing::info!("Email '{}' sent to {}", email.subject, email.to);
                Ok(())
            }
            Ok(Err(e)) => Err(MailError::Transport(e.to_string())),
            Err(_) => Err(MailError::Timeout(self.timeout.as_secs())),
        }
    }
}
