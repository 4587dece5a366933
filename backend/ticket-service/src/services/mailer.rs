/// Outbound mail transport (SMTP or no-op)
use async_trait::async_trait;
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::SmtpConfig;
use crate::error::{AppError, Result};

/// One fully rendered notification mail
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMail {
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, mail: OutboundMail) -> Result<()>;
}

/// lettre-backed transport.
///
/// If SMTP host is empty, operates in no-op mode and only logs what would
/// have been sent.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: Option<Arc<AsyncSmtpTransport<Tokio1Executor>>>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        let from = config
            .from
            .parse::<Mailbox>()
            .map_err(|e| AppError::Config(format!("invalid SMTP_FROM address: {e}")))?;

        let transport = if config.host.trim().is_empty() {
            warn!("SMTP host not configured; mailer will operate in no-op mode");
            None
        } else {
            let builder = if config.starttls {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            } else {
                AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            }
            .map_err(|e| AppError::Config(format!("failed to configure SMTP transport: {e}")))?
            .port(config.port);

            let builder = match (&config.username, &config.password) {
                (Some(username), Some(password)) => {
                    builder.credentials(Credentials::new(username.clone(), password.clone()))
                }
                _ => builder,
            };

            Some(Arc::new(builder.build()))
        };

        Ok(Self { transport, from })
    }

    pub fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }

    fn build_message(&self, mail: &OutboundMail) -> Result<Message> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(mail.subject.as_str())
            .header(header::ContentType::TEXT_HTML);

        let mut primary = 0;
        for addr in &mail.to {
            match addr.parse::<Mailbox>() {
                Ok(mailbox) => {
                    builder = builder.to(mailbox);
                    primary += 1;
                }
                Err(e) => warn!(address = %addr, error = %e, "skipping invalid recipient"),
            }
        }
        for addr in &mail.cc {
            match addr.parse::<Mailbox>() {
                Ok(mailbox) => builder = builder.cc(mailbox),
                Err(e) => warn!(address = %addr, error = %e, "skipping invalid cc recipient"),
            }
        }

        if primary == 0 {
            return Err(AppError::Mail("no valid recipient address".into()));
        }

        builder
            .body(mail.html.clone())
            .map_err(|e| AppError::Mail(format!("failed to build email message: {e}")))
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, mail: OutboundMail) -> Result<()> {
        let Some(transport) = &self.transport else {
            info!(
                subject = %mail.subject,
                to = ?mail.to,
                cc = ?mail.cc,
                "mailer running in no-op mode; skipping actual send"
            );
            return Ok(());
        };

        let message = self.build_message(&mail)?;
        transport
            .send(message)
            .await
            .map_err(|e| AppError::Mail(format!("failed to send email: {e}")))?;

        info!(subject = %mail.subject, recipients = mail.to.len() + mail.cc.len(), "email sent");
        Ok(())
    }
}
