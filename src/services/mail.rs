// src/services/mail.rs

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};

use crate::{
    config::{Config, SmtpSecurity, SmtpSettings},
    error::AppError,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Delivery seam for account emails.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> Result<(), AppError>;
}

/// Writes outgoing mail to the log instead of delivering it.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), AppError> {
        tracing::info!(
            to = %mail.to,
            subject = %mail.subject,
            "Outgoing mail:\n{}",
            mail.body
        );
        Ok(())
    }
}

/// Delivers mail through an SMTP relay.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(settings: &SmtpSettings) -> Result<Self, AppError> {
        let from = settings.from.parse::<Mailbox>().map_err(|e| {
            AppError::InternalServerError(format!("Invalid sender address {}: {e}", settings.from))
        })?;

        let builder = match settings.security {
            SmtpSecurity::StartTls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host),
            SmtpSecurity::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host),
            SmtpSecurity::None => Ok(AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(
                &settings.host,
            )),
        }
        .map_err(|e| AppError::InternalServerError(format!("Invalid SMTP relay: {e}")))?;

        let mut builder = builder
            .port(settings.port)
            .timeout(Some(Duration::from_secs(10)));
        if let (Some(username), Some(password)) = (&settings.username, &settings.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), AppError> {
        let to = mail
            .to
            .parse::<Mailbox>()
            .map_err(|e| AppError::BadRequest(format!("Invalid email address {}: {e}", mail.to)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(mail.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(mail.body)
            .map_err(|e| AppError::InternalServerError(format!("Failed to build email: {e}")))?;

        self.transport.send(message).await.map_err(|e| {
            tracing::error!("Failed to send email to {}: {}", mail.to, e);
            AppError::InternalServerError(format!("Failed to send email: {e}"))
        })?;

        tracing::info!("Email sent to {}", mail.to);
        Ok(())
    }
}

/// SMTP when `SMTP_HOST` is configured, the log otherwise.
pub fn from_config(config: &Config) -> Result<Arc<dyn Mailer>, AppError> {
    match &config.smtp {
        Some(settings) => Ok(Arc::new(SmtpMailer::new(settings)?)),
        None => {
            tracing::warn!("SMTP_HOST is not set; outgoing mail will only be logged");
            Ok(Arc::new(LogMailer))
        }
    }
}

pub fn verification_mail(to: &str, base_url: &str, token: &str) -> OutgoingMail {
    OutgoingMail {
        to: to.to_string(),
        subject: "Email Verification".to_string(),
        body: format!(
            "Please click the link below to verify your email:\n{}/verify-email?token={}",
            base_url.trim_end_matches('/'),
            token
        ),
    }
}
