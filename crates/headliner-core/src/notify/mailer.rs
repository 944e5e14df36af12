use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;

use super::Notifier;
use crate::config::SmtpConfig;
use crate::error::SendError;
use crate::{Error, Result};

/// SMTP reply codes that mean the relay rejected our credentials
const AUTH_REPLY_CODES: &[&str] = &["530", "534", "535"];

/// Subject line for a digest sent at `now`
pub fn digest_subject<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("News Digest - {}", now.format("%Y-%m-%d %H:%M"))
}

/// Build the plain-text digest email addressed to every recipient
pub fn build_message<Tz: TimeZone>(
    sender: &Mailbox,
    recipients: &[Mailbox],
    body: &str,
    now: &DateTime<Tz>,
) -> std::result::Result<Message, SendError>
where
    Tz::Offset: std::fmt::Display,
{
    let mut builder = Message::builder()
        .from(sender.clone())
        .subject(digest_subject(now))
        .header(ContentType::TEXT_PLAIN);

    for recipient in recipients {
        builder = builder.to(recipient.clone());
    }

    builder
        .body(body.to_string())
        .map_err(|e| SendError::Unknown(e.to_string()))
}

fn classify_reply(status: Option<&str>, client_side: bool, message: String) -> SendError {
    match status {
        Some(code) if AUTH_REPLY_CODES.contains(&code) => SendError::AuthFailed(message),
        _ if client_side => SendError::Unknown(message),
        _ => SendError::TransportFailed(message),
    }
}

fn classify(err: &lettre::transport::smtp::Error) -> SendError {
    let status = err.status().map(|code| code.to_string());
    classify_reply(status.as_deref(), err.is_client(), err.to_string())
}

/// Sends digests through an authenticated STARTTLS relay. Each send opens
/// its own SMTP session and quits it afterwards.
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
    recipients: Vec<Mailbox>,
}

impl SmtpNotifier {
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        let sender: Mailbox = config
            .sender_address()
            .parse()
            .map_err(|e| Error::Config(format!("invalid sender address: {}", e)))?;

        let recipients = config
            .recipients
            .iter()
            .map(|r| {
                r.parse::<Mailbox>()
                    .map_err(|e| Error::Config(format!("invalid recipient '{}': {}", r, e)))
            })
            .collect::<Result<Vec<_>>>()?;

        if recipients.is_empty() {
            return Err(Error::Config("no email recipients configured".to_string()));
        }

        let credentials = Credentials::new(config.user.clone(), config.password.expose().to_string());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.server)
            .map_err(|e| Error::Mail(e.to_string()))?
            .port(config.port)
            .credentials(credentials)
            .timeout(Some(Duration::from_secs(config.timeout_secs)))
            .build();

        Ok(Self {
            transport,
            sender,
            recipients,
        })
    }

    pub fn recipient_count(&self) -> usize {
        self.recipients.len()
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send_digest(&self, body: &str) -> std::result::Result<(), SendError> {
        let message = build_message(&self.sender, &self.recipients, body, &Local::now())?;

        match self.transport.send(message).await {
            Ok(_) => {
                tracing::info!("Digest email sent to {} recipients", self.recipients.len());
                Ok(())
            }
            Err(e) => {
                let err = classify(&e);
                tracing::error!(kind = err.kind(), "Failed to send digest email: {}", err);
                Err(err)
            }
        }
    }
}
