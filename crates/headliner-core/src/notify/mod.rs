mod mailer;

use async_trait::async_trait;

use crate::error::SendError;

pub use mailer::{build_message, digest_subject, SmtpNotifier};

/// Delivers a rendered digest body
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_digest(&self, body: &str) -> Result<(), SendError>;
}
