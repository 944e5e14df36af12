use tracing::Instrument;
use uuid::Uuid;

use crate::error::{FetchError, SendError};
use crate::news::format_digest;
use crate::notify::Notifier;
use crate::storage::NewsSource;

/// What a single digest run ended with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Digest with `items` headlines delivered
    Sent { items: usize },
    /// Fetch failed and the error text was mailed instead
    SentFetchError(FetchError),
    /// Fetch failed and nothing was mailed
    Skipped(FetchError),
    /// Delivery failed
    SendFailed(SendError),
}

impl RunOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, RunOutcome::Sent { .. } | RunOutcome::SentFetchError(_))
    }
}

/// Fetch, format and send one digest. Never fails: every error is logged
/// and reported in the outcome.
pub async fn run_digest(
    source: &dyn NewsSource,
    notifier: &dyn Notifier,
    send_on_fetch_error: bool,
) -> RunOutcome {
    let span = tracing::info_span!("digest_run", run_id = %Uuid::new_v4());

    async move {
        tracing::info!("Starting news digest");

        let news = source.fetch_latest_news().await;
        if let Err(ref e) = news {
            tracing::error!("Fetching headlines failed: {}", e);
            if !send_on_fetch_error {
                tracing::warn!("Skipping digest email because the fetch failed");
                return RunOutcome::Skipped(e.clone());
            }
        }

        let body = format_digest(&news);

        let outcome = match notifier.send_digest(&body).await {
            Ok(()) => match news {
                Ok(items) => RunOutcome::Sent { items: items.len() },
                Err(e) => RunOutcome::SentFetchError(e),
            },
            Err(e) => {
                tracing::error!(kind = e.kind(), "Digest delivery failed: {}", e);
                RunOutcome::SendFailed(e)
            }
        };

        tracing::info!(?outcome, "News digest finished");
        outcome
    }
    .instrument(span)
    .await
}

/// Render the digest without sending it
pub async fn preview_digest(source: &dyn NewsSource) -> String {
    format_digest(&source.fetch_latest_news().await)
}


#[cfg(test)]
mod tests {
    use super::testing::{FakeNotifier, FakeSource};
    use super::*;
    use crate::news::{render_digest, Category, NewsItem};

    fn items() -> Vec<NewsItem> {
        vec![
            NewsItem::new(Category::General, "ynet", "10:00", "H1", "L1"),
            NewsItem::new(Category::Sports, "one", "08:00", "H3", "L3"),
        ]
    }

    #[tokio::test]
    async fn test_successful_run_sends_digest() {
        let source = FakeSource::new(Ok(items()));
        let notifier = FakeNotifier::new(Ok(()));

        let outcome = run_digest(&source, &notifier, true).await;

        assert_eq!(outcome, RunOutcome::Sent { items: 2 });
        assert_eq!(notifier.sent(), vec![render_digest(&items())]);
    }

    #[tokio::test]
    async fn test_fetch_error_is_mailed_by_default() {
        let err = FetchError::ConnectionFailed("refused".to_string());
        let source = FakeSource::new(Err(err.clone()));
        let notifier = FakeNotifier::new(Ok(()));

        let outcome = run_digest(&source, &notifier, true).await;

        assert_eq!(outcome, RunOutcome::SentFetchError(err.clone()));
        assert_eq!(notifier.sent(), vec![err.to_string()]);
    }

    #[tokio::test]
    async fn test_fetch_error_can_skip_send() {
        let err = FetchError::QueryFailed("no such table".to_string());
        let source = FakeSource::new(Err(err.clone()));
        let notifier = FakeNotifier::new(Ok(()));

        let outcome = run_digest(&source, &notifier, false).await;

        assert_eq!(outcome, RunOutcome::Skipped(err));
        assert!(notifier.sent().is_empty());
        assert!(!outcome.is_delivered());
    }

    #[tokio::test]
    async fn test_auth_failure_is_reported() {
        let source = FakeSource::new(Ok(items()));
        let notifier = FakeNotifier::new(Err(SendError::AuthFailed("535 bad credentials".to_string())));

        let outcome = run_digest(&source, &notifier, true).await;

        assert!(matches!(outcome, RunOutcome::SendFailed(SendError::AuthFailed(_))));
    }

    #[tokio::test]
    async fn test_preview_does_not_send() {
        let source = FakeSource::new(Ok(Vec::new()));
        assert_eq!(preview_digest(&source).await, "Latest News Headlines\n\n");
    }
}
