use anyhow::{bail, Result};

use headliner_core::{
    notify::SmtpNotifier,
    scheduler::{run_digest, RunOutcome},
    storage::SqlNewsSource,
    AppConfig,
};

pub async fn run(config: &AppConfig) -> Result<()> {
    config.validate()?;

    let source = SqlNewsSource::new(&config.database)?;
    let notifier = SmtpNotifier::new(&config.smtp)?;

    println!("Sending digest to {} recipients...", notifier.recipient_count());

    match run_digest(&source, &notifier, config.schedule.send_on_fetch_error).await {
        RunOutcome::Sent { items } => {
            println!("Digest sent with {} headlines.", items);
            Ok(())
        }
        RunOutcome::SentFetchError(e) => {
            println!("Fetching failed; the error was mailed instead: {}", e);
            Ok(())
        }
        RunOutcome::Skipped(e) => bail!("digest not sent, fetching failed: {}", e),
        RunOutcome::SendFailed(e) => bail!("digest not sent: {}", e),
    }
}
