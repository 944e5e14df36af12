use anyhow::Result;

use headliner_core::{scheduler::preview_digest, storage::SqlNewsSource, AppConfig};

pub async fn run(config: &AppConfig) -> Result<()> {
    let source = SqlNewsSource::new(&config.database)?;
    print!("{}", preview_digest(&source).await);
    Ok(())
}
