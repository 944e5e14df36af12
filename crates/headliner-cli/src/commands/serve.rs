use std::sync::Arc;

use anyhow::Result;
use tokio::sync::watch;
use tracing::info;

use headliner_core::{
    liveness::{self, KeepAlive},
    notify::{Notifier, SmtpNotifier},
    scheduler::SchedulerService,
    storage::{NewsSource, SqlNewsSource},
    AppConfig,
};

/// Run the liveness server, the hourly scheduler and the keep-alive loop
/// until Ctrl+C
pub async fn start(config: Arc<AppConfig>) -> Result<()> {
    config.validate()?;

    // Create shutdown channel
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Setup signal handlers for graceful shutdown
    let shutdown_tx_clone = shutdown_tx.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal");
        let _ = shutdown_tx_clone.send(true);
    });

    let source: Arc<dyn NewsSource> = Arc::new(SqlNewsSource::new(&config.database)?);
    let notifier: Arc<dyn Notifier> = Arc::new(SmtpNotifier::new(&config.smtp)?);

    let listener = liveness::bind(&config.server).await?;
    let server = tokio::spawn(liveness::serve(listener, shutdown_rx.clone()));

    let scheduler = SchedulerService::new(source, notifier, config.schedule.clone());
    let scheduler = tokio::spawn(scheduler.run(shutdown_rx.clone()));

    let keepalive = if config.keepalive.enabled {
        let keepalive = KeepAlive::new(&config.keepalive_base_url(), &config.keepalive)?;
        Some(tokio::spawn(keepalive.run(shutdown_rx.clone())))
    } else {
        info!("Keep-alive ping disabled");
        None
    };

    println!(
        "Headliner started (PID: {}). Press Ctrl+C to stop.",
        std::process::id()
    );
    println!("  Listening on: {}:{}", config.server.host, config.server.port);
    println!("  Recipients: {}", config.smtp.recipients.len());
    println!("  Keep-alive URL: {}", liveness::ping_url(&config.keepalive_base_url()));

    // Runs until shutdown
    server.await??;
    scheduler.await?;
    if let Some(keepalive) = keepalive {
        keepalive.await?;
    }

    println!("Headliner stopped.");
    Ok(())
}
