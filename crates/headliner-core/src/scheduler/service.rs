use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::ScheduleConfig;
use crate::notify::Notifier;
use crate::storage::NewsSource;

use super::tasks::{run_digest, RunOutcome};
use super::trigger::HourlyTrigger;

type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

/// Events emitted by the scheduler after each digest run
#[derive(Debug, Clone)]
pub enum SchedulerEvent {
    /// A digest run finished, successfully or not
    RunFinished { outcome: RunOutcome },
}

/// Background service that sends the digest at the top of every hour
pub struct SchedulerService {
    source: Arc<dyn NewsSource>,
    notifier: Arc<dyn Notifier>,
    config: ScheduleConfig,
    clock: Clock,
    event_tx: Option<mpsc::UnboundedSender<SchedulerEvent>>,
}

impl SchedulerService {
    /// Create a new scheduler service
    pub fn new(
        source: Arc<dyn NewsSource>,
        notifier: Arc<dyn Notifier>,
        config: ScheduleConfig,
    ) -> Self {
        Self {
            source,
            notifier,
            config,
            clock: Arc::new(|| Local::now().naive_local()),
            event_tx: None,
        }
    }

    /// Replace the wall clock used for the hourly check
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> NaiveDateTime + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    /// Set the event sender for run notifications
    pub fn with_event_sender(mut self, tx: mpsc::UnboundedSender<SchedulerEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    fn send_event(&self, event: SchedulerEvent) {
        if let Some(ref tx) = self.event_tx {
            if tx.send(event).is_err() {
                warn!("Failed to send scheduler event: receiver dropped");
            }
        }
    }

    /// Run one digest immediately
    pub async fn run_now(&self) -> RunOutcome {
        let outcome = run_digest(
            self.source.as_ref(),
            self.notifier.as_ref(),
            self.config.send_on_fetch_error,
        )
        .await;
        self.send_event(SchedulerEvent::RunFinished {
            outcome: outcome.clone(),
        });
        outcome
    }

    /// Poll the clock until shutdown, running the digest once per hour
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let poll_secs = self.config.poll_interval_secs.max(1);
        let mut trigger = HourlyTrigger::for_poll_interval(poll_secs);

        info!(
            "Scheduler started: poll={}s, run_on_start={}",
            poll_secs, self.config.run_on_start
        );

        if self.config.run_on_start {
            trigger.mark_fired((self.clock)());
            self.run_now().await;
        }

        let mut poll = tokio::time::interval(Duration::from_secs(poll_secs));
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                result = shutdown.changed() => {
                    if result.is_err() || *shutdown.borrow() {
                        info!("Scheduler received shutdown signal");
                        break;
                    }
                }

                _ = poll.tick() => {
                    let now = (self.clock)();
                    if trigger.should_fire(now) {
                        debug!("Hourly digest due at {}", now);
                        self.run_now().await;
                    }
                }
            }
        }

        info!("Scheduler stopped");
    }
}
