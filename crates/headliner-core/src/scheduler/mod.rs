mod service;
pub mod tasks;
mod trigger;

pub use service::{SchedulerEvent, SchedulerService};
pub use tasks::{preview_digest, run_digest, RunOutcome};
pub use trigger::HourlyTrigger;
