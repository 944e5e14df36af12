pub mod config;
pub mod error;
pub mod liveness;
pub mod news;
pub mod notify;
pub mod scheduler;
pub mod storage;

pub use config::AppConfig;
pub use error::{Error, FetchError, Result, SendError};
