use sqlx::any::install_default_drivers;
use sqlx::{AnyConnection, Connection};
use std::time::Duration;

use crate::config::DatabaseConfig;
use crate::error::FetchError;
use crate::Result;

/// Connection settings for the news store.
///
/// No pool is kept: every digest run opens its own connection and closes it
/// when the query is done.
#[derive(Clone)]
pub struct Database {
    url: String,
    connect_timeout: Duration,
}

impl Database {
    pub fn new(config: &DatabaseConfig) -> Result<Self> {
        Ok(Self::from_url(
            config.connection_url()?,
            Duration::from_secs(config.connect_timeout_secs),
        ))
    }

    pub fn from_url(url: impl Into<String>, connect_timeout: Duration) -> Self {
        install_default_drivers();
        Self {
            url: url.into(),
            connect_timeout,
        }
    }

    /// Open a fresh connection. The caller owns it and must close it.
    pub async fn connect(&self) -> std::result::Result<AnyConnection, FetchError> {
        tracing::debug!("Connecting to news database");

        match tokio::time::timeout(self.connect_timeout, AnyConnection::connect(&self.url)).await {
            Ok(Ok(conn)) => Ok(conn),
            Ok(Err(e)) => Err(FetchError::ConnectionFailed(e.to_string())),
            Err(_) => Err(FetchError::ConnectionFailed(format!(
                "timed out after {}s",
                self.connect_timeout.as_secs()
            ))),
        }
    }
}

/// Close a connection, logging instead of failing
pub async fn release(conn: AnyConnection) {
    if let Err(e) = conn.close().await {
        tracing::warn!("Failed to close database connection cleanly: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_in_memory() {
        let db = Database::from_url("sqlite::memory:", Duration::from_secs(5));
        let conn = db.connect().await.unwrap();
        release(conn).await;
    }

    #[tokio::test]
    async fn test_connect_failure_is_reported() {
        let db = Database::from_url(
            "sqlite:///nonexistent-headliner-dir/news.db",
            Duration::from_secs(5),
        );
        let err = db.connect().await.unwrap_err();
        assert!(matches!(err, FetchError::ConnectionFailed(_)));
    }

    #[test]
    fn test_new_requires_host() {
        let config = DatabaseConfig::default();
        assert!(Database::new(&config).is_err());
    }
}
