use std::time::Duration;

use reqwest::{Client, StatusCode};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::config::KeepAliveConfig;
use crate::{Error, Result};

/// The liveness URL under a service base URL
pub fn ping_url(base_url: &str) -> String {
    format!("{}/ping", base_url.trim_end_matches('/'))
}

/// Periodically requests this service's own liveness route through its
/// public URL
pub struct KeepAlive {
    client: Client,
    url: String,
    interval: Duration,
}

impl KeepAlive {
    pub fn new(base_url: &str, config: &KeepAliveConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(Error::Http)?;

        Ok(Self {
            client,
            url: ping_url(base_url),
            interval: Duration::from_secs(config.interval_secs.max(1)),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send one ping and return the response status
    pub async fn ping_once(&self) -> Result<StatusCode> {
        let response = self.client.get(&self.url).send().await?;
        Ok(response.status())
    }

    /// Ping on every interval until shutdown. Failures are only logged.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Keep-alive started: {} every {}s", self.url, self.interval.as_secs());

        loop {
            tokio::select! {
                result = shutdown.changed() => {
                    if result.is_err() || *shutdown.borrow() {
                        info!("Keep-alive received shutdown signal");
                        break;
                    }
                }

                _ = ticker.tick() => {
                    info!("Sending keep-alive ping to {}", self.url);
                    match self.ping_once().await {
                        Ok(status) if status == StatusCode::OK => debug!("Keep-alive ping succeeded"),
                        Ok(status) => warn!("Keep-alive ping failed with status {}", status),
                        Err(e) => error!("Keep-alive ping error: {}", e),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::liveness::{bind, serve};

    fn keepalive_config() -> KeepAliveConfig {
        KeepAliveConfig {
            timeout_secs: 5,
            ..KeepAliveConfig::default()
        }
    }

    #[test]
    fn test_ping_url() {
        assert_eq!(ping_url("http://localhost:10000"), "http://localhost:10000/ping");
        assert_eq!(ping_url("https://digest.onrender.com/"), "https://digest.onrender.com/ping");
    }

    #[tokio::test]
    async fn test_ping_own_server() {
        let listener = bind(&ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        })
        .await
        .unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let server = tokio::spawn(serve(listener, shutdown_rx));

        let keepalive = KeepAlive::new(&format!("http://{}", addr), &keepalive_config()).unwrap();
        assert_eq!(keepalive.ping_once().await.unwrap(), StatusCode::OK);

        shutdown_tx.send(true).unwrap();
        server.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_ping_unreachable_is_error() {
        // Bind then drop to get a port nobody listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let keepalive = KeepAlive::new(&format!("http://{}", addr), &keepalive_config()).unwrap();
        assert!(keepalive.ping_once().await.is_err());
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let keepalive = KeepAlive::new("http://127.0.0.1:9", &keepalive_config()).unwrap();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        shutdown_tx.send(true).unwrap();

        let result = tokio::time::timeout(Duration::from_secs(10), keepalive.run(shutdown_rx)).await;
        assert!(result.is_ok());
    }
}
