use std::net::SocketAddr;

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

use crate::config::ServerConfig;
use crate::Result;

pub const PING_BODY: &str = "Pong";
pub const ROOT_BODY: &str = "Server is running";

async fn ping() -> &'static str {
    PING_BODY
}

async fn root() -> &'static str {
    ROOT_BODY
}

/// Stateless router answering the liveness routes
pub fn create_app() -> Router {
    Router::new()
        .route("/", get(root))
        .route("/ping", get(ping))
}

pub async fn bind(config: &ServerConfig) -> Result<TcpListener> {
    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    info!("Liveness server listening on http://{}", addr);
    Ok(listener)
}

/// Serve until the shutdown flag flips to true
pub async fn serve(listener: TcpListener, mut shutdown: watch::Receiver<bool>) -> Result<()> {
    axum::serve(listener, create_app())
        .with_graceful_shutdown(async move {
            while !*shutdown.borrow() {
                if shutdown.changed().await.is_err() {
                    break;
                }
            }
            info!("Liveness server shutting down");
        })
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    async fn get_body(uri: &str) -> (StatusCode, String) {
        let response = create_app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_ping_returns_pong() {
        assert_eq!(get_body("/ping").await, (StatusCode::OK, "Pong".to_string()));
    }

    #[tokio::test]
    async fn test_root_returns_running() {
        assert_eq!(
            get_body("/").await,
            (StatusCode::OK, "Server is running".to_string())
        );
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let (status, _) = get_body("/digest").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_serve_stops_on_shutdown() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        };
        let listener = bind(&config).await.unwrap();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(serve(listener, shutdown_rx));

        shutdown_tx.send(true).unwrap();
        let result = tokio::time::timeout(std::time::Duration::from_secs(5), handle).await;
        assert!(result.unwrap().unwrap().is_ok());
    }
}
