//! HTTP client for provider downloads

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use super::ProviderClient;
use super::error::{FetchError, Result};

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
            user_agent: format!("weatherfusion/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// reqwest-backed provider client
///
/// Performs exactly one bounded request per call. Failed slices are skipped by
/// the caller and picked up again only through a later run, so there is no
/// retry here.
#[derive(Clone)]
pub struct ReqwestClient {
    client: Client,
}

impl ReqwestClient {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| FetchError::InvalidConfig(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl ProviderClient for ReqwestClient {
    async fn fetch(&self, url: &str) -> Result<Bytes> {
        debug!(url, "Starting download");

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::RequestFailed(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::RequestFailed(format!("Failed to read body: {}", e)))?;

        debug!(url, size = bytes.len(), "Download completed");

        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, http::StatusCode, routing::get};
    use tokio::net::TcpListener;

    async fn spawn_server() -> String {
        let app = Router::new()
            .route("/ok.json", get(|| async { r#"{"hello":"world"}"# }))
            .route(
                "/missing.json",
                get(|| async { (StatusCode::NOT_FOUND, "nope") }),
            );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_http_config_defaults() {
        let config = HttpConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.request_timeout, Duration::from_secs(60));
        assert!(config.user_agent.starts_with("weatherfusion/"));
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let base = spawn_server().await;
        let client = ReqwestClient::new(&HttpConfig::default()).unwrap();

        let body = client.fetch(&format!("{}/ok.json", base)).await.unwrap();
        assert_eq!(body, Bytes::from_static(br#"{"hello":"world"}"#));
    }

    #[tokio::test]
    async fn test_fetch_non_success_status() {
        let base = spawn_server().await;
        let client = ReqwestClient::new(&HttpConfig::default()).unwrap();

        let err = client
            .fetch(&format!("{}/missing.json", base))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = ReqwestClient::new(&HttpConfig::default()).unwrap();
        let err = client
            .fetch(&format!("http://{}/ok.json", addr))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::RequestFailed(_)));
    }
}
