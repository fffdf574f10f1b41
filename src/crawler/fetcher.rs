//! HTTP fetcher implementation
//!
//! This module handles the single outbound request a crawl makes:
//! - Building the HTTP client with the configured user agent and timeouts
//! - GET requests returning raw bytes, Content-Type and status code
//! - Classifying transport failures into `FetchError`
//!
//! There are no retries here. A failed fetch fails the crawl and the next
//! scheduled crawl is the retry.

use crate::config::{FetcherConfig, UserAgentConfig};
use crate::FetchError;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::time::Duration;

/// Raw result of a successful fetch
///
/// Any HTTP status counts as success here; the status is kept alongside the
/// content but never drives control flow.
#[derive(Debug, Clone)]
pub struct FetchedContent {
    /// Response body, undecoded
    pub body: Vec<u8>,

    /// Content-Type header value (empty if absent)
    pub content_type: String,

    /// HTTP status code
    pub status_code: u16,
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `fetcher` - Timeout settings
/// * `user_agent` - The user agent configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(
    fetcher: &FetcherConfig,
    user_agent: &UserAgentConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(Duration::from_secs(fetcher.timeout_secs))
        .connect_timeout(Duration::from_secs(fetcher.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches site content over HTTP
#[derive(Debug, Clone)]
pub struct ContentFetcher {
    client: Client,
}

impl ContentFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a fetcher from configuration
    pub fn from_config(
        fetcher: &FetcherConfig,
        user_agent: &UserAgentConfig,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(fetcher, user_agent)?))
    }

    /// Performs one GET against `url`
    ///
    /// # Returns
    ///
    /// * `Ok(FetchedContent)` - A response arrived, whatever its status
    /// * `Err(FetchError)` - Timeout, connection failure, or the body could not be read
    pub async fn fetch(&self, url: &str) -> Result<FetchedContent, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status_code = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                }
            } else {
                FetchError::Body {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        tracing::debug!(
            "Fetched {} ({} bytes, status {}, content-type '{}')",
            url,
            body.len(),
            status_code,
            content_type
        );

        Ok(FetchedContent {
            body: body.to_vec(),
            content_type,
            status_code,
        })
    }
}

fn classify_error(url: &str, e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if e.is_connect() {
        FetchError::Connect {
            url: url.to_string(),
            message: e.to_string(),
        }
    } else {
        FetchError::Http {
            url: url.to_string(),
            source: e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> (FetcherConfig, UserAgentConfig) {
        (
            FetcherConfig {
                timeout_secs: 5,
                connect_timeout_secs: 2,
            },
            UserAgentConfig {
                crawler_name: "TestWatcher".to_string(),
                crawler_version: "1.0".to_string(),
                contact_url: "https://example.com/about".to_string(),
                contact_email: "admin@example.com".to_string(),
            },
        )
    }

    #[test]
    fn test_build_http_client() {
        let (fetcher, user_agent) = create_test_config();
        let client = build_http_client(&fetcher, &user_agent);
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_connection_refused_is_fetch_error() {
        let (fetcher, user_agent) = create_test_config();
        let fetcher = ContentFetcher::from_config(&fetcher, &user_agent).unwrap();

        // Nothing listens on the port once the listener is dropped
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let result = fetcher.fetch(&format!("http://127.0.0.1:{}/", port)).await;
        assert!(matches!(
            result,
            Err(FetchError::Connect { .. }) | Err(FetchError::Http { .. })
        ));
    }
}
