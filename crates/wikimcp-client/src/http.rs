//! Shared HTTP plumbing: client construction and uniform response handling.

use std::time::Duration;

use reqwest::header::SET_COOKIE;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;

use wikimcp_core::{ApiError, Error, HttpConfig};

/// Body used when an error response cannot be read.
const UNREADABLE_BODY: &str = "Could not read error response body";

/// A decoded JSON response together with the cookies it set.
#[derive(Debug)]
pub struct JsonResponse<T> {
    /// Decoded body.
    pub body: T,
    /// Raw `Set-Cookie` header values, in order.
    pub set_cookies: Vec<String>,
}

/// HTTP client shared by every wiki session and dispatcher.
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    timeout: Duration,
}

impl HttpClient {
    /// Build a client with the configured user agent and timeout.
    pub fn new(config: &HttpConfig) -> Result<Self, Error> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, timeout })
    }

    /// Underlying reqwest client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Send a request and decode its JSON body.
    ///
    /// Non-2xx responses become [`ApiError::HttpStatus`] carrying the status,
    /// the resolved URL and the body text (read best-effort). A body that is
    /// not valid JSON becomes [`ApiError::Decode`].
    pub async fn send_json<T>(
        &self,
        request: RequestBuilder,
        url: &str,
    ) -> Result<JsonResponse<T>, ApiError>
    where
        T: DeserializeOwned,
    {
        let response = request.send().await.map_err(|e| self.transport_error(url, e))?;

        let status = response.status();
        let final_url = response.url().to_string();
        let set_cookies = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .map(str::to_string)
            .collect();

        debug!(status = status.as_u16(), url = %final_url, "Received response");

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| UNREADABLE_BODY.to_string());
            return Err(ApiError::http_status(status.as_u16(), final_url, body));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(url, e))?;
        let body = serde_json::from_slice(&bytes)
            .map_err(|e| ApiError::decode(&final_url, e.to_string()))?;

        Ok(JsonResponse { body, set_cookies })
    }

    fn transport_error(&self, url: &str, error: reqwest::Error) -> ApiError {
        if error.is_timeout() {
            ApiError::Timeout {
                url: url.to_string(),
                seconds: self.timeout.as_secs(),
            }
        } else {
            ApiError::Transport {
                url: url.to_string(),
                message: error.to_string(),
            }
        }
    }
}
