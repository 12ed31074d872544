//! # HTTP Client Utilities
//!
//! Shared HTTP client wrapper for collaborator adapters: a configured
//! timeout, JSON bodies, and status-code classification into
//! [`GatewayError`]. It never retries; retry policy belongs to callers.

use crate::infrastructure::gateways::error::{GatewayError, GatewayResult};
use reqwest::header::HeaderMap;
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// HTTP client wrapper for collaborator adapters.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    timeout_ms: u64,
}

impl HttpClient {
    /// Creates a client with the specified timeout.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Internal` if the client cannot be created.
    pub fn new(timeout_ms: u64) -> GatewayResult<Self> {
        Self::with_headers(timeout_ms, HeaderMap::new())
    }

    /// Creates a client that sends `default_headers` on every request.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Internal` if the client cannot be created.
    pub fn with_headers(timeout_ms: u64, default_headers: HeaderMap) -> GatewayResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .default_headers(default_headers)
            .build()
            .map_err(|e| GatewayError::internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, timeout_ms })
    }

    /// Returns the configured timeout in milliseconds.
    #[inline]
    #[must_use]
    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    /// Makes a POST request with a JSON body and extra headers, and
    /// deserializes the JSON response.
    ///
    /// # Errors
    ///
    /// - `GatewayError::Timeout` / `Connection` for transport failures
    /// - Status-mapped errors for non-2xx responses
    /// - `GatewayError::Protocol` if the body cannot be parsed
    pub async fn post_with_headers<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
        headers: HeaderMap,
    ) -> GatewayResult<T> {
        let response = self
            .client
            .post(url)
            .json(body)
            .headers(headers)
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        self.handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(&self, response: Response) -> GatewayResult<T> {
        let status = response.status();

        if status.is_success() {
            response
                .json::<T>()
                .await
                .map_err(|e| GatewayError::protocol(format!("Failed to parse response: {e}")))
        } else {
            let error_body = response.text().await.unwrap_or_default();
            Err(Self::map_status_error(status, &error_body))
        }
    }

    fn map_reqwest_error(&self, error: reqwest::Error) -> GatewayError {
        if error.is_timeout() {
            GatewayError::timeout_with_duration("Request timed out", self.timeout_ms)
        } else if error.is_connect() {
            GatewayError::connection(format!("Connection failed: {error}"))
        } else {
            GatewayError::connection(format!("HTTP request failed: {error}"))
        }
    }

    /// Maps a non-2xx status to an error. 5xx and 429 are retryable;
    /// every other 4xx is fatal.
    fn map_status_error(status: StatusCode, body: &str) -> GatewayError {
        match status {
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                GatewayError::invalid_request(format!("Bad request: {body}"))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                GatewayError::authentication(format!("Authentication failed: {body}"))
            }
            StatusCode::TOO_MANY_REQUESTS => GatewayError::rate_limited("Rate limit exceeded"),
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
                GatewayError::timeout(format!("Upstream timeout ({status}): {body}"))
            }
            s if s.is_server_error() => {
                GatewayError::connection(format!("Server error ({s}): {body}"))
            }
            s if s.is_client_error() => {
                GatewayError::rejected_with_code(format!("Request refused: {body}"), s.as_str())
            }
            s => GatewayError::protocol(format!("Unexpected HTTP status ({s}): {body}")),
        }
    }
}
