//! Shared HTTP client for the portfolio backend.
//!
//! Every component talks to the backend through [`ApiClient`], which joins
//! paths onto the configured base URL, attaches the bearer token when one is
//! given and sorts each response into one of four outcomes: a decoded body,
//! a server rejection (any non-2xx), a transport failure (no response) or a
//! body that could not be decoded.

use std::sync::Arc;

use reqwest::{Method, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::ClientConfig;

/// Errors produced by the HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// No response was received (connection refused, reset, timed out).
    #[error("Cannot reach server: {0}")]
    Transport(String),

    /// The backend answered with a non-2xx status.
    #[error("{}", .message.as_deref().unwrap_or("Request rejected by server"))]
    Rejected {
        status: u16,
        /// The `error` (or `message`) field of the response body, if any.
        message: Option<String>,
    },

    /// A 2xx body did not match the expected shape.
    #[error("Unexpected response from server: {0}")]
    Decode(String),

    /// The request path could not be joined onto the base URL.
    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),
}

/// Error body the backend sends alongside non-2xx statuses.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Portfolio backend HTTP client.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Transport` if the underlying HTTP client cannot be
    /// built.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.http_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.api_url.clone(),
            }),
        })
    }

    /// Backend base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// GET `path` and decode the JSON body.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure, non-2xx status or an
    /// undecodable body.
    #[instrument(skip(self, token))]
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&SecretString>,
    ) -> Result<T, ApiError> {
        let request = self.request(Method::GET, path, token)?;
        decode(&dispatch(request).await?)
    }

    /// POST a JSON body to `path` and decode the JSON response.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure, non-2xx status or an
    /// undecodable body.
    #[instrument(skip(self, body, token))]
    pub async fn post<B, T>(
        &self,
        path: &str,
        body: &B,
        token: Option<&SecretString>,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(Method::POST, path, token)?.json(body);
        decode(&dispatch(request).await?)
    }

    /// PUT a JSON body to `path` and decode the JSON response.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure, non-2xx status or an
    /// undecodable body.
    #[instrument(skip(self, body, token))]
    pub async fn put<B, T>(&self, path: &str, body: &B, token: Option<&SecretString>) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(Method::PUT, path, token)?.json(body);
        decode(&dispatch(request).await?)
    }

    /// PATCH a JSON body to `path` and decode the JSON response.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure, non-2xx status or an
    /// undecodable body.
    #[instrument(skip(self, body, token))]
    pub async fn patch<B, T>(
        &self,
        path: &str,
        body: &B,
        token: Option<&SecretString>,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(Method::PATCH, path, token)?.json(body);
        decode(&dispatch(request).await?)
    }

    /// DELETE `path`. Any 2xx counts as success; the body is ignored.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or non-2xx status.
    #[instrument(skip(self, token))]
    pub async fn delete(&self, path: &str, token: Option<&SecretString>) -> Result<(), ApiError> {
        let request = self.request(Method::DELETE, path, token)?;
        dispatch(request).await.map(drop)
    }

    /// POST a JSON body without a session, ignoring the response body.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or non-2xx status.
    #[instrument(skip(self, body))]
    pub async fn submit<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<(), ApiError> {
        let request = self.request(Method::POST, path, None)?.json(body);
        dispatch(request).await.map(drop)
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.inner
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::InvalidUrl(format!("{path}: {e}")))
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&SecretString>,
    ) -> Result<RequestBuilder, ApiError> {
        let request = self.inner.client.request(method, self.endpoint(path)?);
        Ok(match token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        })
    }
}

/// Send a request and return the body of a 2xx response.
async fn dispatch(request: RequestBuilder) -> Result<String, ApiError> {
    let response = request.send().await.map_err(|e| {
        warn!(error = %e, "Request did not reach the backend");
        ApiError::Transport(e.to_string())
    })?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ApiError::Transport(e.to_string()))?;

    if status.is_success() {
        debug!(status = status.as_u16(), "Backend request succeeded");
        return Ok(body);
    }

    let message = rejection_message(&body);
    debug!(status = status.as_u16(), message = ?message, "Backend rejected request");
    Err(ApiError::Rejected {
        status: status.as_u16(),
        message,
    })
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Pull a human-readable message out of an error body.
fn rejection_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    parsed
        .error
        .or(parsed.message)
        .map(|message| message.trim().to_string())
        .filter(|message| !message.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(&ClientConfig::new(base, "session.json").unwrap()).unwrap()
    }

    #[test]
    fn test_endpoint_joins_under_base_path() {
        let api = client("http://localhost:5000/portfolio");
        assert_eq!(
            api.endpoint("/api/admin/stats").unwrap().as_str(),
            "http://localhost:5000/portfolio/api/admin/stats"
        );
        assert_eq!(
            api.endpoint("api/admin/testimonials/5").unwrap().as_str(),
            "http://localhost:5000/portfolio/api/admin/testimonials/5"
        );
    }

    #[test]
    fn test_rejection_message_prefers_error_field() {
        assert_eq!(
            rejection_message(r#"{"error":"Invalid credentials"}"#).as_deref(),
            Some("Invalid credentials")
        );
        assert_eq!(
            rejection_message(r#"{"message":"Not found"}"#).as_deref(),
            Some("Not found")
        );
        assert_eq!(rejection_message(r#"{"error":"  "}"#), None);
        assert_eq!(rejection_message("<html>502 Bad Gateway</html>"), None);
    }

    #[test]
    fn test_rejected_display() {
        let with_message = ApiError::Rejected {
            status: 401,
            message: Some("Invalid credentials".to_string()),
        };
        assert_eq!(with_message.to_string(), "Invalid credentials");

        let without = ApiError::Rejected {
            status: 500,
            message: None,
        };
        assert_eq!(without.to_string(), "Request rejected by server");
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let api = client(&format!("http://{addr}"));
        let result: Result<serde_json::Value, _> = api.get("api/testimonials", None).await;
        assert!(matches!(result, Err(ApiError::Transport(_))));
    }
}
