//! The HTTP client contract and its reqwest implementation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::{HttpError, HttpRequest};

/// Default timeout for proof requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default connection timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Fetches a URL and returns the response body.
///
/// Non-2xx responses are errors ([`HttpError::Status`]).
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn request(&self, req: &HttpRequest) -> Result<Vec<u8>, HttpError>;
}

#[async_trait]
impl<T: HttpClient + ?Sized> HttpClient for Arc<T> {
    async fn request(&self, req: &HttpRequest) -> Result<Vec<u8>, HttpError> {
        (**self).request(req).await
    }
}

/// [`HttpClient`] over a pooled `reqwest::Client`.
pub struct ReqwestClient {
    http_client: reqwest::Client,
}

impl ReqwestClient {
    pub fn new(timeout: Duration, user_agent: &str) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT.min(timeout))
            .user_agent(user_agent)
            .build()
            .unwrap_or_default();
        Self { http_client }
    }
}

impl Default for ReqwestClient {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT, concat!("keyproof/", env!("CARGO_PKG_VERSION")))
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn request(&self, req: &HttpRequest) -> Result<Vec<u8>, HttpError> {
        let mut builder = self.http_client.get(&req.url);
        for (name, value) in &req.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        tracing::debug!(url = %req.url, "http request");
        let response = builder.send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(url = %req.url, status = status.as_u16(), "http error status");
            return Err(HttpError::Status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(map_reqwest_error)?;
        Ok(body.to_vec())
    }
}

fn map_reqwest_error(e: reqwest::Error) -> HttpError {
    if e.is_timeout() {
        HttpError::Timeout
    } else if let Some(status) = e.status() {
        HttpError::Status(status.as_u16())
    } else {
        HttpError::Transport(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_host_is_a_transport_error() {
        let client = ReqwestClient::new(Duration::from_millis(500), "keyproof-test");
        let err = client
            .request(&HttpRequest::get("http://127.0.0.1:1/keyspub.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, HttpError::Transport(_) | HttpError::Timeout));
    }
}
