//! Nullable HTTP: canned responses instead of network requests.

use async_trait::async_trait;
use keyproof_http::{HttpClient, HttpError, HttpRequest};
use std::collections::HashMap;
use std::sync::Mutex;

/// An HTTP client that answers from a table of canned responses.
///
/// Responses are keyed by exact URL. The empty-string key is a wildcard used
/// for any URL without its own entry. A URL with no entry and no wildcard
/// answers 404.
pub struct NullHttpClient {
    responses: Mutex<HashMap<String, Result<Vec<u8>, HttpError>>>,
    /// Every request issued (for assertions).
    requests: Mutex<Vec<HttpRequest>>,
}

impl NullHttpClient {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answer `url` with a 200 and `body`.
    pub fn set_response(&self, url: &str, body: impl Into<Vec<u8>>) {
        self.lock_responses()
            .insert(url.to_string(), Ok(body.into()));
    }

    /// Answer `url` with an error.
    pub fn set_error(&self, url: &str, err: HttpError) {
        self.lock_responses().insert(url.to_string(), Err(err));
    }

    /// Forget the canned response for `url`.
    pub fn remove(&self, url: &str) {
        self.lock_responses().remove(url);
    }

    /// All requests issued so far.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn lock_responses(
        &self,
    ) -> std::sync::MutexGuard<'_, HashMap<String, Result<Vec<u8>, HttpError>>> {
        self.responses.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for NullHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for NullHttpClient {
    async fn request(&self, req: &HttpRequest) -> Result<Vec<u8>, HttpError> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(req.clone());

        let responses = self.lock_responses();
        responses
            .get(&req.url)
            .or_else(|| responses.get(""))
            .cloned()
            .unwrap_or(Err(HttpError::Status(404)))
    }
}
