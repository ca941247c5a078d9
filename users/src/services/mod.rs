//! Service adapters.
//!
//! Each supported service knows how to normalize and validate account names,
//! where a claim's proof lives, and how to pull the posted text out of the
//! service's response envelope. Dispatch is a closed enum; the set of
//! services an engine accepts is an explicit [`ServiceRegistry`].

mod echo;
mod github;
mod https;
mod reddit;
mod twitter;

pub use echo::echo_url;

use keyproof_http::{HttpClient, HttpError, HttpRequest};
use std::fmt;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::{Status, User};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NameError {
    #[error("name is empty")]
    Empty,
    #[error("name has invalid characters")]
    InvalidChars,
    #[error("name is longer than {0} characters")]
    TooLong(usize),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UrlError {
    #[error("unparsable url: {0}")]
    Parse(String),
    #[error("invalid scheme: {0}")]
    BadScheme(String),
    #[error("invalid host: {0}")]
    BadHost(String),
    #[error("path mismatch: {0}")]
    PathMismatch(String),
}

/// A failed proof check step, already classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub status: Status,
    pub message: String,
}

impl Failure {
    pub fn new(status: Status, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.message)
    }
}

/// Per-service settings.
#[derive(Clone, Debug, Default)]
pub struct ServiceOptions {
    /// Bearer token for the twitter API. Without one, twitter checks fail
    /// with `connection-fail`.
    pub twitter_bearer_token: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Service {
    Github,
    Twitter,
    Reddit,
    Https,
    /// Test service: the proof text is carried in the URL itself.
    Echo,
}

impl Service {
    pub const ALL: [Service; 5] = [
        Service::Github,
        Service::Twitter,
        Service::Reddit,
        Service::Https,
        Service::Echo,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Service::Github => "github",
            Service::Twitter => "twitter",
            Service::Reddit => "reddit",
            Service::Https => "https",
            Service::Echo => "echo",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.id() == id)
    }

    /// Whether verified users of this service go into the search index.
    pub fn searchable(&self) -> bool {
        !matches!(self, Service::Echo)
    }

    /// Canonical form of a user-entered name. Idempotent.
    pub fn normalize_name(&self, raw: &str) -> String {
        match self {
            Service::Https => https::normalize_name(raw),
            _ => raw
                .trim()
                .trim_start_matches(|c: char| c == '@' || c.is_whitespace())
                .to_lowercase(),
        }
    }

    pub fn validate_name(&self, name: &str) -> Result<(), NameError> {
        match self {
            Service::Github => check_name(name, 39, |c| {
                c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'
            }),
            Service::Twitter => check_name(name, 15, |c| {
                c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'
            }),
            Service::Reddit => check_name(name, 20, |c| {
                c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-'
            }),
            Service::Https => https::validate_name(name),
            Service::Echo => check_name(name, 16, |c| {
                c.is_ascii_lowercase() || c.is_ascii_digit()
            }),
        }
    }

    /// Canonical form of a user-entered proof URL.
    pub fn normalize_url(&self, url: &str) -> Result<String, UrlError> {
        match self {
            Service::Echo => Ok(url.trim().to_string()),
            _ => {
                let mut parsed = parse_url(url)?;
                parsed.set_query(None);
                parsed.set_fragment(None);
                Ok(parsed.to_string())
            }
        }
    }

    /// Check that `url` is a proof location for `name` and return the URL
    /// that actually gets fetched.
    pub fn validate_url(&self, name: &str, url: &str) -> Result<String, UrlError> {
        let parsed = parse_url(url)?;
        match self {
            Service::Github => github::validate_url(name, &parsed),
            Service::Twitter => twitter::validate_url(name, &parsed),
            Service::Reddit => reddit::validate_url(name, &parsed),
            Service::Https => https::validate_url(name, &parsed),
            Service::Echo => echo::validate_url(name, &parsed),
        }
    }

    /// Fetch the proof at `location` and return the posted text.
    pub async fn request(
        &self,
        http: &dyn HttpClient,
        options: &ServiceOptions,
        user: &User,
        location: &str,
    ) -> Result<Vec<u8>, Failure> {
        debug!(service = self.id(), location, "requesting proof");
        match self {
            Service::Github => github::request(http, user, location).await,
            Service::Twitter => twitter::request(http, options, user, location).await,
            Service::Reddit => reddit::request(http, user, location).await,
            Service::Https => fetch(http, &HttpRequest::get(location)).await,
            Service::Echo => echo::request(user, location),
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// The services an engine accepts, and their settings.
#[derive(Clone, Debug)]
pub struct ServiceRegistry {
    services: Vec<Service>,
    options: ServiceOptions,
}

impl ServiceRegistry {
    pub fn new(services: Vec<Service>, options: ServiceOptions) -> Self {
        Self { services, options }
    }

    /// Every real service. Excludes `echo`.
    pub fn production(options: ServiceOptions) -> Self {
        Self::new(
            Service::ALL
                .into_iter()
                .filter(|s| *s != Service::Echo)
                .collect(),
            options,
        )
    }

    /// Every service including `echo`.
    pub fn with_test_services(options: ServiceOptions) -> Self {
        Self::new(Service::ALL.to_vec(), options)
    }

    pub fn get(&self, id: &str) -> Option<Service> {
        Service::from_id(id).filter(|s| self.services.contains(s))
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn options(&self) -> &ServiceOptions {
        &self.options
    }
}

fn check_name(name: &str, max: usize, allowed: impl Fn(char) -> bool) -> Result<(), NameError> {
    if name.is_empty() {
        return Err(NameError::Empty);
    }
    if !name.chars().all(allowed) {
        return Err(NameError::InvalidChars);
    }
    if name.len() > max {
        return Err(NameError::TooLong(max));
    }
    Ok(())
}

fn parse_url(url: &str) -> Result<Url, UrlError> {
    Url::parse(url.trim()).map_err(|e| UrlError::Parse(e.to_string()))
}

fn require_https(url: &Url) -> Result<(), UrlError> {
    if url.scheme() != "https" {
        return Err(UrlError::BadScheme(url.scheme().to_string()));
    }
    Ok(())
}

fn require_host(url: &Url, hosts: &[&str]) -> Result<(), UrlError> {
    let host = url.host_str().unwrap_or_default();
    if !hosts.contains(&host) {
        return Err(UrlError::BadHost(host.to_string()));
    }
    Ok(())
}

/// Non-empty path segments.
fn segments(url: &Url) -> Vec<&str> {
    url.path_segments()
        .map(|s| s.filter(|p| !p.is_empty()).collect())
        .unwrap_or_default()
}

/// Issue a request and classify transport failures.
async fn fetch(http: &dyn HttpClient, req: &HttpRequest) -> Result<Vec<u8>, Failure> {
    http.request(req).await.map_err(|e| match e {
        HttpError::Status(404) => Failure::new(Status::ResourceNotFound, "not found (404)"),
        other => Failure::new(Status::ConnectionFail, other.to_string()),
    })
}

/// Parse a JSON envelope. An unparsable envelope is `content-invalid`.
fn parse_envelope<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, Failure> {
    serde_json::from_slice(body)
        .map_err(|e| Failure::new(Status::ContentInvalid, format!("invalid response: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn name_rules() {
        assert_eq!(Service::Github.validate_name("alice-1"), Ok(()));
        assert_eq!(
            Service::Github.validate_name("alice_1"),
            Err(NameError::InvalidChars)
        );
        assert_eq!(Service::Twitter.validate_name("alice_1"), Ok(()));
        assert_eq!(
            Service::Twitter.validate_name("a234567890123456"),
            Err(NameError::TooLong(15))
        );
        assert_eq!(Service::Reddit.validate_name("a_b-c"), Ok(()));
        assert_eq!(Service::Echo.validate_name("a-b"), Err(NameError::InvalidChars));
        assert_eq!(Service::Https.validate_name("example.com"), Ok(()));
        assert_eq!(Service::Github.validate_name(""), Err(NameError::Empty));
    }

    #[test]
    fn names_are_lowercased_and_unprefixed() {
        assert_eq!(Service::Twitter.normalize_name("@Alice"), "alice");
        assert_eq!(Service::Github.normalize_name(" Alice "), "alice");
        assert_eq!(
            Service::Https.normalize_name("https://Example.COM/"),
            "example.com"
        );
    }

    #[test]
    fn urls_drop_query_and_fragment() {
        assert_eq!(
            Service::Twitter
                .normalize_url("https://twitter.com/alice/status/1?s=20#x")
                .unwrap(),
            "https://twitter.com/alice/status/1"
        );
    }

    #[test]
    fn registry_limits_services() {
        let prod = ServiceRegistry::production(ServiceOptions::default());
        assert_eq!(prod.get("github"), Some(Service::Github));
        assert_eq!(prod.get("echo"), None);
        assert_eq!(prod.get("myspace"), None);

        let test = ServiceRegistry::with_test_services(ServiceOptions::default());
        assert_eq!(test.get("echo"), Some(Service::Echo));
    }

    #[test]
    fn echo_is_not_searchable() {
        assert!(!Service::Echo.searchable());
        assert!(Service::Github.searchable());
    }

    proptest! {
        #[test]
        fn normalize_name_is_idempotent(raw in "[@ ]{0,2}[A-Za-z0-9_.:/-]{0,40}[ /]{0,2}") {
            for svc in Service::ALL {
                let once = svc.normalize_name(&raw);
                prop_assert_eq!(svc.normalize_name(&once), once.clone());
            }
        }
    }
}
