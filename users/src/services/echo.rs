//! Echo: a test service whose proof is carried in the claim URL.

use url::{form_urlencoded, Url};

use super::{segments, Failure, UrlError};
use crate::{Status, User};

/// Build `test://echo/<name>/<encoded message>`.
pub fn echo_url(name: &str, message: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(message.as_bytes()).collect();
    format!("test://echo/{name}/{encoded}")
}

pub(super) fn validate_url(name: &str, url: &Url) -> Result<String, UrlError> {
    if url.scheme() != "test" {
        return Err(UrlError::BadScheme(url.scheme().to_string()));
    }
    let host = url.host_str().unwrap_or_default();
    if host != "echo" {
        return Err(UrlError::BadHost(host.to_string()));
    }
    match segments(url).as_slice() {
        [owner, _message] if *owner == name => Ok(url.to_string()),
        _ => Err(UrlError::PathMismatch(url.path().to_string())),
    }
}

pub(super) fn request(_user: &User, location: &str) -> Result<Vec<u8>, Failure> {
    let url = Url::parse(location).map_err(|e| Failure::new(Status::Failure, e.to_string()))?;
    let encoded = segments(&url)
        .get(1)
        .map(|s| s.to_string())
        .ok_or_else(|| Failure::new(Status::ContentNotFound, "no message in url"))?;
    let message: String = form_urlencoded::parse(encoded.as_bytes())
        .map(|(k, _)| k.into_owned())
        .next()
        .unwrap_or_default();
    Ok(message.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyproof_types::Kid;

    #[test]
    fn message_survives_the_url() {
        let msg = "BEGIN MESSAGE.\nabc def.\nEND MESSAGE.";
        let raw = echo_url("alice", msg);
        let url = Url::parse(&raw).unwrap();
        assert_eq!(validate_url("alice", &url).unwrap(), raw);

        let user = User {
            kid: Kid::new("kex_test").unwrap(),
            name: "alice".to_string(),
            seq: 1,
            service: "echo".to_string(),
            url: raw.clone(),
        };
        assert_eq!(request(&user, &raw).unwrap(), msg.as_bytes());
    }

    #[test]
    fn owner_must_match() {
        let url = Url::parse(&echo_url("bob", "hi")).unwrap();
        assert!(matches!(
            validate_url("alice", &url),
            Err(UrlError::PathMismatch(_))
        ));
        let url = Url::parse("https://echo/alice/hi").unwrap();
        assert!(matches!(
            validate_url("alice", &url),
            Err(UrlError::BadScheme(_))
        ));
    }
}
