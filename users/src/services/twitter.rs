//! Twitter (tweets fetched through the v2 API).

use keyproof_http::{HttpClient, HttpRequest};
use serde::Deserialize;
use url::Url;

use super::{
    fetch, parse_envelope, require_host, require_https, segments, Failure, ServiceOptions,
    UrlError,
};
use crate::{Status, User};

const HOSTS: &[&str] = &[
    "twitter.com",
    "www.twitter.com",
    "mobile.twitter.com",
    "x.com",
    "www.x.com",
];

/// `https://twitter.com/<name>/status/<id>` →
/// `https://api.twitter.com/2/tweets/<id>?expansions=author_id`.
pub(super) fn validate_url(name: &str, url: &Url) -> Result<String, UrlError> {
    require_https(url)?;
    require_host(url, HOSTS)?;
    match segments(url).as_slice() {
        [owner, "status", id]
            if owner.eq_ignore_ascii_case(name)
                && !id.is_empty()
                && id.chars().all(|c| c.is_ascii_digit()) =>
        {
            Ok(format!(
                "https://api.twitter.com/2/tweets/{id}?expansions=author_id"
            ))
        }
        _ => Err(UrlError::PathMismatch(url.path().to_string())),
    }
}

#[derive(Deserialize)]
struct TweetResponse {
    #[serde(default)]
    data: Option<Tweet>,
    #[serde(default)]
    includes: Includes,
    #[serde(default)]
    errors: Vec<ApiError>,
}

#[derive(Deserialize)]
struct Tweet {
    #[serde(default)]
    author_id: String,
    #[serde(default)]
    text: String,
}

#[derive(Default, Deserialize)]
struct Includes {
    #[serde(default)]
    users: Vec<Author>,
}

#[derive(Deserialize)]
struct Author {
    id: String,
    username: String,
}

#[derive(Deserialize)]
struct ApiError {
    #[serde(default)]
    detail: String,
}

pub(super) async fn request(
    http: &dyn HttpClient,
    options: &ServiceOptions,
    user: &User,
    location: &str,
) -> Result<Vec<u8>, Failure> {
    let token = options
        .twitter_bearer_token
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| Failure::new(Status::ConnectionFail, "no twitter bearer token"))?;
    let req = HttpRequest::get(location).header("Authorization", format!("Bearer {token}"));
    let body = fetch(http, &req).await?;
    let resp: TweetResponse = parse_envelope(&body)?;

    // Deleted tweets come back as 200 with only `errors`.
    let Some(tweet) = resp.data else {
        let detail = resp
            .errors
            .into_iter()
            .next()
            .map(|e| e.detail)
            .unwrap_or_else(|| "tweet not found".to_string());
        return Err(Failure::new(Status::ResourceNotFound, detail));
    };

    let author = resp
        .includes
        .users
        .iter()
        .find(|a| a.id == tweet.author_id)
        .ok_or_else(|| Failure::new(Status::ContentInvalid, "tweet author missing"))?;
    if !author.username.eq_ignore_ascii_case(&user.name) {
        return Err(Failure::new(
            Status::ContentInvalid,
            format!("tweet author {:?} is not {:?}", author.username, user.name),
        ));
    }

    Ok(tweet.text.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyproof_nullables::NullHttpClient;
    use keyproof_types::Kid;

    const API: &str = "https://api.twitter.com/2/tweets/1205589994380783616?expansions=author_id";

    fn user() -> User {
        User {
            kid: Kid::new("kex_test").unwrap(),
            name: "alice".to_string(),
            seq: 1,
            service: "twitter".to_string(),
            url: "https://twitter.com/alice/status/1205589994380783616".to_string(),
        }
    }

    fn options() -> ServiceOptions {
        ServiceOptions {
            twitter_bearer_token: Some("token".to_string()),
        }
    }

    #[test]
    fn tweet_urls_on_every_host() {
        for host in ["twitter.com", "mobile.twitter.com", "x.com"] {
            let url = Url::parse(&format!("https://{host}/Alice/status/1205589994380783616"))
                .unwrap();
            assert_eq!(validate_url("alice", &url).unwrap(), API);
        }
        let url = Url::parse("https://twitter.com/alice/status/abc").unwrap();
        assert!(matches!(
            validate_url("alice", &url),
            Err(UrlError::PathMismatch(_))
        ));
        let url = Url::parse("https://nitter.net/alice/status/1").unwrap();
        assert!(matches!(
            validate_url("alice", &url),
            Err(UrlError::BadHost(_))
        ));
    }

    #[tokio::test]
    async fn author_is_matched_by_id_and_username() {
        let http = NullHttpClient::new();
        http.set_response(
            API,
            r#"{"data":{"id":"1","author_id":"7","text":"proof"},
                "includes":{"users":[{"id":"8","username":"alice"},{"id":"7","username":"Alice"}]}}"#,
        );
        assert_eq!(
            request(&http, &options(), &user(), API).await.unwrap(),
            b"proof"
        );
        assert_eq!(
            http.requests()[0].header_value("authorization"),
            Some("Bearer token")
        );

        http.set_response(
            API,
            r#"{"data":{"id":"1","author_id":"8","text":"proof"},
                "includes":{"users":[{"id":"8","username":"mallory"}]}}"#,
        );
        let err = request(&http, &options(), &user(), API).await.unwrap_err();
        assert_eq!(err.status, Status::ContentInvalid);
    }

    #[tokio::test]
    async fn deleted_tweet_is_not_found() {
        let http = NullHttpClient::new();
        http.set_response(
            API,
            r#"{"errors":[{"detail":"Could not find tweet","title":"Not Found Error"}]}"#,
        );
        let err = request(&http, &options(), &user(), API).await.unwrap_err();
        assert_eq!(err.status, Status::ResourceNotFound);
        assert_eq!(err.message, "Could not find tweet");
    }

    #[tokio::test]
    async fn missing_token_is_a_connection_failure() {
        let http = NullHttpClient::new();
        let err = request(&http, &ServiceOptions::default(), &user(), API)
            .await
            .unwrap_err();
        assert_eq!(err.status, Status::ConnectionFail);
        assert!(http.requests().is_empty());
    }
}
