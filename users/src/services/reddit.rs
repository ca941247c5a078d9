//! Reddit posts in the proof subreddit.

use keyproof_http::{HttpClient, HttpRequest};
use serde::Deserialize;
use url::Url;

use super::{fetch, parse_envelope, require_host, require_https, segments, Failure, UrlError};
use crate::{Status, User};

/// Proofs must be posted here.
const SUBREDDIT: &str = "keyspubmsgs";

const HOSTS: &[&str] = &["reddit.com", "www.reddit.com", "old.reddit.com"];

/// `https://reddit.com/r/keyspubmsgs/comments/<id>/<name>/` →
/// `https://www.reddit.com/r/keyspubmsgs/comments/<id>/<name>.json`.
pub(super) fn validate_url(name: &str, url: &Url) -> Result<String, UrlError> {
    require_https(url)?;
    require_host(url, HOSTS)?;
    match segments(url).as_slice() {
        ["r", sub, "comments", id, title, ..]
            if sub.eq_ignore_ascii_case(SUBREDDIT)
                && title.eq_ignore_ascii_case(name)
                && id.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            Ok(format!(
                "https://www.reddit.com/r/{SUBREDDIT}/comments/{id}/{name}.json"
            ))
        }
        _ => Err(UrlError::PathMismatch(url.path().to_string())),
    }
}

#[derive(Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
}

#[derive(Deserialize)]
struct Child {
    kind: String,
    data: Post,
}

#[derive(Deserialize)]
struct Post {
    #[serde(default)]
    author: String,
    #[serde(default)]
    subreddit: String,
    #[serde(default)]
    selftext: String,
}

pub(super) async fn request(
    http: &dyn HttpClient,
    user: &User,
    location: &str,
) -> Result<Vec<u8>, Failure> {
    let body = fetch(http, &HttpRequest::get(location)).await?;
    let listings: Vec<Listing> = parse_envelope(&body)?;

    let post = listings
        .into_iter()
        .flat_map(|l| l.data.children)
        .find(|c| c.kind == "t3")
        .map(|c| c.data)
        .ok_or_else(|| Failure::new(Status::ContentNotFound, "no post in listing"))?;

    if !post.author.eq_ignore_ascii_case(&user.name) {
        return Err(Failure::new(
            Status::ContentInvalid,
            format!("post author {:?} is not {:?}", post.author, user.name),
        ));
    }
    if !post.subreddit.eq_ignore_ascii_case(SUBREDDIT) {
        return Err(Failure::new(
            Status::ContentInvalid,
            format!("post is in r/{}, not r/{SUBREDDIT}", post.subreddit),
        ));
    }

    Ok(post.selftext.into_bytes())
}
