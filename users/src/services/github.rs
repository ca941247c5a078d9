//! GitHub gists.

use keyproof_http::{HttpClient, HttpRequest};
use serde::Deserialize;
use std::collections::BTreeMap;
use url::Url;

use super::{fetch, parse_envelope, require_host, require_https, segments, Failure, UrlError};
use crate::proof::find_armored;
use crate::{Status, User};

const GISTS_API: &str = "https://api.github.com/gists";

/// `https://gist.github.com/<name>/<id>` → `https://api.github.com/gists/<id>`.
pub(super) fn validate_url(name: &str, url: &Url) -> Result<String, UrlError> {
    require_https(url)?;
    require_host(url, &["gist.github.com"])?;
    match segments(url).as_slice() {
        [owner, id]
            if owner.eq_ignore_ascii_case(name) && id.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            Ok(format!("{GISTS_API}/{id}"))
        }
        _ => Err(UrlError::PathMismatch(url.path().to_string())),
    }
}

#[derive(Deserialize)]
struct Gist {
    #[serde(default)]
    owner: Option<Owner>,
    #[serde(default)]
    files: BTreeMap<String, GistFile>,
}

#[derive(Deserialize)]
struct Owner {
    login: String,
}

#[derive(Deserialize)]
struct GistFile {
    #[serde(default)]
    content: Option<String>,
}

pub(super) async fn request(
    http: &dyn HttpClient,
    user: &User,
    location: &str,
) -> Result<Vec<u8>, Failure> {
    let req = HttpRequest::get(location).header("Accept", "application/vnd.github.v3+json");
    let body = fetch(http, &req).await?;
    let gist: Gist = parse_envelope(&body)?;

    let owner = gist.owner.map(|o| o.login).unwrap_or_default();
    if !owner.eq_ignore_ascii_case(&user.name) {
        return Err(Failure::new(
            Status::ContentInvalid,
            format!("gist owner {owner:?} is not {:?}", user.name),
        ));
    }

    // Files are keyed by name, so the response order is lost. Prefer the
    // first file carrying a signed block, else the first by name.
    let mut contents: Vec<String> = gist.files.into_values().filter_map(|f| f.content).collect();
    if contents.is_empty() {
        return Err(Failure::new(Status::ContentNotFound, "gist has no content"));
    }
    let pick = contents
        .iter()
        .position(|c| find_armored(c).is_some())
        .unwrap_or(0);
    Ok(contents.swap_remove(pick).into_bytes())
}
