//! Locating and checking the signed message inside fetched content.
//!
//! Services wrap the posted text in all sorts of ways: HTML tags, entity
//! escaping, reflowed whitespace, surrounding prose. The armored block is
//! located by its `BEGIN ... MESSAGE.` / `END ... MESSAGE.` markers and
//! everything in between is handed to the dearmorer with whitespace collapsed.

use keyproof_crypto::{armor, dearmor, open_attached, signing_public_key};
use regex::Regex;
use std::sync::OnceLock;

use crate::services::Failure;
use crate::{Status, User};

fn block_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)BEGIN\s+(?:[A-Z0-9]+\s+)*?MESSAGE\..*?END\s+(?:[A-Z0-9]+\s+)*?MESSAGE\.")
            .expect("static regex")
    })
}

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("static regex"))
}

/// Strip tags and decode the entities services commonly escape.
fn strip_html(text: &str) -> String {
    let text = tag_regex().replace_all(text, " ");
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}

/// Find the first armored block in `text`, with whitespace collapsed.
pub fn find_armored(text: &str) -> Option<String> {
    let cleaned = strip_html(text);
    block_regex()
        .find(&cleaned)
        .map(|m| m.as_str().split_whitespace().collect::<Vec<_>>().join(" "))
}

/// Check that `body` carries a message signed by `user.kid` that claims the
/// same kid, service and name. Returns the message in canonical armor.
pub fn verify_content(body: &[u8], user: &User) -> Result<String, Failure> {
    let text = String::from_utf8_lossy(body);
    let block = find_armored(&text)
        .ok_or_else(|| Failure::new(Status::ContentNotFound, "no signed message found"))?;

    let armored = dearmor(&block)
        .map_err(|e| Failure::new(Status::StatementInvalid, format!("invalid message: {e}")))?;
    let public = signing_public_key(&user.kid)
        .map_err(|e| Failure::new(Status::StatementInvalid, e.to_string()))?;
    let payload = open_attached(&armored.data, &public)
        .map_err(|e| Failure::new(Status::StatementInvalid, format!("bad signature: {e}")))?;
    let signed = User::from_json(&payload)
        .map_err(|e| Failure::new(Status::StatementInvalid, format!("invalid claim: {e}")))?;

    if !user.matches_proof(&signed) {
        return Err(Failure::new(
            Status::StatementInvalid,
            format!(
                "signed claim {}:{} does not match {}:{}",
                signed.kid,
                signed.id(),
                user.kid,
                user.id()
            ),
        ));
    }

    Ok(armor(&armored.data, armored.brand.as_deref()))
}
