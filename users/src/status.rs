//! Verification status.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Outcome of checking a user proof.
///
/// The serialized names are the public wire vocabulary and must not change.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    /// The proof was fetched and verified.
    Ok,
    /// The proof location does not exist (HTTP 404, deleted tweet).
    ResourceNotFound,
    /// The proof location exists but holds no signed message.
    ContentNotFound,
    /// A signed message was found but its signature or fields are wrong.
    StatementInvalid,
    /// The service envelope was wrong (author, owner or subreddit mismatch).
    ContentInvalid,
    /// Network error, timeout, rate limit or non-404 error status.
    ConnectionFail,
    /// Any other failure, e.g. an invalid claim.
    #[serde(rename = "fail")]
    Failure,
    /// Not checked yet.
    #[default]
    Unknown,
}

impl Status {
    pub const ALL: [Status; 8] = [
        Status::Ok,
        Status::ResourceNotFound,
        Status::ContentNotFound,
        Status::StatementInvalid,
        Status::ContentInvalid,
        Status::ConnectionFail,
        Status::Failure,
        Status::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Ok => "ok",
            Status::ResourceNotFound => "resource-not-found",
            Status::ContentNotFound => "content-not-found",
            Status::StatementInvalid => "statement-invalid",
            Status::ContentInvalid => "content-invalid",
            Status::ConnectionFail => "connection-fail",
            Status::Failure => "fail",
            Status::Unknown => "unknown",
        }
    }

    /// Transient failures are expected to resolve on a later check.
    pub fn is_transient(&self) -> bool {
        matches!(self, Status::ConnectionFail)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| format!("unknown status: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_match_display_and_serde() {
        for st in Status::ALL {
            let json = serde_json::to_string(&st).unwrap();
            assert_eq!(json, format!("\"{}\"", st.as_str()));
            assert_eq!(serde_json::from_str::<Status>(&json).unwrap(), st);
            assert_eq!(st.as_str().parse::<Status>().unwrap(), st);
        }
    }

    #[test]
    fn failure_is_spelled_fail() {
        assert_eq!(serde_json::to_string(&Status::Failure).unwrap(), "\"fail\"");
        assert!("failure".parse::<Status>().is_err());
    }

    #[test]
    fn default_is_unknown() {
        assert_eq!(Status::default(), Status::Unknown);
    }
}
