//! Verification results.

use keyproof_types::Timestamp;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{Status, User};

/// The outcome of the latest check of a user claim.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResult {
    pub user: User,
    pub status: Status,
    /// Message from the failing step, empty on success.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub err: String,
    /// The proof text in canonical armor, from the last successful check.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub statement: String,
    /// When the claim was last checked.
    #[serde(default)]
    pub ts: Timestamp,
    /// When the claim was last checked successfully. Zero if never.
    #[serde(default, skip_serializing_if = "Timestamp::is_zero")]
    pub vts: Timestamp,
    /// When this claim was first checked.
    #[serde(default, skip_serializing_if = "Timestamp::is_zero")]
    pub cts: Timestamp,
    /// Set when the result was reported by a proxy rather than checked here.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub proxied: bool,
}

impl UserResult {
    /// An unchecked result for `user`.
    pub fn new(user: User) -> Self {
        Self {
            user,
            status: Status::Unknown,
            err: String::new(),
            statement: String::new(),
            ts: Timestamp::EPOCH,
            vts: Timestamp::EPOCH,
            cts: Timestamp::EPOCH,
            proxied: false,
        }
    }

    /// Start a new check of `user`, keeping what the prior result knew about
    /// the last successful verification.
    pub fn carry_forward(user: User, prior: Option<&UserResult>) -> Self {
        let mut result = Self::new(user);
        if let Some(prior) = prior {
            result.statement = prior.statement.clone();
            result.vts = prior.vts;
            if prior.user == result.user {
                result.cts = prior.cts;
            }
        }
        result
    }

    /// Record a check at `now`.
    pub fn stamp(&mut self, now: Timestamp) {
        self.ts = now;
        if self.cts.is_zero() {
            self.cts = now;
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }

    /// Whether the last check is older than `dt`.
    pub fn is_timestamp_expired(&self, now: Timestamp, dt: Duration) -> bool {
        self.ts.elapsed_since(now) > dt
    }

    /// Whether the last successful check is older than `dt`. A claim that
    /// never verified counts from its first check.
    pub fn is_verify_expired(&self, now: Timestamp, dt: Duration) -> bool {
        let since = if self.vts.is_zero() { self.cts } else { self.vts };
        !since.is_zero() && since.elapsed_since(now) > dt
    }

    /// Whether this result belongs in the identity indexes.
    ///
    /// `ok` always does. A `connection-fail` does while the last successful
    /// check is within `grace`. Everything else does not.
    pub fn is_indexable(&self, now: Timestamp, grace: Duration) -> bool {
        if self.status == Status::Ok {
            return true;
        }
        self.status.is_transient() && !self.vts.is_zero() && self.vts.elapsed_since(now) < grace
    }
}
