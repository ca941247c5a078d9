//! Search requests and results.

use keyproof_types::Kid;
use serde::{Deserialize, Serialize};

use crate::UserResult;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchRequest {
    /// A key id, or a prefix of `name@service`.
    pub query: String,
    /// Zero means the configured default.
    pub limit: usize,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            limit: 0,
        }
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub kid: Kid,
    pub result: UserResult,
}
