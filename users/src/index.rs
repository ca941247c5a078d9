//! Secondary indexes over verification results.
//!
//! `/kid/<kid>` is the record of truth. The `user`, `service` and `search`
//! collections are derived from it and can always be rebuilt.

use keyproof_store::{path, DocumentStore, IterOptions};
use keyproof_types::Kid;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use crate::{User, UserResult, UsersError};

pub const KID_COLLECTION: &str = "kid";
pub const USER_COLLECTION: &str = "user";
pub const SERVICE_COLLECTION: &str = "service";
pub const SEARCH_COLLECTION: &str = "search";

/// What every index collection stores.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDocument {
    pub kid: Kid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<UserResult>,
}

impl IndexDocument {
    pub fn new(kid: Kid, result: Option<UserResult>) -> Self {
        Self { kid, result }
    }
}

pub(crate) struct Index {
    store: Arc<dyn DocumentStore>,
}

impl Index {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub fn get_kid(&self, kid: &Kid) -> Result<Option<IndexDocument>, UsersError> {
        self.get(&path(&[KID_COLLECTION, kid.as_str()]))
    }

    pub fn put_kid(&self, doc: &IndexDocument) -> Result<(), UsersError> {
        self.put(&path(&[KID_COLLECTION, doc.kid.as_str()]), doc)
    }

    /// Every kid record. Undecodable records are skipped.
    pub fn kid_documents(&self) -> Result<Vec<IndexDocument>, UsersError> {
        self.list(KID_COLLECTION, &IterOptions::new())
    }

    /// Look up `name@service`.
    pub fn get_user(&self, id: &str) -> Result<Option<IndexDocument>, UsersError> {
        self.get(&path(&[USER_COLLECTION, id]))
    }

    /// Searchable entries whose id starts with `prefix`, ascending.
    pub fn search(&self, prefix: &str, limit: usize) -> Result<Vec<IndexDocument>, UsersError> {
        self.list(
            SEARCH_COLLECTION,
            &IterOptions::new().prefix(prefix).limit(limit),
        )
    }

    /// Write the derived entries for `result` under `kid`.
    pub fn index(
        &self,
        kid: &Kid,
        result: &UserResult,
        searchable: bool,
    ) -> Result<(), UsersError> {
        let doc = IndexDocument::new(kid.clone(), Some(result.clone()));
        let user = &result.user;
        self.put(&user_path(user), &doc)?;
        self.put(&service_path(user), &doc)?;
        if searchable {
            self.put(&search_path(user), &doc)?;
        } else {
            self.delete_owned(&search_path(user), kid)?;
        }
        Ok(())
    }

    /// Remove the derived entries for `user` that still belong to `kid`.
    /// Returns whether anything was removed.
    pub fn unindex(&self, kid: &Kid, user: &User) -> Result<bool, UsersError> {
        let mut removed = false;
        for p in [user_path(user), service_path(user), search_path(user)] {
            removed |= self.delete_owned(&p, kid)?;
        }
        Ok(removed)
    }

    fn delete_owned(&self, p: &str, kid: &Kid) -> Result<bool, UsersError> {
        match self.get(p)? {
            Some(doc) if &doc.kid == kid => Ok(self.store.delete(p)?),
            _ => Ok(false),
        }
    }

    fn get(&self, p: &str) -> Result<Option<IndexDocument>, UsersError> {
        match self.store.get(p)? {
            Some(doc) => Ok(Some(serde_json::from_slice(&doc.data)?)),
            None => Ok(None),
        }
    }

    fn put(&self, p: &str, doc: &IndexDocument) -> Result<(), UsersError> {
        self.store.set(p, &serde_json::to_vec(doc)?)?;
        Ok(())
    }

    fn list(&self, collection: &str, opts: &IterOptions) -> Result<Vec<IndexDocument>, UsersError> {
        let docs = self.store.documents(collection, opts)?;
        Ok(docs
            .filter_map(|d| match serde_json::from_slice(&d.data) {
                Ok(doc) => Some(doc),
                Err(e) => {
                    warn!(path = %d.path, error = %e, "skipping undecodable index document");
                    None
                }
            })
            .collect())
    }
}

fn user_path(user: &User) -> String {
    path(&[USER_COLLECTION, &user.id()])
}

fn service_path(user: &User) -> String {
    path(&[SERVICE_COLLECTION, &format!("{}@{}", user.service, user.name)])
}

fn search_path(user: &User) -> String {
    path(&[SEARCH_COLLECTION, &user.id()])
}
