//! LMDB implementation of DocumentStore.
//!
//! Keys are the UTF-8 bytes of the full document path. Listing a collection
//! is a prefix range-scan over `/<collection>/<prefix>`.

use std::ops::Bound;
use std::path::Path;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use keyproof_store::{
    check_document_path, path_components, Document, DocumentIterator, DocumentStore,
    IterOptions, StoreError,
};

use crate::{LmdbEnvironment, LmdbError};

pub struct LmdbDocumentStore {
    env: Arc<Env>,
    documents_db: Database<Bytes, Bytes>,
}

impl LmdbDocumentStore {
    pub fn new(environment: &LmdbEnvironment) -> Self {
        Self {
            env: Arc::clone(&environment.env),
            documents_db: environment.documents_db,
        }
    }

    /// Open (or create) a store at `path` with the default map size.
    pub fn open(path: &Path) -> Result<Self, LmdbError> {
        let environment = LmdbEnvironment::open(path, crate::environment::DEFAULT_MAP_SIZE)?;
        Ok(Self::new(&environment))
    }
}

/// Smallest byte string greater than every string starting with `prefix`.
/// `None` when no such bound exists (empty or all-0xFF prefix).
fn prefix_upper_bound(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut upper = prefix.to_vec();
    while let Some(last) = upper.pop() {
        if last < 0xFF {
            upper.push(last + 1);
            return Some(upper);
        }
    }
    None
}

fn decode_key(key: &[u8]) -> Result<String, LmdbError> {
    String::from_utf8(key.to_vec()).map_err(|e| LmdbError::Heed(format!("non-UTF-8 key: {e}")))
}

impl DocumentStore for LmdbDocumentStore {
    fn set(&self, path: &str, data: &[u8]) -> Result<(), StoreError> {
        check_document_path(path)?;
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.documents_db
            .put(&mut wtxn, path.as_bytes(), data)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get(&self, path: &str) -> Result<Option<Document>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let val = self
            .documents_db
            .get(&rtxn, path.as_bytes())
            .map_err(LmdbError::from)?
            .map(|b| Document::new(path, b.to_vec()));
        Ok(val)
    }

    fn delete(&self, path: &str) -> Result<bool, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let existed = self
            .documents_db
            .delete(&mut wtxn, path.as_bytes())
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(existed)
    }

    fn documents(
        &self,
        parent: &str,
        opts: &IterOptions,
    ) -> Result<DocumentIterator, StoreError> {
        let depth = path_components(parent).len() + 1;
        let prefix = opts.scan_prefix(parent);
        let upper = prefix_upper_bound(prefix.as_bytes());
        let bounds = (
            Bound::Included(prefix.as_bytes()),
            match upper.as_deref() {
                Some(u) => Bound::Excluded(u),
                None => Bound::Unbounded,
            },
        );

        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let iter = self
            .documents_db
            .range(&rtxn, &bounds)
            .map_err(LmdbError::from)?;

        let limit = opts.limit.unwrap_or(usize::MAX);
        let mut docs = Vec::new();
        for entry in iter {
            if docs.len() >= limit {
                break;
            }
            let (key, val) = entry.map_err(LmdbError::from)?;
            let key = decode_key(key)?;
            if path_components(&key).len() != depth {
                continue;
            }
            docs.push(Document::new(key, val.to_vec()));
        }
        Ok(DocumentIterator::new(docs))
    }
}
