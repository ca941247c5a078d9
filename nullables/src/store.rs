//! Nullable document store: thread-safe in-memory storage for testing.

use keyproof_store::{
    check_document_path, path_components, Document, DocumentIterator, DocumentStore,
    IterOptions, StoreError,
};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// An in-memory document store ordered by path.
pub struct NullDocumentStore {
    documents: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl NullDocumentStore {
    pub fn new() -> Self {
        Self {
            documents: Mutex::new(BTreeMap::new()),
        }
    }

    /// Every stored path, in order (for assertions).
    pub fn paths(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Vec<u8>>> {
        // A panic in another test thread must not cascade into this one.
        self.documents.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for NullDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore for NullDocumentStore {
    fn set(&self, path: &str, data: &[u8]) -> Result<(), StoreError> {
        check_document_path(path)?;
        self.lock().insert(path.to_string(), data.to_vec());
        Ok(())
    }

    fn get(&self, path: &str) -> Result<Option<Document>, StoreError> {
        Ok(self
            .lock()
            .get(path)
            .map(|data| Document::new(path, data.clone())))
    }

    fn delete(&self, path: &str) -> Result<bool, StoreError> {
        Ok(self.lock().remove(path).is_some())
    }

    fn documents(
        &self,
        parent: &str,
        opts: &IterOptions,
    ) -> Result<DocumentIterator, StoreError> {
        let depth = path_components(parent).len() + 1;
        let prefix = opts.scan_prefix(parent);
        let docs = self
            .lock()
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .filter(|(k, _)| path_components(k).len() == depth)
            .take(opts.limit.unwrap_or(usize::MAX))
            .map(|(k, v)| Document::new(k.clone(), v.clone()))
            .collect();
        Ok(DocumentIterator::new(docs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_listing_matches_path_order() {
        let store = NullDocumentStore::new();
        store.set("/search/bob@github", b"b").unwrap();
        store.set("/search/alice@github", b"a").unwrap();
        store.set("/searchx/alice@github", b"other").unwrap();

        let ids: Vec<String> = store
            .documents("search", &IterOptions::new().prefix("a"))
            .unwrap()
            .map(|d| d.id().to_string())
            .collect();
        assert_eq!(ids, vec!["alice@github"]);

        let all = store.documents("search", &IterOptions::new()).unwrap().count();
        assert_eq!(all, 2);
    }

    #[test]
    fn rejects_collection_paths() {
        let store = NullDocumentStore::new();
        assert!(store.set("/kid", b"x").is_err());
    }
}
