//! Document storage trait.

use crate::StoreError;

/// A stored document: its full path and raw bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    pub path: String,
    pub data: Vec<u8>,
}

impl Document {
    pub fn new(path: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            data,
        }
    }

    /// The document id (last path component).
    pub fn id(&self) -> &str {
        crate::path_last(&self.path).unwrap_or_default()
    }
}

/// Options for listing the documents of a collection.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IterOptions {
    /// Only return documents whose id starts with this prefix.
    pub prefix: Option<String>,
    /// Return at most this many documents.
    pub limit: Option<usize>,
}

impl IterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Full key prefix to scan for, given the parent collection path.
    pub fn scan_prefix(&self, parent: &str) -> String {
        let parent = crate::path(&[parent]);
        format!("{}/{}", parent.trim_end_matches('/'), self.prefix.as_deref().unwrap_or(""))
    }
}

/// Documents produced by [`DocumentStore::documents`], in ascending path order.
#[derive(Debug, Default)]
pub struct DocumentIterator {
    inner: std::vec::IntoIter<Document>,
}

impl DocumentIterator {
    pub fn new(documents: Vec<Document>) -> Self {
        Self {
            inner: documents.into_iter(),
        }
    }
}

impl Iterator for DocumentIterator {
    type Item = Document;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// Trait for path-addressed document storage.
///
/// Each write fully overwrites the document at a path; there are no merges
/// and no transactions spanning several paths.
pub trait DocumentStore: Send + Sync {
    /// Write a document. The path must have an even number of components.
    fn set(&self, path: &str, data: &[u8]) -> Result<(), StoreError>;

    /// Read a document, `None` if absent.
    fn get(&self, path: &str) -> Result<Option<Document>, StoreError>;

    /// Delete a document. Returns whether it existed.
    fn delete(&self, path: &str) -> Result<bool, StoreError>;

    /// List the direct documents of a collection in ascending path order.
    fn documents(&self, parent: &str, opts: &IterOptions)
        -> Result<DocumentIterator, StoreError>;

    fn exists(&self, path: &str) -> Result<bool, StoreError> {
        self.get(path).map(|d| d.is_some())
    }
}

impl<T: DocumentStore + ?Sized> DocumentStore for std::sync::Arc<T> {
    fn set(&self, path: &str, data: &[u8]) -> Result<(), StoreError> {
        (**self).set(path, data)
    }

    fn get(&self, path: &str) -> Result<Option<Document>, StoreError> {
        (**self).get(path)
    }

    fn delete(&self, path: &str) -> Result<bool, StoreError> {
        (**self).delete(path)
    }

    fn documents(
        &self,
        parent: &str,
        opts: &IterOptions,
    ) -> Result<DocumentIterator, StoreError> {
        (**self).documents(parent, opts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_prefix_combines_parent_and_prefix() {
        let opts = IterOptions::new().prefix("ali").limit(5);
        assert_eq!(opts.scan_prefix("search"), "/search/ali");
        assert_eq!(opts.scan_prefix("/search/"), "/search/ali");
        assert_eq!(IterOptions::new().scan_prefix("kid"), "/kid/");
    }

    #[test]
    fn document_id_is_last_component() {
        let doc = Document::new("/user/alice@github", vec![]);
        assert_eq!(doc.id(), "alice@github");
    }
}
