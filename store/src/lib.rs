//! Abstract document storage for keyproof.
//!
//! Every storage backend (LMDB, in-memory for testing) implements
//! [`DocumentStore`]. The rest of the codebase depends only on the trait.
//!
//! Documents live at `/`-delimited paths made of collection/id pairs, e.g.
//! `/kid/kex_...` or `/user/alice@github`. Iteration is in ascending path
//! order, which is what makes prefix search over a collection possible.

pub mod document;
pub mod error;
pub mod path;

pub use document::{Document, DocumentIterator, DocumentStore, IterOptions};
pub use error::StoreError;
pub use path::{check_document_path, path, path_components, path_first, path_last};
