//! LMDB storage backend for keyproof.
//!
//! Implements [`keyproof_store::DocumentStore`] using the `heed` LMDB bindings.
//! All documents live in a single LMDB database keyed by their full path, so
//! LMDB's lexicographic key order is exactly the ascending path order the
//! trait promises.

pub mod document;
pub mod environment;
pub mod error;

pub use document::LmdbDocumentStore;
pub use environment::LmdbEnvironment;
pub use error::LmdbError;
