//! Signed statement chains.
//!
//! Each key has a sigchain: an append-only list of statements signed by that
//! key, numbered from 1. A statement can revoke an earlier one; revoked
//! statements stay in the chain but no longer count for lookups such as
//! [`Sigchain::find_last`].
//!
//! Chains are persisted through [`SigchainStore`]. [`DocumentSigchainStore`]
//! keeps them in any [`keyproof_store::DocumentStore`].

pub mod chain;
pub mod error;
pub mod statement;
pub mod store;

pub use chain::Sigchain;
pub use error::SigchainError;
pub use statement::Statement;
pub use store::{DocumentSigchainStore, SigchainStore};
