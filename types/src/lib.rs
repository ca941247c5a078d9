//! Fundamental types for keyproof.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! key ids, raw key material, signatures, timestamps and the clock abstraction.

pub mod error;
pub mod keys;
pub mod kid;
pub mod time;

pub use error::TypesError;
pub use keys::{KeyPair, PrivateKey, PublicKey, Signature};
pub use kid::{KeyType, Kid};
pub use time::{Clock, SystemClock, Timestamp};
