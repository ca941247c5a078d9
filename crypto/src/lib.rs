//! Cryptographic primitives for keyproof.
//!
//! - **Ed25519** for signing statements and proofs
//! - **Blake2b** for key id checksums
//! - Key id derivation with `kex_`/`kbx_` prefixes and base32 encoding
//! - Base62 armoring of signed messages (`BEGIN MESSAGE.` ... `END MESSAGE.`)

pub mod armor;
pub mod base62;
pub mod error;
pub mod hash;
pub mod keys;
pub mod kid;
pub mod sign;

pub use armor::{armor, dearmor, Armored};
pub use error::CryptoError;
pub use hash::blake2b_256;
pub use keys::{ed25519_public_to_x25519, generate_keypair, keypair_from_seed};
pub use kid::{
    decode_kid, derive_kid, derive_x25519_kid, is_valid_kid, related_x25519_kid,
    signing_public_key,
};
pub use sign::{open_attached, sign_attached, sign_message, verify_signature};
