//! Ed25519 key pairs and their X25519 counterparts.

use ed25519_dalek::{SigningKey, VerifyingKey};
use keyproof_types::{KeyPair, PrivateKey, PublicKey};
use rand::rngs::OsRng;

fn keypair(signing: &SigningKey) -> KeyPair {
    KeyPair {
        public: PublicKey(signing.verifying_key().to_bytes()),
        private: PrivateKey(signing.to_bytes()),
    }
}

/// A fresh key pair from the OS random source.
pub fn generate_keypair() -> KeyPair {
    keypair(&SigningKey::generate(&mut OsRng))
}

/// The key pair for a 32-byte Ed25519 seed.
pub fn keypair_from_seed(seed: &[u8; 32]) -> KeyPair {
    keypair(&SigningKey::from_bytes(seed))
}

/// The X25519 (Montgomery form) public key for an Ed25519 public key.
/// `None` if the bytes are not a valid Edwards point.
pub fn ed25519_public_to_x25519(ed25519_public: &[u8; 32]) -> Option<[u8; 32]> {
    VerifyingKey::from_bytes(ed25519_public)
        .ok()
        .map(|vk| vk.to_montgomery().to_bytes())
}
