//! Ed25519 message signing and verification.
//!
//! Attached signatures are laid out as `signature(64) || message`, which is the
//! payload carried inside an armored proof.

use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use keyproof_types::{PrivateKey, PublicKey, Signature};

use crate::CryptoError;

/// Sign a message with a private key, returning the signature.
pub fn sign_message(message: &[u8], private_key: &PrivateKey) -> Signature {
    let signing_key = SigningKey::from_bytes(&private_key.0);
    let sig = signing_key.sign(message);
    Signature(sig.to_bytes())
}

/// Verify a signature against a message and public key.
///
/// Returns `true` if the signature is valid, `false` otherwise.
pub fn verify_signature(message: &[u8], signature: &Signature, public_key: &PublicKey) -> bool {
    let Ok(verifying_key) = VerifyingKey::from_bytes(&public_key.0) else {
        return false;
    };
    let dalek_sig = ed25519_dalek::Signature::from_bytes(&signature.0);
    verifying_key.verify_strict(message, &dalek_sig).is_ok()
}

/// Produce `signature || message`.
pub fn sign_attached(message: &[u8], private_key: &PrivateKey) -> Vec<u8> {
    let sig = sign_message(message, private_key);
    let mut out = Vec::with_capacity(Signature::LEN + message.len());
    out.extend_from_slice(sig.as_bytes());
    out.extend_from_slice(message);
    out
}

/// Verify an attached signature and return the message it covers.
pub fn open_attached(signed: &[u8], public_key: &PublicKey) -> Result<Vec<u8>, CryptoError> {
    let sig = Signature::from_slice(signed).ok_or(CryptoError::MessageTooShort)?;
    let message = &signed[Signature::LEN..];
    if !verify_signature(message, &sig, public_key) {
        return Err(CryptoError::VerifyFailed);
    }
    Ok(message.to_vec())
}
