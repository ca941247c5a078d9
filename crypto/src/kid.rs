//! Key id derivation from public keys.
//!
//! Key id format: prefix + base32(public_key, 52 chars) + base32(checksum, 8 chars)
//!
//! The prefix is `kex_` for Ed25519 signing keys and `kbx_` for X25519 keys.
//! Checksum: first 5 bytes of Blake2b-256(prefix || public_key), so the same
//! bytes under a different key type never validate.
//! Base32 alphabet: `13456789abcdefghijkmnopqrstuwxyz` (avoids ambiguous chars).

use keyproof_types::{KeyType, Kid, PublicKey};

use crate::CryptoError;

/// Base32 alphabet (32 chars, avoids visually ambiguous 0/O, 2/Z, l/I, v).
const BASE32_ALPHABET: &[u8; 32] = b"13456789abcdefghijkmnopqrstuwxyz";

/// Reverse lookup table: ASCII byte → 5-bit value (0xFF = invalid).
const BASE32_DECODE: [u8; 128] = {
    let mut table = [0xFFu8; 128];
    let alpha = BASE32_ALPHABET;
    let mut i = 0;
    while i < 32 {
        table[alpha[i] as usize] = i as u8;
        i += 1;
    }
    table
};

/// Length of the encoded part (after the prefix): 52 pubkey + 8 checksum.
const ENCODED_LEN: usize = 60;
/// Number of base32 characters for the public key (256 bits → ceil(256/5) = 52).
const PUBKEY_CHARS: usize = 52;

fn encode_base32(bytes: &[u8]) -> String {
    let num_chars = (bytes.len() * 8).div_ceil(5);
    let mut result = String::with_capacity(num_chars);

    let mut buffer: u64 = 0;
    let mut bits_in_buffer = 0;

    for &byte in bytes {
        buffer = (buffer << 8) | byte as u64;
        bits_in_buffer += 8;
        while bits_in_buffer >= 5 {
            bits_in_buffer -= 5;
            let idx = ((buffer >> bits_in_buffer) & 0x1F) as usize;
            result.push(BASE32_ALPHABET[idx] as char);
        }
    }
    if bits_in_buffer > 0 {
        let idx = ((buffer << (5 - bits_in_buffer)) & 0x1F) as usize;
        result.push(BASE32_ALPHABET[idx] as char);
    }

    result
}

fn decode_base32_fixed<const N: usize>(s: &str) -> Option<[u8; N]> {
    let mut buffer: u64 = 0;
    let mut bits_in_buffer = 0;
    let mut result = [0u8; N];
    let mut pos = 0;

    for c in s.bytes() {
        if c >= 128 {
            return None;
        }
        let val = BASE32_DECODE[c as usize];
        if val == 0xFF {
            return None;
        }
        buffer = (buffer << 5) | val as u64;
        bits_in_buffer += 5;
        if bits_in_buffer >= 8 {
            bits_in_buffer -= 8;
            if pos < N {
                result[pos] = (buffer >> bits_in_buffer) as u8;
                pos += 1;
            }
        }
    }

    if pos < N {
        return None;
    }
    Some(result)
}

fn checksum(key_type: KeyType, key: &[u8; 32]) -> [u8; 5] {
    let mut input = Vec::with_capacity(4 + 32);
    input.extend_from_slice(key_type.prefix().as_bytes());
    input.extend_from_slice(key);
    let hash = crate::blake2b_256(&input);
    let mut out = [0u8; 5];
    out.copy_from_slice(&hash[..5]);
    out
}

fn encode_kid(key_type: KeyType, key: &[u8; 32]) -> Kid {
    let encoded = format!(
        "{}{}{}",
        key_type.prefix(),
        encode_base32(key),
        encode_base32(&checksum(key_type, key))
    );
    // The prefix comes from KeyType, so construction cannot fail.
    Kid::new(encoded).unwrap_or_else(|_| unreachable!("kid prefix from KeyType"))
}

/// Derive the `kex_` key id of an Ed25519 public key.
pub fn derive_kid(public_key: &PublicKey) -> Kid {
    encode_kid(KeyType::EdX25519, public_key.as_bytes())
}

/// Derive the `kbx_` key id of an X25519 public key.
pub fn derive_x25519_kid(x25519_public: &[u8; 32]) -> Kid {
    encode_kid(KeyType::X25519, x25519_public)
}

/// Decode a key id string into its key type and public key bytes.
///
/// Fails if the prefix is unknown, the length is wrong, a character is
/// outside the alphabet, or the checksum does not match.
pub fn decode_kid(kid: &str) -> Result<(KeyType, [u8; 32]), CryptoError> {
    let invalid = || CryptoError::InvalidKid(kid.to_string());
    let key_type = KeyType::from_kid_str(kid).ok_or_else(invalid)?;
    let encoded = &kid[key_type.prefix().len()..];
    if encoded.len() != ENCODED_LEN {
        return Err(invalid());
    }
    let key: [u8; 32] = decode_base32_fixed(&encoded[..PUBKEY_CHARS]).ok_or_else(invalid)?;
    let sum: [u8; 5] = decode_base32_fixed(&encoded[PUBKEY_CHARS..]).ok_or_else(invalid)?;
    if sum != checksum(key_type, &key) {
        return Err(invalid());
    }
    Ok((key_type, key))
}

/// Whether a string is a well-formed key id with a valid checksum.
pub fn is_valid_kid(kid: &str) -> bool {
    decode_kid(kid).is_ok()
}

/// The Ed25519 public key a `kex_` key id encodes.
pub fn signing_public_key(kid: &Kid) -> Result<PublicKey, CryptoError> {
    match decode_kid(kid.as_str())? {
        (KeyType::EdX25519, key) => Ok(PublicKey(key)),
        (KeyType::X25519, _) => Err(CryptoError::NotSigningKey(kid.to_string())),
    }
}

/// The `kbx_` key id of the X25519 key converted from a `kex_` key id.
///
/// Returns `None` for X25519 key ids or malformed input.
pub fn related_x25519_kid(kid: &Kid) -> Option<Kid> {
    let public = signing_public_key(kid).ok()?;
    let x = crate::ed25519_public_to_x25519(public.as_bytes())?;
    Some(derive_x25519_kid(&x))
}
