//! Key identifiers with a key-type prefix.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TypesError;

/// The kind of key a [`Kid`] refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyType {
    /// Ed25519 signing key (can also be converted to X25519 for encryption).
    EdX25519,
    /// X25519 encryption-only key.
    X25519,
}

impl KeyType {
    /// The string prefix used when encoding a key id of this type.
    pub fn prefix(&self) -> &'static str {
        match self {
            KeyType::EdX25519 => "kex_",
            KeyType::X25519 => "kbx_",
        }
    }

    /// Determine the key type from the start of an encoded key id.
    pub fn from_kid_str(s: &str) -> Option<Self> {
        if s.starts_with(KeyType::EdX25519.prefix()) {
            Some(KeyType::EdX25519)
        } else if s.starts_with(KeyType::X25519.prefix()) {
            Some(KeyType::X25519)
        } else {
            None
        }
    }
}

/// A key identifier: `kex_`/`kbx_` + base32(public key) + base32(checksum).
///
/// The type only guarantees a known prefix. Full checksum validation lives in
/// `keyproof_crypto::decode_kid`, which is what callers should use when the
/// string comes from an untrusted source.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Kid(String);

impl Kid {
    /// Create a key id from a raw string, checking only the prefix.
    pub fn new(raw: impl Into<String>) -> Result<Self, TypesError> {
        let s = raw.into();
        match KeyType::from_kid_str(&s) {
            Some(kt) if s.len() > kt.prefix().len() => Ok(Self(s)),
            Some(_) => Err(TypesError::InvalidKid(s)),
            None => Err(TypesError::UnknownKeyType(s)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn key_type(&self) -> KeyType {
        // Constructors guarantee a known prefix.
        KeyType::from_kid_str(&self.0).unwrap_or(KeyType::EdX25519)
    }
}

impl fmt::Display for Kid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Kid {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Kid {
    type Error = TypesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Kid> for String {
    fn from(kid: Kid) -> Self {
        kid.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_determines_key_type() {
        let ed = Kid::new("kex_abc").unwrap();
        let x = Kid::new("kbx_abc").unwrap();
        assert_eq!(ed.key_type(), KeyType::EdX25519);
        assert_eq!(x.key_type(), KeyType::X25519);
    }

    #[test]
    fn unknown_prefix_rejected() {
        assert!(matches!(
            Kid::new("brst_abc"),
            Err(TypesError::UnknownKeyType(_))
        ));
        assert!(matches!(Kid::new("kex_"), Err(TypesError::InvalidKid(_))));
    }

    #[test]
    fn serde_goes_through_validation() {
        let kid: Kid = serde_json::from_str("\"kex_abc\"").unwrap();
        assert_eq!(kid.as_str(), "kex_abc");
        assert!(serde_json::from_str::<Kid>("\"alice\"").is_err());
        assert_eq!(serde_json::to_string(&kid).unwrap(), "\"kex_abc\"");
    }
}
