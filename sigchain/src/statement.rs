//! A single signed sigchain entry.

use keyproof_crypto::{derive_kid, sign_message, signing_public_key, verify_signature};
use keyproof_types::{KeyPair, Kid, Signature, Timestamp};
use serde::{Deserialize, Serialize};

use crate::SigchainError;

/// Statement type used by revocations.
pub const REVOKE_TYPE: &str = "revoke";

/// A signed statement.
///
/// The signature covers the JSON encoding of every other field, in
/// declaration order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    pub kid: Kid,
    pub seq: u64,
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub statement_type: String,
    #[serde(with = "hex_bytes", default, skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revoke: Option<u64>,
    pub ts: Timestamp,
    #[serde(with = "hex_bytes")]
    pub sig: Vec<u8>,
}

#[derive(Serialize)]
struct SignedFields<'a> {
    kid: &'a Kid,
    seq: u64,
    #[serde(rename = "type", skip_serializing_if = "str::is_empty")]
    statement_type: &'a str,
    #[serde(with = "hex_bytes", skip_serializing_if = "<[u8]>::is_empty")]
    data: &'a [u8],
    #[serde(skip_serializing_if = "Option::is_none")]
    revoke: Option<u64>,
    ts: Timestamp,
}

impl Statement {
    /// Create and sign a statement with `key`.
    pub fn sign(
        key: &KeyPair,
        seq: u64,
        statement_type: &str,
        data: Vec<u8>,
        revoke: Option<u64>,
        ts: Timestamp,
    ) -> Result<Self, SigchainError> {
        let mut st = Statement {
            kid: derive_kid(&key.public),
            seq,
            statement_type: statement_type.to_string(),
            data,
            revoke,
            ts,
            sig: Vec::new(),
        };
        let bytes = st.signed_bytes()?;
        st.sig = sign_message(&bytes, &key.private).0.to_vec();
        Ok(st)
    }

    /// Bytes covered by the signature.
    pub fn signed_bytes(&self) -> Result<Vec<u8>, SigchainError> {
        let fields = SignedFields {
            kid: &self.kid,
            seq: self.seq,
            statement_type: &self.statement_type,
            data: &self.data,
            revoke: self.revoke,
            ts: self.ts,
        };
        serde_json::to_vec(&fields).map_err(|e| SigchainError::Serialization(e.to_string()))
    }

    /// Check the signature against the statement's own kid.
    pub fn verify(&self) -> Result<(), SigchainError> {
        let public = signing_public_key(&self.kid)?;
        let sig = Signature::from_slice(&self.sig).ok_or(SigchainError::InvalidSignature)?;
        if self.sig.len() != Signature::LEN
            || !verify_signature(&self.signed_bytes()?, &sig, &public)
        {
            return Err(SigchainError::InvalidSignature);
        }
        Ok(())
    }

    pub fn is_revoke(&self) -> bool {
        self.revoke.is_some()
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer, T: AsRef<[u8]> + ?Sized>(
        bytes: &T,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyproof_crypto::keypair_from_seed;

    #[test]
    fn signed_statement_verifies() {
        let key = keypair_from_seed(&[1u8; 32]);
        let st = Statement::sign(&key, 1, "user", b"{}".to_vec(), None, Timestamp::from_millis(5))
            .unwrap();
        assert_eq!(st.kid, derive_kid(&key.public));
        assert!(st.verify().is_ok());
    }

    #[test]
    fn tampered_data_fails_verification() {
        let key = keypair_from_seed(&[1u8; 32]);
        let mut st =
            Statement::sign(&key, 1, "user", b"{\"n\":\"alice\"}".to_vec(), None, Timestamp::EPOCH)
                .unwrap();
        st.data = b"{\"n\":\"mallory\"}".to_vec();
        assert!(matches!(st.verify(), Err(SigchainError::InvalidSignature)));
    }

    #[test]
    fn json_round_trip_keeps_signature_valid() {
        let key = keypair_from_seed(&[2u8; 32]);
        let st = Statement::sign(&key, 3, "", Vec::new(), Some(2), Timestamp::from_millis(9))
            .unwrap();
        let json = serde_json::to_string(&st).unwrap();
        assert!(!json.contains("\"type\""));
        let back: Statement = serde_json::from_str(&json).unwrap();
        assert_eq!(back, st);
        assert!(back.verify().is_ok());
    }
}
