use keyproof_types::Kid;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SigchainError {
    #[error("statement kid {got} does not match sigchain kid {expected}")]
    KidMismatch { expected: Kid, got: Kid },

    #[error("invalid statement seq: expected {expected}, got {got}")]
    InvalidSeq { expected: u64, got: u64 },

    #[error("invalid statement signature")]
    InvalidSignature,

    #[error("revoke target {0} not found")]
    RevokeTargetMissing(u64),

    #[error("statement {0} is already revoked")]
    AlreadyRevoked(u64),

    #[error("cannot revoke a revoke statement ({0})")]
    RevokeOfRevoke(u64),

    #[error("crypto error: {0}")]
    Crypto(#[from] keyproof_crypto::CryptoError),

    #[error("store error: {0}")]
    Store(#[from] keyproof_store::StoreError),

    #[error("serialization error: {0}")]
    Serialization(String),
}
