use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid key id: {0}")]
    InvalidKid(String),

    #[error("key id is not a signing key: {0}")]
    NotSigningKey(String),

    #[error("signed message too short")]
    MessageTooShort,

    #[error("signature verification failed")]
    VerifyFailed,

    #[error("invalid base62: {0}")]
    Base62(String),

    #[error("invalid armor: {0}")]
    Armor(String),
}
