use keyproof_crypto::CryptoError;
use keyproof_sigchain::SigchainError;
use keyproof_store::StoreError;
use keyproof_types::Kid;
use thiserror::Error;

use crate::services::{NameError, UrlError};

#[derive(Debug, Error)]
pub enum UsersError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("sigchain error: {0}")]
    Sigchain(#[from] SigchainError),

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("unknown service: {0}")]
    UnknownService(String),

    #[error("invalid name: {0}")]
    InvalidName(#[from] NameError),

    #[error("invalid url: {0}")]
    InvalidUrl(#[from] UrlError),

    #[error("key {got} does not match {expected}")]
    KidMismatch { expected: Kid, got: Kid },

    #[error("invalid user statement: {0}")]
    InvalidStatement(String),

    #[error("no user claim for {0}")]
    NoClaim(Kid),

    #[error("proxied result does not match the current claim for {0}")]
    ProxyMismatch(Kid),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("config error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for UsersError {
    fn from(e: serde_json::Error) -> Self {
        UsersError::Serialization(e.to_string())
    }
}
