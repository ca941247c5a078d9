//! Errors raised while constructing fundamental types.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypesError {
    #[error("invalid key id: {0}")]
    InvalidKid(String),

    #[error("unknown key type prefix: {0}")]
    UnknownKeyType(String),
}
