//! `user` statements in a sigchain.

use keyproof_sigchain::{Sigchain, Statement};
use keyproof_types::{KeyPair, Timestamp};

use crate::{User, UsersError};

pub const USER_STATEMENT_TYPE: &str = "user";

/// Build the next statement for `sigchain` anchoring `user`.
///
/// `user.seq` must be the position the statement will take in the chain.
/// The statement is signed but not added.
pub fn user_statement(
    sigchain: &Sigchain,
    key: &KeyPair,
    user: &User,
    ts: Timestamp,
) -> Result<Statement, UsersError> {
    if &user.kid != sigchain.kid() {
        return Err(UsersError::KidMismatch {
            expected: sigchain.kid().clone(),
            got: user.kid.clone(),
        });
    }
    let next = sigchain.last_seq() + 1;
    if user.seq != next {
        return Err(UsersError::InvalidStatement(format!(
            "user seq {} is not the next seq {next}",
            user.seq
        )));
    }
    if user.url.is_empty() {
        return Err(UsersError::InvalidStatement("user has no url".to_string()));
    }
    Ok(Statement::sign(
        key,
        next,
        USER_STATEMENT_TYPE,
        user.to_json()?,
        None,
        ts,
    )?)
}

/// Decode the claim carried by a `user` statement.
pub fn user_from_statement(statement: &Statement) -> Result<User, UsersError> {
    if statement.statement_type != USER_STATEMENT_TYPE {
        return Err(UsersError::InvalidStatement(format!(
            "statement {} has type {:?}",
            statement.seq, statement.statement_type
        )));
    }
    let user = User::from_json(&statement.data)?;
    if user.kid != statement.kid {
        return Err(UsersError::KidMismatch {
            expected: statement.kid.clone(),
            got: user.kid,
        });
    }
    if user.seq != statement.seq {
        return Err(UsersError::InvalidStatement(format!(
            "user seq {} in statement {}",
            user.seq, statement.seq
        )));
    }
    Ok(user)
}
