//! The per-key chain of statements.

use keyproof_types::{KeyPair, Kid, Timestamp};
use serde::{Deserialize, Serialize};

use crate::statement::REVOKE_TYPE;
use crate::{SigchainError, Statement};

/// An append-only list of statements signed by one key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sigchain {
    kid: Kid,
    statements: Vec<Statement>,
}

impl Sigchain {
    pub fn new(kid: Kid) -> Self {
        Self {
            kid,
            statements: Vec::new(),
        }
    }

    pub fn kid(&self) -> &Kid {
        &self.kid
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Seq of the last statement, 0 for an empty chain.
    pub fn last_seq(&self) -> u64 {
        self.statements.last().map(|s| s.seq).unwrap_or(0)
    }

    /// Append a statement after checking kid, seq, signature and revocation rules.
    pub fn add(&mut self, statement: Statement) -> Result<(), SigchainError> {
        if statement.kid != self.kid {
            return Err(SigchainError::KidMismatch {
                expected: self.kid.clone(),
                got: statement.kid,
            });
        }
        let expected = self.last_seq() + 1;
        if statement.seq != expected {
            return Err(SigchainError::InvalidSeq {
                expected,
                got: statement.seq,
            });
        }
        statement.verify()?;

        if let Some(target) = statement.revoke {
            let revoked = self
                .get(target)
                .ok_or(SigchainError::RevokeTargetMissing(target))?;
            if revoked.is_revoke() {
                return Err(SigchainError::RevokeOfRevoke(target));
            }
            if self.is_revoked(target) {
                return Err(SigchainError::AlreadyRevoked(target));
            }
        }

        self.statements.push(statement);
        Ok(())
    }

    /// Sign and append a revocation of statement `seq`.
    pub fn revoke(
        &mut self,
        seq: u64,
        key: &KeyPair,
        ts: Timestamp,
    ) -> Result<Statement, SigchainError> {
        let st = Statement::sign(key, self.last_seq() + 1, REVOKE_TYPE, Vec::new(), Some(seq), ts)?;
        self.add(st.clone())?;
        Ok(st)
    }

    pub fn get(&self, seq: u64) -> Option<&Statement> {
        // Seqs are contiguous from 1.
        let idx = usize::try_from(seq.checked_sub(1)?).ok()?;
        self.statements.get(idx)
    }

    pub fn is_revoked(&self, seq: u64) -> bool {
        self.statements.iter().any(|s| s.revoke == Some(seq))
    }

    /// The last non-revoked statement of the given type.
    pub fn find_last(&self, statement_type: &str) -> Option<&Statement> {
        self.statements
            .iter()
            .rev()
            .filter(|s| !s.is_revoke() && s.statement_type == statement_type)
            .find(|s| !self.is_revoked(s.seq))
    }

    /// All non-revoked statements of the given type, oldest first.
    pub fn find_all(&self, statement_type: &str) -> Vec<&Statement> {
        self.statements
            .iter()
            .filter(|s| !s.is_revoke() && s.statement_type == statement_type)
            .filter(|s| !self.is_revoked(s.seq))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyproof_crypto::{derive_kid, keypair_from_seed};

    fn chain_with(key: &KeyPair, types: &[&str]) -> Sigchain {
        let mut sc = Sigchain::new(derive_kid(&key.public));
        for t in types {
            let st = Statement::sign(
                key,
                sc.last_seq() + 1,
                t,
                t.as_bytes().to_vec(),
                None,
                Timestamp::from_millis(1),
            )
            .unwrap();
            sc.add(st).unwrap();
        }
        sc
    }

    #[test]
    fn find_last_skips_revoked() {
        let key = keypair_from_seed(&[1u8; 32]);
        let mut sc = chain_with(&key, &["user", "note", "user"]);
        assert_eq!(sc.find_last("user").unwrap().seq, 3);

        sc.revoke(3, &key, Timestamp::from_millis(2)).unwrap();
        assert_eq!(sc.find_last("user").unwrap().seq, 1);
        assert_eq!(sc.find_all("user").len(), 1);

        sc.revoke(1, &key, Timestamp::from_millis(3)).unwrap();
        assert!(sc.find_last("user").is_none());
        assert_eq!(sc.last_seq(), 5);
    }

    #[test]
    fn seq_must_be_contiguous() {
        let key = keypair_from_seed(&[1u8; 32]);
        let mut sc = chain_with(&key, &["user"]);
        let st = Statement::sign(&key, 5, "user", Vec::new(), None, Timestamp::EPOCH).unwrap();
        assert!(matches!(
            sc.add(st),
            Err(SigchainError::InvalidSeq { expected: 2, got: 5 })
        ));
    }

    #[test]
    fn foreign_statements_are_rejected() {
        let key = keypair_from_seed(&[1u8; 32]);
        let other = keypair_from_seed(&[2u8; 32]);
        let mut sc = chain_with(&key, &[]);
        let st = Statement::sign(&other, 1, "user", Vec::new(), None, Timestamp::EPOCH).unwrap();
        assert!(matches!(sc.add(st), Err(SigchainError::KidMismatch { .. })));
    }

    #[test]
    fn revocation_rules() {
        let key = keypair_from_seed(&[1u8; 32]);
        let mut sc = chain_with(&key, &["user"]);
        assert!(matches!(
            sc.revoke(7, &key, Timestamp::EPOCH),
            Err(SigchainError::RevokeTargetMissing(7))
        ));
        sc.revoke(1, &key, Timestamp::EPOCH).unwrap();
        assert!(matches!(
            sc.revoke(1, &key, Timestamp::EPOCH),
            Err(SigchainError::AlreadyRevoked(1))
        ));
        assert!(matches!(
            sc.revoke(2, &key, Timestamp::EPOCH),
            Err(SigchainError::RevokeOfRevoke(2))
        ));
    }
}
