//! The user claim.

use keyproof_crypto::{armor, derive_kid, sign_attached};
use keyproof_types::{KeyPair, Kid};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::services::ServiceRegistry;
use crate::UsersError;

/// A claim that `kid` is `name` on `service`, proven at `url`.
///
/// The JSON encoding is compact with single-letter keys in a fixed order
/// (`k`, `n`, `sq`, `sr`, `u`) and empty or zero fields omitted. The same
/// encoding is signed into proofs, so field order is part of the format.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "k")]
    pub kid: Kid,
    #[serde(rename = "n", default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(rename = "sq", default, skip_serializing_if = "is_zero")]
    pub seq: u64,
    #[serde(rename = "sr", default, skip_serializing_if = "String::is_empty")]
    pub service: String,
    #[serde(rename = "u", default, skip_serializing_if = "String::is_empty")]
    pub url: String,
}

fn is_zero(n: &u64) -> bool {
    *n == 0
}

impl User {
    /// Build a claim anchored at sigchain position `seq`.
    ///
    /// The name and URL are normalized for the service and then validated.
    pub fn new(
        registry: &ServiceRegistry,
        kid: Kid,
        service: &str,
        name: &str,
        url: &str,
        seq: u64,
    ) -> Result<Self, UsersError> {
        let svc = registry
            .get(service)
            .ok_or_else(|| UsersError::UnknownService(service.to_string()))?;
        let name = svc.normalize_name(name);
        let url = svc.normalize_url(url)?;
        let user = User {
            kid,
            name,
            seq,
            service: svc.id().to_string(),
            url,
        };
        user.validate(registry)?;
        Ok(user)
    }

    /// Build the claim that gets signed into a proof, before the proof has
    /// been posted (so there is no URL or sigchain position yet).
    pub fn for_signing(
        registry: &ServiceRegistry,
        kid: Kid,
        service: &str,
        name: &str,
    ) -> Result<Self, UsersError> {
        let svc = registry
            .get(service)
            .ok_or_else(|| UsersError::UnknownService(service.to_string()))?;
        let name = svc.normalize_name(name);
        svc.validate_name(&name)?;
        Ok(User {
            kid,
            name,
            seq: 0,
            service: svc.id().to_string(),
            url: String::new(),
        })
    }

    /// `name@service`.
    pub fn id(&self) -> String {
        format!("{}@{}", self.name, self.service)
    }

    /// Check the claim against the service rules: known service, name
    /// already normalized and valid, URL valid for the name.
    pub fn validate(&self, registry: &ServiceRegistry) -> Result<(), UsersError> {
        let svc = registry
            .get(&self.service)
            .ok_or_else(|| UsersError::UnknownService(self.service.clone()))?;
        if svc.normalize_name(&self.name) != self.name {
            return Err(UsersError::InvalidStatement(format!(
                "name {:?} is not normalized",
                self.name
            )));
        }
        svc.validate_name(&self.name)?;
        svc.validate_url(&self.name, &self.url)?;
        Ok(())
    }

    /// Fields a signed proof must agree on.
    pub fn matches_proof(&self, signed: &User) -> bool {
        self.kid == signed.kid && self.service == signed.service && self.name == signed.name
    }

    pub fn to_json(&self) -> Result<Vec<u8>, UsersError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, UsersError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{} ({})", self.name, self.service, self.kid)
    }
}

/// Sign `user` with `key` and armor it for posting on the service.
pub fn sign_user(key: &KeyPair, user: &User) -> Result<String, UsersError> {
    let kid = derive_kid(&key.public);
    if kid != user.kid {
        return Err(UsersError::KidMismatch {
            expected: user.kid.clone(),
            got: kid,
        });
    }
    let signed = sign_attached(&user.to_json()?, &key.private);
    Ok(armor(&signed, None))
}
