//! Sigchain persistence.

use keyproof_crypto::related_x25519_kid;
use keyproof_store::{path, DocumentStore, IterOptions};
use keyproof_types::Kid;
use serde::{Deserialize, Serialize};

use crate::{Sigchain, SigchainError};

/// Collection holding serialized sigchains, keyed by kid.
pub const SIGCHAIN_COLLECTION: &str = "sigchain";
/// Collection mapping derived key ids back to the signing key id.
pub const RELATED_COLLECTION: &str = "related";

/// Source of sigchains for the rest of the system.
pub trait SigchainStore: Send + Sync {
    /// The sigchain for a kid, `None` if none has been saved.
    fn sigchain(&self, kid: &Kid) -> Result<Option<Sigchain>, SigchainError>;

    /// Persist a sigchain, replacing any previous copy.
    fn save(&self, sigchain: &Sigchain) -> Result<(), SigchainError>;

    /// The signing key a derived key id belongs to (key rotation / X25519 redirect).
    fn related_key(&self, kid: &Kid) -> Result<Option<Kid>, SigchainError>;

    /// Every kid with a saved sigchain.
    fn kids(&self) -> Result<Vec<Kid>, SigchainError>;
}

#[derive(Serialize, Deserialize)]
struct Related {
    kid: Kid,
}

/// A [`SigchainStore`] backed by a document store.
///
/// Chains are stored as JSON at `/sigchain/<kid>`. Saving a chain for a
/// `kex_` key also records its X25519 key id at `/related/<kbx>`.
pub struct DocumentSigchainStore<S> {
    store: S,
}

impl<S: DocumentStore> DocumentSigchainStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn inner(&self) -> &S {
        &self.store
    }
}

impl<S: DocumentStore> SigchainStore for DocumentSigchainStore<S> {
    fn sigchain(&self, kid: &Kid) -> Result<Option<Sigchain>, SigchainError> {
        let Some(doc) = self.store.get(&path(&[SIGCHAIN_COLLECTION, kid.as_str()]))? else {
            return Ok(None);
        };
        let sc: Sigchain = serde_json::from_slice(&doc.data)
            .map_err(|e| SigchainError::Serialization(e.to_string()))?;
        Ok(Some(sc))
    }

    fn save(&self, sigchain: &Sigchain) -> Result<(), SigchainError> {
        let data = serde_json::to_vec(sigchain)
            .map_err(|e| SigchainError::Serialization(e.to_string()))?;
        self.store
            .set(&path(&[SIGCHAIN_COLLECTION, sigchain.kid().as_str()]), &data)?;

        if let Some(bx) = related_x25519_kid(sigchain.kid()) {
            let related = serde_json::to_vec(&Related {
                kid: sigchain.kid().clone(),
            })
            .map_err(|e| SigchainError::Serialization(e.to_string()))?;
            self.store
                .set(&path(&[RELATED_COLLECTION, bx.as_str()]), &related)?;
        }
        tracing::debug!(kid = %sigchain.kid(), len = sigchain.len(), "saved sigchain");
        Ok(())
    }

    fn related_key(&self, kid: &Kid) -> Result<Option<Kid>, SigchainError> {
        let Some(doc) = self.store.get(&path(&[RELATED_COLLECTION, kid.as_str()]))? else {
            return Ok(None);
        };
        let related: Related = serde_json::from_slice(&doc.data)
            .map_err(|e| SigchainError::Serialization(e.to_string()))?;
        Ok(Some(related.kid))
    }

    fn kids(&self) -> Result<Vec<Kid>, SigchainError> {
        self.store
            .documents(SIGCHAIN_COLLECTION, &IterOptions::new())?
            .map(|doc| {
                Kid::new(doc.id()).map_err(|e| SigchainError::Serialization(e.to_string()))
            })
            .collect()
    }
}
