//! LMDB environment setup.

use std::path::Path;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use crate::LmdbError;

/// Name of the database holding every document.
pub const DOCUMENTS_DB: &str = "documents";

/// Default map size: 1 GiB.
pub const DEFAULT_MAP_SIZE: usize = 1 << 30;

/// Wraps the LMDB environment and the documents database handle.
pub struct LmdbEnvironment {
    pub(crate) env: Arc<Env>,
    pub(crate) documents_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given path.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;
        // SAFETY: the environment is opened once per directory by this
        // process; callers must not open the same path twice concurrently.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(4)
                .open(path)?
        };
        let mut wtxn = env.write_txn()?;
        let documents_db: Database<Bytes, Bytes> =
            env.create_database(&mut wtxn, Some(DOCUMENTS_DB))?;
        wtxn.commit()?;
        tracing::debug!(path = %path.display(), "opened LMDB environment");

        Ok(Self {
            env: Arc::new(env),
            documents_db,
        })
    }

    pub fn env(&self) -> &Arc<Env> {
        &self.env
    }
}
