//! Command implementations, separated from argument parsing so they can be
//! driven against nullable infrastructure in tests.

use anyhow::{bail, Context};
use keyproof_crypto::decode_kid;
use keyproof_http::{HttpClient, ReqwestClient};
use keyproof_sigchain::{DocumentSigchainStore, Sigchain, SigchainStore};
use keyproof_store::DocumentStore;
use keyproof_store_lmdb::LmdbDocumentStore;
use keyproof_types::{Clock, Kid, SystemClock};
use keyproof_users::{
    SearchRequest, SearchResult, ServiceRegistry, Status, User, UserResult, Users, UsersConfig,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// The engine and its sigchain store.
pub struct App {
    pub users: Users,
    pub sigchains: Arc<dyn SigchainStore>,
    pub config: UsersConfig,
}

impl App {
    /// Wire the engine over the LMDB data dir, the system clock and reqwest.
    pub fn open(config: UsersConfig) -> anyhow::Result<Self> {
        let store = LmdbDocumentStore::open(&config.data_dir).with_context(|| {
            format!("opening data dir {}", config.data_dir.display())
        })?;
        let http = ReqwestClient::new(config.http_timeout(), &config.user_agent);
        Ok(Self::with(
            Arc::new(store),
            Arc::new(http),
            Arc::new(SystemClock),
            config,
        ))
    }

    pub fn with(
        store: Arc<dyn DocumentStore>,
        http: Arc<dyn HttpClient>,
        clock: Arc<dyn Clock>,
        config: UsersConfig,
    ) -> Self {
        let sigchains: Arc<dyn SigchainStore> =
            Arc::new(DocumentSigchainStore::new(store.clone()));
        let registry = ServiceRegistry::production(config.service_options());
        let users = Users::new(store, sigchains.clone(), http, registry, clock, &config);
        Self {
            users,
            sigchains,
            config,
        }
    }
}

/// Parse and checksum-validate a key id.
pub fn parse_kid(s: &str) -> anyhow::Result<Kid> {
    decode_kid(s.trim()).with_context(|| format!("invalid key id {s:?}"))?;
    Ok(Kid::new(s.trim())?)
}

/// Dry-run a claim without touching the store.
pub async fn check(
    app: &App,
    kid: &str,
    service: &str,
    name: &str,
    url: &str,
) -> anyhow::Result<UserResult> {
    let user = User::new(app.users.registry(), parse_kid(kid)?, service, name, url, 0)?;
    Ok(app.users.verifier().verify(&user, None).await)
}

pub async fn update(app: &App, kid: &str) -> anyhow::Result<Option<UserResult>> {
    Ok(app.users.update(&parse_kid(kid)?).await?)
}

pub fn find(app: &App, kid: &str) -> anyhow::Result<Option<UserResult>> {
    Ok(app.users.find(&parse_kid(kid)?)?)
}

pub fn search(app: &App, query: &str, limit: usize) -> anyhow::Result<Vec<SearchResult>> {
    Ok(app
        .users
        .search(&SearchRequest::new(query).limit(limit))?)
}

pub fn status(app: &App, status: &str) -> anyhow::Result<Vec<Kid>> {
    let status: Status = status.parse().map_err(anyhow::Error::msg)?;
    Ok(app.users.status(status)?)
}

/// Validate a sigchain from JSON and store it. Statements are replayed one by
/// one so every signature and sequence rule is checked.
pub fn import(app: &App, json: &str) -> anyhow::Result<Kid> {
    let parsed: Sigchain = serde_json::from_str(json).context("parsing sigchain")?;
    let mut sigchain = Sigchain::new(parsed.kid().clone());
    for st in parsed.statements() {
        sigchain
            .add(st.clone())
            .with_context(|| format!("statement {}", st.seq))?;
    }

    if let Some(existing) = app.sigchains.sigchain(sigchain.kid())? {
        if existing.len() > sigchain.len() {
            bail!(
                "stored sigchain for {} has {} statements, import has {}",
                sigchain.kid(),
                existing.len(),
                sigchain.len()
            );
        }
        if existing.statements() != &sigchain.statements()[..existing.len()] {
            bail!("import does not extend the stored sigchain for {}", sigchain.kid());
        }
    }

    app.sigchains.save(&sigchain)?;
    info!(kid = %sigchain.kid(), statements = sigchain.len(), "imported sigchain");
    Ok(sigchain.kid().clone())
}

/// Re-check expired results every `interval` until `shutdown` resolves.
pub async fn sweep(
    app: &App,
    interval: Duration,
    shutdown: impl std::future::Future<Output = ()>,
) -> anyhow::Result<()> {
    tokio::pin!(shutdown);
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("sweep stopped");
                return Ok(());
            }
            _ = ticker.tick() => {
                let report = app
                    .users
                    .check_expired(app.config.stale_after(), app.config.max_age())
                    .await?;
                if !report.failed.is_empty() {
                    warn!(failed = report.failed.len(), "some updates failed");
                }
                info!(checked = report.checked.len(), "sweep pass done");
            }
        }
    }
}
