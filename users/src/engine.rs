//! The users engine.
//!
//! Keeps `/kid/<kid>` and the derived identity indexes in line with each
//! key's current claim and the latest proof check. Index writes are not
//! transactional; the kid record wins, and [`Users::reindex`] or another
//! [`Users::update`] repairs derived entries.

use keyproof_crypto::is_valid_kid;
use keyproof_http::HttpClient;
use keyproof_sigchain::SigchainStore;
use keyproof_store::DocumentStore;
use keyproof_types::{Clock, Kid};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::index::{Index, IndexDocument};
use crate::proof::verify_content;
use crate::services::ServiceRegistry;
use crate::statement::{user_from_statement, USER_STATEMENT_TYPE};
use crate::{
    SearchRequest, SearchResult, Status, User, UserResult, UsersConfig, UsersError, Verifier,
};

/// Outcome of [`Users::check_expired`].
#[derive(Debug, Default)]
pub struct SweepReport {
    /// Kids that were updated.
    pub checked: Vec<Kid>,
    /// Kids whose update returned an error, with the error.
    pub failed: Vec<(Kid, String)>,
}

pub struct Users {
    index: Index,
    sigchains: Arc<dyn SigchainStore>,
    verifier: Verifier,
    clock: Arc<dyn Clock>,
    grace_period: Duration,
    search_limit: usize,
}

impl Users {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        sigchains: Arc<dyn SigchainStore>,
        http: Arc<dyn HttpClient>,
        registry: ServiceRegistry,
        clock: Arc<dyn Clock>,
        config: &UsersConfig,
    ) -> Self {
        let verifier = Verifier::new(
            Arc::new(registry),
            http,
            clock.clone(),
            config.http_timeout(),
        );
        Self {
            index: Index::new(store),
            sigchains,
            verifier,
            clock,
            grace_period: config.grace_period(),
            search_limit: config.search_limit,
        }
    }

    pub fn verifier(&self) -> &Verifier {
        &self.verifier
    }

    pub fn registry(&self) -> &ServiceRegistry {
        self.verifier.registry()
    }

    /// The claim currently anchored in `kid`'s sigchain: the last
    /// non-revoked `user` statement.
    pub fn current_user(&self, kid: &Kid) -> Result<Option<User>, UsersError> {
        let Some(sigchain) = self.sigchains.sigchain(kid)? else {
            return Ok(None);
        };
        sigchain
            .find_last(USER_STATEMENT_TYPE)
            .map(user_from_statement)
            .transpose()
    }

    /// Re-check `kid`'s current claim and bring the indexes in line.
    ///
    /// Returns `None` if the key has no claim, in which case any previous
    /// claim is removed from the indexes.
    pub async fn update(&self, kid: &Kid) -> Result<Option<UserResult>, UsersError> {
        debug!(%kid, "updating");
        let user = self.current_user(kid)?;
        let record = self.index.get_kid(kid)?;
        let prior = record.as_ref().and_then(|d| d.result.clone());

        let Some(user) = user else {
            if let Some(prior) = &prior {
                if self.index.unindex(kid, &prior.user)? {
                    info!(%kid, user = %prior.user.id(), "claim removed, unindexed");
                }
            }
            if record.is_some() {
                self.index.put_kid(&IndexDocument::new(kid.clone(), None))?;
            }
            return Ok(None);
        };

        let result = self.verifier.verify(&user, prior.as_ref()).await;
        self.save(kid, prior.as_ref(), &result)?;
        Ok(Some(result))
    }

    /// Accept a result checked elsewhere (e.g. by a server that holds API
    /// credentials). The result must be for `kid`'s current claim.
    pub fn check_proxied(&self, kid: &Kid, proxied: UserResult) -> Result<UserResult, UsersError> {
        let user = self
            .current_user(kid)?
            .ok_or_else(|| UsersError::NoClaim(kid.clone()))?;
        if user != proxied.user {
            return Err(UsersError::ProxyMismatch(kid.clone()));
        }
        let prior = self.index.get_kid(kid)?.and_then(|d| d.result);

        let mut result = UserResult::carry_forward(user, prior.as_ref());
        result.stamp(self.clock.now());
        result.proxied = true;
        result.status = proxied.status;
        result.err = proxied.err;
        if proxied.status == Status::Ok {
            match verify_content(proxied.statement.as_bytes(), &result.user) {
                Ok(statement) => {
                    result.statement = statement;
                    result.vts = proxied.vts;
                }
                Err(failure) => {
                    result.status = failure.status;
                    result.err = failure.message;
                }
            }
        }

        self.save(kid, prior.as_ref(), &result)?;
        Ok(result)
    }

    /// Persist `result` as `kid`'s record and update the derived entries.
    fn save(
        &self,
        kid: &Kid,
        prior: Option<&UserResult>,
        result: &UserResult,
    ) -> Result<(), UsersError> {
        self.index
            .put_kid(&IndexDocument::new(kid.clone(), Some(result.clone())))?;
        self.apply_index(kid, result)?;

        if let Some(prior) = prior {
            if prior.user.id() != result.user.id() && self.index.unindex(kid, &prior.user)? {
                info!(%kid, old = %prior.user.id(), new = %result.user.id(), "identity changed, unindexed old");
            }
        }
        Ok(())
    }

    /// Index or unindex `result` according to its status. Returns whether it
    /// is indexed.
    fn apply_index(&self, kid: &Kid, result: &UserResult) -> Result<bool, UsersError> {
        if result.status == Status::ConnectionFail {
            warn!(%kid, user = %result.user.id(), err = %result.err, "connection failure");
        }
        if result.is_indexable(self.clock.now(), self.grace_period) {
            let searchable = self
                .registry()
                .get(&result.user.service)
                .is_some_and(|s| s.searchable());
            self.index.index(kid, result, searchable)?;
            debug!(%kid, user = %result.user.id(), status = %result.status, "indexed");
            Ok(true)
        } else {
            if self.index.unindex(kid, &result.user)? {
                info!(%kid, user = %result.user.id(), status = %result.status, "unindexed");
            }
            Ok(false)
        }
    }

    /// The stored result for `kid`. Falls back to the related key once.
    pub fn find(&self, kid: &Kid) -> Result<Option<UserResult>, UsersError> {
        if let Some(result) = self.get(kid)? {
            return Ok(Some(result));
        }
        match self.sigchains.related_key(kid)? {
            Some(related) if &related != kid => self.get(&related),
            _ => Ok(None),
        }
    }

    /// The stored result for `kid`, without following related keys.
    pub fn get(&self, kid: &Kid) -> Result<Option<UserResult>, UsersError> {
        Ok(self.index.get_kid(kid)?.and_then(|d| d.result))
    }

    /// Kids whose last check is older than `stale_after`, excluding results
    /// last verified more than `max_age` ago.
    pub fn expired(&self, stale_after: Duration, max_age: Duration) -> Result<Vec<Kid>, UsersError> {
        let now = self.clock.now();
        Ok(self
            .index
            .kid_documents()?
            .into_iter()
            .filter_map(|doc| {
                let result = doc.result?;
                (result.is_timestamp_expired(now, stale_after)
                    && !result.is_verify_expired(now, max_age))
                .then_some(doc.kid)
            })
            .collect())
    }

    /// Update every expired kid. Errors are collected, not returned.
    pub async fn check_expired(
        &self,
        stale_after: Duration,
        max_age: Duration,
    ) -> Result<SweepReport, UsersError> {
        let kids = self.expired(stale_after, max_age)?;
        debug!(count = kids.len(), "checking expired");
        let mut report = SweepReport::default();
        for kid in kids {
            match self.update(&kid).await {
                Ok(_) => report.checked.push(kid),
                Err(e) => {
                    warn!(%kid, error = %e, "update failed");
                    report.failed.push((kid, e.to_string()));
                }
            }
        }
        Ok(report)
    }

    /// Kids whose stored result has `status`.
    pub fn status(&self, status: Status) -> Result<Vec<Kid>, UsersError> {
        Ok(self
            .index
            .kid_documents()?
            .into_iter()
            .filter(|doc| doc.result.as_ref().is_some_and(|r| r.status == status))
            .map(|doc| doc.kid)
            .collect())
    }

    /// Look up a key id exactly, or search identities by prefix.
    pub fn search(&self, req: &SearchRequest) -> Result<Vec<SearchResult>, UsersError> {
        let query = req.query.trim();
        if is_valid_kid(query) {
            let Ok(kid) = Kid::new(query) else {
                return Ok(Vec::new());
            };
            return Ok(self
                .find(&kid)?
                .map(|result| SearchResult {
                    kid: result.user.kid.clone(),
                    result,
                })
                .into_iter()
                .collect());
        }

        let limit = match req.limit {
            0 => self.search_limit,
            n => n.min(self.search_limit),
        };
        Ok(self
            .index
            .search(&query.to_lowercase(), limit)?
            .into_iter()
            .filter_map(|doc| {
                Some(SearchResult {
                    kid: doc.kid,
                    result: doc.result?,
                })
            })
            .collect())
    }

    /// Look up an indexed identity, `name@service`.
    pub fn user(&self, id: &str) -> Result<Option<SearchResult>, UsersError> {
        let Some((name, service)) = id.rsplit_once('@') else {
            return Ok(None);
        };
        let Some(svc) = self.registry().get(service) else {
            return Err(UsersError::UnknownService(service.to_string()));
        };
        let id = format!("{}@{}", svc.normalize_name(name), svc.id());
        Ok(self.index.get_user(&id)?.and_then(|doc| {
            Some(SearchResult {
                kid: doc.kid,
                result: doc.result?,
            })
        }))
    }

    /// Another kid that already holds an indexed claim to `user`'s identity.
    pub fn check_for_existing(&self, user: &User) -> Result<Option<Kid>, UsersError> {
        Ok(self
            .index
            .get_user(&user.id())?
            .map(|doc| doc.kid)
            .filter(|kid| kid != &user.kid))
    }

    /// Re-apply index decisions to every kid record. Returns how many
    /// results are indexed afterwards.
    pub fn reindex(&self) -> Result<usize, UsersError> {
        let mut indexed = 0;
        for doc in self.index.kid_documents()? {
            if let Some(result) = &doc.result {
                if self.apply_index(&doc.kid, result)? {
                    indexed += 1;
                }
            }
        }
        info!(indexed, "reindexed");
        Ok(indexed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{echo_url, ServiceOptions};
    use crate::statement::user_statement;
    use crate::user::sign_user;
    use keyproof_crypto::{derive_kid, keypair_from_seed, related_x25519_kid};
    use keyproof_nullables::{NullClock, NullDocumentStore, NullHttpClient};
    use keyproof_sigchain::{DocumentSigchainStore, Sigchain};
    use keyproof_types::{KeyPair, Timestamp};

    struct Harness {
        users: Users,
        store: Arc<NullDocumentStore>,
        sigchains: Arc<DocumentSigchainStore<Arc<NullDocumentStore>>>,
        clock: Arc<NullClock>,
    }

    fn harness() -> Harness {
        let store = Arc::new(NullDocumentStore::new());
        let sigchains = Arc::new(DocumentSigchainStore::new(store.clone()));
        let clock = Arc::new(NullClock::default());
        let users = Users::new(
            store.clone(),
            sigchains.clone(),
            Arc::new(NullHttpClient::new()),
            ServiceRegistry::with_test_services(ServiceOptions::default()),
            clock.clone(),
            &UsersConfig::default(),
        );
        Harness {
            users,
            store,
            sigchains,
            clock,
        }
    }

    fn link_echo(h: &Harness, key: &KeyPair, name: &str) -> Kid {
        let kid = derive_kid(&key.public);
        let mut sc = h
            .sigchains
            .sigchain(&kid)
            .unwrap()
            .unwrap_or_else(|| Sigchain::new(kid.clone()));
        let signing = User::for_signing(h.users.registry(), kid.clone(), "echo", name).unwrap();
        let msg = sign_user(key, &signing).unwrap();
        let user = User::new(
            h.users.registry(),
            kid.clone(),
            "echo",
            name,
            &echo_url(name, &msg),
            sc.last_seq() + 1,
        )
        .unwrap();
        sc.add(user_statement(&sc, key, &user, h.clock.now()).unwrap())
            .unwrap();
        h.sigchains.save(&sc).unwrap();
        kid
    }

    #[tokio::test]
    async fn echo_claims_are_indexed_but_not_searchable() {
        let h = harness();
        let key = keypair_from_seed(&[1u8; 32]);
        let kid = link_echo(&h, &key, "alice");

        let result = h.users.update(&kid).await.unwrap().unwrap();
        assert_eq!(result.status, Status::Ok, "{}", result.err);

        let found = h.users.user("alice@echo").unwrap().unwrap();
        assert_eq!(found.kid, kid);
        assert!(h
            .users
            .search(&SearchRequest::new("alice"))
            .unwrap()
            .is_empty());
        assert_eq!(h.users.status(Status::Ok).unwrap(), vec![kid]);
    }

    #[tokio::test]
    async fn key_without_claim_has_no_result() {
        let h = harness();
        let key = keypair_from_seed(&[1u8; 32]);
        let kid = derive_kid(&key.public);
        assert_eq!(h.users.update(&kid).await.unwrap(), None);
        assert_eq!(h.users.find(&kid).unwrap(), None);
    }

    #[tokio::test]
    async fn find_follows_the_related_key() {
        let h = harness();
        let key = keypair_from_seed(&[1u8; 32]);
        let kid = link_echo(&h, &key, "alice");
        h.users.update(&kid).await.unwrap();

        let bx = related_x25519_kid(&kid).unwrap();
        let found = h.users.find(&bx).unwrap().unwrap();
        assert_eq!(found.user.kid, kid);
        assert_eq!(h.users.get(&bx).unwrap(), None);

        let hits = h.users.search(&SearchRequest::new(bx.as_str())).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].kid, kid);
    }

    #[tokio::test]
    async fn expired_respects_stale_and_max_age() {
        let h = harness();
        let key = keypair_from_seed(&[1u8; 32]);
        let kid = link_echo(&h, &key, "alice");
        h.users.update(&kid).await.unwrap();

        let day = Duration::from_secs(86_400);
        assert!(h.users.expired(day, 60 * day).unwrap().is_empty());

        h.clock.advance(2 * day);
        assert_eq!(h.users.expired(day, 60 * day).unwrap(), vec![kid.clone()]);
        // Verified longer ago than max_age: excluded.
        assert!(h.users.expired(day, day).unwrap().is_empty());

        let report = h.users.check_expired(day, 60 * day).await.unwrap();
        assert_eq!(report.checked, vec![kid]);
        assert!(report.failed.is_empty());
        assert!(h.users.expired(day, 60 * day).unwrap().is_empty());
    }

    #[tokio::test]
    async fn never_verified_claim_stops_expiring_after_max_age() {
        let h = harness();
        let key = keypair_from_seed(&[3u8; 32]);
        let kid = derive_kid(&key.public);
        let mut sc = Sigchain::new(kid.clone());
        let user = User::new(
            h.users.registry(),
            kid.clone(),
            "echo",
            "alice",
            &echo_url("alice", "no proof here"),
            1,
        )
        .unwrap();
        sc.add(user_statement(&sc, &key, &user, h.clock.now()).unwrap())
            .unwrap();
        h.sigchains.save(&sc).unwrap();

        let first = h.users.update(&kid).await.unwrap().unwrap();
        assert_eq!(first.status, Status::ContentNotFound);
        assert!(first.vts.is_zero());

        let day = Duration::from_secs(86_400);
        h.clock.advance(2 * day);
        assert_eq!(h.users.expired(day, 60 * day).unwrap(), vec![kid.clone()]);
        let report = h.users.check_expired(day, 60 * day).await.unwrap();
        assert_eq!(report.checked, vec![kid.clone()]);
        assert_eq!(h.users.get(&kid).unwrap().unwrap().cts, first.cts);

        h.clock.advance(365 * day);
        assert!(h.users.expired(day, 60 * day).unwrap().is_empty());
    }

    #[tokio::test]
    async fn existing_claim_by_another_key_is_reported() {
        let h = harness();
        let alice = keypair_from_seed(&[1u8; 32]);
        let kid = link_echo(&h, &alice, "alice");
        h.users.update(&kid).await.unwrap();

        let mallory = keypair_from_seed(&[2u8; 32]);
        let claim =
            User::for_signing(h.users.registry(), derive_kid(&mallory.public), "echo", "alice")
                .unwrap();
        assert_eq!(h.users.check_for_existing(&claim).unwrap(), Some(kid.clone()));

        let own = User::for_signing(h.users.registry(), kid, "echo", "alice").unwrap();
        assert_eq!(h.users.check_for_existing(&own).unwrap(), None);
    }

    #[tokio::test]
    async fn proxied_result_must_match_claim() {
        let h = harness();
        let key = keypair_from_seed(&[1u8; 32]);
        let kid = link_echo(&h, &key, "alice");
        let user = h.users.current_user(&kid).unwrap().unwrap();
        let checked = h.users.verifier().verify(&user, None).await;

        h.clock.advance(Duration::from_secs(30));
        let result = h.users.check_proxied(&kid, checked.clone()).unwrap();
        assert!(result.proxied);
        assert_eq!(result.status, Status::Ok);
        assert_eq!(result.vts, checked.vts);
        assert_eq!(result.ts, h.clock.now());
        assert!(h.users.user("alice@echo").unwrap().is_some());

        let mut wrong = checked;
        wrong.user.name = "bob".to_string();
        assert!(matches!(
            h.users.check_proxied(&kid, wrong),
            Err(UsersError::ProxyMismatch(_))
        ));
    }

    #[tokio::test]
    async fn proxied_ok_with_bad_statement_is_rejected() {
        let h = harness();
        let key = keypair_from_seed(&[1u8; 32]);
        let kid = link_echo(&h, &key, "alice");
        let user = h.users.current_user(&kid).unwrap().unwrap();
        let forged = UserResult {
            status: Status::Ok,
            statement: "BEGIN MESSAGE. forged. END MESSAGE.".to_string(),
            vts: h.clock.now(),
            ..UserResult::new(user)
        };
        let result = h.users.check_proxied(&kid, forged).unwrap();
        assert_eq!(result.status, Status::StatementInvalid);
        assert!(h.users.user("alice@echo").unwrap().is_none());
    }

    #[tokio::test]
    async fn reindex_restores_missing_entries() {
        let h = harness();
        let key = keypair_from_seed(&[1u8; 32]);
        let kid = link_echo(&h, &key, "alice");
        h.users.update(&kid).await.unwrap();

        h.store.delete("/user/alice@echo").unwrap();
        assert!(h.users.user("alice@echo").unwrap().is_none());
        assert_eq!(h.users.reindex().unwrap(), 1);
        assert!(h.users.user("alice@echo").unwrap().is_some());
    }
}
