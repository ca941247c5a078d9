//! Checking a single claim.

use keyproof_http::HttpClient;
use keyproof_types::Clock;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::proof::verify_content;
use crate::services::{Failure, ServiceRegistry};
use crate::{Status, User, UserResult};

/// Runs the full check of a claim: validate, fetch, verify.
///
/// Has no side effects beyond HTTP requests, so it doubles as a dry-run
/// checker for claims that are not in any sigchain yet.
#[derive(Clone)]
pub struct Verifier {
    registry: Arc<ServiceRegistry>,
    http: Arc<dyn HttpClient>,
    clock: Arc<dyn Clock>,
    timeout: Duration,
}

impl Verifier {
    pub fn new(
        registry: Arc<ServiceRegistry>,
        http: Arc<dyn HttpClient>,
        clock: Arc<dyn Clock>,
        timeout: Duration,
    ) -> Self {
        Self {
            registry,
            http,
            clock,
            timeout,
        }
    }

    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    /// Check `user`, starting from what `prior` knew about the last
    /// successful verification.
    pub async fn verify(&self, user: &User, prior: Option<&UserResult>) -> UserResult {
        let mut result = UserResult::carry_forward(user.clone(), prior);
        result.stamp(self.clock.now());

        let outcome = match tokio::time::timeout(self.timeout, self.check(user)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(Failure::new(Status::ConnectionFail, "request timed out")),
        };

        match outcome {
            Ok(statement) => {
                debug!(user = %user, "proof verified");
                result.status = Status::Ok;
                result.statement = statement;
                result.vts = self.clock.now();
            }
            Err(failure) => {
                debug!(user = %user, status = %failure.status, err = %failure.message, "proof check failed");
                result.status = failure.status;
                result.err = failure.message;
            }
        }
        result
    }

    /// Validate, fetch and verify. Returns the canonical statement.
    pub async fn check(&self, user: &User) -> Result<String, Failure> {
        let service = self.registry.get(&user.service).ok_or_else(|| {
            Failure::new(Status::Failure, format!("unsupported service {:?}", user.service))
        })?;
        user.validate(&self.registry)
            .map_err(|e| Failure::new(Status::Failure, e.to_string()))?;
        let location = service
            .validate_url(&user.name, &user.url)
            .map_err(|e| Failure::new(Status::Failure, e.to_string()))?;

        let body = service
            .request(self.http.as_ref(), self.registry.options(), user, &location)
            .await?;
        verify_content(&body, user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{echo_url, ServiceOptions};
    use crate::user::sign_user;
    use keyproof_crypto::{derive_kid, keypair_from_seed};
    use keyproof_nullables::{NullClock, NullHttpClient};
    use keyproof_types::Timestamp;

    fn verifier(http: Arc<NullHttpClient>, clock: Arc<NullClock>) -> Verifier {
        Verifier::new(
            Arc::new(ServiceRegistry::with_test_services(ServiceOptions::default())),
            http,
            clock,
            Duration::from_secs(10),
        )
    }

    fn echo_user(seed: u8) -> User {
        let key = keypair_from_seed(&[seed; 32]);
        let registry = ServiceRegistry::with_test_services(ServiceOptions::default());
        let signing =
            User::for_signing(&registry, derive_kid(&key.public), "echo", "alice").unwrap();
        let msg = sign_user(&key, &signing).unwrap();
        User {
            seq: 1,
            url: echo_url("alice", &msg),
            ..signing
        }
    }

    #[tokio::test]
    async fn success_sets_statement_and_vts() {
        let clock = Arc::new(NullClock::new(Timestamp::from_secs(5_000)));
        let v = verifier(Arc::new(NullHttpClient::new()), clock.clone());
        let user = echo_user(1);

        let result = v.verify(&user, None).await;
        assert_eq!(result.status, Status::Ok, "{}", result.err);
        assert!(result.statement.starts_with("BEGIN MESSAGE."));
        assert_eq!(result.ts, Timestamp::from_secs(5_000));
        assert_eq!(result.vts, Timestamp::from_secs(5_000));
        assert!(result.err.is_empty());
    }

    #[tokio::test]
    async fn verification_is_deterministic() {
        let clock = Arc::new(NullClock::new(Timestamp::from_secs(5_000)));
        let v = verifier(Arc::new(NullHttpClient::new()), clock);
        let user = echo_user(1);
        let first = v.verify(&user, None).await;
        let second = v.verify(&user, Some(&first)).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn failure_keeps_prior_verification() {
        let clock = Arc::new(NullClock::new(Timestamp::from_secs(5_000)));
        let http = Arc::new(NullHttpClient::new());
        let v = verifier(http.clone(), clock.clone());

        let key = keypair_from_seed(&[3u8; 32]);
        let user = User {
            kid: derive_kid(&key.public),
            name: "alice".to_string(),
            seq: 1,
            service: "github".to_string(),
            url: "https://gist.github.com/alice/1".to_string(),
        };
        let prior = UserResult {
            status: Status::Ok,
            statement: "BEGIN MESSAGE. old. END MESSAGE.".to_string(),
            vts: Timestamp::from_secs(4_000),
            ts: Timestamp::from_secs(4_000),
            ..UserResult::new(user.clone())
        };

        clock.advance(Duration::from_secs(60));
        http.set_error("", keyproof_http::HttpError::Timeout);
        let result = v.verify(&user, Some(&prior)).await;
        assert_eq!(result.status, Status::ConnectionFail);
        assert_eq!(result.vts, prior.vts);
        assert_eq!(result.statement, prior.statement);
        assert_eq!(result.ts, Timestamp::from_secs(5_060));
        assert!(!result.err.is_empty());
    }

    #[tokio::test]
    async fn invalid_claim_fails_without_network() {
        let clock = Arc::new(NullClock::default());
        let http = Arc::new(NullHttpClient::new());
        let v = verifier(http.clone(), clock);
        let mut user = echo_user(1);
        user.service = "myspace".to_string();

        let result = v.verify(&user, None).await;
        assert_eq!(result.status, Status::Failure);
        assert!(http.requests().is_empty());
    }
}
