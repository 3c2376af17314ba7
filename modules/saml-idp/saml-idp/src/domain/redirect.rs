//! Suspends a request while an external authenticator runs and resumes it
//! when the user agent returns.
//!
//! Per session there is at most one pending request (the input) and one
//! committed result:
//!
//! ```text
//! IDLE --start--> PENDING --complete/cancel--> RESOLVED --resume--> IDLE
//!  ^                 |                                                |
//!  +----clear--------+------------------------------------------------+
//! ```
//!
//! Starting again while pending overwrites the input and drops any result.

use std::sync::Arc;

use saml_idp_sdk::{
    AuthnRequestContext, Clock, ExternalAuthnResult, PendingRedirectToken, RedirectInstruction,
    ResumedAuthentication, Saml2ErrorStatus, SessionId, SessionStore,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use xxhash_rust::xxh3::xxh3_64;

use crate::domain::error::{DomainError, StateError};

pub const INPUT_KEY: &str = "saml_idp.external_authn.input";
pub const RESULT_KEY: &str = "saml_idp.external_authn.result";

const LOCK_STRIPES: u64 = 64;

pub struct RedirectResumeCoordinator {
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    resume_path: String,
    locks: Vec<Mutex<()>>,
}

impl RedirectResumeCoordinator {
    #[must_use]
    pub fn new(
        store: Arc<dyn SessionStore>,
        clock: Arc<dyn Clock>,
        resume_path: impl Into<String>,
    ) -> Self {
        Self {
            store,
            clock,
            resume_path: resume_path.into(),
            locks: (0..LOCK_STRIPES).map(|_| Mutex::new(())).collect(),
        }
    }

    fn lock_for(&self, session: &SessionId) -> &Mutex<()> {
        let stripe = usize::try_from(xxh3_64(session.as_str().as_bytes()) % LOCK_STRIPES)
            .unwrap_or_default();
        &self.locks[stripe]
    }

    /// Stores `context` as the pending request and returns where to send the
    /// user agent.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if `authn_path` is not an absolute path, or a
    /// session store error.
    pub async fn start(
        &self,
        session: &SessionId,
        context: AuthnRequestContext,
        authn_path: &str,
    ) -> Result<RedirectInstruction, DomainError> {
        let request_id = context.request_id().to_owned();
        let token =
            PendingRedirectToken::new(context, authn_path, &self.resume_path, self.clock.now())?;
        let instruction = RedirectInstruction::for_token(&token);

        let _guard = self.lock_for(session).lock().await;
        self.store.remove(session, RESULT_KEY).await?;
        self.put(session, INPUT_KEY, &token).await?;

        info!(
            %request_id,
            authn_path = %instruction.authn_path,
            "Redirecting to external authentication"
        );
        Ok(instruction)
    }

    /// The pending request for `session`.
    ///
    /// # Errors
    ///
    /// Returns `NoPendingAuthentication` if nothing is pending.
    pub async fn pending(&self, session: &SessionId) -> Result<PendingRedirectToken, DomainError> {
        self.fetch::<PendingRedirectToken>(session, INPUT_KEY)
            .await?
            .ok_or_else(|| StateError::NoPendingAuthentication.into())
    }

    /// Commits the external result and returns the path to resume at.
    ///
    /// # Errors
    ///
    /// Returns `NoPendingAuthentication` if nothing is pending.
    pub async fn complete(
        &self,
        session: &SessionId,
        result: ExternalAuthnResult,
    ) -> Result<String, DomainError> {
        let _guard = self.lock_for(session).lock().await;
        let Some(token) = self.fetch::<PendingRedirectToken>(session, INPUT_KEY).await? else {
            warn!("External authentication result committed without a pending request");
            return Err(StateError::NoPendingAuthentication.into());
        };
        self.put(session, RESULT_KEY, &result).await?;

        debug!(
            request_id = %token.context().request_id(),
            success = matches!(result, ExternalAuthnResult::Success(_)),
            "External authentication completed"
        );
        Ok(token.resume_path().to_owned())
    }

    /// Commits a user cancellation.
    ///
    /// # Errors
    ///
    /// Returns `NoPendingAuthentication` if nothing is pending.
    pub async fn cancel(&self, session: &SessionId) -> Result<String, DomainError> {
        self.complete(
            session,
            ExternalAuthnResult::Failure(Saml2ErrorStatus::Cancel.into()),
        )
        .await
    }

    /// Takes the committed result together with its pending request, leaving
    /// the session idle.
    ///
    /// # Errors
    ///
    /// - `NoResult` if nothing was committed
    /// - `ResultWithoutPendingToken` if a result exists but its request is
    ///   gone; the orphaned result is dropped
    pub async fn resume(&self, session: &SessionId) -> Result<ResumedAuthentication, DomainError> {
        let _guard = self.lock_for(session).lock().await;

        let Some(result) = self.fetch::<ExternalAuthnResult>(session, RESULT_KEY).await? else {
            warn!("Resume requested but no external authentication result exists");
            return Err(StateError::NoResult.into());
        };
        let Some(token) = self.fetch::<PendingRedirectToken>(session, INPUT_KEY).await? else {
            warn!("External authentication result exists without a pending request");
            self.store.remove(session, RESULT_KEY).await?;
            return Err(StateError::ResultWithoutPendingToken.into());
        };

        self.store.remove(session, RESULT_KEY).await?;
        self.store.remove(session, INPUT_KEY).await?;

        debug!(request_id = %token.context().request_id(), "Resuming suspended request");
        Ok(ResumedAuthentication {
            context: token.into_context(),
            result,
        })
    }

    /// Drops any pending request and result.
    ///
    /// # Errors
    ///
    /// Returns a session store error.
    pub async fn clear(&self, session: &SessionId) -> Result<(), DomainError> {
        let _guard = self.lock_for(session).lock().await;
        self.store.remove(session, INPUT_KEY).await?;
        self.store.remove(session, RESULT_KEY).await?;
        Ok(())
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        session: &SessionId,
        key: &str,
    ) -> Result<Option<T>, DomainError> {
        match self.store.get(session, key).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    async fn put<T: Serialize>(
        &self,
        session: &SessionId,
        key: &str,
        value: &T,
    ) -> Result<(), DomainError> {
        self.store
            .set(session, key, serde_json::to_value(value)?)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use saml_idp_sdk::{PeerMetadata, SamlIdpError, SystemClock, UserAuthentication};
    use tracing_test::traced_test;

    use super::*;
    use crate::infra::InMemorySessionStore;

    fn coordinator() -> (RedirectResumeCoordinator, Arc<InMemorySessionStore>) {
        let store = Arc::new(InMemorySessionStore::new());
        let coordinator =
            RedirectResumeCoordinator::new(store.clone(), Arc::new(SystemClock), "/saml2/resume");
        (coordinator, store)
    }

    fn request(id: &str) -> AuthnRequestContext {
        AuthnRequestContext::builder(id, PeerMetadata::new("https://sp.example.com"))
            .requested_authn_contexts(["http://id.elegnamnden.se/loa/1.0/loa3"])
            .build()
    }

    fn success(subject: &str) -> ExternalAuthnResult {
        ExternalAuthnResult::Success(UserAuthentication {
            subject_attributes: vec![
                saml_idp_sdk::UserAttribute::new("urn:oid:1.2.752.29.4.13").with_value(subject),
            ],
            assurance_context_uri: "http://id.elegnamnden.se/loa/1.0/loa3".to_owned(),
            authenticated_at: None,
            authenticating_authority: None,
            reusable: true,
        })
    }

    fn is_state(err: &DomainError, expected: StateError) -> bool {
        matches!(err, DomainError::State(s) if *s == expected)
    }

    #[tokio::test]
    async fn full_cycle_returns_original_request() {
        let (c, store) = coordinator();
        let session = SessionId::new("s1");

        let instruction = c.start(&session, request("_a"), "/extauth").await.unwrap();
        assert_eq!(instruction.location, "/extauth?resumeUrl=%2Fsaml2%2Fresume");
        assert_eq!(c.pending(&session).await.unwrap().context().request_id(), "_a");

        let resume_path = c.complete(&session, success("1")).await.unwrap();
        assert_eq!(resume_path, "/saml2/resume");

        let resumed = c.resume(&session).await.unwrap();
        assert_eq!(resumed.context.request_id(), "_a");
        assert_eq!(resumed.result, success("1"));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn complete_without_pending_is_state_error() {
        let (c, _) = coordinator();
        let err = c.complete(&SessionId::new("s1"), success("1")).await.unwrap_err();
        assert!(is_state(&err, StateError::NoPendingAuthentication));
    }

    #[tokio::test]
    async fn result_without_token_is_state_error() {
        let (c, store) = coordinator();
        let session = SessionId::new("s1");
        c.start(&session, request("_a"), "/extauth").await.unwrap();
        c.complete(&session, success("1")).await.unwrap();

        store.remove(&session, INPUT_KEY).await.unwrap();

        let err = c.resume(&session).await.unwrap_err();
        assert!(is_state(&err, StateError::ResultWithoutPendingToken));
        let public: SamlIdpError = err.into();
        assert!(matches!(public, SamlIdpError::Unrecoverable(_)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn resume_without_result_is_state_error() {
        let (c, _) = coordinator();
        let session = SessionId::new("s1");
        c.start(&session, request("_a"), "/extauth").await.unwrap();

        let err = c.resume(&session).await.unwrap_err();
        assert!(is_state(&err, StateError::NoResult));
        // the pending request is still there
        assert!(c.pending(&session).await.is_ok());
    }

    #[tokio::test]
    async fn second_start_discards_first() {
        let (c, _) = coordinator();
        let session = SessionId::new("s1");

        c.start(&session, request("_a"), "/extauth").await.unwrap();
        c.start(&session, request("_b"), "/extauth").await.unwrap();
        c.complete(&session, success("b")).await.unwrap();

        let resumed = c.resume(&session).await.unwrap();
        assert_eq!(resumed.context.request_id(), "_b");
        assert_eq!(resumed.result, success("b"));
    }

    #[tokio::test]
    async fn restart_clears_stale_result() {
        let (c, _) = coordinator();
        let session = SessionId::new("s1");

        c.start(&session, request("_a"), "/extauth").await.unwrap();
        c.complete(&session, success("a")).await.unwrap();
        c.start(&session, request("_b"), "/extauth").await.unwrap();

        let err = c.resume(&session).await.unwrap_err();
        assert!(is_state(&err, StateError::NoResult));
    }

    #[tokio::test]
    async fn cancel_commits_cancel_status() {
        let (c, _) = coordinator();
        let session = SessionId::new("s1");
        c.start(&session, request("_a"), "/extauth").await.unwrap();
        c.cancel(&session).await.unwrap();

        let resumed = c.resume(&session).await.unwrap();
        match resumed.result {
            ExternalAuthnResult::Failure(status) => {
                assert_eq!(status.status, Saml2ErrorStatus::Cancel);
            }
            ExternalAuthnResult::Success(_) => panic!("expected cancel"),
        }
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let (c, _) = coordinator();
        let a = SessionId::new("a");
        let b = SessionId::new("b");

        c.start(&a, request("_a"), "/extauth").await.unwrap();
        let err = c.complete(&b, success("b")).await.unwrap_err();
        assert!(is_state(&err, StateError::NoPendingAuthentication));
        assert!(c.pending(&a).await.is_ok());
    }

    #[tokio::test]
    async fn clear_returns_to_idle() {
        let (c, store) = coordinator();
        let session = SessionId::new("s1");
        c.start(&session, request("_a"), "/extauth").await.unwrap();
        c.complete(&session, success("a")).await.unwrap();

        c.clear(&session).await.unwrap();
        assert!(store.is_empty());
        assert!(c.pending(&session).await.is_err());
    }

    #[tokio::test]
    async fn abandoned_flow_is_dropped_with_the_session() {
        let (c, store) = coordinator();
        let session = SessionId::new("s1");
        c.start(&session, request("_a"), "/extauth").await.unwrap();
        assert_eq!(store.len(), 1);

        store.invalidate(&session);
        assert!(store.is_empty());
        let err = c.pending(&session).await.unwrap_err();
        assert!(is_state(&err, StateError::NoPendingAuthentication));
    }

    #[tokio::test]
    async fn relative_authn_path_is_rejected() {
        let (c, store) = coordinator();
        let err = c
            .start(&SessionId::new("s1"), request("_a"), "extauth")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Internal(_)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn tampered_pending_request_is_not_trusted() {
        let (c, store) = coordinator();
        let session = SessionId::new("s1");
        c.start(&session, request("_a"), "/extauth").await.unwrap();

        let mut stored = store.get(&session, INPUT_KEY).await.unwrap().unwrap();
        stored["resume_path"] = serde_json::json!("https://evil.example");
        store.set(&session, INPUT_KEY, stored).await.unwrap();

        let err = c.complete(&session, success("1")).await.unwrap_err();
        assert!(matches!(err, DomainError::Internal(_)));
        assert!(store.get(&session, RESULT_KEY).await.unwrap().is_none());
    }

    fn subject_of(result: &ExternalAuthnResult) -> Option<&str> {
        match result {
            ExternalAuthnResult::Success(auth) => auth
                .subject_attributes
                .first()?
                .values
                .first()
                .map(String::as_str),
            ExternalAuthnResult::Failure(_) => None,
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_flows_on_one_session_stay_consistent() {
        let (c, store) = coordinator();
        let c = Arc::new(c);
        let session = SessionId::new("shared");

        let tasks: Vec<_> = (0..8)
            .map(|task| {
                let c = Arc::clone(&c);
                let session = session.clone();
                tokio::spawn(async move {
                    for round in 0..25 {
                        let id = format!("_t{task}_{round}");
                        c.start(&session, request(&id), "/extauth").await.unwrap();
                        if let Err(err) = c.complete(&session, success(&id)).await {
                            // another task resumed in between
                            let expected = StateError::NoPendingAuthentication;
                            assert!(is_state(&err, expected), "{err}");
                        }
                        match c.resume(&session).await {
                            Ok(resumed) => {
                                assert!(resumed.context.request_id().starts_with("_t"));
                                let subject = subject_of(&resumed.result);
                                assert!(subject.is_some_and(|s| s.starts_with("_t")));
                            }
                            // another task restarted or resumed in between
                            Err(err) => assert!(is_state(&err, StateError::NoResult), "{err}"),
                        }
                    }
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap();
        }

        // a committed result never outlives its pending request
        let result = store.get(&session, RESULT_KEY).await.unwrap();
        let input = store.get(&session, INPUT_KEY).await.unwrap();
        assert!(result.is_none() || input.is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_sessions_resume_their_own_request() {
        let (c, store) = coordinator();
        let c = Arc::new(c);

        // more sessions than lock stripes
        let tasks: Vec<_> = (0..200)
            .map(|n| {
                let c = Arc::clone(&c);
                tokio::spawn(async move {
                    let session = SessionId::new(format!("s{n}"));
                    let id = format!("_r{n}");
                    c.start(&session, request(&id), "/extauth").await.unwrap();
                    c.complete(&session, success(&id)).await.unwrap();

                    let resumed = c.resume(&session).await.unwrap();
                    assert_eq!(resumed.context.request_id(), id);
                    assert_eq!(subject_of(&resumed.result), Some(id.as_str()));
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap();
        }
        assert!(store.is_empty());
    }

    #[tokio::test]
    #[traced_test]
    async fn orphaned_callback_is_logged() {
        let (c, _) = coordinator();
        assert!(c.complete(&SessionId::new("s1"), success("1")).await.is_err());
        assert!(logs_contain("without a pending request"));
    }
}
