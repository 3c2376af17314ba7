//! Authentication pipeline.

use std::sync::Arc;

use saml_idp_sdk::{
    AuthenticatorOutcome, AuthnOutcome, AuthnRequestContext, ExternalAuthnResult,
    PendingRedirectToken, SessionId, UserAuthentication, UserAuthenticatorPluginClient,
};
use tracing::info;

use super::DomainError;
use super::redirect::RedirectResumeCoordinator;
use super::requirements::RequirementResolver;
use super::sso::{SsoArbiter, SsoDecision};

/// Drives a request through requirement resolution, SSO arbitration and the
/// authenticator.
pub struct Service {
    resolver: RequirementResolver,
    arbiter: SsoArbiter,
    coordinator: RedirectResumeCoordinator,
    authenticator: Arc<dyn UserAuthenticatorPluginClient>,
}

impl Service {
    #[must_use]
    pub fn new(
        resolver: RequirementResolver,
        arbiter: SsoArbiter,
        coordinator: RedirectResumeCoordinator,
        authenticator: Arc<dyn UserAuthenticatorPluginClient>,
    ) -> Self {
        Self {
            resolver,
            arbiter,
            coordinator,
            authenticator,
        }
    }

    /// Authenticates `request`, reusing `prior` when the voters allow it.
    ///
    /// # Errors
    ///
    /// Protocol errors from arbitration or the authenticator, collaborator
    /// failures.
    #[tracing::instrument(
        skip_all,
        fields(request_id = %request.request_id(), requester = %request.requester())
    )]
    pub async fn authenticate(
        &self,
        session: &SessionId,
        request: &AuthnRequestContext,
        prior: Option<&UserAuthentication>,
    ) -> Result<AuthnOutcome, DomainError> {
        let requirements = self.resolver.resolve(request);
        let supported = self.authenticator.supported_authn_contexts();

        let authn_contexts = match self.arbiter.decide(prior, request, &supported)? {
            SsoDecision::Reuse(authentication) => {
                info!(
                    assurance_context = %authentication.assurance_context_uri,
                    "Reusing prior authentication"
                );
                return Ok(AuthnOutcome::Authenticated {
                    request: request.clone(),
                    authentication,
                    requirements,
                    sso: true,
                });
            }
            SsoDecision::Authenticate { authn_contexts } => authn_contexts,
        };

        let narrowed = request.with_authn_contexts(authn_contexts);
        match self.authenticator.authenticate(&narrowed, &requirements).await? {
            AuthenticatorOutcome::Completed(authentication) => {
                info!(
                    assurance_context = %authentication.assurance_context_uri,
                    "User authenticated"
                );
                Ok(AuthnOutcome::Authenticated {
                    request: request.clone(),
                    authentication,
                    requirements,
                    sso: false,
                })
            }
            AuthenticatorOutcome::ContinueExternally { authn_path } => {
                let instruction = self.coordinator.start(session, narrowed, &authn_path).await?;
                Ok(AuthnOutcome::Redirect(instruction))
            }
        }
    }

    /// Continues the suspended request of `session` with the committed
    /// external result.
    ///
    /// # Errors
    ///
    /// State errors if the session holds no consistent result, or the
    /// external failure as a protocol error.
    #[tracing::instrument(skip_all, fields(session = %session))]
    pub async fn resume(&self, session: &SessionId) -> Result<AuthnOutcome, DomainError> {
        let resumed = self.coordinator.resume(session).await?;
        let context = resumed.context;

        match resumed.result {
            ExternalAuthnResult::Success(authentication) => {
                info!(
                    request_id = %context.request_id(),
                    requester = %context.requester(),
                    assurance_context = %authentication.assurance_context_uri,
                    "External authentication succeeded"
                );
                let requirements = self.resolver.resolve(&context);
                Ok(AuthnOutcome::Authenticated {
                    request: context,
                    authentication,
                    requirements,
                    sso: false,
                })
            }
            ExternalAuthnResult::Failure(status) => {
                info!(
                    request_id = %context.request_id(),
                    requester = %context.requester(),
                    status = %status,
                    "External authentication failed"
                );
                Err(DomainError::Protocol(status))
            }
        }
    }

    /// # Errors
    ///
    /// State error if nothing is pending.
    pub async fn pending_request(
        &self,
        session: &SessionId,
    ) -> Result<PendingRedirectToken, DomainError> {
        self.coordinator.pending(session).await
    }

    /// # Errors
    ///
    /// State error if nothing is pending.
    pub async fn complete_external(
        &self,
        session: &SessionId,
        result: ExternalAuthnResult,
    ) -> Result<String, DomainError> {
        self.coordinator.complete(session, result).await
    }

    /// # Errors
    ///
    /// State error if nothing is pending.
    pub async fn cancel_external(&self, session: &SessionId) -> Result<String, DomainError> {
        self.coordinator.cancel(session).await
    }

    /// # Errors
    ///
    /// Session store errors.
    pub async fn clear(&self, session: &SessionId) -> Result<(), DomainError> {
        self.coordinator.clear(session).await
    }
}
