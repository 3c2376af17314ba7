//! Local (in-process) client for the SAML `IdP`.

use std::sync::Arc;

use async_trait::async_trait;
use saml_idp_sdk::{
    AuthnOutcome, AuthnRequestContext, ExternalAuthnResult, PendingRedirectToken, SamlIdpClient,
    SamlIdpError, SessionId, UserAuthentication,
};

use super::{DomainError, Service};

/// Local client wrapping the service.
pub struct SamlIdpLocalClient {
    svc: Arc<Service>,
}

impl SamlIdpLocalClient {
    #[must_use]
    pub fn new(svc: Arc<Service>) -> Self {
        Self { svc }
    }
}

fn log_and_convert(op: &str, e: DomainError) -> SamlIdpError {
    if let DomainError::Protocol(status) = &e {
        tracing::info!(operation = op, status = %status, "saml_idp request rejected");
    } else {
        tracing::error!(operation = op, error = ?e, "saml_idp call failed");
    }
    e.into()
}

#[async_trait]
impl SamlIdpClient for SamlIdpLocalClient {
    async fn authenticate(
        &self,
        session: &SessionId,
        request: &AuthnRequestContext,
        prior: Option<&UserAuthentication>,
    ) -> Result<AuthnOutcome, SamlIdpError> {
        self.svc
            .authenticate(session, request, prior)
            .await
            .map_err(|e| log_and_convert("authenticate", e))
    }

    async fn resume(&self, session: &SessionId) -> Result<AuthnOutcome, SamlIdpError> {
        self.svc
            .resume(session)
            .await
            .map_err(|e| log_and_convert("resume", e))
    }

    async fn pending_request(
        &self,
        session: &SessionId,
    ) -> Result<PendingRedirectToken, SamlIdpError> {
        self.svc
            .pending_request(session)
            .await
            .map_err(|e| log_and_convert("pending_request", e))
    }

    async fn complete_external(
        &self,
        session: &SessionId,
        result: ExternalAuthnResult,
    ) -> Result<String, SamlIdpError> {
        self.svc
            .complete_external(session, result)
            .await
            .map_err(|e| log_and_convert("complete_external", e))
    }

    async fn cancel_external(&self, session: &SessionId) -> Result<String, SamlIdpError> {
        self.svc
            .cancel_external(session)
            .await
            .map_err(|e| log_and_convert("cancel_external", e))
    }

    async fn clear(&self, session: &SessionId) -> Result<(), SamlIdpError> {
        self.svc
            .clear(session)
            .await
            .map_err(|e| log_and_convert("clear", e))
    }
}
