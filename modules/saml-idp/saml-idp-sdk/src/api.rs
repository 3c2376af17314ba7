//! Public API trait for the SAML `IdP` module.
//!
//! The binding layer drives requests through this trait; external
//! authenticators use it to read the pending request and to commit their
//! result.

use async_trait::async_trait;

use crate::error::{Saml2ErrorStatus, SamlIdpError};
use crate::models::{
    AuthnOutcome, AuthnRequestContext, ExternalAuthnResult, PendingRedirectToken,
    UserAuthentication,
};
use crate::session::SessionId;

/// Public API trait for the SAML `IdP` decision core.
///
/// ```ignore
/// let idp: Arc<dyn SamlIdpClient> = module.client();
///
/// match idp.authenticate(&session, &request, prior.as_ref()).await {
///     Ok(AuthnOutcome::Redirect(r)) => redirect_to(&r.location),
///     Ok(AuthnOutcome::Authenticated { .. }) => build_response(),
///     Err(SamlIdpError::Status(status)) => send_error_response(status),
///     Err(e) => show_error_page(e),
/// }
/// ```
#[async_trait]
pub trait SamlIdpClient: Send + Sync {
    /// Run the authentication pipeline for `request`.
    ///
    /// `prior` is the authentication currently held in the session, if any.
    ///
    /// # Errors
    ///
    /// - `Status(NoAuthnContext)` if no requested context is supported
    /// - `Status(PassiveAuthn)` if passive was requested and SSO was not possible
    /// - `Status(_)` for authenticator failures
    /// - `Internal` / `ServiceUnavailable` for collaborator failures
    async fn authenticate(
        &self,
        session: &SessionId,
        request: &AuthnRequestContext,
        prior: Option<&UserAuthentication>,
    ) -> Result<AuthnOutcome, SamlIdpError>;

    /// Continue a request after the user agent returned from an external
    /// authenticator.
    ///
    /// # Errors
    ///
    /// - `Unrecoverable(InvalidSession)` if no result or no pending request exists
    /// - `Status(_)` if the external authenticator reported a failure
    async fn resume(&self, session: &SessionId) -> Result<AuthnOutcome, SamlIdpError>;

    /// The request an external authenticator is expected to authenticate.
    ///
    /// # Errors
    ///
    /// Returns `Unrecoverable(InvalidSession)` if nothing is pending.
    async fn pending_request(&self, session: &SessionId)
    -> Result<PendingRedirectToken, SamlIdpError>;

    /// Commit the external authenticator's result and return the path the
    /// user agent should be sent back to.
    ///
    /// # Errors
    ///
    /// Returns `Unrecoverable(InvalidSession)` if nothing is pending.
    async fn complete_external(
        &self,
        session: &SessionId,
        result: ExternalAuthnResult,
    ) -> Result<String, SamlIdpError>;

    /// Commit a user cancellation. Shorthand for completing with
    /// [`Saml2ErrorStatus::Cancel`].
    ///
    /// # Errors
    ///
    /// Returns `Unrecoverable(InvalidSession)` if nothing is pending.
    async fn cancel_external(&self, session: &SessionId) -> Result<String, SamlIdpError> {
        self.complete_external(
            session,
            ExternalAuthnResult::Failure(Saml2ErrorStatus::Cancel.into()),
        )
        .await
    }

    /// Drop any pending request and result held for `session`.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be written.
    async fn clear(&self, session: &SessionId) -> Result<(), SamlIdpError>;
}
