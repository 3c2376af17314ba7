//! Plugin API trait for user authenticator implementations.
//!
//! Authenticators perform the actual credential check. They either complete
//! the authentication in-process or ask the `IdP` to hand the user agent over
//! to an external path.

use async_trait::async_trait;

use crate::attributes::AttributeRequirementSet;
use crate::error::SamlIdpError;
use crate::models::{AuthnRequestContext, UserAuthentication};

/// What an authenticator did with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthenticatorOutcome {
    /// The user was authenticated.
    Completed(UserAuthentication),
    /// Authentication continues at `authn_path`; the result is committed later
    /// through [`crate::SamlIdpClient::complete_external`].
    ContinueExternally { authn_path: String },
}

/// Plugin API trait for user authenticators.
#[async_trait]
pub trait UserAuthenticatorPluginClient: Send + Sync {
    /// Authentication context URIs this authenticator can deliver.
    fn supported_authn_contexts(&self) -> Vec<String>;

    /// Authenticate the user for `context`.
    ///
    /// `context` carries only the authentication contexts that are both
    /// requested and supported.
    ///
    /// # Errors
    ///
    /// - `Status` for protocol-level failures (e.g. `AuthnFailed`)
    /// - `ServiceUnavailable` if the authenticator backend is down
    /// - `Internal` for unexpected errors
    async fn authenticate(
        &self,
        context: &AuthnRequestContext,
        requirements: &AttributeRequirementSet,
    ) -> Result<AuthenticatorOutcome, SamlIdpError>;
}
