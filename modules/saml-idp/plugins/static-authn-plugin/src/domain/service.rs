//! Service implementation for the static authenticator plugin.

use saml_idp_sdk::{AuthenticatorOutcome, AuthnRequestContext, UserAuthentication};
use time::OffsetDateTime;

use crate::config::{AuthnMode, IdentityConfig, StaticAuthnPluginConfig};

/// Static authenticator service.
///
/// - `accept_all`: every request is authenticated as the configured identity
/// - `external`: every request continues at the configured path
pub struct Service {
    mode: AuthnMode,
    supported_authn_contexts: Vec<String>,
    authn_path: String,
    identity: IdentityConfig,
}

impl Service {
    /// Create a service from plugin configuration.
    #[must_use]
    pub fn from_config(cfg: &StaticAuthnPluginConfig) -> Self {
        Self {
            mode: cfg.mode,
            supported_authn_contexts: cfg.supported_authn_contexts.clone(),
            authn_path: cfg.authn_path.trim().to_owned(),
            identity: cfg.identity.clone(),
        }
    }

    #[must_use]
    pub fn supported_authn_contexts(&self) -> &[String] {
        &self.supported_authn_contexts
    }

    /// Authenticate the request.
    ///
    /// Returns `None` in `accept_all` mode if the request allows no
    /// authentication context.
    #[must_use]
    pub fn authenticate(&self, context: &AuthnRequestContext) -> Option<AuthenticatorOutcome> {
        match self.mode {
            AuthnMode::AcceptAll => {
                let assurance = self.pick_assurance(context.requested_authn_contexts())?;
                Some(AuthenticatorOutcome::Completed(build_authentication(
                    &self.identity,
                    assurance,
                )))
            }
            AuthnMode::External => Some(AuthenticatorOutcome::ContinueExternally {
                authn_path: self.authn_path.clone(),
            }),
        }
    }

    fn pick_assurance<'a>(&'a self, allowed: &'a [String]) -> Option<&'a str> {
        match &self.identity.assurance_context_uri {
            Some(preferred) if allowed.contains(preferred) => Some(preferred.as_str()),
            _ => allowed.first().map(String::as_str),
        }
    }
}

fn build_authentication(identity: &IdentityConfig, assurance: &str) -> UserAuthentication {
    UserAuthentication {
        subject_attributes: identity.attributes.clone(),
        assurance_context_uri: assurance.to_owned(),
        authenticated_at: Some(OffsetDateTime::now_utc()),
        authenticating_authority: identity.authenticating_authority.clone(),
        reusable: identity.reusable,
    }
}
