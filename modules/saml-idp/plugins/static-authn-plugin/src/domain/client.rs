//! Client implementation for the static authenticator plugin.
//!
//! Implements `UserAuthenticatorPluginClient` using the domain service.

use async_trait::async_trait;
use saml_idp_sdk::{
    AttributeRequirementSet, AuthenticatorOutcome, AuthnRequestContext, Saml2ErrorStatus,
    SamlIdpError, UserAuthenticatorPluginClient,
};

use super::service::Service;

#[async_trait]
impl UserAuthenticatorPluginClient for Service {
    fn supported_authn_contexts(&self) -> Vec<String> {
        Service::supported_authn_contexts(self).to_vec()
    }

    async fn authenticate(
        &self,
        context: &AuthnRequestContext,
        _requirements: &AttributeRequirementSet,
    ) -> Result<AuthenticatorOutcome, SamlIdpError> {
        Service::authenticate(self, context)
            .ok_or_else(|| SamlIdpError::status(Saml2ErrorStatus::AuthnFailed))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use saml_idp_sdk::PeerMetadata;

    use super::*;
    use crate::config::{LOA3, StaticAuthnPluginConfig};

    #[tokio::test]
    async fn plugin_trait_accept_all_succeeds() {
        let service = Service::from_config(&StaticAuthnPluginConfig::default());
        let plugin: &dyn UserAuthenticatorPluginClient = &service;

        assert_eq!(plugin.supported_authn_contexts(), [LOA3]);
        let ctx = AuthnRequestContext::builder("_r", PeerMetadata::new("https://sp.example.com"))
            .requested_authn_contexts([LOA3])
            .build();
        let result = plugin
            .authenticate(&ctx, &AttributeRequirementSet::new())
            .await;
        assert!(matches!(result, Ok(AuthenticatorOutcome::Completed(_))));
    }

    #[tokio::test]
    async fn plugin_trait_no_context_fails() {
        let service = Service::from_config(&StaticAuthnPluginConfig::default());
        let plugin: &dyn UserAuthenticatorPluginClient = &service;

        let ctx =
            AuthnRequestContext::builder("_r", PeerMetadata::new("https://sp.example.com")).build();
        let result = plugin.authenticate(&ctx, &AttributeRequirementSet::new()).await;
        match result.unwrap_err() {
            SamlIdpError::Status(status) => {
                assert_eq!(status.status, Saml2ErrorStatus::AuthnFailed);
            }
            other => panic!("Expected Status, got: {other:?}"),
        }
    }
}
