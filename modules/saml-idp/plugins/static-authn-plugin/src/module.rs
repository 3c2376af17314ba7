//! Static authenticator plugin module.

use std::sync::Arc;

use anyhow::bail;
use saml_idp_sdk::UserAuthenticatorPluginClient;
use tracing::info;

use crate::config::{AuthnMode, StaticAuthnPluginConfig};
use crate::domain::Service;

/// Static authenticator plugin module.
pub struct StaticAuthnPlugin {
    service: Arc<Service>,
}

impl StaticAuthnPlugin {
    /// Validates `cfg` and builds the plugin.
    ///
    /// # Errors
    ///
    /// Returns an error if no authentication context is configured, or if
    /// `external` mode is used with a relative `authn_path`.
    pub fn init(cfg: &StaticAuthnPluginConfig) -> anyhow::Result<Self> {
        info!("Initializing static_authn_plugin");

        if cfg.supported_authn_contexts.is_empty() {
            bail!("supported_authn_contexts must not be empty");
        }
        if cfg.mode == AuthnMode::External && !cfg.authn_path.trim().starts_with('/') {
            bail!("authn_path must start with '/', got '{}'", cfg.authn_path);
        }
        if cfg.mode == AuthnMode::AcceptAll {
            tracing::warn!(
                "Static authn plugin is running in `accept_all` mode: \
                 every request is authenticated with a hardcoded identity. \
                 Do NOT use this mode in production."
            );
        }

        info!(
            mode = ?cfg.mode,
            supported_authn_contexts = cfg.supported_authn_contexts.len(),
            attribute_count = cfg.identity.attributes.len(),
            "Loaded plugin configuration"
        );

        Ok(Self {
            service: Arc::new(Service::from_config(cfg)),
        })
    }

    /// The plugin as an authenticator client.
    #[must_use]
    pub fn client(&self) -> Arc<dyn UserAuthenticatorPluginClient> {
        self.service.clone()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn default_config_initializes() {
        let plugin = StaticAuthnPlugin::init(&StaticAuthnPluginConfig::default()).unwrap();
        assert!(!plugin.client().supported_authn_contexts().is_empty());
    }

    #[test]
    fn external_mode_requires_absolute_path() {
        let cfg = StaticAuthnPluginConfig {
            mode: AuthnMode::External,
            authn_path: "extauth".to_owned(),
            ..StaticAuthnPluginConfig::default()
        };
        assert!(StaticAuthnPlugin::init(&cfg).is_err());
    }

    #[test]
    fn empty_context_list_is_rejected() {
        let cfg = StaticAuthnPluginConfig {
            supported_authn_contexts: vec![],
            ..StaticAuthnPluginConfig::default()
        };
        assert!(StaticAuthnPlugin::init(&cfg).is_err());
    }
}
