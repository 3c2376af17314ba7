//! SAML `IdP` module wiring.

use std::sync::Arc;

use saml_idp_sdk::{
    CapabilityRegistry, Clock, SamlIdpClient, SessionStore, SystemClock,
    UserAuthenticatorPluginClient,
};
use tracing::info;

use crate::config::SamlIdpConfig;
use crate::domain::{
    RedirectResumeCoordinator, RequirementResolver, SamlIdpLocalClient, Service, SsoArbiter,
};
use crate::infra::StaticCapabilityRegistry;

/// Collaborators the module is built from.
pub struct ModuleDeps {
    pub session_store: Arc<dyn SessionStore>,
    pub authenticator: Arc<dyn UserAuthenticatorPluginClient>,
    /// Defaults to a registry built from `requirements.capabilities`.
    pub registry: Option<Arc<dyn CapabilityRegistry>>,
    pub clock: Arc<dyn Clock>,
}

impl ModuleDeps {
    #[must_use]
    pub fn new(
        session_store: Arc<dyn SessionStore>,
        authenticator: Arc<dyn UserAuthenticatorPluginClient>,
    ) -> Self {
        Self {
            session_store,
            authenticator,
            registry: None,
            clock: Arc::new(SystemClock),
        }
    }

    #[must_use]
    pub fn with_registry(mut self, registry: Arc<dyn CapabilityRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

/// SAML `IdP` module.
///
/// Owns the pipeline service and exposes it as a [`SamlIdpClient`].
pub struct SamlIdpModule {
    service: Arc<Service>,
    client: Arc<dyn SamlIdpClient>,
}

impl SamlIdpModule {
    /// Validates `cfg` and wires the pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    #[tracing::instrument(skip_all, fields(resume_path = %cfg.redirect.resume_path))]
    pub fn init(cfg: &SamlIdpConfig, deps: ModuleDeps) -> anyhow::Result<Self> {
        cfg.validate()?;
        info!("Initializing saml_idp");

        let registry = deps
            .registry
            .unwrap_or_else(|| -> Arc<dyn CapabilityRegistry> {
                Arc::new(StaticCapabilityRegistry::new(
                    cfg.requirements.capabilities.clone(),
                ))
            });

        let resolver = RequirementResolver::from_config(&cfg.requirements, &registry);
        let arbiter = SsoArbiter::from_config(&cfg.sso, &deps.clock);
        info!(
            sources = ?resolver.source_names().collect::<Vec<_>>(),
            voters = ?arbiter.voter_names().collect::<Vec<_>>(),
            duration_limit = %humantime::format_duration(cfg.sso.duration_limit),
            "Configured requirement sources and SSO voters"
        );

        let coordinator = RedirectResumeCoordinator::new(
            deps.session_store,
            deps.clock,
            cfg.redirect.resume_path.trim(),
        );
        let service = Arc::new(Service::new(
            resolver,
            arbiter,
            coordinator,
            deps.authenticator,
        ));
        let client: Arc<dyn SamlIdpClient> = Arc::new(SamlIdpLocalClient::new(service.clone()));

        info!("saml_idp initialized");
        Ok(Self { service, client })
    }

    #[must_use]
    pub fn client(&self) -> Arc<dyn SamlIdpClient> {
        Arc::clone(&self.client)
    }

    #[must_use]
    pub fn service(&self) -> &Arc<Service> {
        &self.service
    }
}
