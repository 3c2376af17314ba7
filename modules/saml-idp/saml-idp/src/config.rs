//! Configuration for the SAML `IdP` decision core.

use std::collections::HashSet;
use std::hash::Hash;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, bail};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use saml_idp_sdk::ServiceCategory;
use serde::{Deserialize, Serialize};

/// Entity category whose requesters always need a fresh authentication.
pub const SIGSERVICE_CATEGORY: &str = "http://id.elegnamnden.se/st/1.0/sigservice";

/// Environment variable prefix; nested keys are separated by `__`.
pub const ENV_PREFIX: &str = "SAML_IDP__";

/// Configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SamlIdpConfig {
    pub sso: SsoConfig,
    pub requirements: RequirementsConfig,
    pub redirect: RedirectConfig,
}

/// SSO arbitration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SsoConfig {
    /// Maximum age of a prior authentication that may be reused.
    #[serde(with = "humantime_serde")]
    pub duration_limit: Duration,

    /// Voters consulted, in order.
    pub voters: Vec<VoterKind>,

    /// Entity categories whose requesters are never served from SSO.
    pub sso_exempt_categories: Vec<String>,
}

impl Default for SsoConfig {
    fn default() -> Self {
        Self {
            duration_limit: Duration::from_secs(60 * 60),
            voters: vec![
                VoterKind::Freshness,
                VoterKind::CapabilityRestriction,
                VoterKind::PrincipalSelection,
            ],
            sso_exempt_categories: vec![SIGSERVICE_CATEGORY.to_owned()],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoterKind {
    Freshness,
    CapabilityRestriction,
    PrincipalSelection,
}

/// Attribute requirement resolution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RequirementsConfig {
    /// Requirement sources, in merge order.
    pub sources: Vec<SourceKind>,

    /// Entity categories declared by this `IdP`.
    pub idp_entity_categories: Vec<String>,

    /// Service category definitions for the static registry.
    pub capabilities: Vec<ServiceCategory>,
}

impl Default for RequirementsConfig {
    fn default() -> Self {
        Self {
            sources: vec![
                SourceKind::Metadata,
                SourceKind::OasisExtension,
                SourceKind::EidasExtension,
                SourceKind::EntityCategory,
            ],
            idp_entity_categories: Vec::new(),
            capabilities: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Metadata,
    OasisExtension,
    EidasExtension,
    EntityCategory,
}

/// Redirect/resume settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RedirectConfig {
    /// Path the user agent returns to after external authentication.
    pub resume_path: String,
}

impl Default for RedirectConfig {
    fn default() -> Self {
        Self {
            resume_path: "/saml2/resume".to_owned(),
        }
    }
}

impl SamlIdpConfig {
    /// Loads configuration from defaults, then `path` (YAML) if given, then
    /// `SAML_IDP__*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a provider cannot be read, a value has the wrong
    /// shape, or validation fails.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file_exact(path));
        }
        let cfg: Self = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("failed to load saml_idp configuration")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// # Errors
    ///
    /// Returns an error if the resume path is not absolute or a voter or
    /// source is listed twice.
    pub fn validate(&self) -> anyhow::Result<()> {
        let resume_path = self.redirect.resume_path.trim();
        if !resume_path.starts_with('/') || resume_path.starts_with("//") {
            bail!(
                "redirect.resume_path must start with a single '/', got '{}'",
                self.redirect.resume_path
            );
        }
        if has_duplicates(&self.sso.voters) {
            bail!("sso.voters must not list a voter more than once");
        }
        if has_duplicates(&self.requirements.sources) {
            bail!("requirements.sources must not list a source more than once");
        }
        Ok(())
    }
}

fn has_duplicates<T: Eq + Hash>(items: &[T]) -> bool {
    let mut seen = HashSet::new();
    items.iter().any(|item| !seen.insert(item))
}

mod humantime_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
