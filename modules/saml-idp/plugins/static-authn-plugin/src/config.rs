//! Configuration for the static authenticator plugin.

use saml_idp_sdk::UserAttribute;
use serde::Deserialize;

pub const LOA3: &str = "http://id.elegnamnden.se/loa/1.0/loa3";

/// Plugin configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StaticAuthnPluginConfig {
    /// Authentication mode.
    pub mode: AuthnMode,

    /// Authentication context URIs reported as supported.
    pub supported_authn_contexts: Vec<String>,

    /// External entry path used in `external` mode.
    pub authn_path: String,

    /// Identity returned in `accept_all` mode.
    pub identity: IdentityConfig,
}

impl Default for StaticAuthnPluginConfig {
    fn default() -> Self {
        Self {
            mode: AuthnMode::AcceptAll,
            supported_authn_contexts: vec![LOA3.to_owned()],
            authn_path: "/extauth".to_owned(),
            identity: IdentityConfig::default(),
        }
    }
}

/// Authentication mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuthnMode {
    /// Authenticate every request as the configured identity.
    #[default]
    AcceptAll,
    /// Hand every request over to `authn_path`.
    External,
}

/// Identity configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IdentityConfig {
    /// Released subject attributes.
    pub attributes: Vec<UserAttribute>,

    /// Preferred authentication context. When the request does not allow it
    /// the first allowed context is used instead.
    pub assurance_context_uri: Option<String>,

    pub authenticating_authority: Option<String>,

    /// Whether the authentication may be reused for SSO.
    pub reusable: bool,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            attributes: vec![
                UserAttribute::new("urn:oid:1.2.752.29.4.13")
                    .with_friendly_name("personalIdentityNumber")
                    .with_value("197705232382"),
                UserAttribute::new("urn:oid:2.5.4.42")
                    .with_friendly_name("givenName")
                    .with_value("Frida"),
                UserAttribute::new("urn:oid:2.5.4.4")
                    .with_friendly_name("sn")
                    .with_value("Kransstege"),
            ],
            assurance_context_uri: Some(LOA3.to_owned()),
            authenticating_authority: None,
            reusable: true,
        }
    }
}
