//! SAML `IdP` SDK
//!
//! This crate provides the public API for the `saml_idp` module:
//!
//! - [`SamlIdpClient`] - Public API trait for consumers (binding layer, external authenticators)
//! - [`UserAuthenticatorPluginClient`] - Plugin API trait for authenticator implementations
//! - [`SessionStore`] - Session-scoped key/value storage used by the redirect/resume flow
//! - [`CapabilityRegistry`] - Entity category to attribute set lookup
//! - [`AuthnRequestContext`], [`AttributeRequirementSet`], [`UserAuthentication`] - Models
//! - [`SamlIdpError`] - Error types
//!
//! ## Usage
//!
//! ```ignore
//! use saml_idp_sdk::{AuthnOutcome, SamlIdpClient, SessionId};
//!
//! let idp: Arc<dyn SamlIdpClient> = /* module wiring */;
//!
//! match idp.authenticate(&session, &request, prior.as_ref()).await? {
//!     AuthnOutcome::Authenticated { request, authentication, requirements, .. } => { /* build response */ }
//!     AuthnOutcome::Redirect(instruction) => { /* 302 to instruction.location */ }
//! }
//! ```
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod api;
pub mod attributes;
pub mod clock;
pub mod error;
pub mod models;
pub mod plugin_api;
pub mod registry;
pub mod session;

// Re-export main types at crate root
pub use api::SamlIdpClient;
pub use attributes::{
    AttributeConsumingService, AttributeRequirement, AttributeRequirementSet, RequestedAttribute,
    UserAttribute,
};
pub use clock::{Clock, SystemClock};
pub use error::{
    Saml2ErrorStatus, Saml2Status, SamlIdpError, SessionStoreError, UnrecoverableError,
};
pub use models::{
    AuthnOutcome, AuthnRequestContext, AuthnRequestContextBuilder, ExternalAuthnResult,
    PeerMetadata, PendingRedirectToken, RedirectInstruction, ResumedAuthentication, SsoVote,
    UserAuthentication,
};
pub use plugin_api::{AuthenticatorOutcome, UserAuthenticatorPluginClient};
pub use registry::{AttributeSet, AttributeTemplate, CapabilityRegistry, ServiceCategory};
pub use session::{SessionId, SessionStore};
