#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Static SAML `IdP` Authenticator Plugin
//!
//! Authenticator for development and testing that never checks credentials.
//!
//! ## Modes
//!
//! - **`accept_all`** (default): every request is authenticated immediately
//!   as the configured identity.
//!
//! - **`external`**: every request continues at `authn_path`, exercising the
//!   redirect/resume flow. The result is committed by whatever serves that
//!   path.
//!
//! ## Configuration
//!
//! ```yaml
//! mode: accept_all
//! supported_authn_contexts:
//!   - "http://id.elegnamnden.se/loa/1.0/loa3"
//! authn_path: "/extauth"
//! identity:
//!   assurance_context_uri: "http://id.elegnamnden.se/loa/1.0/loa3"
//!   reusable: true
//!   attributes:
//!     - id: "urn:oid:1.2.752.29.4.13"
//!       friendly_name: "personalIdentityNumber"
//!       values: ["197705232382"]
//! ```

pub mod config;
pub mod domain;
pub mod module;

pub use module::StaticAuthnPlugin;
