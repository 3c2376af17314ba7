//! SAML `IdP` Module
//!
//! Decision core of a SAML2 Identity Provider. For each validated
//! authentication request it:
//!
//! 1. resolves which attributes must be delivered, merging SP metadata, the
//!    OASIS and `eIDAS` `RequestedAttributes` extensions and entity categories;
//! 2. decides whether a prior authentication may be reused (SSO) by running
//!    a configurable voter chain;
//! 3. calls the authenticator plugin, suspending the request in the session
//!    when authentication continues at an external path.
//!
//! Provides the `SamlIdpClient` trait through [`module::SamlIdpModule`].
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod config;
pub mod domain;
pub mod infra;
pub mod module;

pub use config::SamlIdpConfig;
pub use module::{ModuleDeps, SamlIdpModule};
