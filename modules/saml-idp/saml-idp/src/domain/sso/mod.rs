//! SSO voting.

pub mod arbiter;
pub mod voters;

use saml_idp_sdk::{AuthnRequestContext, SsoVote, UserAuthentication};

pub use arbiter::{SsoArbiter, SsoDecision};
pub use voters::{CapabilityRestrictionVoter, FreshnessVoter, PrincipalSelectionVoter};

/// Decides whether a prior authentication may satisfy a new request.
///
/// Voters are pure: no I/O and no side effects.
pub trait SsoVoter: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// `allowed_authn_contexts` are the requested contexts the authenticator
    /// supports.
    fn vote(
        &self,
        prior: &UserAuthentication,
        request: &AuthnRequestContext,
        allowed_authn_contexts: &[String],
    ) -> SsoVote;
}
