//! Combines voter verdicts into an SSO decision.

use std::sync::Arc;

use saml_idp_sdk::{AuthnRequestContext, Clock, Saml2ErrorStatus, SsoVote, UserAuthentication};
use tracing::debug;

use super::{CapabilityRestrictionVoter, FreshnessVoter, PrincipalSelectionVoter, SsoVoter};
use crate::config::{SsoConfig, VoterKind};
use crate::domain::error::DomainError;

/// Outcome of arbitration for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SsoDecision {
    /// Reuse this prior authentication.
    Reuse(UserAuthentication),
    /// Authenticate the user under one of `authn_contexts`.
    Authenticate { authn_contexts: Vec<String> },
}

/// Runs the voter chain for a request.
///
/// Every voter is consulted. A single `Deny` rejects reuse; otherwise at least
/// one `Ok` is needed.
pub struct SsoArbiter {
    voters: Vec<Box<dyn SsoVoter>>,
}

impl SsoArbiter {
    #[must_use]
    pub fn new(voters: Vec<Box<dyn SsoVoter>>) -> Self {
        Self { voters }
    }

    #[must_use]
    pub fn from_config(cfg: &SsoConfig, clock: &Arc<dyn Clock>) -> Self {
        let voters = cfg
            .voters
            .iter()
            .map(|kind| -> Box<dyn SsoVoter> {
                match kind {
                    VoterKind::Freshness => {
                        Box::new(FreshnessVoter::new(Arc::clone(clock), cfg.duration_limit))
                    }
                    VoterKind::CapabilityRestriction => Box::new(CapabilityRestrictionVoter::new(
                        cfg.sso_exempt_categories.clone(),
                    )),
                    VoterKind::PrincipalSelection => Box::new(PrincipalSelectionVoter),
                }
            })
            .collect();
        Self::new(voters)
    }

    /// Voter names in evaluation order.
    pub fn voter_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.voters.iter().map(|v| v.name())
    }

    /// Decides how `request` is to be served.
    ///
    /// # Errors
    ///
    /// - `NoAuthnContext` if none of the requested contexts is in `supported`
    /// - `PassiveAuthn` if the request is passive and SSO was not granted
    pub fn decide(
        &self,
        prior: Option<&UserAuthentication>,
        request: &AuthnRequestContext,
        supported: &[String],
    ) -> Result<SsoDecision, DomainError> {
        let authn_contexts = filter_authn_contexts(request.requested_authn_contexts(), supported);
        if authn_contexts.is_empty() {
            return Err(DomainError::protocol(
                Saml2ErrorStatus::NoAuthnContext,
                format!(
                    "None of the requested authentication contexts are supported ({})",
                    request.requested_authn_contexts().join(", ")
                ),
            ));
        }

        if let Some(prior) = prior.filter(|p| sso_applicable(p, request))
            && self.allows(prior, request, &authn_contexts)
        {
            debug!(
                request_id = %request.request_id(),
                assurance_context = %prior.assurance_context_uri,
                "SSO granted"
            );
            return Ok(SsoDecision::Reuse(prior.clone()));
        }

        if request.passive() {
            return Err(DomainError::protocol(
                Saml2ErrorStatus::PassiveAuthn,
                "Passive authentication requested but SSO is not possible",
            ));
        }

        Ok(SsoDecision::Authenticate { authn_contexts })
    }

    /// Runs every voter and applies the arbitration rule.
    #[must_use]
    pub fn allows(
        &self,
        prior: &UserAuthentication,
        request: &AuthnRequestContext,
        allowed_authn_contexts: &[String],
    ) -> bool {
        let mut approved = false;
        let mut denied = false;
        for voter in &self.voters {
            let vote = voter.vote(prior, request, allowed_authn_contexts);
            debug!(
                request_id = %request.request_id(),
                voter = voter.name(),
                vote = ?vote,
                "SSO vote"
            );
            match vote {
                SsoVote::Ok => approved = true,
                SsoVote::Deny => denied = true,
                SsoVote::DontKnow => {}
            }
        }
        approved && !denied
    }
}

fn sso_applicable(prior: &UserAuthentication, request: &AuthnRequestContext) -> bool {
    if request.force_authn() {
        debug!(request_id = %request.request_id(), "ForceAuthn set, SSO not applicable");
        return false;
    }
    if !prior.reusable {
        debug!(request_id = %request.request_id(), "Prior authentication not reusable");
        return false;
    }
    true
}

/// Requested contexts that `supported` contains, in request order. An empty
/// request accepts every supported context.
fn filter_authn_contexts(requested: &[String], supported: &[String]) -> Vec<String> {
    if requested.is_empty() {
        return supported.to_vec();
    }
    requested
        .iter()
        .filter(|uri| supported.contains(uri))
        .cloned()
        .collect()
}
