//! Built-in SSO voters.

use std::sync::Arc;

use saml_idp_sdk::{AuthnRequestContext, Clock, SsoVote, UserAuthentication};

use super::SsoVoter;

/// Approves a prior authentication that is recent enough and was made under
/// one of the allowed authentication contexts.
pub struct FreshnessVoter {
    clock: Arc<dyn Clock>,
    duration_limit: time::Duration,
}

impl FreshnessVoter {
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, duration_limit: std::time::Duration) -> Self {
        Self {
            clock,
            duration_limit: time::Duration::try_from(duration_limit)
                .unwrap_or(time::Duration::MAX),
        }
    }
}

impl SsoVoter for FreshnessVoter {
    fn name(&self) -> &'static str {
        "freshness"
    }

    fn vote(
        &self,
        prior: &UserAuthentication,
        _request: &AuthnRequestContext,
        allowed_authn_contexts: &[String],
    ) -> SsoVote {
        let Some(authenticated_at) = prior.authenticated_at else {
            return SsoVote::Deny;
        };
        if let Some(expires_at) = authenticated_at.checked_add(self.duration_limit)
            && self.clock.now() > expires_at
        {
            return SsoVote::Deny;
        }
        if !allowed_authn_contexts.contains(&prior.assurance_context_uri) {
            return SsoVote::Deny;
        }
        SsoVote::Ok
    }
}

/// Blocks SSO for requesters declaring an SSO-exempt entity category.
///
/// Never approves.
pub struct CapabilityRestrictionVoter {
    exempt_categories: Vec<String>,
}

impl CapabilityRestrictionVoter {
    #[must_use]
    pub fn new(exempt_categories: Vec<String>) -> Self {
        Self { exempt_categories }
    }
}

impl SsoVoter for CapabilityRestrictionVoter {
    fn name(&self) -> &'static str {
        "capability_restriction"
    }

    fn vote(
        &self,
        _prior: &UserAuthentication,
        request: &AuthnRequestContext,
        _allowed_authn_contexts: &[String],
    ) -> SsoVote {
        if self
            .exempt_categories
            .iter()
            .any(|c| request.peer().declares(c))
        {
            SsoVote::Deny
        } else {
            SsoVote::DontKnow
        }
    }
}

/// Checks principal-selection hints against the prior authentication.
///
/// Every hinted value must be among the prior's values for the same
/// attribute. Hints without values are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrincipalSelectionVoter;

impl SsoVoter for PrincipalSelectionVoter {
    fn name(&self) -> &'static str {
        "principal_selection"
    }

    fn vote(
        &self,
        prior: &UserAuthentication,
        request: &AuthnRequestContext,
        _allowed_authn_contexts: &[String],
    ) -> SsoVote {
        for hint in request.principal_selection() {
            if hint.values.is_empty() {
                continue;
            }
            let matches = prior
                .attribute(&hint.id)
                .is_some_and(|attr| hint.values.iter().all(|v| attr.values.contains(v)));
            if !matches {
                return SsoVote::Deny;
            }
        }
        SsoVote::Ok
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::time::Duration;

    use saml_idp_sdk::{PeerMetadata, UserAttribute};
    use time::OffsetDateTime;
    use time::macros::datetime;

    use super::*;
    use crate::config::SIGSERVICE_CATEGORY;

    const LOA3: &str = "http://id.elegnamnden.se/loa/1.0/loa3";
    const PNR: &str = "urn:oid:1.2.752.29.4.13";
    const T: OffsetDateTime = datetime!(2026-03-01 10:00 UTC);

    struct FixedClock(OffsetDateTime);

    impl Clock for FixedClock {
        fn now(&self) -> OffsetDateTime {
            self.0
        }
    }

    fn prior() -> UserAuthentication {
        UserAuthentication {
            subject_attributes: vec![UserAttribute::new(PNR).with_value("197705232382")],
            assurance_context_uri: LOA3.to_owned(),
            authenticated_at: Some(T),
            authenticating_authority: None,
            reusable: true,
        }
    }

    fn request() -> AuthnRequestContext {
        AuthnRequestContext::builder("_r", PeerMetadata::new("https://sp.example.com")).build()
    }

    fn freshness_at(minutes: i64) -> FreshnessVoter {
        FreshnessVoter::new(
            Arc::new(FixedClock(T + time::Duration::minutes(minutes))),
            Duration::from_secs(3600),
        )
    }

    #[test]
    fn freshness_ok_within_limit() {
        let vote = freshness_at(59).vote(&prior(), &request(), &[LOA3.to_owned()]);
        assert_eq!(vote, SsoVote::Ok);
    }

    #[test]
    fn freshness_deny_after_limit() {
        let vote = freshness_at(61).vote(&prior(), &request(), &[LOA3.to_owned()]);
        assert_eq!(vote, SsoVote::Deny);
    }

    #[test]
    fn freshness_deny_on_context_mismatch() {
        let vote = freshness_at(1).vote(&prior(), &request(), &["urn:other".to_owned()]);
        assert_eq!(vote, SsoVote::Deny);
    }

    #[test]
    fn freshness_deny_without_instant() {
        let mut prior = prior();
        prior.authenticated_at = None;
        let vote = freshness_at(1).vote(&prior, &request(), &[LOA3.to_owned()]);
        assert_eq!(vote, SsoVote::Deny);
    }

    #[test]
    fn capability_restriction_blocks_exempt_requester() {
        let voter = CapabilityRestrictionVoter::new(vec![SIGSERVICE_CATEGORY.to_owned()]);
        let signservice = AuthnRequestContext::builder(
            "_r",
            PeerMetadata {
                entity_categories: vec![SIGSERVICE_CATEGORY.to_owned()],
                ..PeerMetadata::new("https://sign.example.com")
            },
        )
        .build();

        assert_eq!(voter.vote(&prior(), &signservice, &[]), SsoVote::Deny);
        assert_eq!(voter.vote(&prior(), &request(), &[]), SsoVote::DontKnow);
    }

    #[test]
    fn principal_selection_matches_prior() {
        let ctx = AuthnRequestContext::builder("_r", PeerMetadata::new("https://sp.example.com"))
            .principal_selection(vec![UserAttribute::new(PNR).with_value("197705232382")])
            .build();
        assert_eq!(PrincipalSelectionVoter.vote(&prior(), &ctx, &[]), SsoVote::Ok);
    }

    #[test]
    fn principal_selection_denies_other_principal() {
        let ctx = AuthnRequestContext::builder("_r", PeerMetadata::new("https://sp.example.com"))
            .principal_selection(vec![UserAttribute::new(PNR).with_value("188803099368")])
            .build();
        assert_eq!(PrincipalSelectionVoter.vote(&prior(), &ctx, &[]), SsoVote::Deny);
    }

    #[test]
    fn principal_selection_denies_when_prior_lacks_attribute() {
        let ctx = AuthnRequestContext::builder("_r", PeerMetadata::new("https://sp.example.com"))
            .principal_selection(vec![UserAttribute::new("urn:oid:2.5.4.42").with_value("Kalle")])
            .build();
        assert_eq!(PrincipalSelectionVoter.vote(&prior(), &ctx, &[]), SsoVote::Deny);
    }

    #[test]
    fn principal_selection_ignores_valueless_hints() {
        let ctx = AuthnRequestContext::builder("_r", PeerMetadata::new("https://sp.example.com"))
            .principal_selection(vec![UserAttribute::new("urn:oid:2.5.4.42")])
            .build();
        assert_eq!(PrincipalSelectionVoter.vote(&prior(), &ctx, &[]), SsoVote::Ok);
        assert_eq!(PrincipalSelectionVoter.vote(&prior(), &request(), &[]), SsoVote::Ok);
    }
}
