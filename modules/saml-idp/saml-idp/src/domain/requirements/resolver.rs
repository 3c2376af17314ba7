//! Merges all requirement sources into one requirement set.

use std::sync::Arc;

use saml_idp_sdk::{AttributeRequirementSet, AuthnRequestContext, CapabilityRegistry};

use super::{
    EidasExtensionRequirementSource, EntityCategoryRequirementSource, MetadataRequirementSource,
    OasisExtensionRequirementSource, RequirementSource,
};
use crate::config::{RequirementsConfig, SourceKind};

/// Runs the configured sources in order and merges their output by
/// attribute id.
///
/// When several sources name the same id the attribute is required only if
/// every one of them requires it; the first-seen friendly name and origin
/// are kept.
pub struct RequirementResolver {
    sources: Vec<Box<dyn RequirementSource>>,
}

impl RequirementResolver {
    #[must_use]
    pub fn new(sources: Vec<Box<dyn RequirementSource>>) -> Self {
        Self { sources }
    }

    #[must_use]
    pub fn from_config(cfg: &RequirementsConfig, registry: &Arc<dyn CapabilityRegistry>) -> Self {
        let sources = cfg
            .sources
            .iter()
            .map(|kind| -> Box<dyn RequirementSource> {
                match kind {
                    SourceKind::Metadata => Box::new(MetadataRequirementSource),
                    SourceKind::OasisExtension => Box::new(OasisExtensionRequirementSource),
                    SourceKind::EidasExtension => Box::new(EidasExtensionRequirementSource),
                    SourceKind::EntityCategory => Box::new(EntityCategoryRequirementSource::new(
                        cfg.idp_entity_categories.clone(),
                        Arc::clone(registry),
                    )),
                }
            })
            .collect();
        Self::new(sources)
    }

    /// Source names in evaluation order.
    pub fn source_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.sources.iter().map(|s| s.name())
    }

    #[must_use]
    pub fn resolve(&self, ctx: &AuthnRequestContext) -> AttributeRequirementSet {
        let mut set = AttributeRequirementSet::new();
        for source in &self.sources {
            let contribution = source.extract(ctx);
            tracing::trace!(
                source = source.name(),
                count = contribution.len(),
                "Requirement source evaluated"
            );
            for requirement in contribution {
                set.merge(requirement);
            }
        }
        tracing::debug!(
            request_id = %ctx.request_id(),
            requirements = set.len(),
            required = set.iter().filter(|r| r.required).count(),
            "Resolved attribute requirements"
        );
        set
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use saml_idp_sdk::{
        AttributeConsumingService, AttributeSet, AttributeTemplate, PeerMetadata,
        RequestedAttribute, ServiceCategory,
    };

    use super::*;
    use crate::infra::StaticCapabilityRegistry;

    const CAT_PNR: &str = "http://id.elegnamnden.se/ec/1.0/loa3-pnr";
    const PNR: &str = "urn:oid:1.2.752.29.4.13";
    const GIVEN_NAME: &str = "urn:oid:2.5.4.42";

    fn resolver() -> RequirementResolver {
        let cfg = RequirementsConfig {
            idp_entity_categories: vec![CAT_PNR.to_owned()],
            ..RequirementsConfig::default()
        };
        let registry: Arc<dyn CapabilityRegistry> =
            Arc::new(StaticCapabilityRegistry::new(vec![ServiceCategory {
                uri: CAT_PNR.to_owned(),
                attribute_set: AttributeSet {
                    required: vec![AttributeTemplate::new(PNR)],
                    recommended: vec![],
                },
            }]));
        RequirementResolver::from_config(&cfg, &registry)
    }

    fn request() -> AuthnRequestContext {
        let peer = PeerMetadata {
            entity_id: "https://sp.example.com".to_owned(),
            entity_categories: vec![CAT_PNR.to_owned()],
            attribute_consuming_services: vec![AttributeConsumingService {
                index: 0,
                is_default: true,
                requested_attributes: vec![
                    RequestedAttribute::new(GIVEN_NAME, true).with_friendly_name("givenName"),
                    RequestedAttribute::new(PNR, false),
                ],
            }],
        };
        AuthnRequestContext::builder("_req", peer)
            .oasis_requested_attributes(vec![RequestedAttribute::new(GIVEN_NAME, true)])
            .build()
    }

    #[test]
    fn sources_are_merged_by_conjunction() {
        let set = resolver().resolve(&request());

        assert_eq!(set.len(), 2);
        // metadata says optional, entity category says required
        let pnr = set.get(PNR).unwrap();
        assert!(!pnr.required);
        assert!(pnr.origin.is_none());
        // both metadata and the extension require it
        let given_name = set.get(GIVEN_NAME).unwrap();
        assert!(given_name.required);
        assert_eq!(given_name.friendly_name.as_deref(), Some("givenName"));
    }

    #[test]
    fn source_order_follows_configuration() {
        let cfg = RequirementsConfig {
            sources: vec![SourceKind::EntityCategory, SourceKind::Metadata],
            idp_entity_categories: vec![CAT_PNR.to_owned()],
            ..RequirementsConfig::default()
        };
        let registry: Arc<dyn CapabilityRegistry> =
            Arc::new(StaticCapabilityRegistry::new(vec![ServiceCategory {
                uri: CAT_PNR.to_owned(),
                attribute_set: AttributeSet {
                    required: vec![AttributeTemplate::new(PNR)],
                    recommended: vec![],
                },
            }]));
        let resolver = RequirementResolver::from_config(&cfg, &registry);

        assert_eq!(
            resolver.source_names().collect::<Vec<_>>(),
            ["entity_category", "metadata"]
        );
        let set = resolver.resolve(&request());
        let pnr = set.get(PNR).unwrap();
        assert_eq!(pnr.origin.as_deref(), Some(CAT_PNR));
        assert!(!pnr.required);
        assert_eq!(set.as_slice()[0].id, PNR);
    }

    #[test]
    fn resolving_twice_is_identical() {
        let resolver = resolver();
        let ctx = request();

        let first = serde_json::to_vec(&resolver.resolve(&ctx)).unwrap();
        let second = serde_json::to_vec(&resolver.resolve(&ctx)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn no_sources_yields_empty_set() {
        let resolver = RequirementResolver::new(Vec::new());
        assert!(resolver.resolve(&request()).is_empty());
    }
}
