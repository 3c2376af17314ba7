//! Attribute requirement sources and their merge.

pub mod entity_category;
pub mod resolver;
pub mod sources;

use saml_idp_sdk::{AttributeRequirement, AuthnRequestContext, RequestedAttribute};

pub use entity_category::EntityCategoryRequirementSource;
pub use resolver::RequirementResolver;
pub use sources::{
    EidasExtensionRequirementSource, MetadataRequirementSource, OasisExtensionRequirementSource,
};

/// Extracts candidate attribute requirements from one part of a request.
///
/// Sources never fail. Missing input yields an empty list, and so does
/// malformed input (after logging a warning).
pub trait RequirementSource: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn extract(&self, ctx: &AuthnRequestContext) -> Vec<AttributeRequirement>;
}

/// Converts raw requested attributes, discarding the whole list if any entry
/// has no name.
fn explicit_requirements(
    source: &'static str,
    ctx: &AuthnRequestContext,
    requested: &[RequestedAttribute],
) -> Vec<AttributeRequirement> {
    if requested.iter().any(|ra| ra.name.trim().is_empty()) {
        tracing::warn!(
            source,
            request_id = %ctx.request_id(),
            requester = %ctx.requester(),
            "Requested attribute without a name; ignoring this source"
        );
        return Vec::new();
    }
    requested.iter().map(AttributeRequirement::from).collect()
}
