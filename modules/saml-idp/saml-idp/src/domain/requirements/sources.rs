//! Explicit requirement sources: SP metadata and the request extensions.

use saml_idp_sdk::{AttributeConsumingService, AttributeRequirement, AuthnRequestContext};

use super::{RequirementSource, explicit_requirements};

/// Reads the requester's `AttributeConsumingService` from metadata.
///
/// Selection: the entry whose index matches the request's
/// `AttributeConsumingServiceIndex`, else the default entry, else the entry
/// with the lowest index.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataRequirementSource;

impl MetadataRequirementSource {
    fn select(ctx: &AuthnRequestContext) -> Option<&AttributeConsumingService> {
        let services = &ctx.peer().attribute_consuming_services;

        ctx.attribute_consuming_service_index()
            .and_then(|idx| services.iter().find(|s| s.index == idx))
            .or_else(|| services.iter().find(|s| s.is_default))
            .or_else(|| services.iter().min_by_key(|s| s.index))
    }
}

impl RequirementSource for MetadataRequirementSource {
    fn name(&self) -> &'static str {
        "metadata"
    }

    fn extract(&self, ctx: &AuthnRequestContext) -> Vec<AttributeRequirement> {
        Self::select(ctx)
            .map(|acs| explicit_requirements(self.name(), ctx, &acs.requested_attributes))
            .unwrap_or_default()
    }
}

/// Reads the OASIS `RequestedAttributes` request extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct OasisExtensionRequirementSource;

impl RequirementSource for OasisExtensionRequirementSource {
    fn name(&self) -> &'static str {
        "oasis_extension"
    }

    fn extract(&self, ctx: &AuthnRequestContext) -> Vec<AttributeRequirement> {
        ctx.oasis_requested_attributes()
            .map(|attrs| explicit_requirements(self.name(), ctx, attrs))
            .unwrap_or_default()
    }
}

/// Reads the `eIDAS` `RequestedAttributes` request extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct EidasExtensionRequirementSource;

impl RequirementSource for EidasExtensionRequirementSource {
    fn name(&self) -> &'static str {
        "eidas_extension"
    }

    fn extract(&self, ctx: &AuthnRequestContext) -> Vec<AttributeRequirement> {
        ctx.eidas_requested_attributes()
            .map(|attrs| explicit_requirements(self.name(), ctx, attrs))
            .unwrap_or_default()
    }
}
