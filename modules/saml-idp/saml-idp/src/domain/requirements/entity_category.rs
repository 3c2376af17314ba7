//! Requirements implied by entity categories declared by both parties.

use std::sync::Arc;

use saml_idp_sdk::{
    AttributeRequirement, AttributeTemplate, AuthnRequestContext, CapabilityRegistry,
    ServiceCategory,
};

use super::RequirementSource;

/// Derives requirements from the service entity categories that the
/// requester declares and this `IdP` also declares.
///
/// With a single surviving category its required/recommended split is used
/// as is. With several, an attribute is only required if every surviving
/// category mentions it and all of them require it: the `IdP` may end up
/// serving the request under any one of the categories.
pub struct EntityCategoryRequirementSource {
    idp_categories: Vec<String>,
    registry: Arc<dyn CapabilityRegistry>,
}

struct Mention<'a> {
    category: usize,
    origin: &'a str,
    friendly_name: Option<&'a str>,
    required: bool,
}

impl EntityCategoryRequirementSource {
    #[must_use]
    pub fn new(idp_categories: Vec<String>, registry: Arc<dyn CapabilityRegistry>) -> Self {
        Self {
            idp_categories,
            registry,
        }
    }

    /// Service categories declared by both parties, in requester order.
    fn surviving(&self, ctx: &AuthnRequestContext) -> Vec<ServiceCategory> {
        let mut out: Vec<ServiceCategory> = Vec::new();
        for uri in &ctx.peer().entity_categories {
            if !self.idp_categories.contains(uri) || out.iter().any(|c| &c.uri == uri) {
                continue;
            }
            if let Some(category) = self.registry.service_category(uri) {
                out.push(category);
            } else {
                tracing::debug!(category = %uri, "Not a registered service category");
            }
        }
        out
    }
}

fn templates(category: &ServiceCategory) -> impl Iterator<Item = (&AttributeTemplate, bool)> {
    let set = &category.attribute_set;
    set.required
        .iter()
        .map(|t| (t, true))
        .chain(set.recommended.iter().map(|t| (t, false)))
}

fn single(category: &ServiceCategory) -> Vec<AttributeRequirement> {
    let mut out: Vec<AttributeRequirement> = Vec::new();
    for (template, required) in templates(category) {
        if out.iter().any(|r| r.id == template.name) {
            continue;
        }
        out.push(AttributeRequirement::implicit(
            category.uri.clone(),
            template.name.clone(),
            template.friendly_name.clone(),
            required,
        ));
    }
    out
}

fn merged(categories: &[ServiceCategory]) -> Vec<AttributeRequirement> {
    // attribute id -> mentions, in first-seen order
    let mut mentions: Vec<(&str, Vec<Mention<'_>>)> = Vec::new();

    for (idx, category) in categories.iter().enumerate() {
        for (template, required) in templates(category) {
            let mention = Mention {
                category: idx,
                origin: &category.uri,
                friendly_name: template.friendly_name.as_deref(),
                required,
            };
            match mentions.iter_mut().find(|(id, _)| *id == template.name) {
                Some((_, list)) if list.iter().any(|m| m.category == idx) => {}
                Some((_, list)) => list.push(mention),
                None => mentions.push((&template.name, vec![mention])),
            }
        }
    }

    mentions
        .into_iter()
        .filter_map(|(id, list)| {
            let first = list.first()?;
            let required = list.len() == categories.len() && list.iter().all(|m| m.required);
            Some(AttributeRequirement::implicit(
                first.origin,
                id,
                first.friendly_name.map(str::to_owned),
                required,
            ))
        })
        .collect()
}

impl RequirementSource for EntityCategoryRequirementSource {
    fn name(&self) -> &'static str {
        "entity_category"
    }

    fn extract(&self, ctx: &AuthnRequestContext) -> Vec<AttributeRequirement> {
        let categories = self.surviving(ctx);
        match categories.as_slice() {
            [] => Vec::new(),
            [only] => single(only),
            many => merged(many),
        }
    }
}
