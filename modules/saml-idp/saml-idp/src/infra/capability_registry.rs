//! Configuration-backed entity category registry.

use saml_idp_sdk::{CapabilityRegistry, ServiceCategory};

/// [`CapabilityRegistry`] over a fixed list of service categories.
#[derive(Debug, Clone, Default)]
pub struct StaticCapabilityRegistry {
    categories: Vec<ServiceCategory>,
}

impl StaticCapabilityRegistry {
    /// Later definitions of the same URI are ignored.
    #[must_use]
    pub fn new(categories: Vec<ServiceCategory>) -> Self {
        let mut unique: Vec<ServiceCategory> = Vec::with_capacity(categories.len());
        for category in categories {
            if unique.iter().any(|c| c.uri == category.uri) {
                tracing::warn!(category = %category.uri, "Duplicate service category definition ignored");
                continue;
            }
            unique.push(category);
        }
        Self { categories: unique }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

impl CapabilityRegistry for StaticCapabilityRegistry {
    fn service_category(&self, uri: &str) -> Option<ServiceCategory> {
        self.categories.iter().find(|c| c.uri == uri).cloned()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use saml_idp_sdk::{AttributeSet, AttributeTemplate};

    use super::*;

    #[test]
    fn first_definition_wins() {
        let registry = StaticCapabilityRegistry::new(vec![
            ServiceCategory {
                uri: "urn:ec:a".to_owned(),
                attribute_set: AttributeSet {
                    required: vec![AttributeTemplate::new("pnr")],
                    recommended: vec![],
                },
            },
            ServiceCategory {
                uri: "urn:ec:a".to_owned(),
                attribute_set: AttributeSet::default(),
            },
        ]);

        assert_eq!(registry.len(), 1);
        let a = registry.service_category("urn:ec:a").unwrap();
        assert_eq!(a.attribute_set.required.len(), 1);
        assert!(registry.service_category("urn:ec:b").is_none());
    }
}
