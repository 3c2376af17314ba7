//! Entity category registry.

use serde::{Deserialize, Serialize};

/// An attribute named by an entity category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttributeTemplate {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friendly_name: Option<String>,
}

impl AttributeTemplate {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            friendly_name: None,
        }
    }

    #[must_use]
    pub fn with_friendly_name(mut self, friendly_name: impl Into<String>) -> Self {
        self.friendly_name = Some(friendly_name.into());
        self
    }
}

/// The attributes a category asks for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AttributeSet {
    pub required: Vec<AttributeTemplate>,
    pub recommended: Vec<AttributeTemplate>,
}

/// A service entity category together with its attribute set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceCategory {
    pub uri: String,
    #[serde(default)]
    pub attribute_set: AttributeSet,
}

/// Read-only lookup from entity category URI to its definition.
pub trait CapabilityRegistry: Send + Sync {
    /// Returns the service category registered under `uri`, if any.
    fn service_category(&self, uri: &str) -> Option<ServiceCategory>;
}
