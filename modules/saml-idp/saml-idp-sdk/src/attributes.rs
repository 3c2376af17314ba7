//! Attribute models: user attributes, raw requested attributes, and the
//! merged attribute requirements handed to response building.

use serde::{Deserialize, Serialize};

/// A user attribute, either released for a subject or supplied as a
/// principal-selection hint on a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAttribute {
    /// Attribute name (typically an OID URI such as `urn:oid:1.2.752.29.4.13`).
    pub id: String,
    /// Human-readable attribute name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friendly_name: Option<String>,
    /// SAML name format, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_format: Option<String>,
    /// String values.
    #[serde(default)]
    pub values: Vec<String>,
}

impl UserAttribute {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            friendly_name: None,
            name_format: None,
            values: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_friendly_name(mut self, friendly_name: impl Into<String>) -> Self {
        self.friendly_name = Some(friendly_name.into());
        self
    }

    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.values.push(value.into());
        self
    }
}

/// A raw requested attribute as found in SP metadata or a request extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestedAttribute {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friendly_name: Option<String>,
    #[serde(default)]
    pub is_required: bool,
}

impl RequestedAttribute {
    #[must_use]
    pub fn new(name: impl Into<String>, is_required: bool) -> Self {
        Self {
            name: name.into(),
            friendly_name: None,
            is_required,
        }
    }

    #[must_use]
    pub fn with_friendly_name(mut self, friendly_name: impl Into<String>) -> Self {
        self.friendly_name = Some(friendly_name.into());
        self
    }
}

/// An `AttributeConsumingService` entry from SP metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeConsumingService {
    pub index: u32,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub requested_attributes: Vec<RequestedAttribute>,
}

/// A single attribute the `IdP` should deliver.
///
/// `origin` is only set when the requirement was implied by a declared entity
/// category rather than requested explicitly; it holds that category's URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeRequirement {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friendly_name: Option<String>,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

impl AttributeRequirement {
    /// An explicitly requested attribute.
    #[must_use]
    pub fn explicit(id: impl Into<String>, friendly_name: Option<String>, required: bool) -> Self {
        Self {
            id: id.into(),
            friendly_name,
            required,
            origin: None,
        }
    }

    /// An attribute implied by the entity category `origin`.
    #[must_use]
    pub fn implicit(
        origin: impl Into<String>,
        id: impl Into<String>,
        friendly_name: Option<String>,
        required: bool,
    ) -> Self {
        Self {
            id: id.into(),
            friendly_name,
            required,
            origin: Some(origin.into()),
        }
    }
}

impl From<&RequestedAttribute> for AttributeRequirement {
    fn from(ra: &RequestedAttribute) -> Self {
        Self::explicit(ra.name.clone(), ra.friendly_name.clone(), ra.is_required)
    }
}

/// Attribute requirements keyed by attribute id.
///
/// Ids are unique. Entries keep the order in which their id was first seen,
/// so resolving the same request twice yields identical sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<AttributeRequirement>", into = "Vec<AttributeRequirement>")]
pub struct AttributeRequirementSet {
    entries: Vec<AttributeRequirement>,
}

impl AttributeRequirementSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `requirement` to the set.
    ///
    /// If the id is already present the existing entry keeps its friendly
    /// name and origin, and stays required only if `requirement` is required
    /// as well.
    pub fn merge(&mut self, requirement: AttributeRequirement) {
        if let Some(existing) = self.entries.iter_mut().find(|e| e.id == requirement.id) {
            existing.required = existing.required && requirement.required;
        } else {
            self.entries.push(requirement);
        }
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&AttributeRequirement> {
        self.entries.iter().find(|e| e.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    #[must_use]
    pub fn is_required(&self, id: &str) -> bool {
        self.get(id).is_some_and(|e| e.required)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AttributeRequirement> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[AttributeRequirement] {
        &self.entries
    }
}

impl FromIterator<AttributeRequirement> for AttributeRequirementSet {
    fn from_iter<I: IntoIterator<Item = AttributeRequirement>>(iter: I) -> Self {
        let mut set = Self::new();
        for requirement in iter {
            set.merge(requirement);
        }
        set
    }
}

impl From<Vec<AttributeRequirement>> for AttributeRequirementSet {
    fn from(requirements: Vec<AttributeRequirement>) -> Self {
        requirements.into_iter().collect()
    }
}

impl From<AttributeRequirementSet> for Vec<AttributeRequirement> {
    fn from(set: AttributeRequirementSet) -> Self {
        set.entries
    }
}

impl<'a> IntoIterator for &'a AttributeRequirementSet {
    type Item = &'a AttributeRequirement;
    type IntoIter = std::slice::Iter<'a, AttributeRequirement>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn merge_keeps_single_entry_per_id() {
        let set: AttributeRequirementSet = [
            AttributeRequirement::explicit("urn:oid:2.5.4.42", Some("givenName".to_owned()), true),
            AttributeRequirement::explicit("urn:oid:2.5.4.42", Some("gn".to_owned()), true),
            AttributeRequirement::explicit("urn:oid:2.5.4.4", None, false),
        ]
        .into_iter()
        .collect();

        assert_eq!(set.len(), 2);
        let given_name = set.get("urn:oid:2.5.4.42").unwrap();
        assert!(given_name.required);
        assert_eq!(given_name.friendly_name.as_deref(), Some("givenName"));
    }

    #[test]
    fn merge_required_is_conjunction() {
        let mut set = AttributeRequirementSet::new();
        set.merge(AttributeRequirement::implicit("urn:ec:a", "pnr", None, true));
        set.merge(AttributeRequirement::explicit("pnr", None, false));

        let pnr = set.get("pnr").unwrap();
        assert!(!pnr.required);
        assert_eq!(pnr.origin.as_deref(), Some("urn:ec:a"));
    }

    #[test]
    fn optional_first_stays_optional() {
        let mut set = AttributeRequirementSet::new();
        set.merge(AttributeRequirement::explicit("pnr", None, false));
        set.merge(AttributeRequirement::explicit("pnr", None, true));

        assert!(!set.is_required("pnr"));
    }

    #[test]
    fn serializes_as_plain_list() {
        let set: AttributeRequirementSet =
            [AttributeRequirement::explicit("a", None, true)].into_iter().collect();
        let json = serde_json::to_value(&set).unwrap();
        assert_eq!(json, serde_json::json!([{ "id": "a", "required": true }]));
    }

    #[test]
    fn deserializing_merges_duplicate_ids() {
        let set: AttributeRequirementSet = serde_json::from_value(serde_json::json!([
            { "id": "pnr", "required": true },
            { "id": "pnr", "required": false },
            { "id": "sn", "required": true },
        ]))
        .unwrap();

        assert_eq!(set.len(), 2);
        assert!(!set.is_required("pnr"));
        assert!(set.is_required("sn"));
    }
}
