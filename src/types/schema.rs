use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

use super::{Constraint, InternalSchemaElement};

/// Internal representation of a non-primitive FHIR type, suitable for
/// validation and other programmatic use.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InternalTypeSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: Option<String>,
    pub title: Option<String>,
    pub url: Option<String>,
    pub kind: Option<String>,
    pub description: Option<String>,

    /// Keyed by path relative to the schema root.
    pub elements: HashMap<String, InternalSchemaElement>,

    #[serde(default)]
    pub constraints: Vec<Constraint>,

    #[serde(default)]
    pub inner_types: Vec<InternalTypeSchema>,

    #[serde(default)]
    pub summary_properties: BTreeSet<String>,
    #[serde(default)]
    pub mandatory_properties: BTreeSet<String>,

    /// Name of the schema that synthesized this inner type.
    pub parent_type: Option<String>,
}

const ABSTRACT_RESOURCE_TYPES: [&str; 2] = ["Resource", "DomainResource"];

impl InternalTypeSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: None,
            title: None,
            url: None,
            kind: None,
            description: None,
            elements: HashMap::new(),
            constraints: Vec::new(),
            inner_types: Vec::new(),
            summary_properties: BTreeSet::new(),
            mandatory_properties: BTreeSet::new(),
            parent_type: None,
        }
    }

    pub fn with_type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with_element(mut self, key: impl Into<String>, element: InternalSchemaElement) -> Self {
        self.elements.insert(key.into(), element);
        self
    }

    pub fn element(&self, key: &str) -> Option<&InternalSchemaElement> {
        self.elements.get(key)
    }

    pub fn inner_type(&self, name: &str) -> Option<&InternalTypeSchema> {
        self.inner_types.iter().find(|inner| inner.name == name)
    }

    pub fn is_resource_type(&self) -> bool {
        self.kind.as_deref() == Some("resource")
            && !ABSTRACT_RESOURCE_TYPES.contains(&self.name.as_str())
    }

    /// A profile constrains a type under a different name (`us-core-patient` over `Patient`).
    pub fn is_profile(&self) -> bool {
        self.type_name
            .as_deref()
            .is_some_and(|type_name| type_name != self.name)
    }
}

impl fmt::Display for InternalTypeSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InternalTypeSchema({}", self.name)?;
        if let Some(type_name) = &self.type_name {
            write!(f, ": {type_name}")?;
        }
        if let Some(url) = &self.url {
            write!(f, " <{url}>")?;
        }
        write!(
            f,
            ", {} elements, {} inner types)",
            self.elements.len(),
            self.inner_types.len()
        )
    }
}
