use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock, Weak};

use super::{Cardinality, Constraint, ElementBinding, ElementType, InternalSchemaElement, InternalTypeSchema, TypedValue};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SlicingRules {
    #[serde(rename = "discriminator")]
    pub discriminators: Vec<SliceDiscriminator>,
    pub ordered: bool,
    pub rule: Option<SlicingRule>,
    pub slices: Vec<SliceDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SliceDiscriminator {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: DiscriminatorKind,
}

/// Only value and pattern discriminators are compiled; every other kind
/// is rejected at compile time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DiscriminatorKind {
    Value,
    Pattern,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SlicingRule {
    #[serde(rename = "open")]
    Open,
    #[serde(rename = "closed")]
    Closed,
    #[serde(rename = "openAtEnd")]
    OpenAtEnd,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SliceDefinition {
    pub name: String,
    pub definition: Option<String>,
    pub description: String,
    pub min: u32,
    pub max: Cardinality,
    #[serde(rename = "type")]
    pub types: Vec<ElementType>,
    pub fixed: Option<TypedValue>,
    pub pattern: Option<TypedValue>,
    pub binding: Option<ElementBinding>,
    #[serde(default)]
    pub constraints: Vec<Constraint>,
    pub elements: HashMap<String, InternalSchemaElement>,
    #[serde(skip)]
    pub type_schema: SchemaLink,
}

/// Late-bound, non-owning link from a slice to the schema of its profile.
///
/// The link is filled from the registry the first time the slice is
/// crawled. It holds a `Weak` so that co-referencing schemas never keep
/// each other alive.
#[derive(Default)]
pub struct SchemaLink {
    target: RwLock<Weak<InternalTypeSchema>>,
}

impl SlicingRules {
    pub fn new(rule: Option<SlicingRule>) -> Self {
        Self {
            discriminators: Vec::new(),
            ordered: false,
            rule,
            slices: Vec::new(),
        }
    }

    pub fn with_discriminator(mut self, kind: DiscriminatorKind, path: impl Into<String>) -> Self {
        self.discriminators.push(SliceDiscriminator {
            path: path.into(),
            kind,
        });
        self
    }

    pub fn with_slice(mut self, slice: SliceDefinition) -> Self {
        self.slices.push(slice);
        self
    }

    pub fn slice(&self, name: &str) -> Option<&SliceDefinition> {
        self.slices.iter().find(|slice| slice.name == name)
    }
}

impl DiscriminatorKind {
    pub fn parse(kind: &str) -> Option<Self> {
        match kind {
            "value" => Some(Self::Value),
            "pattern" => Some(Self::Pattern),
            _ => None,
        }
    }
}

impl SlicingRule {
    pub fn parse(rule: &str) -> Option<Self> {
        match rule {
            "open" => Some(Self::Open),
            "closed" => Some(Self::Closed),
            "openAtEnd" => Some(Self::OpenAtEnd),
            _ => None,
        }
    }
}

impl SliceDefinition {
    /// Builds a slice from the compiled slice-start element.
    pub fn from_element(name: impl Into<String>, definition: Option<String>, element: InternalSchemaElement) -> Self {
        Self {
            name: name.into(),
            definition,
            description: element.description,
            min: element.min,
            max: element.max,
            types: element.types,
            fixed: element.fixed,
            pattern: element.pattern,
            binding: element.binding,
            constraints: element.constraints,
            elements: HashMap::new(),
            type_schema: SchemaLink::default(),
        }
    }

    pub fn new(name: impl Into<String>) -> Self {
        Self::from_element(name, None, InternalSchemaElement::new(""))
    }

    pub fn with_cardinality(mut self, min: u32, max: Cardinality) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn with_type(mut self, element_type: ElementType) -> Self {
        self.types.push(element_type);
        self
    }

    pub fn with_element(mut self, key: impl Into<String>, element: InternalSchemaElement) -> Self {
        self.elements.insert(key.into(), element);
        self
    }

    /// First profile URL among the allowed types, used to bind `type_schema`.
    pub fn profile_url(&self) -> Option<&str> {
        self.types
            .iter()
            .find_map(|t| t.profile.first())
            .map(String::as_str)
    }

    pub fn has_types(&self) -> bool {
        !self.types.is_empty()
    }
}

impl SchemaLink {
    pub fn get(&self) -> Option<Arc<InternalTypeSchema>> {
        self.target.read().ok().and_then(|weak| weak.upgrade())
    }

    pub fn bind(&self, schema: &Arc<InternalTypeSchema>) {
        if let Ok(mut target) = self.target.write() {
            *target = Arc::downgrade(schema);
        }
    }

    pub fn is_bound(&self) -> bool {
        self.get().is_some()
    }
}

impl Clone for SchemaLink {
    fn clone(&self) -> Self {
        let target = self
            .target
            .read()
            .map(|weak| weak.clone())
            .unwrap_or_default();
        Self {
            target: RwLock::new(target),
        }
    }
}

// Links are a traversal cache and never part of a schema's structure.
impl PartialEq for SchemaLink {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl fmt::Debug for SchemaLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(schema) => write!(f, "SchemaLink({})", schema.name),
            None => write!(f, "SchemaLink(unbound)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_url_skips_types_without_profiles() {
        let slice = SliceDefinition::new("race")
            .with_type(ElementType::new("Extension"))
            .with_type(ElementType::new("Extension").with_profile("http://example.org/race"));
        assert_eq!(slice.profile_url(), Some("http://example.org/race"));

        let untyped = SliceDefinition::new("other").with_type(ElementType::new("Extension"));
        assert_eq!(untyped.profile_url(), None);
    }
}
