// Compiled element definitions: cardinality, allowed types and fixed/pattern values

use serde::{Deserialize, Serialize};
use std::fmt;

use super::SlicingRules;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InternalSchemaElement {
    pub path: String,
    pub description: String,
    pub min: u32,
    pub max: Cardinality,
    /// Derived from the base (pre-profile) max, not from `max`.
    pub is_array: bool,
    #[serde(rename = "type")]
    pub types: Vec<ElementType>,
    pub fixed: Option<TypedValue>,
    pub pattern: Option<TypedValue>,
    pub slicing: Option<SlicingRules>,
    pub binding: Option<ElementBinding>,
    #[serde(default)]
    pub constraints: Vec<Constraint>,
}

/// Upper bound of an element's occurrence count.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    Bounded(u32),
    Unbounded,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ElementType {
    pub code: String,
    #[serde(default)]
    pub target_profile: Vec<String>,
    #[serde(default)]
    pub profile: Vec<String>,
}

/// A JSON value tagged with the FHIR type it was declared as.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TypedValue {
    #[serde(rename = "type")]
    pub type_name: String,
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ElementBinding {
    pub strength: BindingStrength,
    pub value_set: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BindingStrength {
    #[serde(rename = "required")]
    Required,
    #[serde(rename = "extensible")]
    Extensible,
    #[serde(rename = "preferred")]
    Preferred,
    #[serde(rename = "example")]
    Example,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Constraint {
    pub key: String,
    pub severity: ConstraintSeverity,
    pub expression: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConstraintSeverity {
    Error,
    Warning,
}

impl InternalSchemaElement {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            description: String::new(),
            min: 0,
            max: Cardinality::Bounded(1),
            is_array: false,
            types: Vec::new(),
            fixed: None,
            pattern: None,
            slicing: None,
            binding: None,
            constraints: Vec::new(),
        }
    }

    pub fn with_cardinality(mut self, min: u32, max: Cardinality) -> Self {
        self.min = min;
        self.max = max;
        self.is_array = max.exceeds_one();
        self
    }

    pub fn with_type(mut self, element_type: ElementType) -> Self {
        self.types.push(element_type);
        self
    }

    pub fn with_slicing(mut self, slicing: SlicingRules) -> Self {
        self.slicing = Some(slicing);
        self
    }

    pub fn is_required(&self) -> bool {
        self.min > 0
    }

    pub fn type_codes(&self) -> impl Iterator<Item = &str> {
        self.types.iter().map(|t| t.code.as_str())
    }

    /// Value set of a `required` binding, if any.
    pub fn required_binding(&self) -> Option<&str> {
        self.binding
            .as_ref()
            .filter(|binding| binding.strength == BindingStrength::Required)
            .and_then(|binding| binding.value_set.as_deref())
    }
}

impl Cardinality {
    pub fn exceeds_one(&self) -> bool {
        match self {
            Cardinality::Bounded(n) => *n > 1,
            Cardinality::Unbounded => true,
        }
    }

    pub fn as_option(&self) -> Option<u32> {
        match self {
            Cardinality::Bounded(n) => Some(*n),
            Cardinality::Unbounded => None,
        }
    }
}

impl Default for Cardinality {
    fn default() -> Self {
        Cardinality::Bounded(1)
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cardinality::Bounded(n) => write!(f, "{n}"),
            Cardinality::Unbounded => write!(f, "*"),
        }
    }
}

impl ElementType {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            target_profile: Vec::new(),
            profile: Vec::new(),
        }
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile.push(profile.into());
        self
    }

    pub fn with_target_profile(mut self, target_profile: impl Into<String>) -> Self {
        self.target_profile.push(target_profile.into());
        self
    }
}

impl TypedValue {
    pub fn new(type_name: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            type_name: type_name.into(),
            value,
        }
    }
}

impl BindingStrength {
    pub fn parse(strength: &str) -> Option<Self> {
        match strength {
            "required" => Some(Self::Required),
            "extensible" => Some(Self::Extensible),
            "preferred" => Some(Self::Preferred),
            "example" => Some(Self::Example),
            _ => None,
        }
    }
}

impl ConstraintSeverity {
    pub fn parse(severity: Option<&str>) -> Self {
        match severity {
            Some("warning") => Self::Warning,
            _ => Self::Error,
        }
    }
}
