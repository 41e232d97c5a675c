use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StructureDefinition {
    #[serde(default = "structure_definition_resource_type")]
    pub resource_type: String,

    pub id: Option<String>,
    pub url: Option<String>,
    pub version: Option<String>,
    pub name: Option<String>,
    pub title: Option<String>,
    pub status: Option<String>,
    pub description: Option<String>,

    pub kind: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_: Option<bool>,

    #[serde(rename = "type")]
    pub type_name: Option<String>,

    pub base_definition: Option<String>,
    pub derivation: Option<String>,

    pub snapshot: Option<StructureDefinitionSnapshot>,
}

fn structure_definition_resource_type() -> String {
    "StructureDefinition".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StructureDefinitionSnapshot {
    #[serde(default)]
    pub element: Vec<ElementDefinition>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ElementDefinition {
    pub id: Option<String>,
    #[serde(default)]
    pub path: String,

    pub slice_name: Option<String>,
    pub label: Option<String>,
    pub slicing: Option<ElementDefinitionSlicing>,
    pub short: Option<String>,
    pub definition: Option<String>,

    pub min: Option<u32>,
    pub max: Option<String>,
    pub base: Option<ElementDefinitionBase>,

    pub content_reference: Option<String>,

    #[serde(rename = "type")]
    pub element_type: Option<Vec<ElementDefinitionType>>,

    pub constraint: Option<Vec<ElementDefinitionConstraint>>,
    pub is_summary: Option<bool>,
    pub binding: Option<ElementDefinitionBinding>,

    /// Everything not modelled above, including the type-suffixed
    /// `fixed*` / `pattern*` properties.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ElementDefinitionSlicing {
    pub discriminator: Option<Vec<ElementDefinitionSlicingDiscriminator>>,
    pub description: Option<String>,
    pub ordered: Option<bool>,
    pub rules: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ElementDefinitionSlicingDiscriminator {
    #[serde(rename = "type")]
    pub discriminator_type: String,
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ElementDefinitionBase {
    pub path: Option<String>,
    pub min: Option<u32>,
    pub max: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ElementDefinitionType {
    pub code: Option<String>,
    pub profile: Option<Vec<String>>,
    pub target_profile: Option<Vec<String>>,
    pub extension: Option<Vec<Extension>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Extension {
    pub url: String,
    pub value_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ElementDefinitionConstraint {
    pub key: Option<String>,
    pub severity: Option<String>,
    pub human: Option<String>,
    pub expression: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ElementDefinitionBinding {
    pub strength: String,
    pub description: Option<String>,
    pub value_set: Option<String>,
}

/// A FHIR Bundle reduced to what definition indexing needs.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Bundle {
    #[serde(default)]
    pub entry: Vec<BundleEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BundleEntry {
    pub resource: Option<Value>,
}

impl StructureDefinition {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            resource_type: structure_definition_resource_type(),
            id: None,
            url: None,
            version: None,
            name: Some(name.into()),
            title: None,
            status: None,
            description: None,
            kind: None,
            abstract_: None,
            type_name: Some(type_name.into()),
            base_definition: None,
            derivation: None,
            snapshot: None,
        }
    }

    pub fn from_json(value: Value) -> crate::Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_elements(mut self, elements: Vec<ElementDefinition>) -> Self {
        self.snapshot = Some(StructureDefinitionSnapshot { element: elements });
        self
    }

    pub fn snapshot_elements(&self) -> &[ElementDefinition] {
        self.snapshot
            .as_ref()
            .map(|snapshot| snapshot.element.as_slice())
            .unwrap_or_default()
    }

    pub fn is_structure_definition(&self) -> bool {
        self.resource_type == "StructureDefinition"
    }
}

impl ElementDefinition {
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            id: Some(path.clone()),
            path,
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_slice_name(mut self, slice_name: impl Into<String>) -> Self {
        self.slice_name = Some(slice_name.into());
        self
    }

    pub fn with_cardinality(mut self, min: u32, max: impl Into<String>) -> Self {
        self.min = Some(min);
        self.max = Some(max.into());
        self
    }

    pub fn with_base(mut self, path: impl Into<String>, min: u32, max: impl Into<String>) -> Self {
        self.base = Some(ElementDefinitionBase {
            path: Some(path.into()),
            min: Some(min),
            max: Some(max.into()),
        });
        self
    }

    pub fn with_type(mut self, code: impl Into<String>) -> Self {
        self.element_type
            .get_or_insert_with(Vec::new)
            .push(ElementDefinitionType {
                code: Some(code.into()),
                ..Default::default()
            });
        self
    }

    pub fn with_profiled_type(mut self, code: impl Into<String>, profile: impl Into<String>) -> Self {
        self.element_type
            .get_or_insert_with(Vec::new)
            .push(ElementDefinitionType {
                code: Some(code.into()),
                profile: Some(vec![profile.into()]),
                ..Default::default()
            });
        self
    }

    pub fn with_slicing(
        mut self,
        discriminators: &[(&str, &str)],
        ordered: bool,
        rules: impl Into<String>,
    ) -> Self {
        self.slicing = Some(ElementDefinitionSlicing {
            discriminator: Some(
                discriminators
                    .iter()
                    .map(|(kind, path)| ElementDefinitionSlicingDiscriminator {
                        discriminator_type: kind.to_string(),
                        path: path.to_string(),
                    })
                    .collect(),
            ),
            description: None,
            ordered: Some(ordered),
            rules: Some(rules.into()),
        });
        self
    }

    pub fn with_content_reference(mut self, reference: impl Into<String>) -> Self {
        self.content_reference = Some(reference.into());
        self
    }

    pub fn with_definition(mut self, definition: impl Into<String>) -> Self {
        self.definition = Some(definition.into());
        self
    }

    /// Sets a type-suffixed property such as `fixedUri` or `patternCodeableConcept`.
    pub fn with_property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    pub fn first_type_code(&self) -> Option<&str> {
        self.element_type
            .as_ref()
            .and_then(|types| types.first())
            .and_then(|t| t.code.as_deref())
    }

    pub fn has_type(&self, code: &str) -> bool {
        self.element_type
            .iter()
            .flatten()
            .any(|t| t.code.as_deref() == Some(code))
    }

    /// Slice member elements carry a `:` slice separator in their id.
    pub fn is_slice_member(&self) -> bool {
        self.id.as_deref().is_some_and(|id| id.contains(':'))
    }
}
