use once_cell::sync::Lazy;
use serde_json::Value;
use std::collections::HashSet;

use super::structure_definition::{ElementDefinition, ElementDefinitionType};
use crate::types::{Cardinality, ElementType, TypedValue};
use crate::utils::{capitalize, uncapitalize};
use crate::{Result, TypeSchemaError};

const FHIR_TYPE_EXTENSION: &str =
    "http://hl7.org/fhir/StructureDefinition/structuredefinition-fhir-type";

static PRIMITIVE_TYPES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "base64Binary",
        "boolean",
        "canonical",
        "code",
        "date",
        "dateTime",
        "decimal",
        "id",
        "instant",
        "integer",
        "integer64",
        "markdown",
        "oid",
        "positiveInt",
        "string",
        "time",
        "unsignedInt",
        "uri",
        "url",
        "uuid",
        "xhtml",
    ]
    .into_iter()
    .collect()
});

pub fn is_primitive_type(code: &str) -> bool {
    PRIMITIVE_TYPES.contains(code)
}

pub fn is_backbone_code(code: &str) -> bool {
    code == "BackboneElement" || code == "Element"
}

pub fn parse_cardinality(max: &str) -> Option<Cardinality> {
    if max == "*" {
        Some(Cardinality::Unbounded)
    } else {
        max.parse().ok().map(Cardinality::Bounded)
    }
}

/// Decodes an optional max; absent values decode to one.
pub fn decode_max(max: Option<&str>, definition: &str) -> Result<Cardinality> {
    match max {
        None => Ok(Cardinality::Bounded(1)),
        Some(max) => parse_cardinality(max).ok_or_else(|| {
            TypeSchemaError::conversion(definition, format!("Invalid cardinality '{max}'"))
        }),
    }
}

/// `["Patient", "contact"]` becomes `PatientContact`; a single segment is kept as is.
pub fn build_type_name(segments: &[&str]) -> String {
    match segments {
        [] => String::new(),
        [single] => single.to_string(),
        [first, rest @ ..] => {
            let mut name = first.to_string();
            for segment in rest {
                name.push_str(&capitalize(segment));
            }
            name
        }
    }
}

/// Type name of an element: the synthesized inner type name for
/// BackboneElement/Element, otherwise the first type code.
pub fn element_type_name(element: &ElementDefinition) -> String {
    match element.first_type_code() {
        Some(code) if is_backbone_code(code) => {
            let path = element
                .base
                .as_ref()
                .and_then(|base| base.path.as_deref())
                .unwrap_or(&element.path);
            let segments: Vec<&str> = path.split('.').collect();
            build_type_name(&segments)
        }
        Some(code) => code.to_string(),
        None => String::new(),
    }
}

pub fn compile_types(element: &ElementDefinition) -> Vec<ElementType> {
    element
        .element_type
        .iter()
        .flatten()
        .map(|declared| ElementType {
            code: compiled_type_code(element, declared),
            target_profile: declared.target_profile.clone().unwrap_or_default(),
            profile: declared.profile.clone().unwrap_or_default(),
        })
        .collect()
}

fn compiled_type_code(element: &ElementDefinition, declared: &ElementDefinitionType) -> String {
    let code = declared.code.as_deref().unwrap_or_default();
    if is_backbone_code(code) {
        return element_type_name(element);
    }
    declared
        .extension
        .iter()
        .flatten()
        .find(|extension| extension.url == FHIR_TYPE_EXTENSION)
        .and_then(|extension| extension.value_url.clone())
        .unwrap_or_else(|| code.to_string())
}

/// First populated `{prefix}{Type}` property of the element, tagged with `Type`.
pub fn typed_property(element: &ElementDefinition, prefix: &str) -> Option<TypedValue> {
    element.extra.iter().find_map(|(key, value)| {
        let suffix = key.strip_prefix(prefix)?;
        if suffix.is_empty() || !suffix.starts_with(|c: char| c.is_ascii_uppercase()) {
            return None;
        }
        if !is_populated(value) {
            return None;
        }
        let uncapitalized = uncapitalize(suffix);
        let type_name = if is_primitive_type(&uncapitalized) {
            uncapitalized
        } else {
            suffix.to_string()
        };
        Some(TypedValue::new(type_name, value.clone()))
    })
}

fn is_populated(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        _ => true,
    }
}

/// Removes the boilerplate `Base StructureDefinition for X Type: ` prefix.
pub fn clean_description(name: &str, description: Option<&str>) -> Option<String> {
    let description = description?;
    let prefix = format!("Base StructureDefinition for {name} Type: ");
    Some(
        description
            .strip_prefix(prefix.as_str())
            .unwrap_or(description)
            .to_string(),
    )
}
