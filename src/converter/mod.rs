mod frames;
mod structure_definition;
mod values;

pub use frames::{BackboneFrame, SlicingFrame};
pub use structure_definition::*;
pub use values::{build_type_name, element_type_name, is_primitive_type, parse_cardinality};

use std::borrow::Cow;
use std::collections::HashMap;

use crate::core::CompilerConfig;
use crate::types::{
    Constraint, ConstraintSeverity, DiscriminatorKind, ElementBinding, BindingStrength,
    InternalSchemaElement, InternalTypeSchema, SliceDefinition, SliceDiscriminator, SlicingRule,
    SlicingRules,
};
use crate::utils::{paths_compatible, trim_path_prefix};
use crate::{Result, TypeSchemaError};

pub trait StructureDefinitionConverter {
    fn convert(&self, structure_definition: &StructureDefinition) -> Result<InternalTypeSchema>;
}

/// Compiles StructureDefinition snapshots into [`InternalTypeSchema`]s.
#[derive(Debug, Clone, Default)]
pub struct TypeSchemaConverter {
    config: CompilerConfig,
}

impl TypeSchemaConverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: CompilerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }
}

impl StructureDefinitionConverter for TypeSchemaConverter {
    fn convert(&self, structure_definition: &StructureDefinition) -> Result<InternalTypeSchema> {
        StructureDefinitionParser::new(structure_definition, &self.config)?.parse()
    }
}

/// Parses a StructureDefinition with the default compiler configuration.
pub fn parse_structure_definition(structure_definition: &StructureDefinition) -> Result<InternalTypeSchema> {
    TypeSchemaConverter::new().convert(structure_definition)
}

/// Single-use, single-pass parser over one snapshot.
struct StructureDefinitionParser<'a> {
    config: &'a CompilerConfig,
    name: String,
    root: &'a ElementDefinition,
    elements: &'a [ElementDefinition],
    element_index: HashMap<&'a str, &'a ElementDefinition>,
    index: usize,
    schema: InternalTypeSchema,
    inner_types: Vec<InternalTypeSchema>,
    backbone: BackboneFrame,
    slicing: SlicingFrame,
}

impl<'a> StructureDefinitionParser<'a> {
    fn new(sd: &'a StructureDefinition, config: &'a CompilerConfig) -> Result<Self> {
        let name = sd
            .name
            .clone()
            .ok_or_else(|| TypeSchemaError::conversion("<unnamed>", "StructureDefinition has no name"))?;

        let Some((root, elements)) = sd.snapshot_elements().split_first() else {
            return Err(TypeSchemaError::conversion(
                &name,
                format!("No snapshot defined for StructureDefinition '{name}'"),
            ));
        };

        let description = if config.strip_base_description_prefix {
            values::clean_description(&name, sd.description.as_deref())
        } else {
            sd.description.clone()
        };

        let mut schema = InternalTypeSchema::new(&name);
        schema.type_name = sd.type_name.clone();
        schema.title = sd.title.clone();
        schema.url = sd.url.clone();
        schema.kind = sd.kind.clone();
        schema.description = description;
        schema.constraints = compile_constraints(root);

        Ok(Self {
            config,
            name,
            root,
            elements,
            element_index: HashMap::new(),
            index: 0,
            schema,
            inner_types: Vec::new(),
            backbone: BackboneFrame::NotInBackbone,
            slicing: SlicingFrame::NotSlicing,
        })
    }

    fn parse(mut self) -> Result<InternalTypeSchema> {
        while let Some(element) = self.next()? {
            let at_sliced_path = self.slicing.path().map(|path| path == element.path);
            match (element.slice_name.as_deref(), at_sliced_path) {
                (Some(slice_name), None) => {
                    return Err(TypeSchemaError::conversion(
                        &self.name,
                        format!(
                            "Invalid slice start before discriminator: {slice_name} ({})",
                            element.id.as_deref().unwrap_or(&element.path)
                        ),
                    ));
                }
                (Some(slice_name), Some(true)) => {
                    let compiled = self.compile_element(&element)?;
                    self.slicing.start_slice(SliceDefinition::from_element(
                        slice_name,
                        element.definition.clone(),
                        compiled,
                    ));
                }
                // Re-slicing below a slice belongs to the enclosing slice
                (Some(_), Some(false)) => self.record_slice_member(&element)?,
                (None, _) if element.is_slice_member() => self.record_slice_member(&element)?,
                (None, _) => {
                    let field = self.compile_element(&element)?;
                    self.check_field_enter(&element)?;
                    self.record_field(&element, field);
                    self.check_field_exit(Some(&element.path));
                }
            }
        }

        // Wrap up when the snapshot ends inside a slice or backbone element
        self.check_field_exit(None);
        self.schema.inner_types = std::mem::take(&mut self.inner_types);
        for inner in &mut self.schema.inner_types {
            inner.parent_type = Some(self.schema.name.clone());
        }

        tracing::debug!(
            definition = %self.schema.name,
            elements = self.schema.elements.len(),
            inner_types = self.schema.inner_types.len(),
            "Compiled StructureDefinition"
        );
        Ok(self.schema)
    }

    fn next(&mut self) -> Result<Option<Cow<'a, ElementDefinition>>> {
        let element = self.peek()?;
        if element.is_some() {
            self.index += 1;
        }
        Ok(element)
    }

    fn peek(&mut self) -> Result<Option<Cow<'a, ElementDefinition>>> {
        let elements = self.elements;
        let Some(element) = elements.get(self.index) else {
            return Ok(None);
        };
        self.element_index.insert(element.path.as_str(), element);
        self.resolve_content_reference(element).map(Some)
    }

    /// Substitutes the shape of a referenced element while keeping the
    /// redirecting element's own identity and cardinality.
    fn resolve_content_reference(&self, element: &'a ElementDefinition) -> Result<Cow<'a, ElementDefinition>> {
        let Some(reference) = element.content_reference.as_deref() else {
            return Ok(Cow::Borrowed(element));
        };
        let target_path = reference
            .split_once('#')
            .map(|(_, fragment)| fragment)
            .unwrap_or(reference);
        let target = self.element_index.get(target_path).copied().ok_or_else(|| {
            TypeSchemaError::conversion(
                &self.name,
                format!("Unresolved content reference '{reference}' at {}", element.path),
            )
        })?;

        let target_base = target.base.as_ref();
        let own_base = element.base.as_ref();
        let mut resolved = target.clone();
        resolved.id = element.id.clone();
        resolved.path = element.path.clone();
        resolved.slice_name = element.slice_name.clone();
        resolved.min = element.min.or(target.min);
        resolved.max = element.max.clone().or_else(|| target.max.clone());
        resolved.base = Some(ElementDefinitionBase {
            path: target_base
                .and_then(|base| base.path.clone())
                .or_else(|| Some(target_path.to_string())),
            min: own_base
                .and_then(|base| base.min)
                .or_else(|| target_base.and_then(|base| base.min))
                .or(target.min),
            max: own_base
                .and_then(|base| base.max.clone())
                .or_else(|| target_base.and_then(|base| base.max.clone()))
                .or_else(|| target.max.clone()),
        });
        resolved.content_reference = element.content_reference.clone();
        resolved.definition = element.definition.clone();
        Ok(Cow::Owned(resolved))
    }

    fn record_slice_member(&mut self, element: &ElementDefinition) -> Result<()> {
        let compiled = self.compile_element(element)?;
        if !self.slicing.record_member(&element.path, compiled) {
            tracing::debug!(
                definition = %self.name,
                element = element.id.as_deref().unwrap_or(&element.path),
                "Slice member outside of an open slice ignored"
            );
        }
        Ok(())
    }

    fn check_field_enter(&mut self, element: &ElementDefinition) -> Result<()> {
        if self.is_inner_type(element)? {
            self.enter_inner_type(element);
        }
        if element.slicing.is_some() && !self.slicing.is_open() {
            self.enter_slicing(element)?;
        }
        Ok(())
    }

    fn is_inner_type(&mut self, element: &ElementDefinition) -> Result<bool> {
        let next = self.peek()?;
        Ok(paths_compatible(
            Some(&element.path),
            next.as_ref().map(|next| next.path.as_str()),
        ) && (element.has_type("BackboneElement") || element.has_type("Element")))
    }

    fn enter_inner_type(&mut self, element: &ElementDefinition) {
        let mut inner = InternalTypeSchema::new(values::element_type_name(element));
        inner.title = element.label.clone();
        inner.description = element.definition.clone();
        inner.constraints = compile_constraints(element);

        self.backbone = std::mem::take(&mut self.backbone).enter(
            inner,
            element.path.clone(),
            &mut self.inner_types,
        );
    }

    fn enter_slicing(&mut self, element: &ElementDefinition) -> Result<()> {
        let Some(slicing) = element.slicing.as_ref() else {
            return Ok(());
        };
        if self.config.elide_default_extension_slicing && has_default_extension_slice(element) {
            let next_starts_slice = self.peek()?.is_some_and(|next| next.slice_name.is_some());
            if !next_starts_slice {
                // Extensions are always sliced by url; no slices follow here
                return Ok(());
            }
        }

        let discriminators = self.compile_discriminators(slicing)?;

        let (owner, key) = match self.backbone.locate(&element.path) {
            Some((owner, key)) => (Some(owner), key),
            None => (None, trim_path_prefix(&element.path, &self.root.path).to_string()),
        };

        self.slicing = SlicingFrame::Slicing {
            rules: SlicingRules {
                discriminators,
                ordered: slicing.ordered.unwrap_or(false),
                rule: slicing.rules.as_deref().and_then(SlicingRule::parse),
                slices: Vec::new(),
            },
            current: None,
            path: element.path.clone(),
            owner,
            key,
        };
        Ok(())
    }

    fn record_field(&mut self, element: &ElementDefinition, field: InternalSchemaElement) {
        let Some(field) = self.backbone.try_record(&element.path, field) else {
            return;
        };

        // Profiles such as SimpleQuantity keep their base type's root path,
        // so keys are relative to the root element path, not the name.
        let key = trim_path_prefix(&element.path, &self.root.path).to_string();
        let property = key.replace("[x]", "");
        if element.is_summary == Some(true) {
            self.schema.summary_properties.insert(property.clone());
        }
        if field.min > 0 {
            self.schema.mandatory_properties.insert(property);
        }
        self.schema.elements.insert(key, field);
    }

    fn check_field_exit(&mut self, path: Option<&str>) {
        if self.backbone.path().is_some() && !paths_compatible(self.backbone.path(), path) {
            // Leaving BackboneElement child fields
            self.backbone = std::mem::take(&mut self.backbone).unwind(path, &mut self.inner_types);
        }

        if self.slicing.is_open() && !paths_compatible(self.slicing.path(), path) {
            self.close_slicing();
        }
    }

    fn close_slicing(&mut self) {
        let Some((rules, owner, key)) = std::mem::take(&mut self.slicing).finish() else {
            return;
        };
        match self.sliced_element_mut(owner.as_deref(), &key) {
            Some(element) => element.slicing = Some(rules),
            None => tracing::warn!(
                definition = %self.name,
                element = %key,
                "Sliced element not found when closing slicing"
            ),
        }
    }

    fn sliced_element_mut(&mut self, owner: Option<&str>, key: &str) -> Option<&mut InternalSchemaElement> {
        let Some(owner) = owner else {
            return self.schema.elements.get_mut(key);
        };
        if let Some(open) = self.backbone.find_mut(owner) {
            return open.elements.get_mut(key);
        }
        self.inner_types
            .iter_mut()
            .rev()
            .find(|inner| inner.name == owner)
            .and_then(|inner| inner.elements.get_mut(key))
    }

    fn compile_discriminators(&self, slicing: &ElementDefinitionSlicing) -> Result<Vec<SliceDiscriminator>> {
        slicing
            .discriminator
            .iter()
            .flatten()
            .map(|discriminator| {
                DiscriminatorKind::parse(&discriminator.discriminator_type)
                    .map(|kind| SliceDiscriminator {
                        path: discriminator.path.clone(),
                        kind,
                    })
                    .ok_or_else(|| {
                        TypeSchemaError::conversion(
                            &self.name,
                            format!(
                                "Unsupported slicing discriminator type: {}",
                                discriminator.discriminator_type
                            ),
                        )
                    })
            })
            .collect()
    }

    fn compile_element(&self, element: &ElementDefinition) -> Result<InternalSchemaElement> {
        // Every slicing declaration is checked, including nested ones no frame opens for
        if let Some(slicing) = element.slicing.as_ref() {
            self.compile_discriminators(slicing)?;
        }
        let max = values::decode_max(element.max.as_deref(), &self.name)?;
        let base_max = match element.base.as_ref().and_then(|base| base.max.as_deref()) {
            Some(base_max) => values::decode_max(Some(base_max), &self.name)?,
            None => max,
        };
        let path = if element.path.is_empty() {
            element
                .base
                .as_ref()
                .and_then(|base| base.path.clone())
                .unwrap_or_default()
        } else {
            element.path.clone()
        };

        Ok(InternalSchemaElement {
            path,
            description: element.definition.clone().unwrap_or_default(),
            min: element.min.unwrap_or(0),
            max,
            is_array: base_max.exceeds_one(),
            types: values::compile_types(element),
            fixed: values::typed_property(element, "fixed"),
            pattern: values::typed_property(element, "pattern"),
            slicing: None,
            binding: element.binding.as_ref().and_then(|binding| {
                BindingStrength::parse(&binding.strength).map(|strength| ElementBinding {
                    strength,
                    value_set: binding.value_set.clone(),
                    description: binding.description.clone(),
                })
            }),
            constraints: compile_constraints(element),
        })
    }
}

fn compile_constraints(element: &ElementDefinition) -> Vec<Constraint> {
    element
        .constraint
        .iter()
        .flatten()
        .map(|constraint| Constraint {
            key: constraint.key.clone().unwrap_or_default(),
            severity: ConstraintSeverity::parse(constraint.severity.as_deref()),
            expression: constraint.expression.clone().unwrap_or_default(),
            description: constraint.human.clone().unwrap_or_default(),
        })
        .collect()
}

fn has_default_extension_slice(element: &ElementDefinition) -> bool {
    let Some(discriminators) = element
        .slicing
        .as_ref()
        .and_then(|slicing| slicing.discriminator.as_ref())
    else {
        return false;
    };
    element.has_type("Extension")
        && discriminators.len() == 1
        && discriminators[0].discriminator_type == "value"
        && discriminators[0].path == "url"
}
