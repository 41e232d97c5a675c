use papaya::HashMap as PapayaMap;
use std::sync::Arc;

use super::{RegistryStats, SchemaResolver};
use crate::converter::{
    Bundle, StructureDefinition, StructureDefinitionConverter, TypeSchemaConverter,
};
use crate::core::{CompilerConfig, TypeSchemaConfig};
use crate::error::{LookupKind, Result, TypeSchemaError};
use crate::types::InternalTypeSchema;

type TypeMap = PapayaMap<String, Arc<InternalTypeSchema>>;

/// Name-indexed store of compiled type schemas.
///
/// Reads are lock-free and may run from many threads at once. Loading is
/// meant to finish before traversals start: a later load under the same
/// name replaces the earlier schema, and the outcome of two loads racing
/// on one name is unspecified.
#[derive(Debug)]
pub struct SchemaRegistry {
    converter: TypeSchemaConverter,
    data_types: TypeMap,
    // Profiles alter the schemas of their elements, so each profile URL
    // gets its own name -> schema namespace
    profile_data_types: PapayaMap<String, Arc<TypeMap>>,
    profiles: TypeMap,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::with_config(CompilerConfig::default())
    }

    pub fn with_config(config: CompilerConfig) -> Self {
        Self {
            converter: TypeSchemaConverter::with_config(config),
            data_types: PapayaMap::new(),
            profile_data_types: PapayaMap::new(),
            profiles: PapayaMap::new(),
        }
    }

    /// Builds a registry from the compiler half of a full configuration.
    pub fn from_config(config: &TypeSchemaConfig) -> Self {
        Self::with_config(config.compiler.clone())
    }

    /// Compiles `sd` and registers it together with its inner types.
    pub fn load(&self, sd: &StructureDefinition) -> Result<Arc<InternalTypeSchema>> {
        self.load_with_profile(sd, None)
    }

    /// Loads a profile into its own namespace and indexes it by its URL.
    pub fn load_profile(&self, sd: &StructureDefinition) -> Result<Arc<InternalTypeSchema>> {
        self.load_with_profile(sd, sd.url.as_deref())
    }

    pub fn load_with_profile(
        &self,
        sd: &StructureDefinition,
        profile_url: Option<&str>,
    ) -> Result<Arc<InternalTypeSchema>> {
        let name = sd.name.as_deref().unwrap_or("<unnamed>");
        if !sd.is_structure_definition() {
            return Err(TypeSchemaError::conversion(
                name,
                format!("Expected a StructureDefinition, got {}", sd.resource_type),
            ));
        }

        let schema = Arc::new(self.converter.convert(sd)?);

        let namespace = self.namespace(profile_url);
        let types = namespace.as_deref().unwrap_or(&self.data_types).pin();
        for inner in &schema.inner_types {
            types.insert(inner.name.clone(), Arc::new(inner.clone()));
        }
        types.insert(schema.name.clone(), Arc::clone(&schema));

        if let Some(profile_url) = profile_url {
            if sd.url.as_deref() == Some(profile_url) {
                self.profiles
                    .pin()
                    .insert(profile_url.to_string(), Arc::clone(&schema));
            }
        }

        tracing::debug!(
            name = %schema.name,
            profile = profile_url.unwrap_or_default(),
            inner_types = schema.inner_types.len(),
            "Registered type schema"
        );
        Ok(schema)
    }

    /// Loads every definition in order, stopping at the first failure.
    pub fn index_definitions<'s>(
        &self,
        definitions: impl IntoIterator<Item = &'s StructureDefinition>,
        profile_url: Option<&str>,
    ) -> Result<usize> {
        let mut loaded = 0;
        for sd in definitions {
            if !sd.is_structure_definition() {
                continue;
            }
            self.load_with_profile(sd, profile_url)?;
            loaded += 1;
        }
        Ok(loaded)
    }

    /// Loads the StructureDefinitions of a Bundle, skipping other resources.
    pub fn index_bundle(&self, bundle: &Bundle, profile_url: Option<&str>) -> Result<usize> {
        let mut definitions = Vec::with_capacity(bundle.entry.len());
        for resource in bundle.entry.iter().filter_map(|entry| entry.resource.as_ref()) {
            let resource_type = resource.get("resourceType").and_then(|t| t.as_str());
            if resource_type != Some("StructureDefinition") {
                tracing::warn!(resource_type, "Skipping non-StructureDefinition bundle entry");
                continue;
            }
            definitions.push(StructureDefinition::from_json(resource.clone())?);
        }

        let loaded = self.index_definitions(&definitions, profile_url)?;
        tracing::info!(loaded, profile = profile_url.unwrap_or_default(), "Indexed StructureDefinition bundle");
        Ok(loaded)
    }

    /// Accepts either a Bundle resource or a bare array of StructureDefinitions.
    pub fn index_bundle_json(&self, json: serde_json::Value, profile_url: Option<&str>) -> Result<usize> {
        let bundle = match json {
            serde_json::Value::Array(resources) => Bundle {
                entry: resources
                    .into_iter()
                    .map(|resource| crate::converter::BundleEntry {
                        resource: Some(resource),
                    })
                    .collect(),
            },
            other => serde_json::from_value(other)?,
        };
        self.index_bundle(&bundle, profile_url)
    }

    pub fn get(&self, name: &str) -> Result<Arc<InternalTypeSchema>> {
        self.try_get(name, None)
            .ok_or_else(|| TypeSchemaError::not_found(LookupKind::DataType, name))
    }

    /// Looks in the profile namespace first, then falls back to base types.
    pub fn try_get(&self, name: &str, profile_url: Option<&str>) -> Option<Arc<InternalTypeSchema>> {
        if let Some(profile_url) = profile_url {
            let namespaces = self.profile_data_types.pin();
            if let Some(found) = namespaces
                .get(profile_url)
                .and_then(|types| types.pin().get(name).cloned())
            {
                return Some(found);
            }
        }
        self.data_types.pin().get(name).cloned()
    }

    pub fn get_profile(&self, url: &str) -> Result<Arc<InternalTypeSchema>> {
        self.try_get_profile(url)
            .ok_or_else(|| TypeSchemaError::not_found(LookupKind::Profile, url))
    }

    pub fn try_get_profile(&self, url: &str) -> Option<Arc<InternalTypeSchema>> {
        self.profiles.pin().get(url).cloned()
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.data_types.pin().contains_key(name)
    }

    pub fn is_profile_loaded(&self, url: &str) -> bool {
        self.profiles.pin().contains_key(url)
    }

    pub fn is_resource_type(&self, name: &str) -> bool {
        self.data_types
            .pin()
            .get(name)
            .is_some_and(|schema| schema.is_resource_type())
    }

    /// Base namespace type names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.data_types.pin().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.data_types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            data_types: self.data_types.len(),
            profiles: self.profiles.len(),
            profile_namespaces: self.profile_data_types.len(),
        }
    }

    fn namespace(&self, profile_url: Option<&str>) -> Option<Arc<TypeMap>> {
        let profile_url = profile_url?;
        let namespaces = self.profile_data_types.pin();
        Some(Arc::clone(namespaces.get_or_insert_with(
            profile_url.to_string(),
            || Arc::new(PapayaMap::new()),
        )))
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaResolver for SchemaRegistry {
    fn resolve_type(&self, name: &str, profile_url: Option<&str>) -> Option<Arc<InternalTypeSchema>> {
        self.try_get(name, profile_url)
    }

    fn resolve_profile(&self, url: &str) -> Option<Arc<InternalTypeSchema>> {
        self.try_get_profile(url)
    }
}
