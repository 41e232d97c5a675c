use std::sync::Arc;

use crate::types::InternalTypeSchema;

/// Read side of a schema registry, as seen by traversals.
pub trait SchemaResolver: Send + Sync {
    /// Looks a type up by name, preferring the namespace of `profile_url`.
    fn resolve_type(&self, name: &str, profile_url: Option<&str>) -> Option<Arc<InternalTypeSchema>>;

    /// Looks a compiled profile up by its canonical URL.
    fn resolve_profile(&self, url: &str) -> Option<Arc<InternalTypeSchema>>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryStats {
    pub data_types: usize,
    pub profiles: usize,
    pub profile_namespaces: usize,
}
