//! Depth-first, visitor-driven traversal of compiled schemas.
//!
//! The crawler organizes the elements visible in the current scope into a
//! path-prefix tree and walks it parent first, siblings ordered by key.
//! Sliced elements are followed by their slices in declaration order; a
//! slice that resolves to a schema of its own (an extension or a profiled
//! type) is bracketed by schema events so visitors can tell host and nested
//! schemas apart.
//!
//! ```rust,no_run
//! use octofhir_typeschema::{SchemaCrawler, SchemaRegistry, SchemaVisitor, InternalSchemaElement, ElementsContext};
//!
//! struct Paths(Vec<String>);
//!
//! impl SchemaVisitor for Paths {
//!     fn on_enter_element(&mut self, path: &str, _: &InternalSchemaElement, _: &ElementsContext) {
//!         self.0.push(path.to_string());
//!     }
//! }
//!
//! # fn example(registry: &SchemaRegistry) -> octofhir_typeschema::Result<()> {
//! let schema = registry.get("Patient")?;
//! let mut paths = Paths(Vec::new());
//! SchemaCrawler::new(schema, registry, &mut paths)?.crawl_resource()?;
//! # Ok(())
//! # }
//! ```

mod tree;
mod visitor;

pub use tree::{build_element_tree, ElementNode};
pub use visitor::SchemaVisitor;

use std::sync::Arc;

use crate::context::{build_elements_context, ElementsContext, ElementsContextArgs, FieldAccessPolicy};
use crate::core::{CrawlerConfig, TypeSchemaConfig};
use crate::storage::SchemaResolver;
use crate::types::{ElementMap, InternalSchemaElement, InternalTypeSchema, SliceDefinition, SlicingRules};
use crate::utils::join_path;
use crate::{Result, TypeSchemaError};

/// Walks one schema and reports to a [`SchemaVisitor`].
///
/// A crawler carries its own context and slice allow-list stacks, so build
/// one per traversal. Several crawlers may share a resolver concurrently.
pub struct SchemaCrawler<'a, V: SchemaVisitor + ?Sized> {
    schema: Arc<InternalTypeSchema>,
    resolver: &'a dyn SchemaResolver,
    visitor: &'a mut V,
    config: CrawlerConfig,
    access_policy: Option<Arc<FieldAccessPolicy>>,
    start_path: String,
    start_elements: Option<&'a ElementMap>,
    contexts: Vec<ElementsContext>,
    slice_allow_list: Vec<(String, Vec<String>)>,
}

impl<'a, V: SchemaVisitor + ?Sized> SchemaCrawler<'a, V> {
    pub fn new(
        schema: Arc<InternalTypeSchema>,
        resolver: &'a dyn SchemaResolver,
        visitor: &'a mut V,
    ) -> Result<Self> {
        let Some(type_name) = schema.type_name.clone() else {
            return Err(TypeSchemaError::crawl(format!(
                "Schema '{}' has no root type name",
                schema.name
            )));
        };

        Ok(Self {
            schema,
            resolver,
            visitor,
            config: CrawlerConfig::default(),
            access_policy: None,
            start_path: type_name,
            start_elements: None,
            contexts: Vec::new(),
            slice_allow_list: Vec::new(),
        })
    }

    /// Starts from an externally supplied element map anchored at `path`
    /// instead of the schema's own elements.
    pub fn with_elements(mut self, path: impl Into<String>, elements: &'a ElementMap) -> Self {
        self.start_path = path.into();
        self.start_elements = Some(elements);
        self.contexts.clear();
        self
    }

    pub fn with_config(mut self, config: CrawlerConfig) -> Self {
        self.config = config;
        self.contexts.clear();
        self
    }

    /// Applies the crawler half of a full configuration.
    pub fn with_type_schema_config(self, config: &TypeSchemaConfig) -> Self {
        self.with_config(config.crawler.clone())
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self.contexts.clear();
        self
    }

    pub fn with_access_policy(mut self, policy: FieldAccessPolicy) -> Self {
        self.access_policy = Some(Arc::new(policy));
        self.contexts.clear();
        self
    }

    pub fn schema(&self) -> &Arc<InternalTypeSchema> {
        &self.schema
    }

    /// Crawls every element of the starting scope, bracketed by the root
    /// schema's enter and exit events.
    pub fn crawl_resource(&mut self) -> Result<()> {
        self.ensure_root_context()?;
        let schema = Arc::clone(&self.schema);

        self.visitor.on_enter_schema(&schema);
        let root = current(&self.contexts)?;
        let path = root.path.clone();
        let tree = build_element_tree(
            root.elements
                .iter()
                .map(|(key, element)| (key.clone(), Arc::clone(element))),
        );
        for node in &tree {
            self.crawl_node(&path, node)?;
        }
        self.visitor.on_exit_schema(&schema);
        Ok(())
    }

    /// Crawls the element at `key` and every element nested below it.
    pub fn crawl_element(&mut self, key: &str) -> Result<()> {
        self.ensure_root_context()?;
        let context = current(&self.contexts)?;
        if !context.elements.contains_key(key) {
            return Err(TypeSchemaError::crawl(format!(
                "Element '{key}' is not visible at {}",
                context.path
            )));
        }

        let path = context.path.clone();
        let prefix = format!("{key}.");
        let tree = build_element_tree(
            context
                .elements
                .iter()
                .filter(|(candidate, _)| candidate.as_str() == key || candidate.starts_with(&prefix))
                .map(|(candidate, element)| (candidate.clone(), Arc::clone(element))),
        );
        for node in &tree {
            self.crawl_node(&path, node)?;
        }
        Ok(())
    }

    /// Crawls exactly one slice of the sliced element at `key`.
    pub fn crawl_slice(&mut self, key: &str, slice_name: &str) -> Result<()> {
        self.ensure_root_context()?;
        let context = current(&self.contexts)?;
        let element = context.elements.get(key).cloned().ok_or_else(|| {
            TypeSchemaError::crawl(format!("Element '{key}' is not visible at {}", context.path))
        })?;
        let path = join_path(&context.path, key);

        let slicing = element
            .slicing
            .as_ref()
            .ok_or_else(|| TypeSchemaError::crawl(format!("Element {path} is not sliced")))?;
        let slice = slicing.slice(slice_name).ok_or_else(|| {
            TypeSchemaError::crawl(format!("Slice '{slice_name}' not found on {path}"))
        })?;
        if !slice.has_types() {
            return Err(TypeSchemaError::crawl(format!(
                "Cannot crawl slice '{slice_name}' of {path} without type information"
            )));
        }

        self.slice_allow_list
            .push((path.clone(), vec![slice_name.to_string()]));
        let result = self.crawl_slices(&path, &element);
        self.slice_allow_list.pop();
        result
    }

    fn ensure_root_context(&mut self) -> Result<()> {
        if !self.contexts.is_empty() {
            return Ok(());
        }

        let elements = self.start_elements.unwrap_or(&self.schema.elements);
        let profile_url = if self.schema.is_profile() {
            self.schema.url.clone()
        } else {
            None
        };
        let mut args = ElementsContextArgs::new(&self.start_path, elements)
            .with_profile_url(profile_url)
            .with_debug(self.config.debug);
        if let Some(policy) = &self.access_policy {
            args = args.with_access_policy(Arc::clone(policy));
        }

        let root = build_elements_context(args).ok_or_else(|| {
            TypeSchemaError::crawl(format!("No elements context at {}", self.start_path))
        })?;
        self.contexts.push(root);
        Ok(())
    }

    fn crawl_node(&mut self, parent_path: &str, node: &ElementNode) -> Result<()> {
        let path = join_path(parent_path, &node.key);

        self.visitor
            .on_enter_element(&path, &node.element, current(&self.contexts)?);
        for child in &node.children {
            self.crawl_node(&path, child)?;
        }
        self.crawl_slices(&path, &node.element)?;
        self.visitor
            .on_exit_element(&path, &node.element, current(&self.contexts)?);
        Ok(())
    }

    fn crawl_slices(&mut self, path: &str, element: &InternalSchemaElement) -> Result<()> {
        let Some(slicing) = element.slicing.as_ref() else {
            return Ok(());
        };
        for slice in &slicing.slices {
            if !self.is_slice_allowed(path, &slice.name) {
                continue;
            }
            if !slice.has_types() && self.config.skip_untyped_slices {
                continue;
            }
            self.crawl_one_slice(path, slice, slicing)?;
        }
        Ok(())
    }

    fn crawl_one_slice(&mut self, path: &str, slice: &SliceDefinition, slicing: &SlicingRules) -> Result<()> {
        let slice_schema = self.resolve_slice_schema(slice);
        if let Some(schema) = slice_schema.as_deref() {
            self.visitor.on_enter_schema(schema);
        }
        self.visitor.on_enter_slice(path, slice, slicing);

        let (elements, profile_url) = match slice_schema.as_deref() {
            Some(schema) if schema.is_profile() => (&schema.elements, schema.url.clone()),
            Some(schema) => (&schema.elements, None),
            None => (&slice.elements, None),
        };

        let parent = current(&self.contexts)?;
        let context = build_elements_context(
            ElementsContextArgs::new(path, elements)
                .with_parent(Some(parent))
                .with_profile_url(profile_url),
        );
        // The slice's own elements are walked; the merged scope only
        // decides which keys an access policy hides.
        let scope = context.as_ref().unwrap_or(parent);
        let tree = build_element_tree(elements.iter().filter_map(|(key, element)| {
            let shared = scope.elements.get(key)?;
            let element = if shared.as_ref() == element {
                Arc::clone(shared)
            } else {
                Arc::new(element.clone())
            };
            Some((key.clone(), element))
        }));

        let pushed = match context {
            Some(context) => {
                self.contexts.push(context);
                true
            }
            None => false,
        };
        let result = tree.iter().try_for_each(|node| self.crawl_node(path, node));
        if pushed {
            self.contexts.pop();
        }
        result?;

        self.visitor.on_exit_slice(path, slice, slicing);
        if let Some(schema) = slice_schema.as_deref() {
            self.visitor.on_exit_schema(schema);
        }
        Ok(())
    }

    fn resolve_slice_schema(&self, slice: &SliceDefinition) -> Option<Arc<InternalTypeSchema>> {
        if let Some(schema) = slice.type_schema.get() {
            return Some(schema);
        }
        let profile_url = slice.profile_url()?;
        match self.resolver.resolve_profile(profile_url) {
            Some(schema) => {
                slice.type_schema.bind(&schema);
                tracing::debug!(slice = %slice.name, profile = profile_url, "Bound slice to profile schema");
                Some(schema)
            }
            None => {
                tracing::warn!(slice = %slice.name, profile = profile_url, "Slice profile is not loaded");
                None
            }
        }
    }

    fn is_slice_allowed(&self, path: &str, slice_name: &str) -> bool {
        self.slice_allow_list
            .iter()
            .rev()
            .find(|(allowed_path, _)| allowed_path == path)
            .is_none_or(|(_, names)| names.iter().any(|name| name == slice_name))
    }
}

fn current(contexts: &[ElementsContext]) -> Result<&ElementsContext> {
    contexts
        .last()
        .ok_or_else(|| TypeSchemaError::crawl("Traversal has no elements context"))
}
