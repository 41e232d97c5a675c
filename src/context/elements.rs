use std::collections::HashMap;
use std::sync::Arc;

use super::access::{resource_key, ExtendedProps, FieldAccessPolicy};
use crate::types::{ElementMap, InternalSchemaElement};
use crate::utils::{join_path, path_difference};

pub type SharedElement = Arc<InternalSchemaElement>;

/// Elements visible at one traversal scope, anchored at `path`.
///
/// `elements` is keyed relative to the anchor; `elements_by_path` holds the
/// same entries under their absolute paths. Both maps share one `Arc` per
/// element.
#[derive(Debug, Clone)]
pub struct ElementsContext {
    pub path: String,
    pub profile_url: Option<String>,
    pub elements: HashMap<String, SharedElement>,
    pub elements_by_path: HashMap<String, SharedElement>,
    pub debug: bool,
    pub access_policy: Option<Arc<FieldAccessPolicy>>,
}

/// Inputs of [`build_elements_context`]. Unset optional values are taken
/// from the parent context.
#[derive(Debug, Clone)]
pub struct ElementsContextArgs<'a> {
    pub path: &'a str,
    pub elements: &'a ElementMap,
    pub parent_context: Option<&'a ElementsContext>,
    pub profile_url: Option<String>,
    pub debug: Option<bool>,
    pub access_policy: Option<Arc<FieldAccessPolicy>>,
}

impl<'a> ElementsContextArgs<'a> {
    pub fn new(path: &'a str, elements: &'a ElementMap) -> Self {
        Self {
            path,
            elements,
            parent_context: None,
            profile_url: None,
            debug: None,
            access_policy: None,
        }
    }

    pub fn with_parent(mut self, parent: Option<&'a ElementsContext>) -> Self {
        self.parent_context = parent;
        self
    }

    pub fn with_profile_url(mut self, profile_url: Option<String>) -> Self {
        self.profile_url = profile_url;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = Some(debug);
        self
    }

    pub fn with_access_policy(mut self, policy: Arc<FieldAccessPolicy>) -> Self {
        self.access_policy = Some(policy);
        self
    }
}

/// Merges `elements` into the scope of an optional parent context.
///
/// Parent entries below `path` are inherited first and win over own
/// entries with the same key, so an enclosing profile's constraints stay in
/// force inside nested scopes. Returns `None` when nothing would change: a
/// parent exists at the same anchor and every own key was already visible.
pub fn build_elements_context(args: ElementsContextArgs<'_>) -> Option<ElementsContext> {
    let ElementsContextArgs {
        path,
        elements,
        parent_context: parent,
        profile_url,
        debug,
        access_policy,
    } = args;

    let profile_url = profile_url.or_else(|| parent.and_then(|p| p.profile_url.clone()));
    let debug = debug.or(parent.map(|p| p.debug)).unwrap_or(false);
    let access_policy = access_policy.or_else(|| parent.and_then(|p| p.access_policy.clone()));

    let mut merged: HashMap<String, SharedElement> = HashMap::new();
    if let Some(parent) = parent {
        for (absolute, element) in &parent.elements_by_path {
            if let Some(key) = path_difference(path, absolute) {
                merged.insert(key.to_string(), Arc::clone(element));
            }
        }
    }

    let mut used_new = false;
    for (key, element) in elements {
        if !merged.contains_key(key) {
            merged.insert(key.clone(), Arc::new(element.clone()));
            used_new = true;
        }
    }

    if !used_new && parent.is_some_and(|p| p.path == path) {
        if debug {
            tracing::debug!(path, "Elements context unchanged, reusing parent");
        }
        return None;
    }

    if let Some(policy) = access_policy.as_deref().filter(|policy| !policy.hidden_fields.is_empty()) {
        merged.retain(|key, _| {
            let absolute = join_path(path, key);
            !resource_key(&absolute).is_some_and(|key| policy.is_hidden(key))
        });
    }

    let elements_by_path = merged
        .iter()
        .map(|(key, element)| (join_path(path, key), Arc::clone(element)))
        .collect();

    if debug {
        tracing::debug!(
            path,
            profile = profile_url.as_deref().unwrap_or_default(),
            elements = merged.len(),
            "Built elements context"
        );
    }

    Some(ElementsContext {
        path: path.to_string(),
        profile_url,
        elements: merged,
        elements_by_path,
        debug,
        access_policy,
    })
}

impl ElementsContext {
    pub fn element(&self, key: &str) -> Option<&SharedElement> {
        self.elements.get(key)
    }

    pub fn element_by_path(&self, path: &str) -> Option<&SharedElement> {
        self.elements_by_path.get(path)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Whether the access policy makes the element at `key` read-only.
    pub fn is_readonly(&self, key: &str) -> bool {
        self.extended_props(&join_path(&self.path, key))
            .is_some_and(|props| props.readonly)
    }

    /// Access flags of a path strictly below the anchor; `None` for the
    /// anchor itself and for unrelated paths. The path need not name a
    /// schema element.
    pub fn extended_props(&self, path: &str) -> Option<ExtendedProps> {
        path_difference(&self.path, path)?;
        let props = match (self.access_policy.as_deref(), resource_key(path)) {
            (Some(policy), Some(key)) => policy.props(key),
            _ => ExtendedProps::default(),
        };
        Some(props)
    }
}
