//! Explicit state frames of the single-pass snapshot parser.

use crate::types::{InternalSchemaElement, InternalTypeSchema, SliceDefinition, SlicingRules};
use crate::utils::{is_strict_descendant, paths_compatible, trim_path_prefix};

/// The currently open synthesized inner type, if any, and its enclosing frames.
#[derive(Debug, Default)]
pub enum BackboneFrame {
    #[default]
    NotInBackbone,
    InBackbone {
        schema: InternalTypeSchema,
        path: String,
        parent: Box<BackboneFrame>,
    },
}

/// The currently open slicing declaration, if any.
#[derive(Debug, Default)]
pub enum SlicingFrame {
    #[default]
    NotSlicing,
    Slicing {
        rules: SlicingRules,
        current: Option<SliceDefinition>,
        /// Path of the sliced element.
        path: String,
        /// Inner type that owns the sliced element; `None` for the root schema.
        owner: Option<String>,
        key: String,
    },
}

impl BackboneFrame {
    pub fn path(&self) -> Option<&str> {
        match self {
            BackboneFrame::NotInBackbone => None,
            BackboneFrame::InBackbone { path, .. } => Some(path.as_str()),
        }
    }

    /// Opens a new inner type at `path`, first unwinding every frame that
    /// does not contain it.
    pub fn enter(
        self,
        schema: InternalTypeSchema,
        path: String,
        completed: &mut Vec<InternalTypeSchema>,
    ) -> BackboneFrame {
        let parent = self.unwind(Some(&path), completed);
        BackboneFrame::InBackbone {
            schema,
            path,
            parent: Box::new(parent),
        }
    }

    /// Closes frames until the innermost one contains `path`. `None` closes all.
    pub fn unwind(self, path: Option<&str>, completed: &mut Vec<InternalTypeSchema>) -> BackboneFrame {
        let mut frame = self;
        loop {
            match frame {
                BackboneFrame::InBackbone {
                    schema,
                    path: frame_path,
                    parent,
                } if !paths_compatible(Some(frame_path.as_str()), path) => {
                    completed.push(schema);
                    frame = *parent;
                }
                other => return other,
            }
        }
    }

    /// Stores `field` in the innermost frame nested above `element_path`,
    /// handing it back when no open frame contains it.
    pub fn try_record(
        &mut self,
        element_path: &str,
        field: InternalSchemaElement,
    ) -> Option<InternalSchemaElement> {
        match self {
            BackboneFrame::NotInBackbone => Some(field),
            BackboneFrame::InBackbone {
                schema,
                path,
                parent,
            } => {
                if is_strict_descendant(path, element_path) {
                    let key = trim_path_prefix(element_path, path).to_string();
                    schema.elements.insert(key, field);
                    None
                } else {
                    parent.try_record(element_path, field)
                }
            }
        }
    }

    /// Name and relative key of the frame that would record `element_path`.
    pub fn locate(&self, element_path: &str) -> Option<(String, String)> {
        match self {
            BackboneFrame::NotInBackbone => None,
            BackboneFrame::InBackbone {
                schema,
                path,
                parent,
            } => {
                if is_strict_descendant(path, element_path) {
                    Some((
                        schema.name.clone(),
                        trim_path_prefix(element_path, path).to_string(),
                    ))
                } else {
                    parent.locate(element_path)
                }
            }
        }
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut InternalTypeSchema> {
        match self {
            BackboneFrame::NotInBackbone => None,
            BackboneFrame::InBackbone { schema, parent, .. } => {
                if schema.name == name {
                    Some(schema)
                } else {
                    parent.find_mut(name)
                }
            }
        }
    }
}

impl SlicingFrame {
    pub fn path(&self) -> Option<&str> {
        match self {
            SlicingFrame::NotSlicing => None,
            SlicingFrame::Slicing { path, .. } => Some(path.as_str()),
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, SlicingFrame::Slicing { .. })
    }

    /// Flushes the in-progress slice and makes `slice` current.
    pub fn start_slice(&mut self, slice: SliceDefinition) {
        if let SlicingFrame::Slicing { rules, current, .. } = self {
            if let Some(previous) = current.replace(slice) {
                rules.slices.push(previous);
            }
        }
    }

    /// Records an element of the current slice; returns false when no slice is open.
    pub fn record_member(&mut self, element_path: &str, field: InternalSchemaElement) -> bool {
        match self {
            SlicingFrame::Slicing {
                current: Some(slice),
                path,
                ..
            } => {
                let key = trim_path_prefix(element_path, path).to_string();
                slice.elements.insert(key, field);
                true
            }
            _ => false,
        }
    }

    /// Ends the declaration, returning its finished rules and where they belong.
    pub fn finish(self) -> Option<(SlicingRules, Option<String>, String)> {
        match self {
            SlicingFrame::NotSlicing => None,
            SlicingFrame::Slicing {
                mut rules,
                current,
                owner,
                key,
                ..
            } => {
                if let Some(slice) = current {
                    rules.slices.push(slice);
                }
                Some((rules, owner, key))
            }
        }
    }
}
