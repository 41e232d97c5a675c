use crate::context::ElementsContext;
use crate::types::{InternalSchemaElement, InternalTypeSchema, SliceDefinition, SlicingRules};

/// Callbacks driven by [`SchemaCrawler`](super::SchemaCrawler).
///
/// Every method defaults to a no-op, so implementors only override the
/// events they care about. Enter and exit calls are always balanced.
pub trait SchemaVisitor {
    /// Called around the root schema and around every slice that resolves
    /// to a schema of its own.
    fn on_enter_schema(&mut self, _schema: &InternalTypeSchema) {}

    fn on_exit_schema(&mut self, _schema: &InternalTypeSchema) {}

    fn on_enter_element(&mut self, _path: &str, _element: &InternalSchemaElement, _context: &ElementsContext) {}

    fn on_exit_element(&mut self, _path: &str, _element: &InternalSchemaElement, _context: &ElementsContext) {}

    /// `path` is the path of the sliced element.
    fn on_enter_slice(&mut self, _path: &str, _slice: &SliceDefinition, _slicing: &SlicingRules) {}

    fn on_exit_slice(&mut self, _path: &str, _slice: &SliceDefinition, _slicing: &SlicingRules) {}
}
