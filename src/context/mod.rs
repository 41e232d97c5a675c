//! Scoped element resolution for schema traversals.

pub mod access;
pub mod elements;

pub use access::{ExtendedProps, FieldAccessPolicy};
pub use elements::{build_elements_context, ElementsContext, ElementsContextArgs, SharedElement};
