pub mod element;
pub mod schema;
pub mod slicing;

pub use element::*;
pub use schema::InternalTypeSchema;
pub use slicing::*;

/// Element key to compiled element, relative to some anchor path.
pub type ElementMap = std::collections::HashMap<String, InternalSchemaElement>;
