//! Compiled schema storage.

pub mod registry;
pub mod traits;

pub use registry::SchemaRegistry;
pub use traits::{RegistryStats, SchemaResolver};
