//! # OctoFHIR TypeSchema
//!
//! Compiles FHIR StructureDefinition snapshots into compact internal type
//! schemas and walks them with a visitor.
//!
//! ## Features
//!
//! - **Compiler**: single-pass conversion of a flat snapshot into a schema with
//!   synthesized inner types, slicing rules and content reference aliasing
//! - **Registry**: lock-free, name- and profile-indexed schema lookup
//! - **Elements context**: scoped, profile-aware view of visible elements,
//!   with optional hidden and read-only field policies
//! - **Crawler**: depth-first traversal over elements and slices that resolves
//!   slice profiles through the registry
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use octofhir_typeschema::*;
//!
//! # fn example() -> Result<()> {
//! let registry = SchemaRegistry::new();
//! let bundle: serde_json::Value = serde_json::from_str("{\"entry\": []}")?;
//! registry.index_bundle_json(bundle, None)?;
//!
//! let patient = registry.get("Patient")?;
//! println!("{patient}");
//! # Ok(())
//! # }
//! ```

pub mod context;
pub mod converter;
pub mod core;
pub mod crawler;
pub mod error;
pub mod storage;
pub mod types;
pub mod utils;

pub use context::*;
pub use converter::*;
pub use crate::core::{CompilerConfig, CrawlerConfig, TypeSchemaConfig};
pub use crawler::{SchemaCrawler, SchemaVisitor};
pub use error::{LookupKind, Result, TypeSchemaError};
pub use storage::*;
pub use types::*;
