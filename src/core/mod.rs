pub mod config;

pub use config::{CompilerConfig, CrawlerConfig, TypeSchemaConfig};
