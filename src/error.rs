use std::fmt;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TypeSchemaError {
    /// A StructureDefinition could not be compiled; nothing was registered.
    #[error("Conversion error in '{name}': {message}")]
    Conversion { name: String, message: String },

    /// A traversal could not be started or continued.
    #[error("Crawl error: {message}")]
    Crawl { message: String },

    /// A registry lookup found nothing under the requested key.
    #[error("Unknown {kind}: {key}")]
    NotFound { kind: LookupKind, key: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    DataType,
    Profile,
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupKind::DataType => write!(f, "data type"),
            LookupKind::Profile => write!(f, "profile"),
        }
    }
}

impl TypeSchemaError {
    pub fn conversion(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Conversion {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn crawl(message: impl Into<String>) -> Self {
        Self::Crawl {
            message: message.into(),
        }
    }

    pub fn not_found(kind: LookupKind, key: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            key: key.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_conversion(&self) -> bool {
        matches!(self, Self::Conversion { .. })
    }
}

pub type Result<T> = std::result::Result<T, TypeSchemaError>;
