use thiserror::Error;

use crate::model::{ComponentKind, SchemaKey};
use crate::qname::QName;

/// Main library error type.
///
/// Unresolvable references and malformed occurrence numerals are tolerated by
/// the builder and never surface here.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Schema already registered: {key}")]
    DuplicateSchema { key: SchemaKey },

    #[error("Duplicate {kind} '{name}' in schema {key}")]
    DuplicateComponent {
        kind: ComponentKind,
        name: QName,
        key: SchemaKey,
    },

    #[error("Top-level {kind} without a name in schema {key}")]
    UnnamedComponent { kind: ComponentKind, key: SchemaKey },

    #[error("Inconsistent content model in {context}: {details}")]
    InconsistentContentModel { context: String, details: String },

    #[error("Not an XML Schema document: {locator} - root element is {root}")]
    NotASchema { locator: String, root: String },

    #[error("Unbound namespace prefix '{prefix}' in '{token}' in schema {key}")]
    UnboundPrefix {
        prefix: String,
        token: String,
        key: SchemaKey,
    },

    #[error("XML parsing error: {locator} - {details}")]
    XmlParse { locator: String, details: String },

    #[error("Schema resolution failed: {location} - {details}")]
    Resolver { location: String, details: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Output error: {0}")]
    Output(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SchemaError {
    /// Structural conflicts signal builder or caller misuse rather than bad references.
    pub fn is_structural_conflict(&self) -> bool {
        matches!(
            self,
            SchemaError::DuplicateSchema { .. }
                | SchemaError::DuplicateComponent { .. }
                | SchemaError::UnnamedComponent { .. }
                | SchemaError::InconsistentContentModel { .. }
                | SchemaError::NotASchema { .. }
        )
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, SchemaError>;
