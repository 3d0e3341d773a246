//! # xsd-model Library
//!
//! Builds an in-memory object model from XML Schema documents, resolves
//! `include`/`import`/`redefine` composition across documents, and writes
//! the model back out as schema documents.
//!
//! The core is the [`Builder`] (document tree to typed graph), the
//! [`Collection`] (schema registry, deep lookup and per-thread resolution
//! cache) and the [`Serializer`] (typed graph back to document tree).

pub mod builder;
pub mod cache;
pub mod cli;
pub mod collection;
pub mod config;
pub mod constants;
pub mod document;
pub mod error;
pub mod extension;
pub mod file_discovery;
pub mod model;
pub mod output;
pub mod processor;
pub mod qname;
pub mod resolver;
pub mod serializer;

pub use builder::Builder;
pub use cache::{CacheConfig, CacheKey, CacheStats, ResolutionCache};
pub use cli::{Cli, OutputFormat, VerbosityLevel};
pub use collection::{Collection, TypeReceiver};
pub use config::{Config, ConfigError, ConfigManager, EnvProvider, SystemEnvProvider};
pub use document::{XmlAttribute, XmlElement, XmlName, XmlNode};
pub use error::{Result, SchemaError};
pub use extension::{ExtensionRegistry, IgnoreExtensions, VerbatimExtensions};
pub use file_discovery::{DiscoveryStats, FileDiscovery};
pub use model::{ComponentKind, SchemaId, SchemaKey};
pub use output::Output;
pub use processor::{
    DocumentResult, DocumentStatus, ProcessingResults, ProcessorConfig, SchemaProcessor,
};
pub use qname::{NamespaceContext, QName};
pub use resolver::{DefaultResolver, InMemoryResolver, ResolverConfig, SchemaSource, UriResolver};
pub use serializer::{SerializedSchema, Serializer};
