//! Typed object model for schema documents.
//!
//! Components live in per-schema arenas and refer to each other through the
//! copyable ids below. Forward edges (schema -> items, type -> particle) are
//! owned values; backward edges (schema -> collection, schema -> parent) are
//! registry keys resolved through the [`Collection`](crate::collection::Collection).

pub mod declarations;
pub mod facet;
pub mod particle;
pub mod schema;
pub mod types;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::document::{XmlAttribute, XmlElement, XmlNode};
use crate::qname::QName;

pub use declarations::{
    Attribute, AttributeGroup, AttributeGroupRef, AttributeItem, AttributeUse, Element,
    Group, IdentityConstraint, IdentityConstraintKind, Notation, ProcessContents, TypeSlot,
    Wildcard, XPathExpr,
};
pub use facet::{Facet, FacetKind};
pub use particle::{GroupRef, ModelGroup, Occurs, Particle, Term, UNBOUNDED};
pub use schema::{BuildState, ExternalKind, ExternalRef, Schema, SchemaItem};
pub use types::{
    ComplexContent, ComplexType, ContentDerivation, ContentModel, DerivationBody, DirectContent,
    SimpleContent, SimpleList, SimpleRestriction, SimpleType, SimpleUnion, TypeBody,
    TypeDefinition,
};

/// Position of a schema inside its collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaId(pub(crate) usize);

impl SchemaId {
    pub fn index(&self) -> usize {
        self.0
    }
}

macro_rules! component_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name {
            pub(crate) schema: SchemaId,
            pub(crate) index: usize,
        }

        impl $name {
            pub(crate) fn new(schema: SchemaId, index: usize) -> Self {
                Self { schema, index }
            }

            /// Schema whose arena owns the component
            pub fn schema(&self) -> SchemaId {
                self.schema
            }
        }
    };
}

component_id!(
    /// Simple or complex type, named or anonymous
    TypeId
);
component_id!(
    /// Element declaration or element reference, global or local
    ElementId
);
component_id!(AttributeId);
component_id!(GroupId);
component_id!(AttributeGroupId);
component_id!(NotationId);

/// Registry identity of a schema: (logical target namespace, locator).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SchemaKey {
    pub namespace: String,
    pub locator: String,
}

impl SchemaKey {
    pub fn new(namespace: impl Into<String>, locator: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            locator: locator.into(),
        }
    }
}

impl fmt::Display for SchemaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.namespace, self.locator)
    }
}

/// Kinds of named top-level constructs, one qualified-name map each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ComponentKind {
    Element,
    Attribute,
    Type,
    Group,
    AttributeGroup,
    Notation,
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ComponentKind::Element => "element",
            ComponentKind::Attribute => "attribute",
            ComponentKind::Type => "type",
            ComponentKind::Group => "group",
            ComponentKind::AttributeGroup => "attribute group",
            ComponentKind::Notation => "notation",
        };
        f.write_str(name)
    }
}

/// `qualified` / `unqualified`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Form {
    Qualified,
    #[default]
    Unqualified,
}

impl Form {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "qualified" => Some(Form::Qualified),
            "unqualified" => Some(Form::Unqualified),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Form::Qualified => "qualified",
            Form::Unqualified => "unqualified",
        }
    }
}

/// Set of derivation methods used by `block`, `final`, `blockDefault` and `finalDefault`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct DerivationSet {
    bits: u8,
}

impl DerivationSet {
    pub const EXTENSION: u8 = 1;
    pub const RESTRICTION: u8 = 1 << 1;
    pub const SUBSTITUTION: u8 = 1 << 2;
    pub const LIST: u8 = 1 << 3;
    pub const UNION: u8 = 1 << 4;
    const ALL: u8 = 1 << 7;

    const TOKENS: [(&'static str, u8); 5] = [
        ("extension", Self::EXTENSION),
        ("restriction", Self::RESTRICTION),
        ("substitution", Self::SUBSTITUTION),
        ("list", Self::LIST),
        ("union", Self::UNION),
    ];

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        Self { bits: Self::ALL }
    }

    pub fn with(mut self, method: u8) -> Self {
        self.bits |= method;
        self
    }

    /// Parses `#all` or a whitespace-separated token list; unknown tokens are skipped.
    pub fn parse(value: &str) -> Self {
        let mut set = Self::empty();
        for token in value.split_whitespace() {
            if token == "#all" {
                return Self::all();
            }
            if let Some((_, bit)) = Self::TOKENS.iter().find(|(name, _)| *name == token) {
                set.bits |= bit;
            }
        }
        set
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    pub fn is_all(&self) -> bool {
        self.bits & Self::ALL != 0
    }

    pub fn contains(&self, method: u8) -> bool {
        self.is_all() || self.bits & method != 0
    }
}

impl fmt::Display for DerivationSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_all() {
            return f.write_str("#all");
        }
        let tokens: Vec<&str> = Self::TOKENS
            .iter()
            .filter(|(_, bit)| self.bits & bit != 0)
            .map(|(name, _)| *name)
            .collect();
        f.write_str(&tokens.join(" "))
    }
}

/// Foreign-namespace content attached to a model node, kept in encounter order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Extensions {
    entries: Vec<ExtensionEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionEntry {
    pub name: QName,
    pub payload: ExtensionPayload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtensionPayload {
    Attribute(XmlAttribute),
    Element(XmlElement),
}

impl Extensions {
    pub fn push(&mut self, name: QName, payload: ExtensionPayload) {
        self.entries.push(ExtensionEntry { name, payload });
    }

    pub fn entries(&self) -> &[ExtensionEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// `annotation` with its appinfo and documentation children.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Annotation {
    pub id: Option<String>,
    pub items: Vec<AnnotationItem>,
    pub extensions: Extensions,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationItem {
    AppInfo(AnnotationContent),
    Documentation(AnnotationContent),
}

/// Raw markup of an appinfo/documentation entry, never interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AnnotationContent {
    pub source: Option<String>,
    /// `xml:lang`, documentation only
    pub lang: Option<String>,
    pub markup: Vec<XmlNode>,
}
