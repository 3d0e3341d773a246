//! Element, attribute, group, attribute-group and notation declarations.

use crate::model::{Annotation, AttributeId, DerivationSet, Extensions, Form, Particle, TypeId};
use crate::qname::QName;

/// Type of an element or attribute declaration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TypeSlot {
    /// No `type=` and no inline type
    #[default]
    None,
    /// `type="..."`; `resolved` stays `None` until a type with that name is registered
    Named { name: QName, resolved: Option<TypeId> },
    /// Inline anonymous type owned by the declaration
    Anonymous(TypeId),
}

impl TypeSlot {
    pub fn type_id(&self) -> Option<TypeId> {
        match self {
            TypeSlot::Named { resolved, .. } => *resolved,
            TypeSlot::Anonymous(id) => Some(*id),
            TypeSlot::None => None,
        }
    }

    pub fn type_name(&self) -> Option<&QName> {
        match self {
            TypeSlot::Named { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, TypeSlot::Named { resolved: None, .. })
    }
}

/// An element declaration, or a reference to a global one when `reference` is set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    /// Effective qualified name: target namespace for global or qualified
    /// local declarations, no namespace for unqualified local ones.
    pub name: Option<QName>,
    pub reference: Option<QName>,
    pub type_slot: TypeSlot,
    pub default_value: Option<String>,
    pub fixed_value: Option<String>,
    pub nillable: bool,
    pub is_abstract: bool,
    pub substitution_group: Option<QName>,
    pub block: DerivationSet,
    pub final_derivation: DerivationSet,
    /// Explicit `form` attribute
    pub form: Option<Form>,
    pub constraints: Vec<IdentityConstraint>,
    pub id: Option<String>,
    pub annotation: Option<Annotation>,
    pub extensions: Extensions,
    pub top_level: bool,
}

impl Element {
    pub fn named(name: QName) -> Self {
        Self {
            name: Some(name),
            ..Default::default()
        }
    }

    pub fn reference(target: QName) -> Self {
        Self {
            reference: Some(target),
            ..Default::default()
        }
    }

    pub fn is_reference(&self) -> bool {
        self.reference.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeUse {
    Optional,
    Required,
    Prohibited,
}

impl AttributeUse {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "optional" => Some(AttributeUse::Optional),
            "required" => Some(AttributeUse::Required),
            "prohibited" => Some(AttributeUse::Prohibited),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeUse::Optional => "optional",
            AttributeUse::Required => "required",
            AttributeUse::Prohibited => "prohibited",
        }
    }
}

/// An attribute declaration, or a reference to a global one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Attribute {
    pub name: Option<QName>,
    pub reference: Option<QName>,
    pub type_slot: TypeSlot,
    pub use_kind: Option<AttributeUse>,
    pub default_value: Option<String>,
    pub fixed_value: Option<String>,
    pub form: Option<Form>,
    pub id: Option<String>,
    pub annotation: Option<Annotation>,
    pub extensions: Extensions,
    pub top_level: bool,
}

impl Attribute {
    pub fn named(name: QName) -> Self {
        Self {
            name: Some(name),
            ..Default::default()
        }
    }

    pub fn reference(target: QName) -> Self {
        Self {
            reference: Some(target),
            ..Default::default()
        }
    }
}

/// `attributeGroup ref="..."` inside a type or attribute group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeGroupRef {
    pub ref_name: QName,
    pub id: Option<String>,
    pub annotation: Option<Annotation>,
    pub extensions: Extensions,
}

/// Attribute-level content of types, derivations and attribute groups, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeItem {
    Attribute(AttributeId),
    GroupRef(AttributeGroupRef),
}

/// Named model group (`group name="..."`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Group {
    pub name: Option<QName>,
    pub particle: Option<Particle>,
    pub id: Option<String>,
    pub annotation: Option<Annotation>,
    pub extensions: Extensions,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AttributeGroup {
    pub name: Option<QName>,
    pub attributes: Vec<AttributeItem>,
    pub any_attribute: Option<Wildcard>,
    pub id: Option<String>,
    pub annotation: Option<Annotation>,
    pub extensions: Extensions,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Notation {
    pub name: Option<QName>,
    pub public_id: Option<String>,
    pub system_id: Option<String>,
    pub id: Option<String>,
    pub annotation: Option<Annotation>,
    pub extensions: Extensions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessContents {
    Strict,
    Lax,
    Skip,
}

impl ProcessContents {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "strict" => Some(ProcessContents::Strict),
            "lax" => Some(ProcessContents::Lax),
            "skip" => Some(ProcessContents::Skip),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessContents::Strict => "strict",
            ProcessContents::Lax => "lax",
            ProcessContents::Skip => "skip",
        }
    }
}

/// `any` / `anyAttribute`. The namespace constraint is kept as written
/// (`##other`, a URI list, ...).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Wildcard {
    pub namespace: Option<String>,
    pub process_contents: Option<ProcessContents>,
    pub id: Option<String>,
    pub annotation: Option<Annotation>,
    pub extensions: Extensions,
}

/// Selector or field path. Stored verbatim, never evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XPathExpr {
    pub xpath: String,
    pub id: Option<String>,
    pub annotation: Option<Annotation>,
}

impl XPathExpr {
    pub fn new(xpath: impl Into<String>) -> Self {
        Self {
            xpath: xpath.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityConstraintKind {
    Key,
    KeyRef { refer: QName },
    Unique,
}

impl IdentityConstraintKind {
    pub fn local_name(&self) -> &'static str {
        match self {
            IdentityConstraintKind::Key => "key",
            IdentityConstraintKind::KeyRef { .. } => "keyref",
            IdentityConstraintKind::Unique => "unique",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityConstraint {
    pub kind: IdentityConstraintKind,
    pub name: QName,
    pub selector: Option<XPathExpr>,
    pub fields: Vec<XPathExpr>,
    pub id: Option<String>,
    pub annotation: Option<Annotation>,
    pub extensions: Extensions,
}

impl IdentityConstraint {
    fn with_kind(kind: IdentityConstraintKind, name: QName) -> Self {
        Self {
            kind,
            name,
            selector: None,
            fields: Vec::new(),
            id: None,
            annotation: None,
            extensions: Extensions::default(),
        }
    }

    pub fn key(name: QName) -> Self {
        Self::with_kind(IdentityConstraintKind::Key, name)
    }

    pub fn keyref(name: QName, refer: QName) -> Self {
        Self::with_kind(IdentityConstraintKind::KeyRef { refer }, name)
    }

    pub fn unique(name: QName) -> Self {
        Self::with_kind(IdentityConstraintKind::Unique, name)
    }
}
