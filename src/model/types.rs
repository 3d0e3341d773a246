//! Simple and complex type definitions and their content models.

use crate::model::{
    Annotation, AttributeItem, DerivationSet, Extensions, Facet, Particle, TypeId, Wildcard,
};
use crate::qname::QName;

/// A named (registered) or anonymous (owned by its declaration) type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDefinition {
    pub name: Option<QName>,
    pub id: Option<String>,
    pub final_derivation: DerivationSet,
    pub annotation: Option<Annotation>,
    pub extensions: Extensions,
    pub body: TypeBody,
}

impl TypeDefinition {
    pub fn simple(name: Option<QName>, simple: SimpleType) -> Self {
        Self::with_body(name, TypeBody::Simple(simple))
    }

    pub fn complex(name: Option<QName>, complex: ComplexType) -> Self {
        Self::with_body(name, TypeBody::Complex(complex))
    }

    fn with_body(name: Option<QName>, body: TypeBody) -> Self {
        Self {
            name,
            id: None,
            final_derivation: DerivationSet::empty(),
            annotation: None,
            extensions: Extensions::default(),
            body,
        }
    }

    pub fn is_simple(&self) -> bool {
        matches!(self.body, TypeBody::Simple(_))
    }

    pub fn is_complex(&self) -> bool {
        matches!(self.body, TypeBody::Complex(_))
    }

    pub fn is_anonymous(&self) -> bool {
        self.name.is_none()
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self.body, TypeBody::Simple(SimpleType::Builtin { .. }))
            || matches!(&self.body, TypeBody::Complex(complex) if complex.builtin)
    }

    pub fn as_simple(&self) -> Option<&SimpleType> {
        match &self.body {
            TypeBody::Simple(simple) => Some(simple),
            TypeBody::Complex(_) => None,
        }
    }

    pub fn as_complex(&self) -> Option<&ComplexType> {
        match &self.body {
            TypeBody::Complex(complex) => Some(complex),
            TypeBody::Simple(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeBody {
    Simple(SimpleType),
    Complex(ComplexType),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimpleType {
    /// Entry of the built-in catalogue; `base` is its base type, if any.
    Builtin { base: Option<QName> },
    Restriction(SimpleRestriction),
    List(SimpleList),
    Union(SimpleUnion),
    /// `simpleType` without a derivation child
    Unspecified,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SimpleRestriction {
    pub base: Option<QName>,
    /// Inline anonymous base type
    pub base_type: Option<TypeId>,
    pub facets: Vec<Facet>,
    pub id: Option<String>,
    pub annotation: Option<Annotation>,
    pub extensions: Extensions,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SimpleList {
    pub item_type_name: Option<QName>,
    /// Inline anonymous item type
    pub item_type: Option<TypeId>,
    pub id: Option<String>,
    pub annotation: Option<Annotation>,
    pub extensions: Extensions,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SimpleUnion {
    pub member_type_names: Vec<QName>,
    /// Inline anonymous member types
    pub member_types: Vec<TypeId>,
    pub id: Option<String>,
    pub annotation: Option<Annotation>,
    pub extensions: Extensions,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ComplexType {
    pub is_abstract: bool,
    /// Explicit `mixed` attribute
    pub mixed: Option<bool>,
    pub block: DerivationSet,
    pub content: ContentModel,
    /// `anyType` from the built-in catalogue
    pub builtin: bool,
}

impl ComplexType {
    pub fn is_mixed(&self) -> bool {
        let content_mixed = match &self.content {
            ContentModel::Complex(complex) => complex.mixed,
            _ => None,
        };
        content_mixed.or(self.mixed).unwrap_or(false)
    }

    /// Base type name when the content model derives from another type
    pub fn base_type_name(&self) -> Option<&QName> {
        match &self.content {
            ContentModel::Simple(SimpleContent { derivation, .. })
            | ContentModel::Complex(ComplexContent { derivation, .. }) => {
                derivation.as_ref().and_then(|d| d.body().base.as_ref())
            }
            ContentModel::Direct(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentModel {
    /// Particle and attributes directly under `complexType`
    Direct(DirectContent),
    Simple(SimpleContent),
    Complex(ComplexContent),
}

impl Default for ContentModel {
    fn default() -> Self {
        ContentModel::Direct(DirectContent::default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DirectContent {
    pub particle: Option<Particle>,
    pub attributes: Vec<AttributeItem>,
    pub any_attribute: Option<Wildcard>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SimpleContent {
    pub derivation: Option<ContentDerivation>,
    pub id: Option<String>,
    pub annotation: Option<Annotation>,
    pub extensions: Extensions,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ComplexContent {
    pub mixed: Option<bool>,
    pub derivation: Option<ContentDerivation>,
    pub id: Option<String>,
    pub annotation: Option<Annotation>,
    pub extensions: Extensions,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentDerivation {
    Extension(DerivationBody),
    Restriction(DerivationBody),
}

impl ContentDerivation {
    pub fn body(&self) -> &DerivationBody {
        match self {
            ContentDerivation::Extension(body) | ContentDerivation::Restriction(body) => body,
        }
    }

    pub fn local_name(&self) -> &'static str {
        match self {
            ContentDerivation::Extension(_) => "extension",
            ContentDerivation::Restriction(_) => "restriction",
        }
    }
}

/// Shared shape of `extension` / `restriction` under simple or complex content.
///
/// Not every field is meaningful for every container: particles belong to
/// complex content only, inline types and facets to simple-content restrictions.
/// The serializer rejects combinations that cannot be written back.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DerivationBody {
    pub base: Option<QName>,
    pub particle: Option<Particle>,
    pub attributes: Vec<AttributeItem>,
    pub any_attribute: Option<Wildcard>,
    pub simple_type: Option<TypeId>,
    pub facets: Vec<Facet>,
    pub id: Option<String>,
    pub annotation: Option<Annotation>,
    pub extensions: Extensions,
}
