//! Constraining facets of simple-type restrictions.

use crate::model::Annotation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FacetKind {
    MinExclusive,
    MinInclusive,
    MaxExclusive,
    MaxInclusive,
    TotalDigits,
    FractionDigits,
    Length,
    MinLength,
    MaxLength,
    Enumeration,
    WhiteSpace,
    Pattern,
}

impl FacetKind {
    pub const ALL: [FacetKind; 12] = [
        FacetKind::MinExclusive,
        FacetKind::MinInclusive,
        FacetKind::MaxExclusive,
        FacetKind::MaxInclusive,
        FacetKind::TotalDigits,
        FacetKind::FractionDigits,
        FacetKind::Length,
        FacetKind::MinLength,
        FacetKind::MaxLength,
        FacetKind::Enumeration,
        FacetKind::WhiteSpace,
        FacetKind::Pattern,
    ];

    pub fn local_name(&self) -> &'static str {
        match self {
            FacetKind::MinExclusive => "minExclusive",
            FacetKind::MinInclusive => "minInclusive",
            FacetKind::MaxExclusive => "maxExclusive",
            FacetKind::MaxInclusive => "maxInclusive",
            FacetKind::TotalDigits => "totalDigits",
            FacetKind::FractionDigits => "fractionDigits",
            FacetKind::Length => "length",
            FacetKind::MinLength => "minLength",
            FacetKind::MaxLength => "maxLength",
            FacetKind::Enumeration => "enumeration",
            FacetKind::WhiteSpace => "whiteSpace",
            FacetKind::Pattern => "pattern",
        }
    }

    pub fn from_local_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.local_name() == name)
    }
}

/// A facet value is kept as written; it is never checked against the base type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Facet {
    pub kind: FacetKind,
    pub value: String,
    pub fixed: bool,
    pub id: Option<String>,
    pub annotation: Option<Annotation>,
}

impl Facet {
    pub fn new(kind: FacetKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
            fixed: false,
            id: None,
            annotation: None,
        }
    }
}
