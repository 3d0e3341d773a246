//! Particle trees: compositors, element terms, wildcards and group references.

use crate::model::{Annotation, ElementId, Extensions, Wildcard};
use crate::qname::QName;

/// Sentinel for `maxOccurs="unbounded"`.
pub const UNBOUNDED: u64 = u64::MAX;

/// Occurrence bounds of a particle. Both default to 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Occurs {
    pub min: u64,
    pub max: u64,
}

impl Default for Occurs {
    fn default() -> Self {
        Self { min: 1, max: 1 }
    }
}

impl Occurs {
    pub fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    pub fn is_unbounded(&self) -> bool {
        self.max == UNBOUNDED
    }

    /// Parses `minOccurs` / `maxOccurs` values.
    ///
    /// A missing value is 1, `unbounded` is [`UNBOUNDED`], and anything that is
    /// not a non-negative integer also falls back to 1.
    pub fn parse(min: Option<&str>, max: Option<&str>) -> Self {
        Self {
            min: parse_bound(min),
            max: parse_bound(max),
        }
    }

    /// Lexical forms for re-emission, `None` where the default applies.
    pub fn lexical(&self) -> (Option<String>, Option<String>) {
        let min = (self.min != 1).then(|| bound_to_string(self.min));
        let max = (self.max != 1).then(|| bound_to_string(self.max));
        (min, max)
    }
}

fn parse_bound(value: Option<&str>) -> u64 {
    match value.map(str::trim) {
        None => 1,
        Some("unbounded") => UNBOUNDED,
        Some(numeral) => numeral.parse().unwrap_or(1),
    }
}

fn bound_to_string(bound: u64) -> String {
    if bound == UNBOUNDED {
        "unbounded".to_string()
    } else {
        bound.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Particle {
    pub occurs: Occurs,
    pub term: Term,
}

impl Particle {
    pub fn new(term: Term) -> Self {
        Self {
            occurs: Occurs::default(),
            term,
        }
    }

    pub fn with_occurs(mut self, occurs: Occurs) -> Self {
        self.occurs = occurs;
        self
    }

    /// Element ids reachable through nested compositors, in document order.
    /// Group references are not followed.
    pub fn elements(&self) -> Vec<ElementId> {
        let mut found = Vec::new();
        self.collect_elements(&mut found);
        found
    }

    fn collect_elements(&self, found: &mut Vec<ElementId>) {
        match &self.term {
            Term::Element(id) => found.push(*id),
            Term::Sequence(group) | Term::Choice(group) | Term::All(group) => {
                for particle in &group.particles {
                    particle.collect_elements(found);
                }
            }
            Term::Any(_) | Term::GroupRef(_) => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    Sequence(ModelGroup),
    Choice(ModelGroup),
    All(ModelGroup),
    Element(ElementId),
    Any(Wildcard),
    GroupRef(GroupRef),
}

impl Term {
    /// Local name of the construct in the schema language
    pub fn local_name(&self) -> &'static str {
        match self {
            Term::Sequence(_) => "sequence",
            Term::Choice(_) => "choice",
            Term::All(_) => "all",
            Term::Element(_) => "element",
            Term::Any(_) => "any",
            Term::GroupRef(_) => "group",
        }
    }

    pub fn model_group(&self) -> Option<&ModelGroup> {
        match self {
            Term::Sequence(group) | Term::Choice(group) | Term::All(group) => Some(group),
            _ => None,
        }
    }
}

/// Body of a `sequence`, `choice` or `all` compositor.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModelGroup {
    pub id: Option<String>,
    pub annotation: Option<Annotation>,
    pub particles: Vec<Particle>,
    pub extensions: Extensions,
}

/// `group ref="..."` inside a content model, resolved lazily.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRef {
    pub ref_name: QName,
    pub id: Option<String>,
    pub annotation: Option<Annotation>,
    pub extensions: Extensions,
}
