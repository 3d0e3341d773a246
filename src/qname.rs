//! Qualified names and namespace-prefix bindings.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A (namespace, local-name) pair identifying a schema construct.
///
/// The empty namespace stands for "no namespace". Prefixes are never part of
/// a qualified name; they live in a [`NamespaceContext`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct QName {
    namespace: String,
    local_name: String,
}

impl QName {
    pub fn new(namespace: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            local_name: local_name.into(),
        }
    }

    /// A name in no namespace
    pub fn local(local_name: impl Into<String>) -> Self {
        Self::new("", local_name)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    pub fn has_namespace(&self) -> bool {
        !self.namespace.is_empty()
    }
}

/// Clark notation: `{namespace}local`, or just `local` without a namespace.
impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.local_name)
        } else {
            write!(f, "{{{}}}{}", self.namespace, self.local_name)
        }
    }
}

/// Splits a `prefix:local` token. An unprefixed token yields an empty prefix.
pub fn split_prefixed(token: &str) -> (&str, &str) {
    match token.trim().split_once(':') {
        Some((prefix, local)) => (prefix, local),
        None => ("", token.trim()),
    }
}

/// Ordered prefix -> namespace bindings. The empty prefix is the default namespace.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NamespaceContext {
    bindings: IndexMap<String, String>,
}

impl NamespaceContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `prefix` to `namespace`, replacing an earlier binding of the same prefix.
    pub fn declare(&mut self, prefix: impl Into<String>, namespace: impl Into<String>) {
        self.bindings.insert(prefix.into(), namespace.into());
    }

    pub fn lookup_namespace(&self, prefix: &str) -> Option<&str> {
        self.bindings.get(prefix).map(String::as_str)
    }

    /// First non-default prefix bound to `namespace`, in declaration order.
    pub fn lookup_prefix(&self, namespace: &str) -> Option<&str> {
        self.bindings
            .iter()
            .find(|(prefix, uri)| !prefix.is_empty() && uri.as_str() == namespace)
            .map(|(prefix, _)| prefix.as_str())
    }

    pub fn default_namespace(&self) -> Option<&str> {
        self.lookup_namespace("")
    }

    pub fn contains_prefix(&self, prefix: &str) -> bool {
        self.bindings.contains_key(prefix)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bindings
            .iter()
            .map(|(prefix, uri)| (prefix.as_str(), uri.as_str()))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl<P: Into<String>, N: Into<String>> FromIterator<(P, N)> for NamespaceContext {
    fn from_iter<I: IntoIterator<Item = (P, N)>>(iter: I) -> Self {
        let mut context = Self::new();
        for (prefix, namespace) in iter {
            context.declare(prefix, namespace);
        }
        context
    }
}

/// In-scope bindings while walking a tree: each level only stores what its
/// element declares and defers to the enclosing level otherwise.
#[derive(Debug, Clone, Copy)]
pub struct NamespaceScope<'a> {
    bindings: &'a NamespaceContext,
    parent: Option<&'a NamespaceScope<'a>>,
    prefixed_only: bool,
}

impl<'a> NamespaceScope<'a> {
    pub fn root(bindings: &'a NamespaceContext) -> Self {
        Self {
            bindings,
            parent: None,
            prefixed_only: false,
        }
    }

    /// Bindings borrowed from an enclosing document. They answer for
    /// non-empty prefixes only; the default namespace never crosses a
    /// document boundary.
    pub fn inherited(bindings: &'a NamespaceContext) -> Self {
        Self {
            bindings,
            parent: None,
            prefixed_only: true,
        }
    }

    pub fn enter(&'a self, bindings: &'a NamespaceContext) -> NamespaceScope<'a> {
        NamespaceScope {
            bindings,
            parent: Some(self),
            prefixed_only: false,
        }
    }

    pub fn lookup_namespace(&self, prefix: &str) -> Option<&'a str> {
        let mut scope = Some(self);
        while let Some(current) = scope {
            if !(current.prefixed_only && prefix.is_empty())
                && let Some(uri) = current.bindings.lookup_namespace(prefix)
            {
                return Some(uri);
            }
            scope = current.parent;
        }
        None
    }
}
