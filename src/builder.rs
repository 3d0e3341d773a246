//! Turns schema documents into the object model.
//!
//! The [`Builder`] walks one document depth-first, registering the schema
//! before its children so that circular include/import chains find it
//! in progress instead of recursing. Nested documents are located through the
//! collection's resolver (and cache, when one is installed) and built into
//! the same collection.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use tracing::{debug, trace};

use crate::cache::CacheKey;
use crate::collection::Collection;
use crate::constants::{XML_NS, XML_PREFIX, XS_NS};
use crate::document::XmlElement;
use crate::error::{Result, SchemaError};
use crate::extension::ExtensionRegistry;
use crate::model::{
    Annotation, AnnotationContent, AnnotationItem, Attribute, AttributeGroup, AttributeGroupId,
    AttributeGroupRef, AttributeId, AttributeItem, AttributeUse, BuildState, ComplexContent,
    ComplexType, ContentDerivation, ContentModel, DerivationBody, DerivationSet, DirectContent,
    Element, ElementId, ExtensionPayload, Extensions, ExternalKind, ExternalRef, Facet, FacetKind,
    Form, Group, GroupId, GroupRef, IdentityConstraint, ModelGroup, Notation, Occurs, Particle,
    ProcessContents, SchemaId, SchemaItem, SchemaKey, SimpleContent, SimpleList, SimpleRestriction,
    SimpleType, SimpleUnion, Term, TypeBody, TypeDefinition, TypeId, TypeSlot, Wildcard, XPathExpr,
};
use crate::qname::{NamespaceContext, NamespaceScope, QName, split_prefixed};
use crate::resolver::SchemaSource;

/// Schema-language constructs the builder knows how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    Annotation,
    AppInfo,
    Documentation,
    Include,
    Import,
    Redefine,
    SimpleType,
    ComplexType,
    Element,
    Attribute,
    Group,
    AttributeGroup,
    Notation,
    Sequence,
    Choice,
    All,
    Any,
    AnyAttribute,
    SimpleContent,
    ComplexContent,
    Extension,
    Restriction,
    List,
    Union,
    Key,
    KeyRef,
    Unique,
    Selector,
    Field,
    Facet(FacetKind),
}

impl NodeKind {
    /// Constructs that open the particle of a complex type or its derivation.
    fn opens_particle(self) -> bool {
        matches!(
            self,
            NodeKind::Sequence | NodeKind::Choice | NodeKind::All | NodeKind::Group
        )
    }
}

static NODE_KINDS: OnceLock<HashMap<&'static str, NodeKind>> = OnceLock::new();

fn node_kinds() -> &'static HashMap<&'static str, NodeKind> {
    NODE_KINDS.get_or_init(|| {
        let mut table = HashMap::from([
            ("annotation", NodeKind::Annotation),
            ("appinfo", NodeKind::AppInfo),
            ("documentation", NodeKind::Documentation),
            ("include", NodeKind::Include),
            ("import", NodeKind::Import),
            ("redefine", NodeKind::Redefine),
            ("simpleType", NodeKind::SimpleType),
            ("complexType", NodeKind::ComplexType),
            ("element", NodeKind::Element),
            ("attribute", NodeKind::Attribute),
            ("group", NodeKind::Group),
            ("attributeGroup", NodeKind::AttributeGroup),
            ("notation", NodeKind::Notation),
            ("sequence", NodeKind::Sequence),
            ("choice", NodeKind::Choice),
            ("all", NodeKind::All),
            ("any", NodeKind::Any),
            ("anyAttribute", NodeKind::AnyAttribute),
            ("simpleContent", NodeKind::SimpleContent),
            ("complexContent", NodeKind::ComplexContent),
            ("extension", NodeKind::Extension),
            ("restriction", NodeKind::Restriction),
            ("list", NodeKind::List),
            ("union", NodeKind::Union),
            ("key", NodeKind::Key),
            ("keyref", NodeKind::KeyRef),
            ("unique", NodeKind::Unique),
            ("selector", NodeKind::Selector),
            ("field", NodeKind::Field),
        ]);
        for facet in FacetKind::ALL {
            table.insert(facet.local_name(), NodeKind::Facet(facet));
        }
        table
    })
}

enum Child<'n> {
    Known(NodeKind, &'n XmlElement),
    /// Schema-namespace element the builder does not read
    Unknown(&'n XmlElement),
    Foreign(&'n XmlElement),
}

fn classify(node: &XmlElement) -> Child<'_> {
    if node.name.namespace() != XS_NS {
        return Child::Foreign(node);
    }
    match node_kinds().get(node.name.local.as_str()) {
        Some(kind) => Child::Known(*kind, node),
        None => Child::Unknown(node),
    }
}

fn ignore(node: &XmlElement) {
    trace!(element = %node.name.lexical(), "ignoring schema construct in this position");
}

fn parse_bool(value: Option<&str>) -> Option<bool> {
    match value.map(str::trim) {
        Some("true") | Some("1") => Some(true),
        Some("false") | Some("0") => Some(false),
        _ => None,
    }
}

fn owned(value: Option<&str>) -> Option<String> {
    value.map(str::to_string)
}

fn derivation_set(node: &XmlElement, name: &str) -> DerivationSet {
    node.attribute(name)
        .map(DerivationSet::parse)
        .unwrap_or_default()
}

/// Where a component being built ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    /// Named, registered and listed among the schema's items
    TopLevel,
    /// Named replacement inside a `redefine`, kept out of the name maps
    Redefine,
    /// Nested or anonymous
    Local,
}

/// Per-document settings shared by every handler.
struct Context {
    schema: SchemaId,
    key: SchemaKey,
    /// Document without `targetNamespace` built under an inherited namespace
    chameleon: bool,
    element_form: Form,
    attribute_form: Form,
}

impl Context {
    fn logical(&self) -> &str {
        &self.key.namespace
    }

    fn qualify(&self, local_name: &str) -> QName {
        QName::new(self.logical(), local_name.trim())
    }

    /// Name of a local declaration: in the target namespace only when qualified.
    fn local_name(&self, local_name: &str, form: Form) -> QName {
        match form {
            Form::Qualified => self.qualify(local_name),
            Form::Unqualified => QName::local(local_name.trim()),
        }
    }
}

pub struct Builder<'c> {
    collection: &'c mut Collection,
    in_progress: Vec<SchemaKey>,
}

impl<'c> Builder<'c> {
    pub fn new(collection: &'c mut Collection) -> Self {
        Self {
            collection,
            in_progress: Vec::new(),
        }
    }

    /// Build an already located document as a new schema.
    pub fn build(&mut self, source: Arc<SchemaSource>) -> Result<SchemaId> {
        self.build_schema(source, None, None)
    }

    /// Locate `location` and build it, unless a schema with the resulting key
    /// is already registered.
    pub fn read_location(
        &mut self,
        location: &str,
        base_uri: Option<&str>,
    ) -> Result<Option<SchemaId>> {
        self.resolve_nested("", location, base_uri, None, None)
    }

    fn registry(&self) -> Arc<dyn ExtensionRegistry> {
        Arc::clone(self.collection.extensions())
    }

    // Document level

    fn build_schema(
        &mut self,
        source: Arc<SchemaSource>,
        parent: Option<SchemaKey>,
        inherited_namespace: Option<String>,
    ) -> Result<SchemaId> {
        let root = &source.document;
        if !root.is(XS_NS, "schema") {
            return Err(SchemaError::NotASchema {
                locator: source.locator.clone(),
                root: root.name.lexical(),
            });
        }

        let target_namespace = root
            .attribute("targetNamespace")
            .filter(|namespace| !namespace.is_empty());
        let logical = target_namespace
            .map(str::to_string)
            .or(inherited_namespace)
            .unwrap_or_default();
        let key = SchemaKey::new(logical, source.locator.clone());
        let id = self.collection.add_schema(key.clone(), target_namespace)?;

        let fallback = parent
            .as_ref()
            .and_then(|parent| self.collection.get_schema(parent))
            .map(|parent| parent.namespaces.clone())
            .unwrap_or_default();

        let mut extensions = Extensions::default();
        self.foreign_attributes(root, &mut extensions);

        let schema = self.collection.schema_mut(id);
        schema.parent = parent;
        schema.namespaces = root.namespaces.clone();
        schema.element_form_default = root.attribute("elementFormDefault").and_then(Form::parse);
        schema.attribute_form_default = root
            .attribute("attributeFormDefault")
            .and_then(Form::parse);
        schema.block_default = root.attribute("blockDefault").map(DerivationSet::parse);
        schema.final_default = root.attribute("finalDefault").map(DerivationSet::parse);
        schema.version = owned(root.attribute("version"));
        schema.schema_id = owned(root.attribute("id"));
        schema.extensions = extensions;
        schema.set_source(Arc::clone(&source));
        schema.set_state(BuildState::TopLevelPass);

        let cx = Context {
            schema: id,
            chameleon: target_namespace.is_none() && !key.namespace.is_empty(),
            element_form: schema.element_form(),
            attribute_form: schema.attribute_form(),
            key: key.clone(),
        };
        debug!(%key, "building schema");

        self.in_progress.push(key.clone());
        let outcome = self.top_level_pass(&cx, root, &fallback);
        self.in_progress.pop();
        outcome?;

        let schema = self.collection.schema_mut(id);
        schema.set_state(BuildState::Complete);
        debug!(
            %key,
            items = schema.items().len(),
            components = schema.component_count(),
            "schema complete"
        );
        Ok(id)
    }

    fn top_level_pass(
        &mut self,
        cx: &Context,
        root: &XmlElement,
        fallback: &NamespaceContext,
    ) -> Result<()> {
        let outer = NamespaceScope::inherited(fallback);
        let scope = outer.enter(&root.namespaces);

        for child in root.child_elements() {
            match classify(child) {
                Child::Known(kind, node) => self.top_level(cx, kind, node, &scope)?,
                Child::Foreign(node) => {
                    let registry = self.registry();
                    let target = &mut self.collection.schema_mut(cx.schema).extensions;
                    registry.deserialize(
                        target,
                        &node.name.to_qname(),
                        ExtensionPayload::Element(node.clone()),
                    );
                }
                Child::Unknown(node) => ignore(node),
            }
        }
        Ok(())
    }

    fn top_level(
        &mut self,
        cx: &Context,
        kind: NodeKind,
        node: &XmlElement,
        scope: &NamespaceScope<'_>,
    ) -> Result<()> {
        match kind {
            NodeKind::Annotation => {
                let annotation = self.annotation(node);
                self.collection.add_annotation(cx.schema, annotation);
            }
            NodeKind::Include => self.external(cx, node, scope, ExternalKind::Include)?,
            NodeKind::Import => self.external(cx, node, scope, ExternalKind::Import)?,
            NodeKind::Redefine => self.external(cx, node, scope, ExternalKind::Redefine)?,
            NodeKind::SimpleType => {
                self.simple_type(cx, node, scope, Placement::TopLevel)?;
            }
            NodeKind::ComplexType => {
                self.complex_type(cx, node, scope, Placement::TopLevel)?;
            }
            NodeKind::Element => {
                self.element(cx, node, scope, Placement::TopLevel)?;
            }
            NodeKind::Attribute => {
                self.attribute(cx, node, scope, Placement::TopLevel)?;
            }
            NodeKind::Group => {
                self.named_group(cx, node, scope, Placement::TopLevel)?;
            }
            NodeKind::AttributeGroup => {
                self.named_attribute_group(cx, node, scope, Placement::TopLevel)?;
            }
            NodeKind::Notation => self.notation(cx, node)?,
            _ => ignore(node),
        }
        Ok(())
    }

    // References

    /// Resolves a `prefix:local` token against the bindings in scope.
    fn qname(&self, cx: &Context, scope: &NamespaceScope<'_>, token: &str) -> Result<QName> {
        let (prefix, local) = split_prefixed(token);
        let namespace = if prefix == XML_PREFIX {
            XML_NS
        } else {
            match scope.lookup_namespace(prefix) {
                Some(namespace) => namespace,
                None if prefix.is_empty() => "",
                None => {
                    return Err(SchemaError::UnboundPrefix {
                        prefix: prefix.to_string(),
                        token: token.to_string(),
                        key: cx.key.clone(),
                    });
                }
            }
        };

        if namespace.is_empty() && cx.chameleon {
            return Ok(cx.qualify(local));
        }
        Ok(QName::new(namespace, local))
    }

    fn optional_qname(
        &self,
        cx: &Context,
        scope: &NamespaceScope<'_>,
        token: Option<&str>,
    ) -> Result<Option<QName>> {
        token.map(|token| self.qname(cx, scope, token)).transpose()
    }

    // Include / import / redefine

    fn external(
        &mut self,
        cx: &Context,
        node: &XmlElement,
        scope: &NamespaceScope<'_>,
        kind: ExternalKind,
    ) -> Result<()> {
        let scope = scope.enter(&node.namespaces);
        let location = node
            .attribute("schemaLocation")
            .map(str::trim)
            .filter(|location| !location.is_empty())
            .map(str::to_string);

        let mut external = ExternalRef::new(kind, location.clone());
        external.id = owned(node.attribute("id"));
        if kind == ExternalKind::Import {
            external.namespace = owned(node.attribute("namespace"));
        }
        self.foreign_attributes(node, &mut external.extensions);

        // Included and redefined documents take on the including namespace
        let (namespace, inherited) = match kind {
            ExternalKind::Import => (external.namespace.clone().unwrap_or_default(), None),
            _ => (cx.logical().to_string(), Some(cx.logical().to_string())),
        };

        if let Some(location) = &location {
            external.target = self.resolve_nested(
                &namespace,
                location,
                Some(&cx.key.locator),
                Some(cx.key.clone()),
                inherited,
            )?;
        }
        if external.target.is_none() && kind == ExternalKind::Import {
            external.target = self.collection.known_namespace(&namespace);
        }
        if external.target.is_none() {
            debug!(
                kind = kind.local_name(),
                location = location.as_deref().unwrap_or(""),
                namespace = %namespace,
                "external schema left unresolved"
            );
        }

        for child in node.child_elements() {
            match classify(child) {
                Child::Known(NodeKind::Annotation, child) => {
                    external.annotation = Some(self.annotation(child));
                }
                Child::Known(NodeKind::SimpleType, child) if kind == ExternalKind::Redefine => {
                    let id = self.simple_type(cx, child, &scope, Placement::Redefine)?;
                    external.redefined.push(SchemaItem::Type(id));
                }
                Child::Known(NodeKind::ComplexType, child) if kind == ExternalKind::Redefine => {
                    let id = self.complex_type(cx, child, &scope, Placement::Redefine)?;
                    external.redefined.push(SchemaItem::Type(id));
                }
                Child::Known(NodeKind::Group, child) if kind == ExternalKind::Redefine => {
                    let id = self.named_group(cx, child, &scope, Placement::Redefine)?;
                    external.redefined.push(SchemaItem::Group(id));
                }
                Child::Known(NodeKind::AttributeGroup, child) if kind == ExternalKind::Redefine => {
                    let id = self.named_attribute_group(cx, child, &scope, Placement::Redefine)?;
                    external.redefined.push(SchemaItem::AttributeGroup(id));
                }
                Child::Foreign(child) => self.foreign_element(child, &mut external.extensions),
                Child::Known(_, child) | Child::Unknown(child) => ignore(child),
            }
        }

        self.collection.add_external(cx.schema, external);
        Ok(())
    }

    fn resolve_nested(
        &mut self,
        namespace: &str,
        location: &str,
        base_uri: Option<&str>,
        parent: Option<SchemaKey>,
        inherited_namespace: Option<String>,
    ) -> Result<Option<SchemaId>> {
        let Some(source) = self.fetch(namespace, location, base_uri)? else {
            debug!(location, base_uri, "resolver found no document");
            return Ok(None);
        };

        let logical = source
            .document
            .attribute("targetNamespace")
            .filter(|namespace| !namespace.is_empty())
            .map(str::to_string)
            .or_else(|| inherited_namespace.clone())
            .unwrap_or_default();
        let key = SchemaKey::new(logical, source.locator.clone());

        if self.in_progress.contains(&key) {
            debug!(%key, "schema already in progress, not re-entering");
            return Ok(self.collection.schema_id(&key));
        }
        if let Some(existing) = self.collection.schema_id(&key) {
            return Ok(Some(existing));
        }

        debug!(%key, "resolving nested schema");
        self.build_schema(source, parent, inherited_namespace).map(Some)
    }

    /// Cache first, then the resolver. Fresh documents are cached for later
    /// lookups with the same (namespace, location, base) triple.
    fn fetch(
        &mut self,
        namespace: &str,
        location: &str,
        base_uri: Option<&str>,
    ) -> Result<Option<Arc<SchemaSource>>> {
        let cache_key = CacheKey::new(namespace, location, base_uri);
        if let Some(cache) = self.collection.cache() {
            if let Some(source) = cache.get(&cache_key) {
                return Ok(Some(source));
            }
            debug!(key = %cache_key, "resolution cache miss");
        }

        let resolver = Arc::clone(self.collection.resolver());
        let Some(source) = resolver.resolve(namespace, location, base_uri)? else {
            return Ok(None);
        };
        let source = Arc::new(source);
        if let Some(cache) = self.collection.cache() {
            cache.insert(cache_key, &source);
        }
        Ok(Some(source))
    }

    // Foreign content and annotations

    fn foreign_attributes(&self, node: &XmlElement, target: &mut Extensions) {
        let registry = self.registry();
        let is_documentation = node.is(XS_NS, "documentation");
        for attr in node.attributes.iter().filter(|attr| attr.name.namespace.is_some()) {
            if is_documentation && attr.name.namespace() == XML_NS && attr.name.local == "lang" {
                continue;
            }
            registry.deserialize(
                target,
                &attr.name.to_qname(),
                ExtensionPayload::Attribute(attr.clone()),
            );
        }
    }

    fn foreign_element(&self, node: &XmlElement, target: &mut Extensions) {
        self.registry().deserialize(
            target,
            &node.name.to_qname(),
            ExtensionPayload::Element(node.clone()),
        );
    }

    fn annotation(&self, node: &XmlElement) -> Annotation {
        let mut annotation = Annotation {
            id: owned(node.attribute("id")),
            ..Default::default()
        };
        self.foreign_attributes(node, &mut annotation.extensions);

        for child in node.child_elements() {
            match classify(child) {
                Child::Known(NodeKind::AppInfo, child) => {
                    annotation.items.push(AnnotationItem::AppInfo(AnnotationContent {
                        source: owned(child.attribute("source")),
                        lang: None,
                        markup: child.children.clone(),
                    }));
                }
                Child::Known(NodeKind::Documentation, child) => {
                    annotation
                        .items
                        .push(AnnotationItem::Documentation(AnnotationContent {
                            source: owned(child.attribute("source")),
                            lang: owned(child.attribute_ns(XML_NS, "lang")),
                            markup: child.children.clone(),
                        }));
                }
                Child::Foreign(child) => self.foreign_element(child, &mut annotation.extensions),
                Child::Known(_, child) | Child::Unknown(child) => ignore(child),
            }
        }
        annotation
    }

    // Types

    fn component_name(
        &self,
        cx: &Context,
        node: &XmlElement,
        placement: Placement,
    ) -> Option<QName> {
        match placement {
            Placement::TopLevel | Placement::Redefine => {
                node.attribute("name").map(|name| cx.qualify(name))
            }
            Placement::Local => None,
        }
    }

    fn place_type(
        &mut self,
        cx: &Context,
        definition: TypeDefinition,
        placement: Placement,
    ) -> Result<TypeId> {
        match placement {
            Placement::TopLevel => self.collection.add_type(cx.schema, definition),
            Placement::Redefine | Placement::Local => {
                Ok(self.collection.alloc_type(cx.schema, definition))
            }
        }
    }

    fn simple_type(
        &mut self,
        cx: &Context,
        node: &XmlElement,
        scope: &NamespaceScope<'_>,
        placement: Placement,
    ) -> Result<TypeId> {
        let scope = scope.enter(&node.namespaces);
        let mut definition = TypeDefinition::simple(
            self.component_name(cx, node, placement),
            SimpleType::Unspecified,
        );
        definition.id = owned(node.attribute("id"));
        definition.final_derivation = derivation_set(node, "final");
        self.foreign_attributes(node, &mut definition.extensions);

        for child in node.child_elements() {
            match classify(child) {
                Child::Known(NodeKind::Annotation, child) => {
                    definition.annotation = Some(self.annotation(child));
                }
                Child::Known(NodeKind::Restriction, child) => {
                    let restriction = self.simple_restriction(cx, child, &scope)?;
                    definition.body = TypeBody::Simple(SimpleType::Restriction(restriction));
                }
                Child::Known(NodeKind::List, child) => {
                    let list = self.simple_list(cx, child, &scope)?;
                    definition.body = TypeBody::Simple(SimpleType::List(list));
                }
                Child::Known(NodeKind::Union, child) => {
                    let union = self.simple_union(cx, child, &scope)?;
                    definition.body = TypeBody::Simple(SimpleType::Union(union));
                }
                Child::Foreign(child) => self.foreign_element(child, &mut definition.extensions),
                Child::Known(_, child) | Child::Unknown(child) => ignore(child),
            }
        }

        self.place_type(cx, definition, placement)
    }

    fn simple_restriction(
        &mut self,
        cx: &Context,
        node: &XmlElement,
        scope: &NamespaceScope<'_>,
    ) -> Result<SimpleRestriction> {
        let scope = scope.enter(&node.namespaces);
        let mut restriction = SimpleRestriction {
            base: self.optional_qname(cx, &scope, node.attribute("base"))?,
            id: owned(node.attribute("id")),
            ..Default::default()
        };
        self.foreign_attributes(node, &mut restriction.extensions);

        for child in node.child_elements() {
            match classify(child) {
                Child::Known(NodeKind::Annotation, child) => {
                    restriction.annotation = Some(self.annotation(child));
                }
                Child::Known(NodeKind::SimpleType, child) => {
                    let base = self.simple_type(cx, child, &scope, Placement::Local)?;
                    restriction.base_type = Some(base);
                }
                Child::Known(NodeKind::Facet(kind), child) => {
                    restriction.facets.push(self.facet(kind, child));
                }
                Child::Foreign(child) => self.foreign_element(child, &mut restriction.extensions),
                Child::Known(_, child) | Child::Unknown(child) => ignore(child),
            }
        }
        Ok(restriction)
    }

    fn simple_list(
        &mut self,
        cx: &Context,
        node: &XmlElement,
        scope: &NamespaceScope<'_>,
    ) -> Result<SimpleList> {
        let scope = scope.enter(&node.namespaces);
        let mut list = SimpleList {
            item_type_name: self.optional_qname(cx, &scope, node.attribute("itemType"))?,
            id: owned(node.attribute("id")),
            ..Default::default()
        };
        self.foreign_attributes(node, &mut list.extensions);

        for child in node.child_elements() {
            match classify(child) {
                Child::Known(NodeKind::Annotation, child) => {
                    list.annotation = Some(self.annotation(child))
                }
                Child::Known(NodeKind::SimpleType, child) => {
                    list.item_type = Some(self.simple_type(cx, child, &scope, Placement::Local)?);
                }
                Child::Foreign(child) => self.foreign_element(child, &mut list.extensions),
                Child::Known(_, child) | Child::Unknown(child) => ignore(child),
            }
        }
        Ok(list)
    }

    fn simple_union(
        &mut self,
        cx: &Context,
        node: &XmlElement,
        scope: &NamespaceScope<'_>,
    ) -> Result<SimpleUnion> {
        let scope = scope.enter(&node.namespaces);
        let member_type_names = node
            .attribute("memberTypes")
            .unwrap_or("")
            .split_whitespace()
            .map(|token| self.qname(cx, &scope, token))
            .collect::<Result<Vec<_>>>()?;
        let mut union = SimpleUnion {
            member_type_names,
            id: owned(node.attribute("id")),
            ..Default::default()
        };
        self.foreign_attributes(node, &mut union.extensions);

        for child in node.child_elements() {
            match classify(child) {
                Child::Known(NodeKind::Annotation, child) => {
                    union.annotation = Some(self.annotation(child))
                }
                Child::Known(NodeKind::SimpleType, child) => {
                    let member = self.simple_type(cx, child, &scope, Placement::Local)?;
                    union.member_types.push(member);
                }
                Child::Foreign(child) => self.foreign_element(child, &mut union.extensions),
                Child::Known(_, child) | Child::Unknown(child) => ignore(child),
            }
        }
        Ok(union)
    }

    fn facet(&self, kind: FacetKind, node: &XmlElement) -> Facet {
        let mut facet = Facet::new(kind, node.attribute("value").unwrap_or_default());
        facet.fixed = parse_bool(node.attribute("fixed")).unwrap_or(false);
        facet.id = owned(node.attribute("id"));
        facet.annotation = node
            .child_elements()
            .find(|child| child.is(XS_NS, "annotation"))
            .map(|child| self.annotation(child));
        facet
    }

    fn complex_type(
        &mut self,
        cx: &Context,
        node: &XmlElement,
        scope: &NamespaceScope<'_>,
        placement: Placement,
    ) -> Result<TypeId> {
        let scope = scope.enter(&node.namespaces);
        let mut complex = ComplexType {
            is_abstract: parse_bool(node.attribute("abstract")).unwrap_or(false),
            mixed: parse_bool(node.attribute("mixed")),
            block: derivation_set(node, "block"),
            ..Default::default()
        };
        let name = self.component_name(cx, node, placement);
        let mut definition = TypeDefinition::complex(name, ComplexType::default());
        definition.id = owned(node.attribute("id"));
        definition.final_derivation = derivation_set(node, "final");
        self.foreign_attributes(node, &mut definition.extensions);

        let mut direct = DirectContent::default();
        let mut content = None;
        for child in node.child_elements() {
            match classify(child) {
                Child::Known(NodeKind::Annotation, child) => {
                    definition.annotation = Some(self.annotation(child));
                }
                Child::Known(NodeKind::SimpleContent, child) => {
                    content = Some(ContentModel::Simple(self.simple_content(cx, child, &scope)?));
                }
                Child::Known(NodeKind::ComplexContent, child) => {
                    content = Some(ContentModel::Complex(self.complex_content(cx, child, &scope)?));
                }
                Child::Known(kind, child) if kind.opens_particle() => {
                    direct.particle = self.particle(cx, kind, child, &scope)?;
                }
                Child::Known(kind @ (NodeKind::Attribute | NodeKind::AttributeGroup), child) => {
                    if let Some(item) = self.attribute_item(cx, kind, child, &scope)? {
                        direct.attributes.push(item);
                    }
                }
                Child::Known(NodeKind::AnyAttribute, child) => {
                    direct.any_attribute = Some(self.wildcard(child));
                }
                Child::Foreign(child) => self.foreign_element(child, &mut definition.extensions),
                Child::Known(_, child) | Child::Unknown(child) => ignore(child),
            }
        }

        complex.content = content.unwrap_or(ContentModel::Direct(direct));
        definition.body = TypeBody::Complex(complex);
        self.place_type(cx, definition, placement)
    }

    fn simple_content(
        &mut self,
        cx: &Context,
        node: &XmlElement,
        scope: &NamespaceScope<'_>,
    ) -> Result<SimpleContent> {
        let scope = scope.enter(&node.namespaces);
        let mut content = SimpleContent {
            id: owned(node.attribute("id")),
            ..Default::default()
        };
        self.foreign_attributes(node, &mut content.extensions);

        for child in node.child_elements() {
            match classify(child) {
                Child::Known(NodeKind::Annotation, child) => {
                    content.annotation = Some(self.annotation(child))
                }
                Child::Known(NodeKind::Extension, child) => {
                    let body = self.derivation_body(cx, child, &scope)?;
                    content.derivation = Some(ContentDerivation::Extension(body));
                }
                Child::Known(NodeKind::Restriction, child) => {
                    let body = self.derivation_body(cx, child, &scope)?;
                    content.derivation = Some(ContentDerivation::Restriction(body));
                }
                Child::Foreign(child) => self.foreign_element(child, &mut content.extensions),
                Child::Known(_, child) | Child::Unknown(child) => ignore(child),
            }
        }
        Ok(content)
    }

    fn complex_content(
        &mut self,
        cx: &Context,
        node: &XmlElement,
        scope: &NamespaceScope<'_>,
    ) -> Result<ComplexContent> {
        let scope = scope.enter(&node.namespaces);
        let mut content = ComplexContent {
            mixed: parse_bool(node.attribute("mixed")),
            id: owned(node.attribute("id")),
            ..Default::default()
        };
        self.foreign_attributes(node, &mut content.extensions);

        for child in node.child_elements() {
            match classify(child) {
                Child::Known(NodeKind::Annotation, child) => {
                    content.annotation = Some(self.annotation(child))
                }
                Child::Known(NodeKind::Extension, child) => {
                    let body = self.derivation_body(cx, child, &scope)?;
                    content.derivation = Some(ContentDerivation::Extension(body));
                }
                Child::Known(NodeKind::Restriction, child) => {
                    let body = self.derivation_body(cx, child, &scope)?;
                    content.derivation = Some(ContentDerivation::Restriction(body));
                }
                Child::Foreign(child) => self.foreign_element(child, &mut content.extensions),
                Child::Known(_, child) | Child::Unknown(child) => ignore(child),
            }
        }
        Ok(content)
    }

    fn derivation_body(
        &mut self,
        cx: &Context,
        node: &XmlElement,
        scope: &NamespaceScope<'_>,
    ) -> Result<DerivationBody> {
        let scope = scope.enter(&node.namespaces);
        let mut body = DerivationBody {
            base: self.optional_qname(cx, &scope, node.attribute("base"))?,
            id: owned(node.attribute("id")),
            ..Default::default()
        };
        self.foreign_attributes(node, &mut body.extensions);

        for child in node.child_elements() {
            match classify(child) {
                Child::Known(NodeKind::Annotation, child) => {
                    body.annotation = Some(self.annotation(child))
                }
                Child::Known(kind, child) if kind.opens_particle() => {
                    body.particle = self.particle(cx, kind, child, &scope)?;
                }
                Child::Known(kind @ (NodeKind::Attribute | NodeKind::AttributeGroup), child) => {
                    if let Some(item) = self.attribute_item(cx, kind, child, &scope)? {
                        body.attributes.push(item);
                    }
                }
                Child::Known(NodeKind::AnyAttribute, child) => {
                    body.any_attribute = Some(self.wildcard(child));
                }
                Child::Known(NodeKind::SimpleType, child) => {
                    body.simple_type = Some(self.simple_type(cx, child, &scope, Placement::Local)?);
                }
                Child::Known(NodeKind::Facet(kind), child) => {
                    body.facets.push(self.facet(kind, child))
                }
                Child::Foreign(child) => self.foreign_element(child, &mut body.extensions),
                Child::Known(_, child) | Child::Unknown(child) => ignore(child),
            }
        }
        Ok(body)
    }

    // Particles

    fn particle(
        &mut self,
        cx: &Context,
        kind: NodeKind,
        node: &XmlElement,
        scope: &NamespaceScope<'_>,
    ) -> Result<Option<Particle>> {
        let occurs = Occurs::parse(node.attribute("minOccurs"), node.attribute("maxOccurs"));
        let term = match kind {
            NodeKind::Sequence => Term::Sequence(self.model_group(cx, node, scope)?),
            NodeKind::Choice => Term::Choice(self.model_group(cx, node, scope)?),
            NodeKind::All => Term::All(self.model_group(cx, node, scope)?),
            NodeKind::Element => Term::Element(self.element(cx, node, scope, Placement::Local)?),
            NodeKind::Any => Term::Any(self.wildcard(node)),
            NodeKind::Group => match self.group_ref(cx, node, scope)? {
                Some(group_ref) => Term::GroupRef(group_ref),
                None => {
                    ignore(node);
                    return Ok(None);
                }
            },
            _ => {
                ignore(node);
                return Ok(None);
            }
        };
        Ok(Some(Particle::new(term).with_occurs(occurs)))
    }

    fn model_group(
        &mut self,
        cx: &Context,
        node: &XmlElement,
        scope: &NamespaceScope<'_>,
    ) -> Result<ModelGroup> {
        let scope = scope.enter(&node.namespaces);
        let mut group = ModelGroup {
            id: owned(node.attribute("id")),
            ..Default::default()
        };
        self.foreign_attributes(node, &mut group.extensions);

        for child in node.child_elements() {
            match classify(child) {
                Child::Known(NodeKind::Annotation, child) => {
                    group.annotation = Some(self.annotation(child))
                }
                Child::Known(
                    kind @ (NodeKind::Element
                    | NodeKind::Group
                    | NodeKind::Sequence
                    | NodeKind::Choice
                    | NodeKind::All
                    | NodeKind::Any),
                    child,
                ) => {
                    if let Some(particle) = self.particle(cx, kind, child, &scope)? {
                        group.particles.push(particle);
                    }
                }
                Child::Foreign(child) => self.foreign_element(child, &mut group.extensions),
                Child::Known(_, child) | Child::Unknown(child) => ignore(child),
            }
        }
        Ok(group)
    }

    fn group_ref(
        &mut self,
        cx: &Context,
        node: &XmlElement,
        scope: &NamespaceScope<'_>,
    ) -> Result<Option<GroupRef>> {
        let scope = scope.enter(&node.namespaces);
        let Some(token) = node.attribute("ref") else {
            return Ok(None);
        };
        let mut group_ref = GroupRef {
            ref_name: self.qname(cx, &scope, token)?,
            id: owned(node.attribute("id")),
            annotation: None,
            extensions: Extensions::default(),
        };
        self.foreign_attributes(node, &mut group_ref.extensions);
        for child in node.child_elements() {
            match classify(child) {
                Child::Known(NodeKind::Annotation, child) => {
                    group_ref.annotation = Some(self.annotation(child))
                }
                Child::Foreign(child) => self.foreign_element(child, &mut group_ref.extensions),
                Child::Known(_, child) | Child::Unknown(child) => ignore(child),
            }
        }
        Ok(Some(group_ref))
    }

    fn wildcard(&self, node: &XmlElement) -> Wildcard {
        let mut wildcard = Wildcard {
            namespace: owned(node.attribute("namespace")),
            process_contents: node.attribute("processContents").and_then(ProcessContents::parse),
            id: owned(node.attribute("id")),
            ..Default::default()
        };
        self.foreign_attributes(node, &mut wildcard.extensions);
        for child in node.child_elements() {
            match classify(child) {
                Child::Known(NodeKind::Annotation, child) => {
                    wildcard.annotation = Some(self.annotation(child))
                }
                Child::Foreign(child) => self.foreign_element(child, &mut wildcard.extensions),
                Child::Known(_, child) | Child::Unknown(child) => ignore(child),
            }
        }
        wildcard
    }

    // Declarations

    fn element(
        &mut self,
        cx: &Context,
        node: &XmlElement,
        scope: &NamespaceScope<'_>,
        placement: Placement,
    ) -> Result<ElementId> {
        let scope = scope.enter(&node.namespaces);
        let form = node.attribute("form").and_then(Form::parse);
        let mut element = Element {
            form,
            top_level: placement == Placement::TopLevel,
            id: owned(node.attribute("id")),
            default_value: owned(node.attribute("default")),
            fixed_value: owned(node.attribute("fixed")),
            nillable: parse_bool(node.attribute("nillable")).unwrap_or(false),
            is_abstract: parse_bool(node.attribute("abstract")).unwrap_or(false),
            substitution_group: self.optional_qname(
                cx,
                &scope,
                node.attribute("substitutionGroup"),
            )?,
            block: derivation_set(node, "block"),
            final_derivation: derivation_set(node, "final"),
            ..Default::default()
        };

        match (placement, node.attribute("ref")) {
            (Placement::Local, Some(token)) => {
                element.reference = Some(self.qname(cx, &scope, token)?);
            }
            (Placement::Local, None) => {
                element.name = node
                    .attribute("name")
                    .map(|name| cx.local_name(name, form.unwrap_or(cx.element_form)));
            }
            _ => element.name = node.attribute("name").map(|name| cx.qualify(name)),
        }

        if let Some(token) = node.attribute("type") {
            element.type_slot = TypeSlot::Named {
                name: self.qname(cx, &scope, token)?,
                resolved: None,
            };
        }
        self.foreign_attributes(node, &mut element.extensions);

        for child in node.child_elements() {
            match classify(child) {
                Child::Known(NodeKind::Annotation, child) => {
                    element.annotation = Some(self.annotation(child))
                }
                Child::Known(NodeKind::SimpleType, child) => {
                    let id = self.simple_type(cx, child, &scope, Placement::Local)?;
                    element.type_slot = TypeSlot::Anonymous(id);
                }
                Child::Known(NodeKind::ComplexType, child) => {
                    let id = self.complex_type(cx, child, &scope, Placement::Local)?;
                    element.type_slot = TypeSlot::Anonymous(id);
                }
                Child::Known(
                    kind @ (NodeKind::Key | NodeKind::KeyRef | NodeKind::Unique),
                    child,
                ) => {
                    element.constraints.push(self.identity_constraint(cx, kind, child, &scope)?);
                }
                Child::Foreign(child) => self.foreign_element(child, &mut element.extensions),
                Child::Known(_, child) | Child::Unknown(child) => ignore(child),
            }
        }

        match placement {
            Placement::TopLevel => self.collection.add_element(cx.schema, element),
            Placement::Redefine | Placement::Local => {
                Ok(self.collection.alloc_element(cx.schema, element))
            }
        }
    }

    fn identity_constraint(
        &self,
        cx: &Context,
        kind: NodeKind,
        node: &XmlElement,
        scope: &NamespaceScope<'_>,
    ) -> Result<IdentityConstraint> {
        let scope = scope.enter(&node.namespaces);
        let name = cx.qualify(node.attribute("name").unwrap_or_default());
        let mut constraint = match kind {
            NodeKind::KeyRef => {
                let refer = self.qname(cx, &scope, node.attribute("refer").unwrap_or_default())?;
                IdentityConstraint::keyref(name, refer)
            }
            NodeKind::Unique => IdentityConstraint::unique(name),
            _ => IdentityConstraint::key(name),
        };
        constraint.id = owned(node.attribute("id"));
        self.foreign_attributes(node, &mut constraint.extensions);

        for child in node.child_elements() {
            match classify(child) {
                Child::Known(NodeKind::Annotation, child) => {
                    constraint.annotation = Some(self.annotation(child))
                }
                Child::Known(NodeKind::Selector, child) => {
                    constraint.selector = Some(self.xpath(child))
                }
                Child::Known(NodeKind::Field, child) => constraint.fields.push(self.xpath(child)),
                Child::Foreign(child) => self.foreign_element(child, &mut constraint.extensions),
                Child::Known(_, child) | Child::Unknown(child) => ignore(child),
            }
        }
        Ok(constraint)
    }

    fn xpath(&self, node: &XmlElement) -> XPathExpr {
        let mut expr = XPathExpr::new(node.attribute("xpath").unwrap_or_default());
        expr.id = owned(node.attribute("id"));
        expr.annotation = node
            .child_elements()
            .find(|child| child.is(XS_NS, "annotation"))
            .map(|child| self.annotation(child));
        expr
    }

    fn attribute(
        &mut self,
        cx: &Context,
        node: &XmlElement,
        scope: &NamespaceScope<'_>,
        placement: Placement,
    ) -> Result<AttributeId> {
        let scope = scope.enter(&node.namespaces);
        let form = node.attribute("form").and_then(Form::parse);
        let mut attribute = Attribute {
            form,
            top_level: placement == Placement::TopLevel,
            use_kind: node.attribute("use").and_then(AttributeUse::parse),
            default_value: owned(node.attribute("default")),
            fixed_value: owned(node.attribute("fixed")),
            id: owned(node.attribute("id")),
            ..Default::default()
        };

        match (placement, node.attribute("ref")) {
            (Placement::Local, Some(token)) => {
                attribute.reference = Some(self.qname(cx, &scope, token)?);
            }
            (Placement::Local, None) => {
                attribute.name = node
                    .attribute("name")
                    .map(|name| cx.local_name(name, form.unwrap_or(cx.attribute_form)));
            }
            _ => attribute.name = node.attribute("name").map(|name| cx.qualify(name)),
        }

        if let Some(token) = node.attribute("type") {
            attribute.type_slot = TypeSlot::Named {
                name: self.qname(cx, &scope, token)?,
                resolved: None,
            };
        }
        self.foreign_attributes(node, &mut attribute.extensions);

        for child in node.child_elements() {
            match classify(child) {
                Child::Known(NodeKind::Annotation, child) => {
                    attribute.annotation = Some(self.annotation(child))
                }
                Child::Known(NodeKind::SimpleType, child) => {
                    let id = self.simple_type(cx, child, &scope, Placement::Local)?;
                    attribute.type_slot = TypeSlot::Anonymous(id);
                }
                Child::Foreign(child) => self.foreign_element(child, &mut attribute.extensions),
                Child::Known(_, child) | Child::Unknown(child) => ignore(child),
            }
        }

        match placement {
            Placement::TopLevel => self.collection.add_attribute(cx.schema, attribute),
            Placement::Redefine | Placement::Local => {
                Ok(self.collection.alloc_attribute(cx.schema, attribute))
            }
        }
    }

    /// Local attribute or attribute-group reference inside a type or group.
    fn attribute_item(
        &mut self,
        cx: &Context,
        kind: NodeKind,
        node: &XmlElement,
        scope: &NamespaceScope<'_>,
    ) -> Result<Option<AttributeItem>> {
        if kind == NodeKind::Attribute {
            let id = self.attribute(cx, node, scope, Placement::Local)?;
            return Ok(Some(AttributeItem::Attribute(id)));
        }

        let scope = scope.enter(&node.namespaces);
        let Some(token) = node.attribute("ref") else {
            ignore(node);
            return Ok(None);
        };
        let mut group_ref = AttributeGroupRef {
            ref_name: self.qname(cx, &scope, token)?,
            id: owned(node.attribute("id")),
            annotation: None,
            extensions: Extensions::default(),
        };
        self.foreign_attributes(node, &mut group_ref.extensions);
        for child in node.child_elements() {
            match classify(child) {
                Child::Known(NodeKind::Annotation, child) => {
                    group_ref.annotation = Some(self.annotation(child))
                }
                Child::Foreign(child) => self.foreign_element(child, &mut group_ref.extensions),
                Child::Known(_, child) | Child::Unknown(child) => ignore(child),
            }
        }
        Ok(Some(AttributeItem::GroupRef(group_ref)))
    }

    fn named_group(
        &mut self,
        cx: &Context,
        node: &XmlElement,
        scope: &NamespaceScope<'_>,
        placement: Placement,
    ) -> Result<GroupId> {
        let scope = scope.enter(&node.namespaces);
        let mut group = Group {
            name: self.component_name(cx, node, placement),
            id: owned(node.attribute("id")),
            ..Default::default()
        };
        self.foreign_attributes(node, &mut group.extensions);

        for child in node.child_elements() {
            match classify(child) {
                Child::Known(NodeKind::Annotation, child) => {
                    group.annotation = Some(self.annotation(child))
                }
                Child::Known(
                    kind @ (NodeKind::Sequence | NodeKind::Choice | NodeKind::All),
                    child,
                ) => {
                    group.particle = self.particle(cx, kind, child, &scope)?;
                }
                Child::Foreign(child) => self.foreign_element(child, &mut group.extensions),
                Child::Known(_, child) | Child::Unknown(child) => ignore(child),
            }
        }

        match placement {
            Placement::TopLevel => self.collection.add_group(cx.schema, group),
            Placement::Redefine | Placement::Local => {
                Ok(self.collection.alloc_group(cx.schema, group))
            }
        }
    }

    fn named_attribute_group(
        &mut self,
        cx: &Context,
        node: &XmlElement,
        scope: &NamespaceScope<'_>,
        placement: Placement,
    ) -> Result<AttributeGroupId> {
        let scope = scope.enter(&node.namespaces);
        let mut group = AttributeGroup {
            name: self.component_name(cx, node, placement),
            id: owned(node.attribute("id")),
            ..Default::default()
        };
        self.foreign_attributes(node, &mut group.extensions);

        for child in node.child_elements() {
            match classify(child) {
                Child::Known(NodeKind::Annotation, child) => {
                    group.annotation = Some(self.annotation(child))
                }
                Child::Known(kind @ (NodeKind::Attribute | NodeKind::AttributeGroup), child) => {
                    if let Some(item) = self.attribute_item(cx, kind, child, &scope)? {
                        group.attributes.push(item);
                    }
                }
                Child::Known(NodeKind::AnyAttribute, child) => {
                    group.any_attribute = Some(self.wildcard(child))
                }
                Child::Foreign(child) => self.foreign_element(child, &mut group.extensions),
                Child::Known(_, child) | Child::Unknown(child) => ignore(child),
            }
        }

        match placement {
            Placement::TopLevel => self.collection.add_attribute_group(cx.schema, group),
            Placement::Redefine | Placement::Local => {
                Ok(self.collection.alloc_attribute_group(cx.schema, group))
            }
        }
    }

    fn notation(&mut self, cx: &Context, node: &XmlElement) -> Result<()> {
        let mut notation = Notation {
            name: node.attribute("name").map(|name| cx.qualify(name)),
            public_id: owned(node.attribute("public")),
            system_id: owned(node.attribute("system")),
            id: owned(node.attribute("id")),
            ..Default::default()
        };
        self.foreign_attributes(node, &mut notation.extensions);
        for child in node.child_elements() {
            match classify(child) {
                Child::Known(NodeKind::Annotation, child) => {
                    notation.annotation = Some(self.annotation(child))
                }
                Child::Foreign(child) => self.foreign_element(child, &mut notation.extensions),
                Child::Known(_, child) | Child::Unknown(child) => ignore(child),
            }
        }
        self.collection.add_notation(cx.schema, notation)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ComponentKind, UNBOUNDED};
    use crate::resolver::InMemoryResolver;

    fn build(text: &str) -> (Collection, SchemaId) {
        let mut collection = Collection::new();
        let id = collection.build_str(text, "test.xsd").unwrap();
        (collection, id)
    }

    #[test]
    fn test_dispatch_table_covers_facets() {
        assert_eq!(node_kinds().get("pattern"), Some(&NodeKind::Facet(FacetKind::Pattern)));
        assert_eq!(node_kinds().get("keyref"), Some(&NodeKind::KeyRef));
        assert!(node_kinds().get("assert").is_none());
    }

    #[test]
    fn test_forward_type_reference() {
        let (collection, id) = build(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                          xmlns:t="urn:t" targetNamespace="urn:t">
                 <xs:element name="early" type="t:Later"/>
                 <xs:complexType name="Later"/>
                 <xs:element name="late" type="t:Later"/>
               </xs:schema>"#,
        );
        let schema = collection.schema(id);
        let early = schema.lookup_element(&QName::new("urn:t", "early")).unwrap();
        let late = schema.lookup_element(&QName::new("urn:t", "late")).unwrap();
        let later = schema.lookup_type(&QName::new("urn:t", "Later")).unwrap();

        assert_eq!(collection.element(early).unwrap().type_slot.type_id(), Some(later));
        assert_eq!(collection.element(late).unwrap().type_slot.type_id(), Some(later));
        assert!(collection.unresolved_type_names().is_empty());
    }

    #[test]
    fn test_unbound_prefix_is_fatal() {
        let mut collection = Collection::new();
        let err = collection
            .build_str(
                r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                     <xs:element name="a" type="nowhere:T"/>
                   </xs:schema>"#,
                "bad.xsd",
            )
            .unwrap_err();
        match err {
            SchemaError::UnboundPrefix { prefix, token, key } => {
                assert_eq!(key.locator, "bad.xsd");
                assert_eq!(prefix, "nowhere");
                assert_eq!(token, "nowhere:T");
            }
            other => panic!("Expected UnboundPrefix, got {:?}", other),
        }
    }

    #[test]
    fn test_unnamed_top_level_is_fatal() {
        let mut collection = Collection::new();
        let err = collection
            .build_str(
                r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                     <xs:attributeGroup/>
                   </xs:schema>"#,
                "bad.xsd",
            )
            .unwrap_err();
        assert!(matches!(
            err,
            SchemaError::UnnamedComponent {
                kind: ComponentKind::AttributeGroup,
                ..
            }
        ));
    }

    #[test]
    fn test_not_a_schema() {
        let mut collection = Collection::new();
        let err = collection.build_str("<root/>", "plain.xml").unwrap_err();
        assert!(matches!(err, SchemaError::NotASchema { .. }));
    }

    #[test]
    fn test_occurrence_parsing_is_permissive() {
        let (collection, id) = build(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                 <xs:complexType name="T">
                   <xs:sequence>
                     <xs:element name="a" minOccurs="0" maxOccurs="unbounded"/>
                     <xs:element name="b" minOccurs="lots" maxOccurs="-1"/>
                   </xs:sequence>
                 </xs:complexType>
               </xs:schema>"#,
        );
        let type_id = collection.schema(id).lookup_type(&QName::local("T")).unwrap();
        let complex = collection.type_definition(type_id).unwrap().as_complex().unwrap();
        let ContentModel::Direct(direct) = &complex.content else {
            panic!("expected direct content");
        };
        let sequence = direct.particle.as_ref().unwrap().term.model_group().unwrap();
        assert_eq!(sequence.particles[0].occurs, Occurs::new(0, UNBOUNDED));
        assert_eq!(sequence.particles[1].occurs, Occurs::new(1, 1));
    }

    #[test]
    fn test_local_element_form() {
        let (collection, id) = build(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:f"
                          elementFormDefault="qualified">
                 <xs:complexType name="T">
                   <xs:sequence>
                     <xs:element name="q"/>
                     <xs:element name="u" form="unqualified"/>
                   </xs:sequence>
                 </xs:complexType>
               </xs:schema>"#,
        );
        let type_id = collection.schema(id).lookup_type(&QName::new("urn:f", "T")).unwrap();
        let complex = collection.type_definition(type_id).unwrap().as_complex().unwrap();
        let ContentModel::Direct(direct) = &complex.content else {
            panic!("expected direct content");
        };
        let names: Vec<QName> = direct
            .particle
            .as_ref()
            .unwrap()
            .elements()
            .into_iter()
            .filter_map(|id| collection.element(id).and_then(|e| e.name.clone()))
            .collect();
        assert_eq!(names, vec![QName::new("urn:f", "q"), QName::local("u")]);
    }

    #[test]
    fn test_chameleon_include() {
        let resolver = InMemoryResolver::new()
            .with_document(
                "main.xsd",
                r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                              xmlns:m="urn:main" targetNamespace="urn:main">
                     <xs:include schemaLocation="common.xsd"/>
                     <xs:element name="root" type="m:Code"/>
                   </xs:schema>"#,
            )
            .with_document(
                "common.xsd",
                r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                     <xs:simpleType name="Code">
                       <xs:restriction base="xs:string"/>
                     </xs:simpleType>
                     <xs:element name="code" type="Code"/>
                   </xs:schema>"#,
            );
        let mut collection = Collection::new().with_resolver(Arc::new(resolver));
        let main = collection.read_location("main.xsd", None).unwrap().unwrap();

        let common_key = SchemaKey::new("urn:main", "common.xsd");
        let common = collection.get_schema(&common_key).unwrap();
        assert_eq!(common.target_namespace(), None);
        assert_eq!(common.logical_namespace(), "urn:main");

        let code_type = collection.find_type(&QName::new("urn:main", "Code")).unwrap();
        let code = common.lookup_element(&QName::new("urn:main", "code")).unwrap();
        assert_eq!(collection.element_type(code), Some(code_type));

        let root = collection
            .schema(main)
            .lookup_element(&QName::new("urn:main", "root"))
            .unwrap();
        assert_eq!(collection.element_type(root), Some(code_type));
    }

    #[test]
    fn test_redefine_items_are_not_registered() {
        let resolver = InMemoryResolver::new()
            .with_document(
                "base.xsd",
                r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:r">
                     <xs:complexType name="T"/>
                   </xs:schema>"#,
            )
            .with_document(
                "redef.xsd",
                r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                              xmlns:r="urn:r" targetNamespace="urn:r">
                     <xs:redefine schemaLocation="base.xsd">
                       <xs:complexType name="T">
                         <xs:complexContent>
                           <xs:extension base="r:T"/>
                         </xs:complexContent>
                       </xs:complexType>
                     </xs:redefine>
                   </xs:schema>"#,
            );
        let mut collection = Collection::new().with_resolver(Arc::new(resolver));
        let id = collection.read_location("redef.xsd", None).unwrap().unwrap();
        let schema = collection.schema(id);

        assert_eq!(schema.component_count(), 0);
        let redefine = schema.externals().next().unwrap();
        assert!(redefine.is_resolved());
        assert_eq!(redefine.redefined.len(), 1);
    }

    #[test]
    fn test_foreign_content_recorded() {
        let (collection, id) = build(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" xmlns:ext="urn:ext">
                 <xs:element name="a" ext:flag="yes">
                   <ext:hint level="2"/>
                 </xs:element>
               </xs:schema>"#,
        );
        let element = collection
            .schema(id)
            .lookup_element(&QName::local("a"))
            .and_then(|id| collection.element(id))
            .unwrap();
        let names: Vec<String> = element
            .extensions
            .entries()
            .iter()
            .map(|entry| entry.name.to_string())
            .collect();
        assert_eq!(names, vec!["{urn:ext}flag", "{urn:ext}hint"]);
    }
}
