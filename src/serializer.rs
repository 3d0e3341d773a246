//! Writes schemas from the object model back to documents.
//!
//! Each document gets its own prefix bindings, all declared on the root
//! element. References are rendered with those prefixes, never with a
//! default namespace, so that unprefixed tokens keep meaning "no namespace".

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::collection::Collection;
use crate::constants::{XML_NS, XML_PREFIX, XS_NS, XS_PREFIX};
use crate::document::{XmlAttribute, XmlElement, XmlName, XmlNode};
use crate::error::{Result, SchemaError};
use crate::model::{
    Annotation, AnnotationContent, AnnotationItem, AttributeGroupId, AttributeId, AttributeItem,
    ComplexType, ComponentKind, ContentDerivation, ContentModel, DerivationBody, DerivationSet,
    ElementId, Extensions, ExternalKind, ExternalRef, Facet, GroupId, IdentityConstraint,
    IdentityConstraintKind, ModelGroup, NotationId, Particle, Schema, SchemaId, SchemaItem,
    SchemaKey, SimpleType, Term, TypeBody, TypeId, TypeSlot, Wildcard, XPathExpr,
};
use crate::qname::{NamespaceContext, NamespaceScope, QName};

/// One emitted document and the schema it came from.
#[derive(Debug, Clone)]
pub struct SerializedSchema {
    pub key: SchemaKey,
    pub document: XmlElement,
}

impl SerializedSchema {
    pub fn locator(&self) -> &str {
        &self.key.locator
    }

    pub fn to_xml_string(&self, indent: Option<usize>) -> Result<String> {
        self.document.to_xml_string(indent)
    }
}

pub struct Serializer<'c> {
    collection: &'c Collection,
}

impl<'c> Serializer<'c> {
    pub fn new(collection: &'c Collection) -> Self {
        Self { collection }
    }

    /// Serialize `id` and, when `recursive`, every schema reachable through
    /// its resolved externals. Each schema is emitted once, depth-first.
    pub fn serialize_schema(&self, id: SchemaId, recursive: bool) -> Result<Vec<SerializedSchema>> {
        let mut visited = HashSet::new();
        let mut output = Vec::new();
        self.visit(id, recursive, &mut visited, &mut output)?;
        Ok(output)
    }

    fn visit(
        &self,
        id: SchemaId,
        recursive: bool,
        visited: &mut HashSet<SchemaId>,
        output: &mut Vec<SerializedSchema>,
    ) -> Result<()> {
        if !visited.insert(id) {
            return Ok(());
        }
        let schema = self.collection.schema(id);
        if schema.is_builtin() {
            return Ok(());
        }

        let document = DocumentWriter::new(self.collection, schema).write()?;
        debug!(key = %schema.key(), "serialized schema");
        output.push(SerializedSchema {
            key: schema.key().clone(),
            document,
        });

        if recursive {
            for external in schema.externals() {
                if let Some(target) = self.collection.external_target(external) {
                    self.visit(target, recursive, visited, output)?;
                }
            }
        }
        Ok(())
    }
}

/// Prefix bindings of one output document.
struct PrefixAllocator {
    /// Bindings found on the source document, reused where still free
    recorded: NamespaceContext,
    target_namespace: Option<String>,
    /// Namespace written without a prefix besides the empty one
    unprefixed: Option<String>,
    assigned: HashMap<String, String>,
    declared: NamespaceContext,
}

impl PrefixAllocator {
    fn new(schema: &Schema) -> Self {
        let unprefixed = match schema.target_namespace() {
            None if !schema.logical_namespace().is_empty() => {
                Some(schema.logical_namespace().to_string())
            }
            _ => None,
        };
        Self {
            recorded: schema.namespaces.clone(),
            target_namespace: schema.target_namespace().map(str::to_string),
            unprefixed,
            assigned: HashMap::new(),
            declared: NamespaceContext::new(),
        }
    }

    /// Prefix for a reference into `namespace`; `None` writes the local name alone.
    fn reference(&mut self, namespace: &str) -> Option<String> {
        if namespace.is_empty() || self.unprefixed.as_deref() == Some(namespace) {
            return None;
        }
        Some(self.declare(namespace))
    }

    /// Prefix bound to `namespace`, declaring one if needed.
    fn declare(&mut self, namespace: &str) -> String {
        if namespace == XML_NS {
            return XML_PREFIX.to_string();
        }
        if let Some(prefix) = self.assigned.get(namespace) {
            return prefix.clone();
        }

        let recorded = self
            .recorded
            .lookup_prefix(namespace)
            .filter(|prefix| *prefix != XML_PREFIX && !self.declared.contains_prefix(prefix))
            .map(str::to_string);
        let prefix = recorded.unwrap_or_else(|| {
            let stem = if namespace == XS_NS {
                XS_PREFIX
            } else if self.target_namespace.as_deref() == Some(namespace) {
                "tns"
            } else {
                "ns"
            };
            self.fresh(stem)
        });

        self.assigned.insert(namespace.to_string(), prefix.clone());
        self.declared.declare(prefix.clone(), namespace);
        prefix
    }

    fn fresh(&self, stem: &str) -> String {
        let taken = |candidate: &str| {
            candidate == XML_PREFIX
                || self.declared.contains_prefix(candidate)
                || self.recorded.contains_prefix(candidate)
        };
        if stem != "ns" && !taken(stem) {
            return stem.to_string();
        }
        let start = if stem == "ns" { 0 } else { 1 };
        (start..)
            .map(|n| format!("{}{}", stem, n))
            .find(|candidate| !taken(candidate))
            .unwrap_or_else(|| stem.to_string())
    }

    fn qname(&mut self, name: &QName) -> String {
        match self.reference(name.namespace()) {
            Some(prefix) => format!("{}:{}", prefix, name.local_name()),
            None => name.local_name().to_string(),
        }
    }
}

struct DocumentWriter<'c> {
    collection: &'c Collection,
    schema: &'c Schema,
    prefixes: PrefixAllocator,
}

impl<'c> DocumentWriter<'c> {
    fn new(collection: &'c Collection, schema: &'c Schema) -> Self {
        Self {
            collection,
            schema,
            prefixes: PrefixAllocator::new(schema),
        }
    }

    fn write(mut self) -> Result<XmlElement> {
        let schema = self.schema;
        let mut root = self.xs("schema");
        set_opt(&mut root, "targetNamespace", schema.target_namespace());
        set_opt(&mut root, "version", schema.version.as_deref());
        set_opt(&mut root, "id", schema.schema_id.as_deref());
        if let Some(form) = schema.element_form_default {
            root.set_attribute("elementFormDefault", form.as_str());
        }
        if let Some(form) = schema.attribute_form_default {
            root.set_attribute("attributeFormDefault", form.as_str());
        }
        if let Some(set) = schema.block_default {
            root.set_attribute("blockDefault", set.to_string());
        }
        if let Some(set) = schema.final_default {
            root.set_attribute("finalDefault", set.to_string());
        }
        self.extensions(&schema.extensions, &mut root);

        let (externals, others): (Vec<&SchemaItem>, Vec<&SchemaItem>) = schema
            .items()
            .iter()
            .partition(|item| matches!(item, SchemaItem::External(_)));
        for item in externals.into_iter().chain(others) {
            let child = self.item(item)?;
            root.push_element(child);
        }

        root.namespaces = std::mem::take(&mut self.prefixes.declared);
        Ok(root)
    }

    fn item(&mut self, item: &SchemaItem) -> Result<XmlElement> {
        match item {
            SchemaItem::Annotation(annotation) => Ok(self.annotation(annotation)),
            SchemaItem::External(external) => self.external(external),
            SchemaItem::Type(id) => self.type_definition(*id, true),
            SchemaItem::Element(id) => self.element(*id, true),
            SchemaItem::Attribute(id) => self.attribute(*id, true),
            SchemaItem::Group(id) => self.group(*id),
            SchemaItem::AttributeGroup(id) => self.attribute_group(*id),
            SchemaItem::Notation(id) => self.notation(*id),
        }
    }

    // Helpers

    fn xs(&mut self, local: &str) -> XmlElement {
        let prefix = self.prefixes.declare(XS_NS);
        XmlElement::new(XmlName::new(Some(XS_NS), local).with_prefix(prefix))
    }

    fn unnamed(&self, kind: ComponentKind) -> SchemaError {
        SchemaError::UnnamedComponent {
            kind,
            key: self.schema.key().clone(),
        }
    }

    fn dangling(&self, kind: ComponentKind) -> SchemaError {
        SchemaError::InconsistentContentModel {
            context: self.schema.key().to_string(),
            details: format!("{} id does not belong to this collection", kind),
        }
    }

    fn inconsistent(&self, context: Option<&QName>, details: &str) -> SchemaError {
        let context = match context {
            Some(name) => format!("{} in {}", name, self.schema.key()),
            None => format!("anonymous type in {}", self.schema.key()),
        };
        SchemaError::InconsistentContentModel {
            context,
            details: details.to_string(),
        }
    }

    fn set_qname(&mut self, out: &mut XmlElement, attribute: &str, name: Option<&QName>) {
        if let Some(name) = name {
            let token = self.prefixes.qname(name);
            out.set_attribute(attribute, token);
        }
    }

    fn annotation_child(&mut self, out: &mut XmlElement, annotation: Option<&Annotation>) {
        if let Some(annotation) = annotation {
            let child = self.annotation(annotation);
            out.push_element(child);
        }
    }

    // Foreign content

    /// Appends foreign content through the registry and binds its namespaces.
    fn extensions(&mut self, extensions: &Extensions, out: &mut XmlElement) {
        if extensions.is_empty() {
            return;
        }
        let attributes_before = out.attributes.len();
        let children_before = out.children.len();
        self.collection.extensions().serialize(extensions, out);

        let outer = NamespaceContext::new();
        let scope = NamespaceScope::root(&outer);
        for attr in &mut out.attributes[attributes_before..] {
            attr.name.prefix = self.markup_prefix(&attr.name, &scope, true);
        }
        for child in &mut out.children[children_before..] {
            if let XmlNode::Element(element) = child {
                self.adopt(element, &scope);
            }
        }
    }

    /// Re-prefixes copied markup. Bindings declared inside the markup itself
    /// stay in effect; everything else is bound on the document root.
    fn adopt(&mut self, element: &mut XmlElement, outer: &NamespaceScope<'_>) {
        let declared = element.namespaces.clone();
        let scope = outer.enter(&declared);
        element.name.prefix = self.markup_prefix(&element.name, &scope, false);
        for attr in &mut element.attributes {
            attr.name.prefix = self.markup_prefix(&attr.name, &scope, true);
        }
        for child in element.child_elements_mut() {
            self.adopt(child, &scope);
        }
    }

    fn markup_prefix(
        &mut self,
        name: &XmlName,
        scope: &NamespaceScope<'_>,
        is_attribute: bool,
    ) -> Option<String> {
        let namespace = name.namespace.as_deref()?;
        if let Some(prefix) = &name.prefix {
            if scope.lookup_namespace(prefix) == Some(namespace) {
                return Some(prefix.clone());
            }
        }
        if !is_attribute && name.prefix.is_none() && scope.lookup_namespace("") == Some(namespace) {
            return None;
        }
        Some(self.prefixes.declare(namespace))
    }

    fn markup(&mut self, nodes: &[XmlNode]) -> Vec<XmlNode> {
        let outer = NamespaceContext::new();
        let scope = NamespaceScope::root(&outer);
        let mut copied = nodes.to_vec();
        for node in &mut copied {
            if let XmlNode::Element(element) = node {
                self.adopt(element, &scope);
            }
        }
        copied
    }

    fn annotation(&mut self, annotation: &Annotation) -> XmlElement {
        let mut out = self.xs("annotation");
        set_opt(&mut out, "id", annotation.id.as_deref());
        self.extensions(&annotation.extensions, &mut out);

        for item in &annotation.items {
            let (local, content) = match item {
                AnnotationItem::AppInfo(content) => ("appinfo", content),
                AnnotationItem::Documentation(content) => ("documentation", content),
            };
            let child = self.annotation_content(local, content);
            out.push_element(child);
        }
        out
    }

    fn annotation_content(&mut self, local: &str, content: &AnnotationContent) -> XmlElement {
        let mut out = self.xs(local);
        set_opt(&mut out, "source", content.source.as_deref());
        if let Some(lang) = &content.lang {
            out.attributes.push(XmlAttribute {
                name: XmlName::new(Some(XML_NS), "lang").with_prefix(XML_PREFIX),
                value: lang.clone(),
            });
        }
        out.children = self.markup(&content.markup);
        out
    }

    // Externals

    fn external(&mut self, external: &ExternalRef) -> Result<XmlElement> {
        let mut out = self.xs(external.kind.local_name());
        if external.kind == ExternalKind::Import {
            set_opt(&mut out, "namespace", external.namespace.as_deref());
        }
        set_opt(&mut out, "schemaLocation", external.schema_location.as_deref());
        set_opt(&mut out, "id", external.id.as_deref());
        self.annotation_child(&mut out, external.annotation.as_ref());
        self.extensions(&external.extensions, &mut out);

        for item in &external.redefined {
            let child = match item {
                SchemaItem::Type(id) => self.type_definition(*id, true)?,
                SchemaItem::Group(id) => self.group(*id)?,
                SchemaItem::AttributeGroup(id) => self.attribute_group(*id)?,
                other => self.item(other)?,
            };
            out.push_element(child);
        }
        Ok(out)
    }

    // Types

    fn type_definition(&mut self, id: TypeId, named: bool) -> Result<XmlElement> {
        let collection = self.collection;
        let definition = collection
            .type_definition(id)
            .ok_or_else(|| self.dangling(ComponentKind::Type))?;
        let name = definition.name.as_ref();
        if definition.is_builtin() {
            return Err(self.inconsistent(name, "built-in types have no schema document form"));
        }

        let mut out = match &definition.body {
            TypeBody::Simple(_) => self.xs("simpleType"),
            TypeBody::Complex(_) => self.xs("complexType"),
        };
        if named {
            let name = name.ok_or_else(|| self.unnamed(ComponentKind::Type))?;
            out.set_attribute("name", name.local_name());
        }
        if let TypeBody::Complex(complex) = &definition.body {
            if complex.is_abstract {
                out.set_attribute("abstract", "true");
            }
            if let Some(mixed) = complex.mixed {
                out.set_attribute("mixed", mixed.to_string());
            }
            set_derivations(&mut out, "block", complex.block);
        }
        set_derivations(&mut out, "final", definition.final_derivation);
        set_opt(&mut out, "id", definition.id.as_deref());
        self.annotation_child(&mut out, definition.annotation.as_ref());
        self.extensions(&definition.extensions, &mut out);

        match &definition.body {
            TypeBody::Simple(simple) => self.simple_body(name, simple, &mut out)?,
            TypeBody::Complex(complex) => self.complex_body(name, complex, &mut out)?,
        }
        Ok(out)
    }

    fn simple_body(
        &mut self,
        name: Option<&QName>,
        simple: &SimpleType,
        out: &mut XmlElement,
    ) -> Result<()> {
        match simple {
            SimpleType::Builtin { .. } => {
                return Err(self.inconsistent(name, "built-in types have no schema document form"));
            }
            SimpleType::Unspecified => {}
            SimpleType::Restriction(restriction) => {
                if restriction.base.is_some() && restriction.base_type.is_some() {
                    return Err(self.inconsistent(
                        name,
                        "restriction has both a base name and an inline base type",
                    ));
                }
                let mut child = self.xs("restriction");
                self.set_qname(&mut child, "base", restriction.base.as_ref());
                set_opt(&mut child, "id", restriction.id.as_deref());
                self.annotation_child(&mut child, restriction.annotation.as_ref());
                self.extensions(&restriction.extensions, &mut child);
                if let Some(base_type) = restriction.base_type {
                    let inline = self.type_definition(base_type, false)?;
                    child.push_element(inline);
                }
                self.facets(&restriction.facets, &mut child);
                out.push_element(child);
            }
            SimpleType::List(list) => {
                if list.item_type_name.is_some() && list.item_type.is_some() {
                    return Err(self.inconsistent(
                        name,
                        "list has both an itemType and an inline item type",
                    ));
                }
                let mut child = self.xs("list");
                self.set_qname(&mut child, "itemType", list.item_type_name.as_ref());
                set_opt(&mut child, "id", list.id.as_deref());
                self.annotation_child(&mut child, list.annotation.as_ref());
                self.extensions(&list.extensions, &mut child);
                if let Some(item_type) = list.item_type {
                    let inline = self.type_definition(item_type, false)?;
                    child.push_element(inline);
                }
                out.push_element(child);
            }
            SimpleType::Union(union) => {
                let mut child = self.xs("union");
                if !union.member_type_names.is_empty() {
                    let tokens: Vec<String> = union
                        .member_type_names
                        .iter()
                        .map(|member| self.prefixes.qname(member))
                        .collect();
                    child.set_attribute("memberTypes", tokens.join(" "));
                }
                set_opt(&mut child, "id", union.id.as_deref());
                self.annotation_child(&mut child, union.annotation.as_ref());
                self.extensions(&union.extensions, &mut child);
                for member in &union.member_types {
                    let inline = self.type_definition(*member, false)?;
                    child.push_element(inline);
                }
                out.push_element(child);
            }
        }
        Ok(())
    }

    fn facets(&mut self, facets: &[Facet], out: &mut XmlElement) {
        for facet in facets {
            let mut child = self.xs(facet.kind.local_name());
            child.set_attribute("value", facet.value.as_str());
            if facet.fixed {
                child.set_attribute("fixed", "true");
            }
            set_opt(&mut child, "id", facet.id.as_deref());
            self.annotation_child(&mut child, facet.annotation.as_ref());
            out.push_element(child);
        }
    }

    fn complex_body(
        &mut self,
        name: Option<&QName>,
        complex: &ComplexType,
        out: &mut XmlElement,
    ) -> Result<()> {
        match &complex.content {
            ContentModel::Direct(direct) => {
                if let Some(particle) = &direct.particle {
                    let child = self.particle(particle)?;
                    out.push_element(child);
                }
                self.attribute_items(&direct.attributes, out)?;
                if let Some(wildcard) = &direct.any_attribute {
                    let child = self.wildcard("anyAttribute", wildcard);
                    out.push_element(child);
                }
            }
            ContentModel::Simple(content) => {
                let mut child = self.xs("simpleContent");
                set_opt(&mut child, "id", content.id.as_deref());
                self.annotation_child(&mut child, content.annotation.as_ref());
                self.extensions(&content.extensions, &mut child);
                if let Some(derivation) = &content.derivation {
                    let body = derivation.body();
                    if body.particle.is_some() {
                        return Err(self.inconsistent(
                            name,
                            "simple content cannot carry a particle",
                        ));
                    }
                    if matches!(derivation, ContentDerivation::Extension(_))
                        && (body.simple_type.is_some() || !body.facets.is_empty())
                    {
                        return Err(self.inconsistent(
                            name,
                            "simple content extension cannot carry facets or an inline type",
                        ));
                    }
                    let derived = self.derivation(name, derivation)?;
                    child.push_element(derived);
                }
                out.push_element(child);
            }
            ContentModel::Complex(content) => {
                let mut child = self.xs("complexContent");
                if let Some(mixed) = content.mixed {
                    child.set_attribute("mixed", mixed.to_string());
                }
                set_opt(&mut child, "id", content.id.as_deref());
                self.annotation_child(&mut child, content.annotation.as_ref());
                self.extensions(&content.extensions, &mut child);
                if let Some(derivation) = &content.derivation {
                    let body = derivation.body();
                    if body.simple_type.is_some() || !body.facets.is_empty() {
                        return Err(self.inconsistent(
                            name,
                            "complex content cannot carry facets or an inline type",
                        ));
                    }
                    let derived = self.derivation(name, derivation)?;
                    child.push_element(derived);
                }
                out.push_element(child);
            }
        }
        Ok(())
    }

    fn derivation(
        &mut self,
        name: Option<&QName>,
        derivation: &ContentDerivation,
    ) -> Result<XmlElement> {
        let body: &DerivationBody = derivation.body();
        if body.base.is_some() && body.simple_type.is_some() {
            return Err(self.inconsistent(
                name,
                "derivation has both a base name and an inline base type",
            ));
        }
        let mut out = self.xs(derivation.local_name());
        self.set_qname(&mut out, "base", body.base.as_ref());
        set_opt(&mut out, "id", body.id.as_deref());
        self.annotation_child(&mut out, body.annotation.as_ref());
        self.extensions(&body.extensions, &mut out);

        if let Some(simple_type) = body.simple_type {
            let inline = self.type_definition(simple_type, false)?;
            out.push_element(inline);
        }
        self.facets(&body.facets, &mut out);
        if let Some(particle) = &body.particle {
            let child = self.particle(particle)?;
            out.push_element(child);
        }
        self.attribute_items(&body.attributes, &mut out)?;
        if let Some(wildcard) = &body.any_attribute {
            let child = self.wildcard("anyAttribute", wildcard);
            out.push_element(child);
        }
        Ok(out)
    }

    // Particles

    fn particle(&mut self, particle: &Particle) -> Result<XmlElement> {
        let mut out = match &particle.term {
            Term::Sequence(group) | Term::Choice(group) | Term::All(group) => {
                self.model_group(particle.term.local_name(), group)?
            }
            Term::Element(id) => self.element(*id, false)?,
            Term::Any(wildcard) => self.wildcard("any", wildcard),
            Term::GroupRef(group_ref) => {
                let mut out = self.xs("group");
                self.set_qname(&mut out, "ref", Some(&group_ref.ref_name));
                set_opt(&mut out, "id", group_ref.id.as_deref());
                self.annotation_child(&mut out, group_ref.annotation.as_ref());
                self.extensions(&group_ref.extensions, &mut out);
                out
            }
        };

        let (min, max) = particle.occurs.lexical();
        set_opt(&mut out, "minOccurs", min.as_deref());
        set_opt(&mut out, "maxOccurs", max.as_deref());
        Ok(out)
    }

    fn model_group(&mut self, local: &str, group: &ModelGroup) -> Result<XmlElement> {
        let mut out = self.xs(local);
        set_opt(&mut out, "id", group.id.as_deref());
        self.annotation_child(&mut out, group.annotation.as_ref());
        self.extensions(&group.extensions, &mut out);
        for particle in &group.particles {
            let child = self.particle(particle)?;
            out.push_element(child);
        }
        Ok(out)
    }

    fn wildcard(&mut self, local: &str, wildcard: &Wildcard) -> XmlElement {
        let mut out = self.xs(local);
        set_opt(&mut out, "namespace", wildcard.namespace.as_deref());
        if let Some(process) = wildcard.process_contents {
            out.set_attribute("processContents", process.as_str());
        }
        set_opt(&mut out, "id", wildcard.id.as_deref());
        self.annotation_child(&mut out, wildcard.annotation.as_ref());
        self.extensions(&wildcard.extensions, &mut out);
        out
    }

    // Declarations

    fn element(&mut self, id: ElementId, top_level: bool) -> Result<XmlElement> {
        let collection = self.collection;
        let element = collection
            .element(id)
            .ok_or_else(|| self.dangling(ComponentKind::Element))?;

        let mut out = self.xs("element");
        match (&element.reference, &element.name) {
            (Some(target), _) if !top_level => self.set_qname(&mut out, "ref", Some(target)),
            (_, Some(name)) => out.set_attribute("name", name.local_name()),
            (_, None) if top_level => return Err(self.unnamed(ComponentKind::Element)),
            _ => {}
        }
        if let TypeSlot::Named { name, .. } = &element.type_slot {
            self.set_qname(&mut out, "type", Some(name));
        }
        self.set_qname(&mut out, "substitutionGroup", element.substitution_group.as_ref());
        set_opt(&mut out, "default", element.default_value.as_deref());
        set_opt(&mut out, "fixed", element.fixed_value.as_deref());
        if element.nillable {
            out.set_attribute("nillable", "true");
        }
        if element.is_abstract {
            out.set_attribute("abstract", "true");
        }
        set_derivations(&mut out, "block", element.block);
        set_derivations(&mut out, "final", element.final_derivation);
        if let Some(form) = element.form {
            out.set_attribute("form", form.as_str());
        }
        set_opt(&mut out, "id", element.id.as_deref());
        self.annotation_child(&mut out, element.annotation.as_ref());
        self.extensions(&element.extensions, &mut out);

        if let TypeSlot::Anonymous(type_id) = element.type_slot {
            let inline = self.type_definition(type_id, false)?;
            out.push_element(inline);
        }
        for constraint in &element.constraints {
            let child = self.identity_constraint(constraint);
            out.push_element(child);
        }
        Ok(out)
    }

    fn identity_constraint(&mut self, constraint: &IdentityConstraint) -> XmlElement {
        let mut out = self.xs(constraint.kind.local_name());
        out.set_attribute("name", constraint.name.local_name());
        if let IdentityConstraintKind::KeyRef { refer } = &constraint.kind {
            self.set_qname(&mut out, "refer", Some(refer));
        }
        set_opt(&mut out, "id", constraint.id.as_deref());
        self.annotation_child(&mut out, constraint.annotation.as_ref());
        self.extensions(&constraint.extensions, &mut out);
        if let Some(selector) = &constraint.selector {
            let child = self.xpath("selector", selector);
            out.push_element(child);
        }
        for field in &constraint.fields {
            let child = self.xpath("field", field);
            out.push_element(child);
        }
        out
    }

    fn xpath(&mut self, local: &str, expr: &XPathExpr) -> XmlElement {
        let mut out = self.xs(local);
        out.set_attribute("xpath", expr.xpath.as_str());
        set_opt(&mut out, "id", expr.id.as_deref());
        self.annotation_child(&mut out, expr.annotation.as_ref());
        out
    }

    fn attribute(&mut self, id: AttributeId, top_level: bool) -> Result<XmlElement> {
        let collection = self.collection;
        let attribute = collection
            .attribute(id)
            .ok_or_else(|| self.dangling(ComponentKind::Attribute))?;

        let mut out = self.xs("attribute");
        match (&attribute.reference, &attribute.name) {
            (Some(target), _) if !top_level => self.set_qname(&mut out, "ref", Some(target)),
            (_, Some(name)) => out.set_attribute("name", name.local_name()),
            (_, None) if top_level => return Err(self.unnamed(ComponentKind::Attribute)),
            _ => {}
        }
        if let TypeSlot::Named { name, .. } = &attribute.type_slot {
            self.set_qname(&mut out, "type", Some(name));
        }
        if let Some(use_kind) = attribute.use_kind {
            out.set_attribute("use", use_kind.as_str());
        }
        set_opt(&mut out, "default", attribute.default_value.as_deref());
        set_opt(&mut out, "fixed", attribute.fixed_value.as_deref());
        if let Some(form) = attribute.form {
            out.set_attribute("form", form.as_str());
        }
        set_opt(&mut out, "id", attribute.id.as_deref());
        self.annotation_child(&mut out, attribute.annotation.as_ref());
        self.extensions(&attribute.extensions, &mut out);

        if let TypeSlot::Anonymous(type_id) = attribute.type_slot {
            let inline = self.type_definition(type_id, false)?;
            out.push_element(inline);
        }
        Ok(out)
    }

    fn attribute_items(&mut self, items: &[AttributeItem], out: &mut XmlElement) -> Result<()> {
        for item in items {
            let child = match item {
                AttributeItem::Attribute(id) => self.attribute(*id, false)?,
                AttributeItem::GroupRef(group_ref) => {
                    let mut child = self.xs("attributeGroup");
                    self.set_qname(&mut child, "ref", Some(&group_ref.ref_name));
                    set_opt(&mut child, "id", group_ref.id.as_deref());
                    self.annotation_child(&mut child, group_ref.annotation.as_ref());
                    self.extensions(&group_ref.extensions, &mut child);
                    child
                }
            };
            out.push_element(child);
        }
        Ok(())
    }

    fn group(&mut self, id: GroupId) -> Result<XmlElement> {
        let collection = self.collection;
        let group = collection
            .group(id)
            .ok_or_else(|| self.dangling(ComponentKind::Group))?;
        let name = group.name.as_ref().ok_or_else(|| self.unnamed(ComponentKind::Group))?;

        let mut out = self.xs("group");
        out.set_attribute("name", name.local_name());
        set_opt(&mut out, "id", group.id.as_deref());
        self.annotation_child(&mut out, group.annotation.as_ref());
        self.extensions(&group.extensions, &mut out);
        if let Some(particle) = &group.particle {
            let child = self.particle(particle)?;
            out.push_element(child);
        }
        Ok(out)
    }

    fn attribute_group(&mut self, id: AttributeGroupId) -> Result<XmlElement> {
        let collection = self.collection;
        let group = collection
            .attribute_group(id)
            .ok_or_else(|| self.dangling(ComponentKind::AttributeGroup))?;
        let name = group
            .name
            .as_ref()
            .ok_or_else(|| self.unnamed(ComponentKind::AttributeGroup))?;

        let mut out = self.xs("attributeGroup");
        out.set_attribute("name", name.local_name());
        set_opt(&mut out, "id", group.id.as_deref());
        self.annotation_child(&mut out, group.annotation.as_ref());
        self.extensions(&group.extensions, &mut out);
        self.attribute_items(&group.attributes, &mut out)?;
        if let Some(wildcard) = &group.any_attribute {
            let child = self.wildcard("anyAttribute", wildcard);
            out.push_element(child);
        }
        Ok(out)
    }

    fn notation(&mut self, id: NotationId) -> Result<XmlElement> {
        let collection = self.collection;
        let notation = collection
            .notation(id)
            .ok_or_else(|| self.dangling(ComponentKind::Notation))?;
        let name = notation
            .name
            .as_ref()
            .ok_or_else(|| self.unnamed(ComponentKind::Notation))?;

        let mut out = self.xs("notation");
        out.set_attribute("name", name.local_name());
        set_opt(&mut out, "public", notation.public_id.as_deref());
        set_opt(&mut out, "system", notation.system_id.as_deref());
        set_opt(&mut out, "id", notation.id.as_deref());
        self.annotation_child(&mut out, notation.annotation.as_ref());
        self.extensions(&notation.extensions, &mut out);
        Ok(out)
    }
}

fn set_opt(out: &mut XmlElement, attribute: &str, value: Option<&str>) {
    if let Some(value) = value {
        out.set_attribute(attribute, value);
    }
}

fn set_derivations(out: &mut XmlElement, attribute: &str, set: DerivationSet) {
    if !set.is_empty() {
        out.set_attribute(attribute, set.to_string());
    }
}
