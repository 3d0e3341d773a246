//! The schema document unit: top-level items, name maps and component arenas.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::{Result, SchemaError};
use crate::model::{
    Annotation, Attribute, AttributeGroup, AttributeGroupId, AttributeId, ComponentKind,
    DerivationSet, Element, ElementId, Extensions, Form, Group, GroupId, Notation, NotationId,
    SchemaId, SchemaKey, TypeDefinition, TypeId,
};
use crate::qname::{NamespaceContext, QName};
use crate::resolver::SchemaSource;

/// Lifecycle of a schema while the builder walks it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildState {
    /// Registered, children not yet visited
    #[default]
    New,
    /// Top-level children are being processed
    TopLevelPass,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalKind {
    Include,
    Import,
    Redefine,
}

impl ExternalKind {
    pub fn local_name(&self) -> &'static str {
        match self {
            ExternalKind::Include => "include",
            ExternalKind::Import => "import",
            ExternalKind::Redefine => "redefine",
        }
    }
}

/// `include`, `import` or `redefine`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalRef {
    pub kind: ExternalKind,
    pub schema_location: Option<String>,
    /// `namespace` attribute of an import
    pub namespace: Option<String>,
    /// Absent when the referenced document could not be located
    pub target: Option<SchemaId>,
    pub id: Option<String>,
    pub annotation: Option<Annotation>,
    /// Replacement definitions of a redefine. They live in the redefining
    /// schema's arenas but are not registered in its name maps and are not
    /// merged with the definitions they replace.
    pub redefined: Vec<SchemaItem>,
    pub extensions: Extensions,
}

impl ExternalRef {
    pub fn new(kind: ExternalKind, schema_location: Option<String>) -> Self {
        Self {
            kind,
            schema_location,
            namespace: None,
            target: None,
            id: None,
            annotation: None,
            redefined: Vec::new(),
            extensions: Extensions::default(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.target.is_some()
    }
}

/// Top-level entry of a schema, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaItem {
    Annotation(Annotation),
    External(ExternalRef),
    Type(TypeId),
    Element(ElementId),
    Attribute(AttributeId),
    Group(GroupId),
    AttributeGroup(AttributeGroupId),
    Notation(NotationId),
}

/// One schema document.
///
/// Components are stored in per-kind arenas addressed by ids; nested and
/// anonymous components live in the same arenas as top-level ones but only
/// named top-level components appear in the name maps.
#[derive(Debug)]
pub struct Schema {
    id: SchemaId,
    key: SchemaKey,
    target_namespace: Option<String>,
    /// Key of the including/importing schema, for namespace inheritance
    pub parent: Option<SchemaKey>,
    /// Bindings declared on the root element
    pub namespaces: NamespaceContext,
    pub element_form_default: Option<Form>,
    pub attribute_form_default: Option<Form>,
    pub block_default: Option<DerivationSet>,
    pub final_default: Option<DerivationSet>,
    pub version: Option<String>,
    pub schema_id: Option<String>,
    pub extensions: Extensions,
    state: BuildState,
    source: Option<Arc<SchemaSource>>,
    builtin: bool,

    items: Vec<SchemaItem>,

    types: Vec<TypeDefinition>,
    elements: Vec<Element>,
    attributes: Vec<Attribute>,
    groups: Vec<Group>,
    attribute_groups: Vec<AttributeGroup>,
    notations: Vec<Notation>,

    type_names: IndexMap<QName, TypeId>,
    element_names: IndexMap<QName, ElementId>,
    attribute_names: IndexMap<QName, AttributeId>,
    group_names: IndexMap<QName, GroupId>,
    attribute_group_names: IndexMap<QName, AttributeGroupId>,
    notation_names: IndexMap<QName, NotationId>,
}

fn register<I: Copy>(
    map: &mut IndexMap<QName, I>,
    kind: ComponentKind,
    name: Option<&QName>,
    id: I,
    key: &SchemaKey,
) -> Result<()> {
    let name = name.ok_or_else(|| SchemaError::UnnamedComponent {
        kind,
        key: key.clone(),
    })?;
    if map.contains_key(name) {
        return Err(SchemaError::DuplicateComponent {
            kind,
            name: name.clone(),
            key: key.clone(),
        });
    }
    map.insert(name.clone(), id);
    Ok(())
}

impl Schema {
    /// `key.namespace` is the logical target namespace; `target_namespace` is
    /// what the document itself declares.
    pub(crate) fn new(id: SchemaId, key: SchemaKey, target_namespace: Option<String>) -> Self {
        Self {
            id,
            key,
            target_namespace,
            parent: None,
            namespaces: NamespaceContext::new(),
            element_form_default: None,
            attribute_form_default: None,
            block_default: None,
            final_default: None,
            version: None,
            schema_id: None,
            extensions: Extensions::default(),
            state: BuildState::New,
            source: None,
            builtin: false,
            items: Vec::new(),
            types: Vec::new(),
            elements: Vec::new(),
            attributes: Vec::new(),
            groups: Vec::new(),
            attribute_groups: Vec::new(),
            notations: Vec::new(),
            type_names: IndexMap::new(),
            element_names: IndexMap::new(),
            attribute_names: IndexMap::new(),
            group_names: IndexMap::new(),
            attribute_group_names: IndexMap::new(),
            notation_names: IndexMap::new(),
        }
    }

    pub fn id(&self) -> SchemaId {
        self.id
    }

    pub fn key(&self) -> &SchemaKey {
        &self.key
    }

    pub fn locator(&self) -> &str {
        &self.key.locator
    }

    /// Effective namespace, inherited from the including schema when the
    /// document declares none.
    pub fn logical_namespace(&self) -> &str {
        &self.key.namespace
    }

    /// `targetNamespace` exactly as declared
    pub fn target_namespace(&self) -> Option<&str> {
        self.target_namespace.as_deref()
    }

    pub fn element_form(&self) -> Form {
        self.element_form_default.unwrap_or_default()
    }

    pub fn attribute_form(&self) -> Form {
        self.attribute_form_default.unwrap_or_default()
    }

    pub fn state(&self) -> BuildState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: BuildState) {
        self.state = state;
    }

    pub fn source(&self) -> Option<&Arc<SchemaSource>> {
        self.source.as_ref()
    }

    pub(crate) fn set_source(&mut self, source: Arc<SchemaSource>) {
        self.source = Some(source);
    }

    /// Member of the built-in datatype catalogue
    pub fn is_builtin(&self) -> bool {
        self.builtin
    }

    pub(crate) fn mark_builtin(&mut self) {
        self.builtin = true;
    }

    pub fn items(&self) -> &[SchemaItem] {
        &self.items
    }

    pub(crate) fn push_item(&mut self, item: SchemaItem) {
        self.items.push(item);
    }

    pub fn externals(&self) -> impl Iterator<Item = &ExternalRef> {
        self.items.iter().filter_map(|item| match item {
            SchemaItem::External(external) => Some(external),
            _ => None,
        })
    }

    // Arena allocation. Nothing here touches the name maps.

    pub(crate) fn alloc_type(&mut self, definition: TypeDefinition) -> TypeId {
        self.types.push(definition);
        TypeId::new(self.id, self.types.len() - 1)
    }

    pub(crate) fn alloc_element(&mut self, element: Element) -> ElementId {
        self.elements.push(element);
        ElementId::new(self.id, self.elements.len() - 1)
    }

    pub(crate) fn alloc_attribute(&mut self, attribute: Attribute) -> AttributeId {
        self.attributes.push(attribute);
        AttributeId::new(self.id, self.attributes.len() - 1)
    }

    pub(crate) fn alloc_group(&mut self, group: Group) -> GroupId {
        self.groups.push(group);
        GroupId::new(self.id, self.groups.len() - 1)
    }

    pub(crate) fn alloc_attribute_group(&mut self, group: AttributeGroup) -> AttributeGroupId {
        self.attribute_groups.push(group);
        AttributeGroupId::new(self.id, self.attribute_groups.len() - 1)
    }

    pub(crate) fn alloc_notation(&mut self, notation: Notation) -> NotationId {
        self.notations.push(notation);
        NotationId::new(self.id, self.notations.len() - 1)
    }

    // Registration of named top-level components.

    pub(crate) fn register_type(&mut self, id: TypeId) -> Result<()> {
        let name = self.types[id.index].name.clone();
        register(&mut self.type_names, ComponentKind::Type, name.as_ref(), id, &self.key)
    }

    pub(crate) fn register_element(&mut self, id: ElementId) -> Result<()> {
        let name = self.elements[id.index].name.clone();
        register(
            &mut self.element_names,
            ComponentKind::Element,
            name.as_ref(),
            id,
            &self.key,
        )
    }

    pub(crate) fn register_attribute(&mut self, id: AttributeId) -> Result<()> {
        let name = self.attributes[id.index].name.clone();
        register(
            &mut self.attribute_names,
            ComponentKind::Attribute,
            name.as_ref(),
            id,
            &self.key,
        )
    }

    pub(crate) fn register_group(&mut self, id: GroupId) -> Result<()> {
        let name = self.groups[id.index].name.clone();
        register(&mut self.group_names, ComponentKind::Group, name.as_ref(), id, &self.key)
    }

    pub(crate) fn register_attribute_group(&mut self, id: AttributeGroupId) -> Result<()> {
        let name = self.attribute_groups[id.index].name.clone();
        register(
            &mut self.attribute_group_names,
            ComponentKind::AttributeGroup,
            name.as_ref(),
            id,
            &self.key,
        )
    }

    pub(crate) fn register_notation(&mut self, id: NotationId) -> Result<()> {
        let name = self.notations[id.index].name.clone();
        register(
            &mut self.notation_names,
            ComponentKind::Notation,
            name.as_ref(),
            id,
            &self.key,
        )
    }

    // Arena access. Ids are only valid for the schema that issued them.

    pub fn type_definition(&self, id: TypeId) -> Option<&TypeDefinition> {
        self.owns(id.schema).then(|| self.types.get(id.index)).flatten()
    }

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.owns(id.schema).then(|| self.elements.get(id.index)).flatten()
    }

    pub fn attribute(&self, id: AttributeId) -> Option<&Attribute> {
        self.owns(id.schema).then(|| self.attributes.get(id.index)).flatten()
    }

    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.owns(id.schema).then(|| self.groups.get(id.index)).flatten()
    }

    pub fn attribute_group(&self, id: AttributeGroupId) -> Option<&AttributeGroup> {
        self.owns(id.schema).then(|| self.attribute_groups.get(id.index)).flatten()
    }

    pub fn notation(&self, id: NotationId) -> Option<&Notation> {
        self.owns(id.schema).then(|| self.notations.get(id.index)).flatten()
    }

    pub(crate) fn element_mut(&mut self, id: ElementId) -> &mut Element {
        &mut self.elements[id.index]
    }

    pub(crate) fn attribute_mut(&mut self, id: AttributeId) -> &mut Attribute {
        &mut self.attributes[id.index]
    }

    fn owns(&self, schema: SchemaId) -> bool {
        schema == self.id
    }

    // Shallow lookup by qualified name.

    pub fn lookup_type(&self, name: &QName) -> Option<TypeId> {
        self.type_names.get(name).copied()
    }

    pub fn lookup_element(&self, name: &QName) -> Option<ElementId> {
        self.element_names.get(name).copied()
    }

    pub fn lookup_attribute(&self, name: &QName) -> Option<AttributeId> {
        self.attribute_names.get(name).copied()
    }

    pub fn lookup_group(&self, name: &QName) -> Option<GroupId> {
        self.group_names.get(name).copied()
    }

    pub fn lookup_attribute_group(&self, name: &QName) -> Option<AttributeGroupId> {
        self.attribute_group_names.get(name).copied()
    }

    pub fn lookup_notation(&self, name: &QName) -> Option<NotationId> {
        self.notation_names.get(name).copied()
    }

    pub fn type_names(&self) -> impl Iterator<Item = (&QName, TypeId)> {
        self.type_names.iter().map(|(name, id)| (name, *id))
    }

    pub fn element_names(&self) -> impl Iterator<Item = (&QName, ElementId)> {
        self.element_names.iter().map(|(name, id)| (name, *id))
    }

    pub fn attribute_names(&self) -> impl Iterator<Item = (&QName, AttributeId)> {
        self.attribute_names.iter().map(|(name, id)| (name, *id))
    }

    pub fn group_names(&self) -> impl Iterator<Item = (&QName, GroupId)> {
        self.group_names.iter().map(|(name, id)| (name, *id))
    }

    pub fn attribute_group_names(&self) -> impl Iterator<Item = (&QName, AttributeGroupId)> {
        self.attribute_group_names.iter().map(|(name, id)| (name, *id))
    }

    pub fn notation_names(&self) -> impl Iterator<Item = (&QName, NotationId)> {
        self.notation_names.iter().map(|(name, id)| (name, *id))
    }

    /// Every registered top-level (kind, name) pair.
    pub fn components(&self) -> Vec<(ComponentKind, QName)> {
        let mut found = Vec::with_capacity(self.component_count());
        found.extend(self.type_names.keys().map(|n| (ComponentKind::Type, n.clone())));
        found.extend(self.element_names.keys().map(|n| (ComponentKind::Element, n.clone())));
        found.extend(
            self.attribute_names
                .keys()
                .map(|n| (ComponentKind::Attribute, n.clone())),
        );
        found.extend(self.group_names.keys().map(|n| (ComponentKind::Group, n.clone())));
        found.extend(
            self.attribute_group_names
                .keys()
                .map(|n| (ComponentKind::AttributeGroup, n.clone())),
        );
        found.extend(
            self.notation_names
                .keys()
                .map(|n| (ComponentKind::Notation, n.clone())),
        );
        found
    }

    pub fn component_count(&self) -> usize {
        self.type_names.len()
            + self.element_names.len()
            + self.attribute_names.len()
            + self.group_names.len()
            + self.attribute_group_names.len()
            + self.notation_names.len()
    }

    /// Qualified name for a top-level component declared in this schema.
    pub fn qualify(&self, local_name: &str) -> QName {
        QName::new(self.logical_namespace(), local_name)
    }
}
