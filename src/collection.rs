//! Registry of schemas with cross-schema lookup.
//!
//! A [`Collection`] owns every schema reached while building one entry
//! document, the forward-type registry that back-fills pending `type=`
//! references, and the built-in datatype catalogue. It is meant to be owned by
//! one thread at a time.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::builder::Builder;
use crate::cache::ResolutionCache;
use crate::constants::{ANY_TYPE, BUILTIN_LOCATOR, BUILTIN_SIMPLE_TYPES, XS_NS};
use crate::document::XmlElement;
use crate::error::{Result, SchemaError};
use crate::extension::{ExtensionRegistry, VerbatimExtensions};
use crate::model::{
    Annotation, Attribute, AttributeGroup, AttributeGroupId, AttributeGroupRef, AttributeId,
    BuildState, ComplexType, ContentModel, Element, ElementId, ExternalKind, ExternalRef, Group,
    GroupId, GroupRef, Notation, NotationId, Schema, SchemaId, SchemaItem, SchemaKey, SimpleType,
    TypeBody, TypeDefinition, TypeId, TypeSlot,
};
use crate::qname::QName;
use crate::resolver::{DefaultResolver, SchemaSource, UriResolver};
use crate::serializer::{SerializedSchema, Serializer};

/// A declaration waiting for a named type to be registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeReceiver {
    Element(ElementId),
    Attribute(AttributeId),
}

pub struct Collection {
    schemas: Vec<Schema>,
    index: HashMap<SchemaKey, SchemaId>,
    known_namespaces: HashMap<String, SchemaId>,
    unresolved: IndexMap<QName, Vec<TypeReceiver>>,
    builtin: SchemaId,
    resolver: Arc<dyn UriResolver>,
    extensions: Arc<dyn ExtensionRegistry>,
    cache: Option<ResolutionCache>,
}

impl Collection {
    /// A collection with the built-in catalogue, the default resolver, verbatim
    /// extension handling and no resolution cache.
    pub fn new() -> Self {
        let mut collection = Self {
            schemas: Vec::new(),
            index: HashMap::new(),
            known_namespaces: HashMap::new(),
            unresolved: IndexMap::new(),
            builtin: SchemaId(0),
            resolver: Arc::new(DefaultResolver::default()),
            extensions: Arc::new(VerbatimExtensions),
            cache: None,
        };
        collection.builtin = collection.register_builtins();
        collection
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn UriResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_extensions(mut self, extensions: Arc<dyn ExtensionRegistry>) -> Self {
        self.extensions = extensions;
        self
    }

    pub fn with_cache(mut self, cache: ResolutionCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Replace the resolution cache, returning the previous one.
    pub fn set_cache(&mut self, cache: Option<ResolutionCache>) -> Option<ResolutionCache> {
        std::mem::replace(&mut self.cache, cache)
    }

    pub fn cache(&self) -> Option<&ResolutionCache> {
        self.cache.as_ref()
    }

    pub fn resolver(&self) -> &Arc<dyn UriResolver> {
        &self.resolver
    }

    pub fn extensions(&self) -> &Arc<dyn ExtensionRegistry> {
        &self.extensions
    }

    fn register_builtins(&mut self) -> SchemaId {
        let id = SchemaId(self.schemas.len());
        let key = SchemaKey::new(XS_NS, BUILTIN_LOCATOR);
        let mut schema = Schema::new(id, key.clone(), Some(XS_NS.to_string()));
        schema.mark_builtin();

        let any_type = TypeDefinition::complex(
            Some(QName::new(XS_NS, ANY_TYPE)),
            ComplexType {
                mixed: Some(true),
                builtin: true,
                ..Default::default()
            },
        );
        let type_id = schema.alloc_type(any_type);
        // Names in the catalogue are unique, registration cannot fail
        let _ = schema.register_type(type_id);

        for (name, base) in BUILTIN_SIMPLE_TYPES {
            let definition = TypeDefinition::simple(
                Some(QName::new(XS_NS, *name)),
                SimpleType::Builtin {
                    base: Some(QName::new(XS_NS, *base)),
                },
            );
            let type_id = schema.alloc_type(definition);
            let _ = schema.register_type(type_id);
        }
        schema.set_state(BuildState::Complete);

        self.schemas.push(schema);
        self.index.insert(key, id);
        id
    }

    // Identity operations

    /// Register an empty schema under `key`. `target_namespace` is the
    /// namespace the document declares, `key.namespace` the logical one.
    pub fn add_schema(
        &mut self,
        key: SchemaKey,
        target_namespace: Option<&str>,
    ) -> Result<SchemaId> {
        if self.index.contains_key(&key) {
            return Err(SchemaError::DuplicateSchema { key });
        }
        let id = SchemaId(self.schemas.len());
        debug!(%key, "registering schema");
        self.schemas
            .push(Schema::new(id, key.clone(), target_namespace.map(str::to_string)));
        self.index.insert(key, id);
        Ok(id)
    }

    pub fn get_schema(&self, key: &SchemaKey) -> Option<&Schema> {
        self.index.get(key).map(|id| &self.schemas[id.0])
    }

    pub fn contains_schema(&self, key: &SchemaKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn schema_id(&self, key: &SchemaKey) -> Option<SchemaId> {
        self.index.get(key).copied()
    }

    /// # Panics
    ///
    /// If `id` was issued by another collection.
    pub fn schema(&self, id: SchemaId) -> &Schema {
        &self.schemas[id.0]
    }

    pub fn schema_mut(&mut self, id: SchemaId) -> &mut Schema {
        &mut self.schemas[id.0]
    }

    /// Schemas in registration order, without the built-in catalogue.
    pub fn schemas(&self) -> impl Iterator<Item = &Schema> {
        self.schemas.iter().filter(|schema| !schema.is_builtin())
    }

    /// Number of registered schemas, without the built-in catalogue.
    pub fn len(&self) -> usize {
        self.schemas.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn builtin_schema(&self) -> &Schema {
        &self.schemas[self.builtin.0]
    }

    /// Make `schema` stand in for imports of `namespace` that have no location
    /// or whose location cannot be resolved.
    pub fn map_namespace(&mut self, namespace: impl Into<String>, schema: SchemaId) {
        self.known_namespaces.insert(namespace.into(), schema);
    }

    pub fn known_namespace(&self, namespace: &str) -> Option<SchemaId> {
        self.known_namespaces.get(namespace).copied()
    }

    // Building

    /// Build `document` as the schema at `locator`.
    pub fn build(&mut self, document: XmlElement, locator: &str) -> Result<SchemaId> {
        self.build_source(SchemaSource::new(locator, document))
    }

    pub fn build_source(&mut self, source: SchemaSource) -> Result<SchemaId> {
        Builder::new(self).build(Arc::new(source))
    }

    /// Parse and build the document text found at `locator`.
    pub fn build_str(&mut self, text: &str, locator: &str) -> Result<SchemaId> {
        self.build_source(SchemaSource::parse(locator, text)?)
    }

    /// Resolve `location` through the resolver and cache and build it.
    /// `Ok(None)` when the resolver cannot find the document.
    pub fn read_location(
        &mut self,
        location: &str,
        base_uri: Option<&str>,
    ) -> Result<Option<SchemaId>> {
        Builder::new(self).read_location(location, base_uri)
    }

    // Serialization

    pub fn serialize_schema(&self, id: SchemaId, recursive: bool) -> Result<Vec<SerializedSchema>> {
        Serializer::new(self).serialize_schema(id, recursive)
    }

    // Programmatic construction. The `add_*` methods append a named
    // top-level component; the `alloc_*` methods create nested or anonymous
    // ones owned by whatever refers to their id.

    pub fn add_type(&mut self, schema: SchemaId, definition: TypeDefinition) -> Result<TypeId> {
        let id = self.schema_mut(schema).alloc_type(definition);
        self.register_type(id)?;
        self.schema_mut(schema).push_item(SchemaItem::Type(id));
        Ok(id)
    }

    pub fn add_element(&mut self, schema: SchemaId, mut element: Element) -> Result<ElementId> {
        element.top_level = true;
        let id = self.alloc_element(schema, element);
        self.schema_mut(schema).register_element(id)?;
        self.schema_mut(schema).push_item(SchemaItem::Element(id));
        Ok(id)
    }

    pub fn add_attribute(
        &mut self,
        schema: SchemaId,
        mut attribute: Attribute,
    ) -> Result<AttributeId> {
        attribute.top_level = true;
        let id = self.alloc_attribute(schema, attribute);
        self.schema_mut(schema).register_attribute(id)?;
        self.schema_mut(schema).push_item(SchemaItem::Attribute(id));
        Ok(id)
    }

    pub fn add_group(&mut self, schema: SchemaId, group: Group) -> Result<GroupId> {
        let id = self.schema_mut(schema).alloc_group(group);
        self.schema_mut(schema).register_group(id)?;
        self.schema_mut(schema).push_item(SchemaItem::Group(id));
        Ok(id)
    }

    pub fn add_attribute_group(
        &mut self,
        schema: SchemaId,
        group: AttributeGroup,
    ) -> Result<AttributeGroupId> {
        let id = self.schema_mut(schema).alloc_attribute_group(group);
        self.schema_mut(schema).register_attribute_group(id)?;
        self.schema_mut(schema).push_item(SchemaItem::AttributeGroup(id));
        Ok(id)
    }

    pub fn add_notation(&mut self, schema: SchemaId, notation: Notation) -> Result<NotationId> {
        let id = self.schema_mut(schema).alloc_notation(notation);
        self.schema_mut(schema).register_notation(id)?;
        self.schema_mut(schema).push_item(SchemaItem::Notation(id));
        Ok(id)
    }

    pub fn add_annotation(&mut self, schema: SchemaId, annotation: Annotation) {
        self.schema_mut(schema)
            .push_item(SchemaItem::Annotation(annotation));
    }

    pub fn add_external(&mut self, schema: SchemaId, external: ExternalRef) {
        self.schema_mut(schema).push_item(SchemaItem::External(external));
    }

    pub fn alloc_type(&mut self, schema: SchemaId, definition: TypeDefinition) -> TypeId {
        self.schema_mut(schema).alloc_type(definition)
    }

    /// Allocate an element; a pending `type=` reference is resolved now or
    /// parked until a type with that name is registered.
    pub fn alloc_element(&mut self, schema: SchemaId, element: Element) -> ElementId {
        let pending = pending_name(&element.type_slot);
        let id = self.schema_mut(schema).alloc_element(element);
        if let Some(name) = pending {
            self.attach_type(name, TypeReceiver::Element(id));
        }
        id
    }

    pub fn alloc_attribute(&mut self, schema: SchemaId, attribute: Attribute) -> AttributeId {
        let pending = pending_name(&attribute.type_slot);
        let id = self.schema_mut(schema).alloc_attribute(attribute);
        if let Some(name) = pending {
            self.attach_type(name, TypeReceiver::Attribute(id));
        }
        id
    }

    pub fn alloc_group(&mut self, schema: SchemaId, group: Group) -> GroupId {
        self.schema_mut(schema).alloc_group(group)
    }

    pub fn alloc_attribute_group(
        &mut self,
        schema: SchemaId,
        group: AttributeGroup,
    ) -> AttributeGroupId {
        self.schema_mut(schema).alloc_attribute_group(group)
    }

    // Forward-type registry

    /// Register a named type and back-fill every declaration waiting for it.
    pub(crate) fn register_type(&mut self, id: TypeId) -> Result<()> {
        let schema = self.schema_mut(id.schema());
        schema.register_type(id)?;
        let Some(name) = schema
            .type_definition(id)
            .and_then(|definition| definition.name.clone())
        else {
            return Ok(());
        };

        if let Some(receivers) = self.unresolved.shift_remove(&name) {
            debug!(%name, count = receivers.len(), "back-filling forward type references");
            for receiver in receivers {
                self.fill(receiver, id);
            }
        }
        Ok(())
    }

    fn attach_type(&mut self, name: QName, receiver: TypeReceiver) {
        match self.find_type(&name) {
            Some(type_id) => self.fill(receiver, type_id),
            None => {
                trace!(%name, ?receiver, "parking forward type reference");
                self.unresolved.entry(name).or_default().push(receiver);
            }
        }
    }

    fn fill(&mut self, receiver: TypeReceiver, type_id: TypeId) {
        let slot = match receiver {
            TypeReceiver::Element(id) => {
                &mut self.schema_mut(id.schema()).element_mut(id).type_slot
            }
            TypeReceiver::Attribute(id) => {
                &mut self.schema_mut(id.schema()).attribute_mut(id).type_slot
            }
        };
        if let TypeSlot::Named { resolved, .. } = slot {
            *resolved = Some(type_id);
        }
    }

    /// Type names referenced by some declaration but never registered.
    pub fn unresolved_type_names(&self) -> Vec<&QName> {
        self.unresolved
            .iter()
            .filter(|(_, receivers)| !receivers.is_empty())
            .map(|(name, _)| name)
            .collect()
    }

    pub fn pending_receivers(&self, name: &QName) -> &[TypeReceiver] {
        self.unresolved.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    // Deep lookup

    pub fn find_type(&self, name: &QName) -> Option<TypeId> {
        self.deep_lookup(name, Schema::lookup_type)
    }

    pub fn find_element(&self, name: &QName) -> Option<ElementId> {
        self.deep_lookup(name, Schema::lookup_element)
    }

    pub fn find_attribute(&self, name: &QName) -> Option<AttributeId> {
        self.deep_lookup(name, Schema::lookup_attribute)
    }

    pub fn find_group(&self, name: &QName) -> Option<GroupId> {
        self.deep_lookup(name, Schema::lookup_group)
    }

    pub fn find_attribute_group(&self, name: &QName) -> Option<AttributeGroupId> {
        self.deep_lookup(name, Schema::lookup_attribute_group)
    }

    pub fn find_notation(&self, name: &QName) -> Option<NotationId> {
        self.deep_lookup(name, Schema::lookup_notation)
    }

    /// Scans schemas whose logical namespace matches, following their
    /// include/import targets. `path` holds the schemas on the current search
    /// path so circular references terminate.
    fn deep_lookup<T, F>(&self, name: &QName, shallow: F) -> Option<T>
    where
        F: Fn(&Schema, &QName) -> Option<T>,
    {
        let mut path = Vec::new();
        self.schemas
            .iter()
            .filter(|schema| schema.logical_namespace() == name.namespace())
            .find_map(|schema| self.search(schema.id(), name, &shallow, &mut path))
    }

    fn search<T, F>(
        &self,
        id: SchemaId,
        name: &QName,
        shallow: &F,
        path: &mut Vec<SchemaId>,
    ) -> Option<T>
    where
        F: Fn(&Schema, &QName) -> Option<T>,
    {
        if path.contains(&id) {
            return None;
        }
        let schema = &self.schemas[id.0];
        if let Some(found) = shallow(schema, name) {
            return Some(found);
        }

        path.push(id);
        let found = schema
            .externals()
            .filter_map(|external| self.external_target(external))
            .find_map(|target| self.search(target, name, shallow, path));
        path.pop();
        found
    }

    /// Resolved target, or the known-namespace override for an import
    /// that carries no location.
    pub fn external_target(&self, external: &ExternalRef) -> Option<SchemaId> {
        external.target.or_else(|| match external.kind {
            ExternalKind::Import if external.schema_location.is_none() => external
                .namespace
                .as_deref()
                .and_then(|namespace| self.known_namespace(namespace)),
            _ => None,
        })
    }

    // Component access

    pub fn type_definition(&self, id: TypeId) -> Option<&TypeDefinition> {
        self.schemas.get(id.schema().0)?.type_definition(id)
    }

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.schemas.get(id.schema().0)?.element(id)
    }

    pub fn attribute(&self, id: AttributeId) -> Option<&Attribute> {
        self.schemas.get(id.schema().0)?.attribute(id)
    }

    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.schemas.get(id.schema().0)?.group(id)
    }

    pub fn attribute_group(&self, id: AttributeGroupId) -> Option<&AttributeGroup> {
        self.schemas.get(id.schema().0)?.attribute_group(id)
    }

    pub fn notation(&self, id: NotationId) -> Option<&Notation> {
        self.schemas.get(id.schema().0)?.notation(id)
    }

    // Lazy reference resolution

    /// The global declaration an element reference points to, or the element itself.
    pub fn resolve_element(&self, id: ElementId) -> Option<ElementId> {
        match &self.element(id)?.reference {
            Some(target) => self.find_element(target),
            None => Some(id),
        }
    }

    pub fn resolve_attribute(&self, id: AttributeId) -> Option<AttributeId> {
        match &self.attribute(id)?.reference {
            Some(target) => self.find_attribute(target),
            None => Some(id),
        }
    }

    pub fn resolve_group_ref(&self, group_ref: &GroupRef) -> Option<GroupId> {
        self.find_group(&group_ref.ref_name)
    }

    pub fn resolve_attribute_group_ref(
        &self,
        group_ref: &AttributeGroupRef,
    ) -> Option<AttributeGroupId> {
        self.find_attribute_group(&group_ref.ref_name)
    }

    /// Type of an element after following a reference. `None` when the
    /// declaration has no type or names one that was never declared.
    pub fn element_type(&self, id: ElementId) -> Option<TypeId> {
        let element = self.element(self.resolve_element(id)?)?;
        self.slot_type(&element.type_slot)
    }

    pub fn attribute_type(&self, id: AttributeId) -> Option<TypeId> {
        let attribute = self.attribute(self.resolve_attribute(id)?)?;
        self.slot_type(&attribute.type_slot)
    }

    fn slot_type(&self, slot: &TypeSlot) -> Option<TypeId> {
        match slot {
            TypeSlot::Named {
                resolved: Some(id), ..
            } => Some(*id),
            TypeSlot::Named { name, resolved: None } => self.find_type(name),
            TypeSlot::Anonymous(id) => Some(*id),
            TypeSlot::None => None,
        }
    }

    /// Base type of a derived type, following the `base` name.
    pub fn base_type(&self, id: TypeId) -> Option<TypeId> {
        let definition = self.type_definition(id)?;
        let base = match &definition.body {
            TypeBody::Simple(SimpleType::Builtin { base }) => base.as_ref(),
            TypeBody::Simple(SimpleType::Restriction(restriction)) => {
                if let Some(inline) = restriction.base_type {
                    return Some(inline);
                }
                restriction.base.as_ref()
            }
            TypeBody::Simple(_) => None,
            TypeBody::Complex(complex) => match &complex.content {
                ContentModel::Direct(_) => None,
                _ => complex.base_type_name(),
            },
        }?;
        self.find_type(base)
    }
}

impl Default for Collection {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("schemas", &self.index.keys().collect::<Vec<_>>())
            .field("unresolved", &self.unresolved.len())
            .field("cache", &self.cache)
            .finish()
    }
}

fn pending_name(slot: &TypeSlot) -> Option<QName> {
    match slot {
        TypeSlot::Named { name, resolved: None } => Some(name.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TypeSlot;

    fn named_slot(name: &QName) -> TypeSlot {
        TypeSlot::Named {
            name: name.clone(),
            resolved: None,
        }
    }

    #[test]
    fn test_builtins_registered() {
        let collection = Collection::new();
        let string = collection.find_type(&QName::new(XS_NS, "string")).unwrap();
        let any_simple = collection.find_type(&QName::new(XS_NS, "anySimpleType")).unwrap();
        assert_eq!(collection.base_type(string), Some(any_simple));
        assert!(collection.find_type(&QName::new(XS_NS, "anyType")).is_some());
        assert!(collection.is_empty());
        assert_eq!(collection.schemas().count(), 0);
    }

    #[test]
    fn test_duplicate_schema_rejected() {
        let mut collection = Collection::new();
        let key = SchemaKey::new("urn:a", "a.xsd");
        collection.add_schema(key.clone(), Some("urn:a")).unwrap();
        assert!(matches!(
            collection.add_schema(key, Some("urn:a")),
            Err(SchemaError::DuplicateSchema { .. })
        ));
    }

    #[test]
    fn test_forward_type_back_filled() {
        let mut collection = Collection::new();
        let schema = collection
            .add_schema(SchemaKey::new("urn:a", "a.xsd"), Some("urn:a"))
            .unwrap();
        let type_name = QName::new("urn:a", "Later");

        let mut element = Element::named(QName::new("urn:a", "item"));
        element.type_slot = named_slot(&type_name);
        let element_id = collection.add_element(schema, element).unwrap();
        assert_eq!(collection.unresolved_type_names(), vec![&type_name]);

        let type_id = collection
            .add_type(
                schema,
                TypeDefinition::simple(Some(type_name.clone()), SimpleType::Unspecified),
            )
            .unwrap();

        assert!(collection.unresolved_type_names().is_empty());
        assert_eq!(
            collection.element(element_id).unwrap().type_slot.type_id(),
            Some(type_id)
        );
    }

    #[test]
    fn test_never_declared_type_stays_pending() {
        let mut collection = Collection::new();
        let schema = collection
            .add_schema(SchemaKey::new("", "a.xsd"), None)
            .unwrap();
        let missing = QName::local("Missing");
        let mut attribute = Attribute::named(QName::local("code"));
        attribute.type_slot = named_slot(&missing);
        let id = collection.add_attribute(schema, attribute).unwrap();

        assert!(collection.attribute_type(id).is_none());
        assert_eq!(collection.pending_receivers(&missing), &[TypeReceiver::Attribute(id)]);
    }

    #[test]
    fn test_deep_lookup_follows_import_and_known_namespace() {
        let mut collection = Collection::new();
        let main = collection
            .add_schema(SchemaKey::new("urn:main", "main.xsd"), Some("urn:main"))
            .unwrap();
        let other = collection
            .add_schema(SchemaKey::new("urn:other", "other.xsd"), Some("urn:other"))
            .unwrap();
        let name = QName::new("urn:other", "Thing");
        collection
            .add_element(other, Element::named(name.clone()))
            .unwrap();

        let mut import = ExternalRef::new(ExternalKind::Import, None);
        import.namespace = Some("urn:other".to_string());
        collection.add_external(main, import);
        collection.map_namespace("urn:other", other);

        let import = collection.schema(main).externals().next().unwrap();
        assert_eq!(collection.external_target(import), Some(other));
        assert!(collection.find_element(&name).is_some());
    }

    #[test]
    fn test_deep_lookup_terminates_on_cycles() {
        let mut collection = Collection::new();
        let a = collection
            .add_schema(SchemaKey::new("urn:x", "a.xsd"), Some("urn:x"))
            .unwrap();
        let b = collection
            .add_schema(SchemaKey::new("urn:x", "b.xsd"), Some("urn:x"))
            .unwrap();
        let mut a_to_b = ExternalRef::new(ExternalKind::Include, Some("b.xsd".into()));
        a_to_b.target = Some(b);
        let mut b_to_a = ExternalRef::new(ExternalKind::Include, Some("a.xsd".into()));
        b_to_a.target = Some(a);
        collection.add_external(a, a_to_b);
        collection.add_external(b, b_to_a);

        assert!(collection.find_group(&QName::new("urn:x", "Nowhere")).is_none());
    }

    #[test]
    fn test_unnamed_top_level_rejected() {
        let mut collection = Collection::new();
        let schema = collection
            .add_schema(SchemaKey::new("", "a.xsd"), None)
            .unwrap();
        assert!(matches!(
            collection.add_group(schema, Group::default()),
            Err(SchemaError::UnnamedComponent { .. })
        ));
    }

    #[test]
    fn test_element_reference_resolution() {
        let mut collection = Collection::new();
        let schema = collection
            .add_schema(SchemaKey::new("urn:a", "a.xsd"), Some("urn:a"))
            .unwrap();
        let name = QName::new("urn:a", "target");
        let string = QName::new(XS_NS, "string");

        let mut global = Element::named(name.clone());
        global.type_slot = named_slot(&string);
        let global = collection.add_element(schema, global).unwrap();
        let reference = collection.alloc_element(schema, Element::reference(name));

        assert_eq!(collection.resolve_element(reference), Some(global));
        assert_eq!(
            collection.element_type(reference),
            collection.find_type(&string)
        );
    }
}
