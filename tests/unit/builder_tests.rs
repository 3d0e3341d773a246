/// Builder tests against whole documents
///
/// These tests verify that building:
/// - Registers every named top-level construct under its qualified name
/// - Applies element form defaults to local declarations
/// - Resolves include locations through the resolver, relative to the includer
/// - Tolerates missing documents and undeclared types, but not unbound prefixes
use std::sync::Arc;

use xsd_model::constants::XS_NS;
use xsd_model::model::{
    AttributeItem, AttributeUse, ComponentKind, ContentDerivation, ContentModel, FacetKind,
    IdentityConstraintKind, SimpleType,
};
use xsd_model::{Collection, QName, SchemaError, SchemaKey};

use crate::common::mocks::{CountingResolver, RecordingExtensions, ResolveRequest};
use crate::common::test_helpers::{
    ORDERS_NS, ORDERS_SCHEMA, orders, particle_shape, top_level_components, type_particle,
};

fn build_orders() -> (Collection, xsd_model::SchemaId) {
    let mut collection = Collection::new();
    let id = collection.build_str(ORDERS_SCHEMA, "orders.xsd").unwrap();
    (collection, id)
}

#[test]
fn test_top_level_components_registered() {
    let (collection, id) = build_orders();

    let mut expected = vec![
        (ComponentKind::Element, orders("order")),
        (ComponentKind::Attribute, orders("revision")),
        (ComponentKind::Type, orders("OrderType")),
        (ComponentKind::Type, orders("LineType")),
        (ComponentKind::Type, orders("Carrier")),
        (ComponentKind::Type, orders("Carriers")),
        (ComponentKind::Group, orders("Shipping")),
        (ComponentKind::AttributeGroup, orders("Audit")),
        (ComponentKind::Notation, orders("png")),
    ];
    expected.sort();

    assert_eq!(top_level_components(&collection, id), expected);

    let schema = collection.schema(id);
    assert_eq!(schema.key(), &SchemaKey::new(ORDERS_NS, "orders.xsd"));
    assert_eq!(schema.target_namespace(), Some(ORDERS_NS));
    assert_eq!(schema.version.as_deref(), Some("1.2"));
}

#[test]
fn test_content_model_shape() {
    let (collection, _) = build_orders();
    let order_type = collection.find_type(&orders("OrderType")).unwrap();
    let shape = particle_shape(&collection, type_particle(&collection, order_type).unwrap());

    assert!(shape.starts_with("sequence["), "{}", shape);
    assert!(shape.ends_with("](1,1)"), "{}", shape);
    assert!(shape.contains("element {urn:orders}line:{urn:orders}LineType(1,unbounded)"));
    assert!(shape.contains("group ref={urn:orders}Shipping(1,1)](0,1)"), "{}", shape);
    assert!(shape.contains("any ##other(0,5)"));
}

#[test]
fn test_qualified_local_elements() {
    let (collection, _) = build_orders();
    let order_type = collection.find_type(&orders("OrderType")).unwrap();
    let particle = type_particle(&collection, order_type).unwrap();

    let first = particle.elements()[0];
    let customer = collection.element(first).unwrap();
    assert_eq!(customer.name, Some(orders("customer")));
    assert!(!customer.top_level);
    // Local declarations never land in the name maps
    assert!(collection.find_element(&orders("customer")).is_none());
}

#[test]
fn test_element_type_and_identity_constraint() {
    let (collection, _) = build_orders();
    let order = collection.find_element(&orders("order")).unwrap();

    assert_eq!(
        collection.element_type(order),
        collection.find_type(&orders("OrderType"))
    );

    let element = collection.element(order).unwrap();
    assert_eq!(element.constraints.len(), 1);
    let key = &element.constraints[0];
    assert_eq!(key.kind, IdentityConstraintKind::Key);
    assert_eq!(key.name, orders("lineKey"));
    assert_eq!(key.selector.as_ref().unwrap().xpath, "o:line");
    assert_eq!(key.fields[0].xpath, "@number");
}

#[test]
fn test_attributes_and_group_references() {
    let (collection, _) = build_orders();
    let order_type = collection.find_type(&orders("OrderType")).unwrap();
    let complex = collection.type_definition(order_type).unwrap().as_complex().unwrap();

    let ContentModel::Direct(direct) = &complex.content else {
        panic!("Expected direct content, got {:?}", complex.content);
    };
    match &direct.attributes[..] {
        [AttributeItem::Attribute(id), AttributeItem::GroupRef(group_ref)] => {
            let attribute = collection.attribute(*id).unwrap();
            assert_eq!(attribute.name, Some(QName::local("id")));
            assert_eq!(attribute.use_kind, Some(AttributeUse::Required));
            assert_eq!(group_ref.ref_name, orders("Audit"));
            assert_eq!(
                collection.resolve_attribute_group_ref(group_ref),
                collection.find_attribute_group(&orders("Audit"))
            );
        }
        other => panic!("Unexpected attribute items: {:?}", other),
    }
    assert_eq!(
        direct.any_attribute.as_ref().and_then(|w| w.namespace.as_deref()),
        Some("##other")
    );
}

#[test]
fn test_simple_types_and_simple_content() {
    let (collection, _) = build_orders();

    let carrier = collection.find_type(&orders("Carrier")).unwrap();
    let Some(SimpleType::Restriction(restriction)) =
        collection.type_definition(carrier).unwrap().as_simple()
    else {
        panic!("Expected a restriction");
    };
    assert_eq!(restriction.base, Some(QName::new(XS_NS, "string")));
    let values: Vec<_> = restriction
        .facets
        .iter()
        .filter(|facet| facet.kind == FacetKind::Enumeration)
        .map(|facet| facet.value.as_str())
        .collect();
    assert_eq!(values, vec!["UPS", "DHL"]);

    let carriers = collection.find_type(&orders("Carriers")).unwrap();
    let Some(SimpleType::List(list)) = collection.type_definition(carriers).unwrap().as_simple()
    else {
        panic!("Expected a list");
    };
    assert_eq!(list.item_type_name, Some(orders("Carrier")));

    let line = collection.find_type(&orders("LineType")).unwrap();
    let complex = collection.type_definition(line).unwrap().as_complex().unwrap();
    let ContentModel::Simple(content) = &complex.content else {
        panic!("Expected simple content");
    };
    assert!(matches!(
        content.derivation,
        Some(ContentDerivation::Extension(_))
    ));
    assert_eq!(complex.base_type_name(), Some(&QName::new(XS_NS, "decimal")));
}

#[test]
fn test_include_resolved_relative_to_includer() {
    let resolver = Arc::new(
        CountingResolver::new()
            .with_document(
                "schemas/main.xsd",
                r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:a">
  <xs:include schemaLocation="types.xsd"/>
</xs:schema>"#,
            )
            .with_document(
                "schemas/types.xsd",
                r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:a">
  <xs:simpleType name="Code"><xs:restriction base="xs:token"/></xs:simpleType>
</xs:schema>"#,
            ),
    );
    let mut collection = Collection::new().with_resolver(resolver.clone());

    let id = collection.read_location("schemas/main.xsd", None).unwrap().unwrap();

    assert_eq!(
        resolver.requests()[1],
        ResolveRequest {
            namespace: "urn:a".to_string(),
            location: "types.xsd".to_string(),
            base_uri: Some("schemas/main.xsd".to_string()),
        }
    );
    let external = collection.schema(id).externals().next().unwrap();
    let target = external.target.unwrap();
    assert_eq!(collection.schema(target).locator(), "schemas/types.xsd");
    assert!(collection.find_type(&QName::new("urn:a", "Code")).is_some());
}

#[test]
fn test_missing_include_is_tolerated() {
    let mut collection = Collection::new().with_resolver(Arc::new(CountingResolver::new()));
    let id = collection
        .build_str(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:include schemaLocation="nowhere.xsd"/>
  <xs:element name="a" type="Undeclared"/>
</xs:schema>"#,
            "main.xsd",
        )
        .unwrap();

    let external = collection.schema(id).externals().next().unwrap();
    assert!(!external.is_resolved());
    assert_eq!(
        collection.unresolved_type_names(),
        vec![&QName::local("Undeclared")]
    );
}

#[test]
fn test_unrecognized_schema_children_ignored() {
    let mut collection = Collection::new();
    let id = collection
        .build_str(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:x">
  <xs:assert test="true()"/>
  <xs:openContent mode="interleave"><xs:any/></xs:openContent>
  <xs:defaultOpenContent><xs:any/></xs:defaultOpenContent>
</xs:schema>"#,
            "future.xsd",
        )
        .unwrap();

    let schema = collection.schema(id);
    assert!(schema.items().is_empty());
    assert_eq!(schema.component_count(), 0);
    assert!(top_level_components(&collection, id).is_empty());
}

#[test]
fn test_unlocatable_import_falls_back_to_known_namespace() {
    let resolver = Arc::new(CountingResolver::new());
    let mut collection = Collection::new().with_resolver(resolver.clone());
    let common = collection
        .build_str(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:common">
  <xs:simpleType name="Code"><xs:restriction base="xs:token"/></xs:simpleType>
</xs:schema>"#,
            "common.xsd",
        )
        .unwrap();
    collection.map_namespace("urn:common", common);

    let main = collection
        .build_str(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           xmlns:c="urn:common" targetNamespace="urn:main">
  <xs:import namespace="urn:common" schemaLocation="missing/common.xsd"/>
  <xs:element name="code" type="c:Code"/>
</xs:schema>"#,
            "main.xsd",
        )
        .unwrap();

    assert_eq!(resolver.call_count(), 1);
    assert_eq!(resolver.requests()[0].location, "missing/common.xsd");

    let import = collection.schema(main).externals().next().unwrap();
    assert_eq!(import.schema_location.as_deref(), Some("missing/common.xsd"));
    assert_eq!(import.target, Some(common));
    assert_eq!(collection.len(), 2);
}

#[test]
fn test_unbound_prefix_in_base_is_fatal() {
    let mut collection = Collection::new();
    let result = collection.build_str(
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:simpleType name="S"><xs:restriction base="nope:string"/></xs:simpleType>
</xs:schema>"#,
        "bad.xsd",
    );

    match result {
        Err(SchemaError::UnboundPrefix { prefix, token, key }) => {
            assert_eq!(prefix, "nope");
            assert_eq!(token, "nope:string");
            assert_eq!(key, SchemaKey::new("", "bad.xsd"));
        }
        other => panic!("Expected UnboundPrefix, got {:?}", other),
    }
}

#[test]
fn test_duplicate_component_is_fatal() {
    let mut collection = Collection::new();
    let result = collection.build_str(
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:element name="a" type="xs:string"/>
  <xs:element name="a" type="xs:int"/>
</xs:schema>"#,
        "dup.xsd",
    );

    assert!(matches!(
        result,
        Err(SchemaError::DuplicateComponent { kind: ComponentKind::Element, .. })
    ));
}

#[test]
fn test_foreign_content_reaches_registry_in_order() {
    let extensions = Arc::new(RecordingExtensions::new());
    let mut collection = Collection::new().with_extensions(extensions.clone());

    let id = collection
        .build_str(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           xmlns:app="urn:app" app:version="3">
  <app:info/>
  <xs:element name="a" type="xs:string" app:owner="ops"/>
</xs:schema>"#,
            "ext.xsd",
        )
        .unwrap();

    assert_eq!(
        extensions.deserialized(),
        vec![
            QName::new("urn:app", "version"),
            QName::new("urn:app", "info"),
            QName::new("urn:app", "owner"),
        ]
    );

    let documents = collection.serialize_schema(id, false).unwrap();
    let text = documents[0].to_xml_string(None).unwrap();
    assert!(extensions.serialized_count() >= 2);
    assert!(text.contains("=\"ops\""));
    assert!(text.contains("info"));
}
