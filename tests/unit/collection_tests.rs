/// Collection tests
///
/// These tests verify that the registry:
/// - Keys schemas by (namespace, locator) and rejects duplicates
/// - Carries the built-in datatype catalogue
/// - Supports programmatic construction with forward type references
/// - Resolves references lazily across schemas
use xsd_model::constants::XS_NS;
use xsd_model::model::{
    ComplexType, ContentModel, DirectContent, Element, ModelGroup, Particle, Term, TypeDefinition,
    TypeSlot,
};
use xsd_model::{Collection, QName, SchemaError, SchemaKey};

use crate::common::test_helpers::{ORDERS_SCHEMA, orders, particle_shape, type_particle};

#[test]
fn test_identity_operations() {
    let mut collection = Collection::new();
    let key = SchemaKey::new("urn:a", "a.xsd");

    assert!(!collection.contains_schema(&key));
    let id = collection.add_schema(key.clone(), Some("urn:a")).unwrap();

    assert!(collection.contains_schema(&key));
    assert_eq!(collection.schema_id(&key), Some(id));
    assert_eq!(collection.get_schema(&key).map(|s| s.id()), Some(id));
    assert_eq!(collection.len(), 1);

    let duplicate = collection.add_schema(key, Some("urn:a"));
    assert!(matches!(duplicate, Err(SchemaError::DuplicateSchema { .. })));
}

#[test]
fn test_builtin_catalogue() {
    let collection = Collection::new();

    for name in ["anyType", "anySimpleType", "string", "positiveInteger", "dateTime", "ID"] {
        assert!(
            collection.find_type(&QName::new(XS_NS, name)).is_some(),
            "missing built-in {}",
            name
        );
    }
    assert!(collection.find_type(&QName::new(XS_NS, "notAType")).is_none());
    // The catalogue is not counted as a registered schema
    assert!(collection.is_empty());
    assert!(collection.builtin_schema().is_builtin());
}

#[test]
fn test_programmatic_construction_with_forward_type() {
    let mut collection = Collection::new();
    let id = collection
        .add_schema(SchemaKey::new("urn:p", "p.xsd"), Some("urn:p"))
        .unwrap();

    let mut element = Element::named(QName::new("urn:p", "item"));
    element.type_slot = TypeSlot::Named {
        name: QName::new("urn:p", "ItemType"),
        resolved: None,
    };
    let element_id = collection.add_element(id, element).unwrap();
    assert!(collection.element(element_id).unwrap().type_slot.is_pending());

    let local = collection.alloc_element(id, Element::named(QName::local("value")));
    let content = ComplexType {
        content: ContentModel::Direct(DirectContent {
            particle: Some(Particle::new(Term::Sequence(ModelGroup {
                particles: vec![Particle::new(Term::Element(local))],
                ..Default::default()
            }))),
            ..Default::default()
        }),
        ..Default::default()
    };
    let type_id = collection
        .add_type(
            id,
            TypeDefinition::complex(Some(QName::new("urn:p", "ItemType")), content),
        )
        .unwrap();

    assert_eq!(collection.element_type(element_id), Some(type_id));
    assert!(collection.unresolved_type_names().is_empty());

    let again = collection.add_type(
        id,
        TypeDefinition::complex(Some(QName::new("urn:p", "ItemType")), ComplexType::default()),
    );
    assert!(matches!(again, Err(SchemaError::DuplicateComponent { .. })));
}

#[test]
fn test_programmatic_schema_serializes_and_rebuilds() {
    let mut collection = Collection::new();
    let id = collection
        .add_schema(SchemaKey::new("urn:p", "p.xsd"), Some("urn:p"))
        .unwrap();
    let mut element = Element::named(QName::new("urn:p", "title"));
    element.type_slot = TypeSlot::Named {
        name: QName::new(XS_NS, "string"),
        resolved: None,
    };
    collection.add_element(id, element).unwrap();

    let documents = collection.serialize_schema(id, false).unwrap();
    let text = documents[0].to_xml_string(None).unwrap();

    let mut rebuilt = Collection::new();
    let rebuilt_id = rebuilt.build_str(&text, "p.xsd").unwrap();
    let title = rebuilt.find_element(&QName::new("urn:p", "title")).unwrap();
    assert_eq!(rebuilt.schema(rebuilt_id).target_namespace(), Some("urn:p"));
    assert_eq!(
        rebuilt.element_type(title),
        rebuilt.find_type(&QName::new(XS_NS, "string"))
    );
}

#[test]
fn test_group_reference_resolution() {
    let mut collection = Collection::new();
    collection.build_str(ORDERS_SCHEMA, "orders.xsd").unwrap();

    let shipping = collection.find_group(&orders("Shipping")).unwrap();
    let group = collection.group(shipping).unwrap();
    let shape = particle_shape(&collection, group.particle.as_ref().unwrap());
    assert!(shape.contains("element {urn:orders}tracking"));

    let order_type = collection.find_type(&orders("OrderType")).unwrap();
    let Term::Sequence(sequence) = &type_particle(&collection, order_type).unwrap().term else {
        panic!("Expected a sequence");
    };
    let Term::Choice(choice) = &sequence.particles[2].term else {
        panic!("Expected a choice");
    };
    let Term::GroupRef(group_ref) = &choice.particles[1].term else {
        panic!("Expected a group reference");
    };
    assert_eq!(collection.resolve_group_ref(group_ref), Some(shipping));
}

#[test]
fn test_element_reference_across_schemas() {
    let mut collection = Collection::new();
    let common = collection
        .build_str(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:common">
  <xs:element name="code" type="xs:token"/>
</xs:schema>"#,
            "common.xsd",
        )
        .unwrap();
    collection.map_namespace("urn:common", common);

    collection
        .build_str(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           xmlns:c="urn:common" targetNamespace="urn:main">
  <xs:import namespace="urn:common"/>
  <xs:complexType name="Wrapper">
    <xs:sequence><xs:element ref="c:code"/></xs:sequence>
  </xs:complexType>
</xs:schema>"#,
            "main.xsd",
        )
        .unwrap();

    let wrapper = collection.find_type(&QName::new("urn:main", "Wrapper")).unwrap();
    let local = type_particle(&collection, wrapper).unwrap().elements()[0];
    let target = collection.find_element(&QName::new("urn:common", "code")).unwrap();

    assert_eq!(collection.resolve_element(local), Some(target));
    assert_eq!(
        collection.element_type(local),
        collection.find_type(&QName::new(XS_NS, "token"))
    );
}
