/// Serializer tests
///
/// These tests verify that writing a schema back:
/// - Declares every prefix on the root and never uses a default namespace
/// - Emits one document per reachable schema only when asked to
/// - Leaves chameleon-included documents without a target namespace
use std::sync::Arc;

use xsd_model::constants::XS_NS;
use xsd_model::{Collection, InMemoryResolver};

use crate::common::test_helpers::{ORDERS_NS, ORDERS_SCHEMA};

const MAIN: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           xmlns:m="urn:main" targetNamespace="urn:main">
  <xs:element name="root" type="m:Shared"/>
  <xs:include schemaLocation="shared.xsd"/>
</xs:schema>"#;

const SHARED: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:complexType name="Shared">
    <xs:sequence><xs:element name="value" type="xs:string"/></xs:sequence>
  </xs:complexType>
</xs:schema>"#;

fn main_collection() -> (Collection, xsd_model::SchemaId) {
    let resolver = InMemoryResolver::new()
        .with_document("main.xsd", MAIN)
        .with_document("shared.xsd", SHARED);
    let mut collection = Collection::new().with_resolver(Arc::new(resolver));
    let id = collection.read_location("main.xsd", None).unwrap().unwrap();
    (collection, id)
}

#[test]
fn test_orders_document_text() {
    let mut collection = Collection::new();
    let id = collection.build_str(ORDERS_SCHEMA, "orders.xsd").unwrap();

    let documents = collection.serialize_schema(id, false).unwrap();
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].locator(), "orders.xsd");

    let root = &documents[0].document;
    assert!(root.is(XS_NS, "schema"));
    assert_eq!(root.attribute("targetNamespace"), Some(ORDERS_NS));
    assert_eq!(root.attribute("elementFormDefault"), Some("qualified"));
    assert!(root.namespaces.default_namespace().is_none());

    let text = documents[0].to_xml_string(Some(2)).unwrap();
    assert!(text.contains("xmlns:xs=\"http://www.w3.org/2001/XMLSchema\""));
    assert!(text.contains("xmlns:o=\"urn:orders\""));
    assert!(text.contains("type=\"o:OrderType\""));
    assert!(text.contains("maxOccurs=\"unbounded\""));
    assert!(text.contains("xml:lang=\"en\""));
    assert!(!text.contains("xmlns=\""));
}

#[test]
fn test_recursive_emission() {
    let (collection, id) = main_collection();

    let single = collection.serialize_schema(id, false).unwrap();
    assert_eq!(single.len(), 1);

    let all = collection.serialize_schema(id, true).unwrap();
    let locators: Vec<_> = all.iter().map(|d| d.locator()).collect();
    assert_eq!(locators, vec!["main.xsd", "shared.xsd"]);
}

#[test]
fn test_include_written_before_other_items() {
    let (collection, id) = main_collection();
    let documents = collection.serialize_schema(id, false).unwrap();

    let children: Vec<_> = documents[0]
        .document
        .child_elements()
        .map(|child| child.name.local.clone())
        .collect();
    assert_eq!(children, vec!["include", "element"]);
}

#[test]
fn test_chameleon_stays_without_namespace() {
    let (collection, id) = main_collection();
    let documents = collection.serialize_schema(id, true).unwrap();

    let shared = &documents[1];
    assert_eq!(shared.key.namespace, "urn:main");
    assert_eq!(shared.document.attribute("targetNamespace"), None);
}

#[test]
fn test_unresolved_external_skipped_when_recursive() {
    let mut collection = Collection::new().with_resolver(Arc::new(InMemoryResolver::new()));
    let id = collection
        .build_str(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:import namespace="urn:gone" schemaLocation="gone.xsd"/>
</xs:schema>"#,
            "lonely.xsd",
        )
        .unwrap();

    let documents = collection.serialize_schema(id, true).unwrap();
    assert_eq!(documents.len(), 1);
    let import = documents[0].document.child_elements().next().unwrap();
    assert_eq!(import.attribute("schemaLocation"), Some("gone.xsd"));
    assert_eq!(import.attribute("namespace"), Some("urn:gone"));
}
