use std::path::{Path, PathBuf};

use xsd_model::model::{ComponentKind, ContentModel, Particle, Term, TypeId, UNBOUNDED};
use xsd_model::{Collection, QName, SchemaId};

pub const ORDERS_NS: &str = "urn:orders";

/// Covers most top-level and nested constructs in one document.
pub const ORDERS_SCHEMA: &str = r###"<?xml version="1.0" encoding="UTF-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           xmlns:o="urn:orders"
           targetNamespace="urn:orders"
           elementFormDefault="qualified"
           version="1.2">
  <xs:annotation>
    <xs:documentation xml:lang="en">Purchase orders</xs:documentation>
  </xs:annotation>
  <xs:element name="order" type="o:OrderType">
    <xs:key name="lineKey">
      <xs:selector xpath="o:line"/>
      <xs:field xpath="@number"/>
    </xs:key>
  </xs:element>
  <xs:complexType name="OrderType">
    <xs:sequence>
      <xs:element name="customer" type="xs:string"/>
      <xs:element name="line" type="o:LineType" maxOccurs="unbounded"/>
      <xs:choice minOccurs="0">
        <xs:element name="note" type="xs:string"/>
        <xs:group ref="o:Shipping"/>
      </xs:choice>
      <xs:any namespace="##other" processContents="lax" minOccurs="0" maxOccurs="5"/>
    </xs:sequence>
    <xs:attribute name="id" type="xs:ID" use="required"/>
    <xs:attributeGroup ref="o:Audit"/>
    <xs:anyAttribute namespace="##other" processContents="skip"/>
  </xs:complexType>
  <xs:complexType name="LineType">
    <xs:simpleContent>
      <xs:extension base="xs:decimal">
        <xs:attribute name="number" type="xs:positiveInteger"/>
      </xs:extension>
    </xs:simpleContent>
  </xs:complexType>
  <xs:group name="Shipping">
    <xs:sequence>
      <xs:element name="carrier" type="o:Carrier"/>
      <xs:element name="tracking" type="xs:string" minOccurs="0"/>
    </xs:sequence>
  </xs:group>
  <xs:attributeGroup name="Audit">
    <xs:attribute name="created" type="xs:dateTime"/>
  </xs:attributeGroup>
  <xs:simpleType name="Carrier">
    <xs:restriction base="xs:string">
      <xs:enumeration value="UPS"/>
      <xs:enumeration value="DHL"/>
    </xs:restriction>
  </xs:simpleType>
  <xs:simpleType name="Carriers">
    <xs:list itemType="o:Carrier"/>
  </xs:simpleType>
  <xs:attribute name="revision" type="xs:string"/>
  <xs:notation name="png" public="image/png"/>
</xs:schema>"###;

/// Schema text in no namespace holding one complex type with the given particle body.
pub fn schema_with_sequence(body: &str) -> String {
    format!(
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:complexType name="T">
    <xs:sequence>
      {}
    </xs:sequence>
  </xs:complexType>
</xs:schema>"#,
        body
    )
}

pub fn write_schema(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, text).unwrap();
    path
}

/// Sorted (kind, name) pairs registered in one schema
pub fn top_level_components(collection: &Collection, id: SchemaId) -> Vec<(ComponentKind, QName)> {
    let mut components = collection.schema(id).components();
    components.sort();
    components
}

/// Particle of a complex type, wherever its content model keeps it
pub fn type_particle(collection: &Collection, id: TypeId) -> Option<&Particle> {
    let complex = collection.type_definition(id)?.as_complex()?;
    match &complex.content {
        ContentModel::Direct(direct) => direct.particle.as_ref(),
        ContentModel::Complex(content) => content.derivation.as_ref()?.body().particle.as_ref(),
        ContentModel::Simple(_) => None,
    }
}

/// Id-free rendering of a particle tree, comparable across collections
pub fn particle_shape(collection: &Collection, particle: &Particle) -> String {
    let term = match &particle.term {
        Term::Sequence(group) | Term::Choice(group) | Term::All(group) => format!(
            "{}[{}]",
            particle.term.local_name(),
            group
                .particles
                .iter()
                .map(|p| particle_shape(collection, p))
                .collect::<Vec<_>>()
                .join(", ")
        ),
        Term::Element(id) => match collection.element(*id) {
            Some(element) => match (&element.reference, &element.name) {
                (Some(target), _) => format!("element ref={}", target),
                (None, Some(name)) => format!(
                    "element {}:{}",
                    name,
                    element
                        .type_slot
                        .type_name()
                        .map(ToString::to_string)
                        .unwrap_or_else(|| "-".to_string())
                ),
                (None, None) => "element ?".to_string(),
            },
            None => "element ?".to_string(),
        },
        Term::Any(wildcard) => format!("any {}", wildcard.namespace.as_deref().unwrap_or("##any")),
        Term::GroupRef(group_ref) => format!("group ref={}", group_ref.ref_name),
    };

    let max = if particle.occurs.max == UNBOUNDED {
        "unbounded".to_string()
    } else {
        particle.occurs.max.to_string()
    };
    format!("{}({},{})", term, particle.occurs.min, max)
}

pub fn orders(local_name: &str) -> QName {
    QName::new(ORDERS_NS, local_name)
}
