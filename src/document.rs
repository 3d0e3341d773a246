//! Generic document tree consumed by the builder and produced by the serializer.
//!
//! Parsing (`roxmltree`) and text output (`quick-xml`) are thin adapters; the
//! object model itself only ever sees [`XmlElement`] trees.

use std::io::Cursor;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use roxmltree::{Document, Node, ParsingOptions};

use crate::constants::XML_PREFIX;
use crate::error::{Result, SchemaError};
use crate::qname::{NamespaceContext, QName};

/// Name of an element or attribute as it appears in a tree.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmlName {
    pub namespace: Option<String>,
    pub local: String,
    pub prefix: Option<String>,
}

impl XmlName {
    pub fn new(namespace: Option<&str>, local: impl Into<String>) -> Self {
        Self {
            namespace: namespace.filter(|ns| !ns.is_empty()).map(str::to_string),
            local: local.into(),
            prefix: None,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.prefix = if prefix.is_empty() { None } else { Some(prefix) };
        self
    }

    pub fn namespace(&self) -> &str {
        self.namespace.as_deref().unwrap_or("")
    }

    pub fn to_qname(&self) -> QName {
        QName::new(self.namespace(), self.local.clone())
    }

    /// `prefix:local` or `local`
    pub fn lexical(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.local),
            None => self.local.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    pub name: XmlName,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
    Comment(String),
}

/// An element with its attributes, children and the namespace bindings it declares.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmlElement {
    pub name: XmlName,
    pub attributes: Vec<XmlAttribute>,
    /// Bindings declared on this element only; inherited ones live on ancestors.
    pub namespaces: NamespaceContext,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: XmlName) -> Self {
        Self {
            name,
            ..Default::default()
        }
    }

    pub fn is(&self, namespace: &str, local: &str) -> bool {
        self.name.namespace() == namespace && self.name.local == local
    }

    /// Value of an attribute in no namespace.
    pub fn attribute(&self, local: &str) -> Option<&str> {
        self.attribute_ns("", local)
    }

    pub fn attribute_ns(&self, namespace: &str, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.name.namespace() == namespace && attr.name.local == local)
            .map(|attr| attr.value.as_str())
    }

    /// Sets an unqualified attribute, replacing an existing value.
    pub fn set_attribute(&mut self, local: &str, value: impl Into<String>) {
        let value = value.into();
        match self
            .attributes
            .iter_mut()
            .find(|attr| attr.name.namespace.is_none() && attr.name.local == local)
        {
            Some(existing) => existing.value = value,
            None => self.attributes.push(XmlAttribute {
                name: XmlName::new(None, local),
                value,
            }),
        }
    }

    pub fn push_element(&mut self, child: XmlElement) {
        self.children.push(XmlNode::Element(child));
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(element) => Some(element),
            _ => None,
        })
    }

    pub fn child_elements_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        self.children.iter_mut().filter_map(|node| match node {
            XmlNode::Element(element) => Some(element),
            _ => None,
        })
    }

    /// Concatenated direct text content.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                XmlNode::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Parses a complete document and returns its root element.
    pub fn parse(text: &str, locator: &str) -> Result<XmlElement> {
        let options = ParsingOptions {
            allow_dtd: true,
            ..Default::default()
        };
        let document =
            Document::parse_with_options(text, options).map_err(|e| SchemaError::XmlParse {
                locator: locator.to_string(),
                details: e.to_string(),
            })?;

        Ok(convert_element(document.root_element()))
    }

    /// Renders the tree as a standalone document. `indent` of `None` writes it on one line.
    pub fn to_xml_string(&self, indent: Option<usize>) -> Result<String> {
        let buffer = Cursor::new(Vec::new());
        let mut writer = match indent {
            Some(width) => Writer::new_with_indent(buffer, b' ', width),
            None => Writer::new(buffer),
        };

        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(|e| SchemaError::Output(e.to_string()))?;
        write_element(&mut writer, self)?;

        String::from_utf8(writer.into_inner().into_inner())
            .map_err(|e| SchemaError::Output(e.to_string()))
    }
}

fn convert_element(node: Node<'_, '_>) -> XmlElement {
    let tag = node.tag_name();
    let prefix = tag.namespace().and_then(|ns| node.lookup_prefix(ns));
    let mut name = XmlName::new(tag.namespace(), tag.name());
    if let Some(prefix) = prefix {
        name = name.with_prefix(prefix);
    }

    let mut element = XmlElement::new(name);
    element.namespaces = declared_namespaces(node);

    for attr in node.attributes() {
        let mut attr_name = XmlName::new(attr.namespace(), attr.name());
        if let Some(prefix) = attr.namespace().and_then(|ns| node.lookup_prefix(ns)) {
            attr_name = attr_name.with_prefix(prefix);
        }
        element.attributes.push(XmlAttribute {
            name: attr_name,
            value: attr.value().to_string(),
        });
    }

    for child in node.children() {
        if child.is_element() {
            element.push_element(convert_element(child));
        } else if child.is_text() {
            if let Some(text) = child.text() {
                element.children.push(XmlNode::Text(text.to_string()));
            }
        } else if child.is_comment() {
            if let Some(text) = child.text() {
                element.children.push(XmlNode::Comment(text.to_string()));
            }
        }
    }

    element
}

/// roxmltree reports in-scope bindings; keep only what differs from the parent.
fn declared_namespaces(node: Node<'_, '_>) -> NamespaceContext {
    let parent = node.parent_element();
    let mut declared = NamespaceContext::new();

    for ns in node.namespaces() {
        let prefix = ns.name().unwrap_or("");
        if prefix == XML_PREFIX {
            continue;
        }
        let inherited = parent.is_some_and(|parent| {
            parent
                .namespaces()
                .any(|p| p.name().unwrap_or("") == prefix && p.uri() == ns.uri())
        });
        if !inherited {
            declared.declare(prefix, ns.uri());
        }
    }

    declared
}

fn write_element<W: std::io::Write>(writer: &mut Writer<W>, element: &XmlElement) -> Result<()> {
    let tag = element.name.lexical();
    let mut start = BytesStart::new(tag.as_str());

    for (prefix, uri) in element.namespaces.iter() {
        let key = if prefix.is_empty() {
            "xmlns".to_string()
        } else {
            format!("xmlns:{}", prefix)
        };
        start.push_attribute((key.as_str(), uri));
    }
    for attr in &element.attributes {
        let key = attr.name.lexical();
        start.push_attribute((key.as_str(), attr.value.as_str()));
    }

    if element.children.is_empty() {
        return writer
            .write_event(Event::Empty(start))
            .map_err(|e| SchemaError::Output(e.to_string()));
    }

    writer
        .write_event(Event::Start(start))
        .map_err(|e| SchemaError::Output(e.to_string()))?;

    for child in &element.children {
        let event = match child {
            XmlNode::Element(nested) => {
                write_element(writer, nested)?;
                continue;
            }
            XmlNode::Text(text) => Event::Text(BytesText::new(text)),
            XmlNode::Comment(text) => Event::Comment(BytesText::from_escaped(text.as_str())),
        };
        writer
            .write_event(event)
            .map_err(|e| SchemaError::Output(e.to_string()))?;
    }

    writer
        .write_event(Event::End(BytesEnd::new(tag.as_str())))
        .map_err(|e| SchemaError::Output(e.to_string()))
}
