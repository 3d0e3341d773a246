//! Hook for foreign-namespace content attached to schema constructs.
//!
//! The builder hands every attribute or child element outside the schema
//! namespace to an [`ExtensionRegistry`] in encounter order, and the
//! serializer asks the same registry to write it back. The core never looks
//! inside the payload.

use crate::document::XmlElement;
use crate::model::{ExtensionPayload, Extensions};
use crate::qname::QName;

pub trait ExtensionRegistry: Send + Sync {
    /// Record `raw`, found on the construct that owns `target`.
    fn deserialize(&self, target: &mut Extensions, name: &QName, raw: ExtensionPayload);

    /// Write the content recorded in `source` onto `out`, the emitted form of
    /// the owning construct. Prefixes are assigned by the caller afterwards.
    fn serialize(&self, source: &Extensions, out: &mut XmlElement);
}

/// Keeps foreign content exactly as found and re-emits it unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct VerbatimExtensions;

impl ExtensionRegistry for VerbatimExtensions {
    fn deserialize(&self, target: &mut Extensions, name: &QName, raw: ExtensionPayload) {
        target.push(name.clone(), raw);
    }

    fn serialize(&self, source: &Extensions, out: &mut XmlElement) {
        for entry in source.entries() {
            match &entry.payload {
                ExtensionPayload::Attribute(attr) => out.attributes.push(attr.clone()),
                ExtensionPayload::Element(element) => out.push_element(element.clone()),
            }
        }
    }
}

/// Drops all foreign content.
#[derive(Debug, Default, Clone, Copy)]
pub struct IgnoreExtensions;

impl ExtensionRegistry for IgnoreExtensions {
    fn deserialize(&self, _target: &mut Extensions, _name: &QName, _raw: ExtensionPayload) {}

    fn serialize(&self, _source: &Extensions, _out: &mut XmlElement) {}
}
