use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use xsd_model::document::XmlElement;
use xsd_model::model::{ExtensionPayload, Extensions};
use xsd_model::{
    ExtensionRegistry, InMemoryResolver, QName, Result, SchemaSource, UriResolver,
    VerbatimExtensions,
};

/// One call into a resolver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveRequest {
    pub namespace: String,
    pub location: String,
    pub base_uri: Option<String>,
}

/// In-memory resolver that counts and records every call
#[derive(Debug, Default)]
pub struct CountingResolver {
    inner: InMemoryResolver,
    calls: AtomicUsize,
    requests: Mutex<Vec<ResolveRequest>>,
}

impl CountingResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(self, locator: &str, text: &str) -> Self {
        self.inner.insert(locator, text);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<ResolveRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn reset(&self) {
        self.calls.store(0, Ordering::SeqCst);
        self.requests.lock().unwrap().clear();
    }
}

impl UriResolver for CountingResolver {
    fn resolve(
        &self,
        target_namespace: &str,
        location: &str,
        base_uri: Option<&str>,
    ) -> Result<Option<SchemaSource>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(ResolveRequest {
            namespace: target_namespace.to_string(),
            location: location.to_string(),
            base_uri: base_uri.map(str::to_string),
        });
        self.inner.resolve(target_namespace, location, base_uri)
    }
}

/// Extension registry that keeps content verbatim and records what it saw
#[derive(Debug, Default)]
pub struct RecordingExtensions {
    deserialized: Mutex<Vec<QName>>,
    serialized: AtomicUsize,
}

impl RecordingExtensions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names handed to `deserialize`, in call order
    pub fn deserialized(&self) -> Vec<QName> {
        self.deserialized.lock().unwrap().clone()
    }

    /// Number of `serialize` calls that had content to write
    pub fn serialized_count(&self) -> usize {
        self.serialized.load(Ordering::SeqCst)
    }
}

impl ExtensionRegistry for RecordingExtensions {
    fn deserialize(&self, target: &mut Extensions, name: &QName, raw: ExtensionPayload) {
        self.deserialized.lock().unwrap().push(name.clone());
        VerbatimExtensions.deserialize(target, name, raw);
    }

    fn serialize(&self, source: &Extensions, out: &mut XmlElement) {
        if !source.is_empty() {
            self.serialized.fetch_add(1, Ordering::SeqCst);
        }
        VerbatimExtensions.serialize(source, out);
    }
}
