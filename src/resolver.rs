//! Locating and parsing referenced schema documents.
//!
//! The builder never touches the filesystem or the network itself; every
//! `include`/`import`/`redefine` and every top-level read goes through a
//! [`UriResolver`].

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{OnceLock, RwLock};
use std::time::Duration;

use regex::Regex;
use reqwest::Url;
use reqwest::blocking::Client;
use tracing::debug;

use crate::document::XmlElement;
use crate::error::{Result, SchemaError};

/// Cached regex for absolute URI detection (`scheme:`). Single-letter
/// schemes are excluded so that Windows drive letters stay paths.
static SCHEME_REGEX: OnceLock<Regex> = OnceLock::new();

fn scheme_regex() -> &'static Regex {
    SCHEME_REGEX.get_or_init(|| {
        Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]+:").expect("Failed to compile scheme regex")
    })
}

/// A located and parsed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaSource {
    /// Authoritative location; becomes the registry key of the built schema
    pub locator: String,
    pub document: XmlElement,
}

impl SchemaSource {
    pub fn new(locator: impl Into<String>, document: XmlElement) -> Self {
        Self {
            locator: locator.into(),
            document,
        }
    }

    pub fn parse(locator: impl Into<String>, text: &str) -> Result<Self> {
        let locator = locator.into();
        let document = XmlElement::parse(text, &locator)?;
        Ok(Self { locator, document })
    }
}

/// Resolves a location hint to a document.
///
/// `Ok(None)` means "not found" and is tolerated by the builder; `Err` aborts
/// the build. Implementations may block.
pub trait UriResolver: Send + Sync {
    fn resolve(
        &self,
        target_namespace: &str,
        location: &str,
        base_uri: Option<&str>,
    ) -> Result<Option<SchemaSource>>;
}

pub fn has_scheme(location: &str) -> bool {
    scheme_regex().is_match(location)
}

/// Joins a location against the locator of the referencing document.
///
/// Absolute URIs and absolute paths are returned unchanged. Relative ones are
/// joined URL-style when the base is a URI and path-style otherwise.
pub fn join_location(location: &str, base_uri: Option<&str>) -> String {
    let location = location.trim();
    if has_scheme(location) || Path::new(location).is_absolute() {
        return location.to_string();
    }
    let Some(base) = base_uri.filter(|base| !base.is_empty()) else {
        return normalize_path(Path::new(location));
    };

    if has_scheme(base) {
        if let Ok(joined) = Url::parse(base).and_then(|base| base.join(location)) {
            return joined.to_string();
        }
        return location.to_string();
    }

    // A base ending in a separator names a directory rather than a document
    let parent = if base.ends_with(['/', '\\']) {
        Path::new(base)
    } else {
        Path::new(base).parent().unwrap_or(Path::new(""))
    };
    normalize_path(&parent.join(location))
}

/// Lexically removes `.` and resolvable `..` components so that the same
/// document reached along different paths gets the same locator.
fn normalize_path(path: &Path) -> String {
    let mut parts: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }
    parts.iter().collect::<PathBuf>().to_string_lossy().into_owned()
}

/// Settings for [`DefaultResolver`].
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Whether `http(s)` locations are fetched at all
    pub allow_remote: bool,
    pub timeout_seconds: u64,
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
    pub user_agent: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            allow_remote: true,
            timeout_seconds: 30,
            retry_attempts: 2,
            retry_delay_ms: 500,
            user_agent: format!("xsd-model/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Reads local paths and `file://` URLs, and fetches `http(s)` URLs with a
/// blocking client when remote access is allowed.
pub struct DefaultResolver {
    config: ResolverConfig,
    client: OnceLock<Client>,
}

impl DefaultResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self {
            config,
            client: OnceLock::new(),
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    fn read_local(&self, locator: String, path: &Path) -> Result<Option<SchemaSource>> {
        match std::fs::read_to_string(path) {
            Ok(text) => SchemaSource::parse(locator, &text).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "schema document not found");
                Ok(None)
            }
            Err(e) => Err(SchemaError::Io(e)),
        }
    }

    /// The blocking client owns its own runtime, so it is only built on
    /// first use from a worker thread.
    fn client(&self) -> Result<&Client> {
        if let Some(client) = self.client.get() {
            return Ok(client);
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(self.config.timeout_seconds))
            .user_agent(&self.config.user_agent)
            .build()?;
        let _ = self.client.set(client);
        self.client.get().ok_or_else(|| SchemaError::Resolver {
            location: String::new(),
            details: "HTTP client unavailable".to_string(),
        })
    }

    fn fetch_remote(&self, url: &str) -> Result<Option<SchemaSource>> {
        if !self.config.allow_remote {
            debug!(url, "remote schema skipped, network access disabled");
            return Ok(None);
        }

        let client = self.client()?;
        let mut attempt = 0;
        loop {
            let outcome = client.get(url).send();
            let retryable = match &outcome {
                Ok(response) => response.status().is_server_error(),
                Err(e) => e.is_timeout() || e.is_connect(),
            };
            if retryable && attempt < self.config.retry_attempts {
                let delay = backoff_delay(self.config.retry_delay_ms, attempt);
                debug!(url, attempt, delay_ms = delay, "retrying schema download");
                std::thread::sleep(Duration::from_millis(delay));
                attempt += 1;
                continue;
            }

            let response = outcome?;
            let status = response.status();
            if status == reqwest::StatusCode::NOT_FOUND {
                return Ok(None);
            }
            if !status.is_success() {
                return Err(SchemaError::Resolver {
                    location: url.to_string(),
                    details: format!(
                        "HTTP {}: {}",
                        status.as_u16(),
                        status.canonical_reason().unwrap_or("Unknown")
                    ),
                });
            }

            let text = response.text()?;
            return SchemaSource::parse(url, &text).map(Some);
        }
    }
}

impl Default for DefaultResolver {
    fn default() -> Self {
        Self::new(ResolverConfig::default())
    }
}

impl UriResolver for DefaultResolver {
    fn resolve(
        &self,
        _target_namespace: &str,
        location: &str,
        base_uri: Option<&str>,
    ) -> Result<Option<SchemaSource>> {
        let locator = join_location(location, base_uri);

        if !has_scheme(&locator) {
            let path = PathBuf::from(&locator);
            return self.read_local(locator, &path);
        }

        let url = Url::parse(&locator).map_err(|e| SchemaError::Resolver {
            location: locator.clone(),
            details: e.to_string(),
        })?;
        match url.scheme() {
            "file" => {
                let path = url.to_file_path().map_err(|_| SchemaError::Resolver {
                    location: locator.clone(),
                    details: "not a local file URL".to_string(),
                })?;
                self.read_local(locator, &path)
            }
            "http" | "https" => self.fetch_remote(&locator),
            scheme => Err(SchemaError::Resolver {
                location: locator.clone(),
                details: format!("unsupported URI scheme '{}'", scheme),
            }),
        }
    }
}

/// Serves documents registered up front, keyed by locator.
///
/// Relative locations are joined against the base exactly like
/// [`DefaultResolver`] does, so a set of documents keyed by relative paths
/// can include each other.
#[derive(Debug, Default)]
pub struct InMemoryResolver {
    documents: RwLock<HashMap<String, String>>,
}

impl InMemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(self, locator: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(locator, text);
        self
    }

    pub fn insert(&self, locator: impl Into<String>, text: impl Into<String>) {
        if let Ok(mut documents) = self.documents.write() {
            documents.insert(locator.into(), text.into());
        }
    }

    pub fn len(&self) -> usize {
        self.documents.read().map(|docs| docs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl UriResolver for InMemoryResolver {
    fn resolve(
        &self,
        _target_namespace: &str,
        location: &str,
        base_uri: Option<&str>,
    ) -> Result<Option<SchemaSource>> {
        let documents = self.documents.read().map_err(|e| SchemaError::Resolver {
            location: location.to_string(),
            details: e.to_string(),
        })?;

        let joined = join_location(location, base_uri);
        for candidate in [joined.as_str(), location] {
            if let Some(text) = documents.get(candidate) {
                return SchemaSource::parse(candidate, text).map(Some);
            }
        }
        Ok(None)
    }
}

/// Exponential backoff, saturating instead of overflowing on large attempt counts.
fn backoff_delay(base_ms: u64, attempt: u32) -> u64 {
    base_ms.saturating_mul(1u64.checked_shl(attempt).unwrap_or(u64::MAX))
}
