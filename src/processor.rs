//! Parallel build engine for discovered schema documents
//!
//! Discovery and configuration stay on the async runtime; the CPU-bound
//! builds run on a dedicated rayon pool reached through `spawn_blocking`.
//! Every document is built into its own [`Collection`], and every pool worker
//! carries its own [`ResolutionCache`], so nothing mutable is shared between
//! threads.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cache::{CacheConfig, ResolutionCache};
use crate::collection::Collection;
use crate::config::{Config, ConfigManager};
use crate::error::{Result, SchemaError};
use crate::extension::{ExtensionRegistry, VerbatimExtensions};
use crate::file_discovery::FileDiscovery;
use crate::model::SchemaId;
use crate::resolver::{SchemaSource, UriResolver};

/// Processing configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessorConfig {
    /// Number of pool threads
    pub threads: usize,
    /// Base URI for relative known-namespace locations
    pub base_uri: Option<String>,
    /// (namespace, location) pairs loaded before each document
    pub known_namespaces: Vec<(String, String)>,
    /// Per-worker cache settings; `None` disables caching
    pub cache: Option<CacheConfig>,
    /// Directory for re-emitted documents
    pub output_dir: Option<PathBuf>,
    pub recursive: bool,
    pub indent: usize,
    /// Skip remaining documents after the first failure
    pub fail_fast: bool,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            threads: num_cpus::get(),
            base_uri: None,
            known_namespaces: Vec::new(),
            cache: Some(CacheConfig::default()),
            output_dir: None,
            recursive: false,
            indent: 2,
            fail_fast: false,
        }
    }
}

impl From<&Config> for ProcessorConfig {
    fn from(config: &Config) -> Self {
        Self {
            threads: ConfigManager::get_thread_count(config),
            base_uri: config.builder.base_uri.clone(),
            known_namespaces: config
                .builder
                .known_namespaces
                .iter()
                .map(|(namespace, location)| (namespace.clone(), location.clone()))
                .collect(),
            cache: config.cache_config(),
            output_dir: config.output.directory.clone(),
            recursive: config.output.recursive,
            indent: config.output.indent,
            fail_fast: config.builder.fail_fast,
        }
    }
}

/// Outcome of building a single document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DocumentStatus {
    /// The document and everything it references were built
    Built,
    /// A hard error aborted the build
    Failed { message: String },
    /// Not attempted (fail-fast after an earlier failure)
    Skipped { reason: String },
}

impl DocumentStatus {
    pub fn is_built(&self) -> bool {
        matches!(self, DocumentStatus::Built)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, DocumentStatus::Failed { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, DocumentStatus::Skipped { .. })
    }
}

/// Result of building a single document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentResult {
    pub path: PathBuf,
    #[serde(flatten)]
    pub status: DocumentStatus,
    /// Logical target namespace of the entry schema
    pub target_namespace: Option<String>,
    /// Schemas registered in the document's collection, including known namespaces
    pub schema_count: usize,
    /// Named top-level components across those schemas
    pub component_count: usize,
    /// Type names referenced but never declared
    pub unresolved_types: Vec<String>,
    /// include/import/redefine entries whose document was not found
    pub unresolved_externals: usize,
    /// Files written to the output directory
    pub outputs: Vec<PathBuf>,
    pub duration: Duration,
}

impl DocumentResult {
    fn failed(path: PathBuf, error: &SchemaError, duration: Duration) -> Self {
        Self {
            status: DocumentStatus::Failed {
                message: error.to_string(),
            },
            duration,
            ..Self::empty(path)
        }
    }

    fn skipped(path: PathBuf, reason: impl Into<String>) -> Self {
        Self {
            status: DocumentStatus::Skipped {
                reason: reason.into(),
            },
            ..Self::empty(path)
        }
    }

    fn empty(path: PathBuf) -> Self {
        Self {
            path,
            status: DocumentStatus::Built,
            target_namespace: None,
            schema_count: 0,
            component_count: 0,
            unresolved_types: Vec::new(),
            unresolved_externals: 0,
            outputs: Vec::new(),
            duration: Duration::ZERO,
        }
    }
}

/// Aggregated results of processing multiple documents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingResults {
    pub total_files: usize,
    pub built_files: usize,
    pub failed_files: usize,
    pub skipped_files: usize,
    /// Wall-clock time including discovery
    pub total_duration: Duration,
    pub discovery_duration: Duration,
    pub threads: usize,
    pub file_results: Vec<DocumentResult>,
}

impl ProcessingResults {
    /// Aggregate individual document results into a summary
    pub fn aggregate(file_results: Vec<DocumentResult>) -> Self {
        let mut built_files = 0;
        let mut failed_files = 0;
        let mut skipped_files = 0;
        let mut total_duration = Duration::ZERO;

        for result in &file_results {
            match result.status {
                DocumentStatus::Built => built_files += 1,
                DocumentStatus::Failed { .. } => failed_files += 1,
                DocumentStatus::Skipped { .. } => skipped_files += 1,
            }
            total_duration += result.duration;
        }

        Self {
            total_files: file_results.len(),
            built_files,
            failed_files,
            skipped_files,
            total_duration,
            discovery_duration: Duration::ZERO,
            threads: 1,
            file_results,
        }
    }

    pub fn all_built(&self) -> bool {
        self.total_files > 0 && self.built_files == self.total_files
    }

    pub fn has_failures(&self) -> bool {
        self.failed_files > 0
    }

    /// Built documents as a percentage of all documents
    pub fn success_rate(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            (self.built_files as f64 / self.total_files as f64) * 100.0
        }
    }

    pub fn component_count(&self) -> usize {
        self.file_results.iter().map(|r| r.component_count).sum()
    }

    pub fn output_count(&self) -> usize {
        self.file_results.iter().map(|r| r.outputs.len()).sum()
    }
}

/// Per-worker state handed out by `map_init`.
///
/// The cache only holds sources weakly and every document gets a fresh
/// collection, so the worker keeps the resolved sources alive itself, up to
/// the cache capacity, for as long as it runs.
struct WorkerState {
    cache: Option<ResolutionCache>,
    pinned: HashMap<String, Arc<SchemaSource>>,
    capacity: usize,
}

impl WorkerState {
    fn new(config: Option<&CacheConfig>) -> Self {
        Self {
            cache: config.map(ResolutionCache::new),
            pinned: HashMap::new(),
            capacity: config.map_or(0, |config| config.max_entries as usize),
        }
    }

    /// Hold every source the resolver produced for `collection`. `read_directly`
    /// is the document read from disk, which never went through the cache.
    fn pin_resolved(&mut self, collection: &Collection, read_directly: Option<SchemaId>) {
        if self.cache.is_none() {
            return;
        }
        for schema in collection
            .schemas()
            .filter(|schema| Some(schema.id()) != read_directly)
        {
            let Some(source) = schema.source() else {
                continue;
            };
            if self.pinned.len() >= self.capacity && !self.pinned.contains_key(&source.locator) {
                debug!(capacity = self.capacity, "worker pin limit reached");
                return;
            }
            self.pinned
                .entry(source.locator.clone())
                .or_insert_with(|| Arc::clone(source));
        }
    }
}

impl Drop for WorkerState {
    fn drop(&mut self) {
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }
}

/// Builds schema documents in parallel, one collection per document
#[derive(Clone)]
pub struct SchemaProcessor {
    config: ProcessorConfig,
    resolver: Arc<dyn UriResolver>,
    extensions: Arc<dyn ExtensionRegistry>,
    pool: Arc<rayon::ThreadPool>,
}

impl SchemaProcessor {
    pub fn new(config: ProcessorConfig, resolver: Arc<dyn UriResolver>) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads.max(1))
            .thread_name(|index| format!("xsd-model-worker-{}", index))
            .build()
            .map_err(|e| SchemaError::Config(format!("Failed to start worker pool: {}", e)))?;

        Ok(Self {
            config,
            resolver,
            extensions: Arc::new(VerbatimExtensions),
            pool: Arc::new(pool),
        })
    }

    pub fn with_extensions(mut self, extensions: Arc<dyn ExtensionRegistry>) -> Self {
        self.extensions = extensions;
        self
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Discover documents under `path` and build each of them.
    ///
    /// Consumes the processor so that the resolver, and any blocking HTTP
    /// client it created, is dropped off the async runtime.
    pub async fn process_path(
        self,
        path: &Path,
        discovery: &FileDiscovery,
    ) -> Result<ProcessingResults> {
        let start = Instant::now();

        let files = discovery.discover_files(path).await?;
        let discovery_duration = start.elapsed();
        info!(count = files.len(), "discovered schema documents");

        let threads = self.config.threads;
        let file_results = tokio::task::spawn_blocking(move || self.process_files(&files))
            .await
            .map_err(|e| SchemaError::Config(format!("Worker task failed: {}", e)))?;

        let mut results = ProcessingResults::aggregate(file_results);
        results.discovery_duration = discovery_duration;
        results.total_duration = start.elapsed();
        results.threads = threads;
        Ok(results)
    }

    /// Build every file on the pool. Results keep the order of `files`.
    pub fn process_files(&self, files: &[PathBuf]) -> Vec<DocumentResult> {
        let stop = AtomicBool::new(false);

        self.pool.install(|| {
            files
                .par_iter()
                .map_init(
                    || WorkerState::new(self.config.cache.as_ref()),
                    |state, path| {
                        if self.config.fail_fast && stop.load(Ordering::Relaxed) {
                            return DocumentResult::skipped(
                                path.clone(),
                                "skipped after an earlier failure",
                            );
                        }
                        let result = self.process_file(path, state);
                        if result.status.is_failed() {
                            stop.store(true, Ordering::Relaxed);
                        }
                        result
                    },
                )
                .collect()
        })
    }

    /// Build one file with a fresh collection and no cache.
    pub fn process_single_file(&self, path: &Path) -> DocumentResult {
        let mut state = WorkerState::new(None);
        self.process_file(path, &mut state)
    }

    fn process_file(&self, path: &Path, state: &mut WorkerState) -> DocumentResult {
        let start = Instant::now();

        let mut collection = Collection::new()
            .with_resolver(Arc::clone(&self.resolver))
            .with_extensions(Arc::clone(&self.extensions));
        collection.set_cache(state.cache.clone());

        let result = match self.build_document(&mut collection, path, state) {
            Ok(result) => result,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "schema build failed");
                return DocumentResult::failed(path.to_path_buf(), &e, start.elapsed());
            }
        };

        DocumentResult {
            duration: start.elapsed(),
            ..result
        }
    }

    fn build_document(
        &self,
        collection: &mut Collection,
        path: &Path,
        state: &mut WorkerState,
    ) -> Result<DocumentResult> {
        self.load_known_namespaces(collection)?;

        let locator = path.to_string_lossy().into_owned();
        let existing = collection
            .schemas()
            .find(|s| s.locator() == locator)
            .map(|s| s.id());
        let id = match existing {
            // Already loaded as a known namespace
            Some(id) => id,
            None => {
                let text = std::fs::read_to_string(path)?;
                collection.build_str(&text, &locator)?
            }
        };

        state.pin_resolved(collection, existing.is_none().then_some(id));

        let outputs = match &self.config.output_dir {
            Some(dir) => self.write_outputs(collection, id, dir)?,
            None => Vec::new(),
        };

        let entry = collection.schema(id);
        Ok(DocumentResult {
            path: path.to_path_buf(),
            status: DocumentStatus::Built,
            target_namespace: Some(entry.logical_namespace().to_string())
                .filter(|namespace| !namespace.is_empty()),
            schema_count: collection.len(),
            component_count: collection.schemas().map(|s| s.component_count()).sum(),
            unresolved_types: collection
                .unresolved_type_names()
                .into_iter()
                .map(|name| name.to_string())
                .collect(),
            unresolved_externals: collection
                .schemas()
                .flat_map(|s| s.externals())
                .filter(|external| !external.is_resolved())
                .count(),
            outputs,
            duration: Duration::ZERO,
        })
    }

    fn load_known_namespaces(&self, collection: &mut Collection) -> Result<()> {
        for (namespace, location) in &self.config.known_namespaces {
            match collection.read_location(location, self.config.base_uri.as_deref())? {
                Some(id) => collection.map_namespace(namespace.clone(), id),
                None => debug!(namespace, location, "known namespace document not found"),
            }
        }
        Ok(())
    }

    fn write_outputs(
        &self,
        collection: &Collection,
        id: SchemaId,
        dir: &Path,
    ) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;

        let mut used = HashSet::new();
        let mut written = Vec::new();
        for document in collection.serialize_schema(id, self.config.recursive)? {
            let file_name = unique_file_name(document.locator(), &mut used);
            let target = dir.join(file_name);
            let text = document.to_xml_string(Some(self.config.indent))?;
            std::fs::write(&target, text)?;
            debug!(path = %target.display(), key = %document.key, "wrote schema document");
            written.push(target);
        }
        Ok(written)
    }
}

/// Last path segment of `locator`, suffixed with a counter when another
/// document of this run already took the name.
fn unique_file_name(locator: &str, used: &mut HashSet<String>) -> String {
    let base = locator
        .rsplit(['/', '\\'])
        .find(|segment| !segment.is_empty())
        .unwrap_or("schema.xsd");
    let (stem, extension) = match base.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() => (stem, Some(extension)),
        _ => (base, None),
    };

    let mut candidate = base.to_string();
    let mut counter = 1;
    while !used.insert(candidate.clone()) {
        candidate = match extension {
            Some(extension) => format!("{}-{}.{}", stem, counter, extension),
            None => format!("{}-{}", stem, counter),
        };
        counter += 1;
    }
    candidate
}
