use crate::cache;
use crate::cli::{Cli, OutputFormat};
use crate::error::SchemaError;
use crate::resolver::ResolverConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Source of `XSD_MODEL_*` variables, injectable for tests
pub trait EnvProvider {
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads the process environment
pub struct SystemEnvProvider;

impl EnvProvider for SystemEnvProvider {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML configuration: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("Invalid JSON configuration: {0}")]
    JsonParsing(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Validation(String),

    #[error("Invalid environment override: {0}")]
    Environment(String),

    #[error("Unsupported configuration file format: {0}")]
    UnsupportedFormat(String),
}

impl From<ConfigError> for SchemaError {
    fn from(err: ConfigError) -> Self {
        SchemaError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;

const ENV_PREFIX: &str = "XSD_MODEL_";

/// Looked up in the working directory, then in `<config dir>/xsd-model/`
const CONFIG_NAMES: [&str; 4] = [
    "xsd-model.toml",
    "xsd-model.json",
    ".xsd-model.toml",
    ".xsd-model.json",
];

/// Everything the binary can be told, from any layer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub builder: BuilderConfig,
    pub cache: CacheSettings,
    pub network: NetworkConfig,
    pub output: OutputConfig,
    pub files: FileConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct BuilderConfig {
    /// Base URI for relative known-namespace locations
    pub base_uri: Option<String>,
    /// Namespace -> location, loaded up front and consulted for imports without a location
    pub known_namespaces: BTreeMap<String, String>,
    /// Worker threads; the CPU count when unset
    pub threads: Option<usize>,
    /// Stop at the first document that fails to build
    pub fail_fast: bool,
}

/// Per-worker resolution cache
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheSettings {
    pub enabled: bool,
    pub max_entries: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: cache::CacheConfig::default().max_entries,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NetworkConfig {
    /// Fetch `http(s)` locations
    pub allow_remote: bool,
    pub timeout_seconds: u64,
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        let resolver = ResolverConfig::default();
        Self {
            allow_remote: false,
            timeout_seconds: resolver.timeout_seconds,
            retry_attempts: resolver.retry_attempts,
            retry_delay_ms: resolver.retry_delay_ms,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub verbose: bool,
    /// Failures only
    pub quiet: bool,
    /// Directory for re-emitted documents; nothing is written when unset
    pub directory: Option<PathBuf>,
    /// Also emit schemas reached through externals
    pub recursive: bool,
    /// Indentation width of written documents
    pub indent: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Human,
            verbose: false,
            quiet: false,
            directory: None,
            recursive: false,
            indent: 2,
        }
    }
}

/// Which files under the input path are schema documents
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FileConfig {
    pub extensions: Vec<String>,
    /// Globs relative to the input directory
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
    pub max_depth: Option<usize>,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["xsd".to_string()],
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            max_depth: None,
        }
    }
}

impl Config {
    /// `None` when the cache is switched off
    pub fn cache_config(&self) -> Option<cache::CacheConfig> {
        self.cache.enabled.then(|| cache::CacheConfig {
            max_entries: self.cache.max_entries,
        })
    }

    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            allow_remote: self.network.allow_remote,
            timeout_seconds: self.network.timeout_seconds,
            retry_attempts: self.network.retry_attempts,
            retry_delay_ms: self.network.retry_delay_ms,
            ..ResolverConfig::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileFormat {
    Toml,
    Json,
}

impl FileFormat {
    /// `Ok(None)` for a file without extension
    fn from_path(path: &Path) -> Result<Option<Self>> {
        match path.extension().and_then(|ext| ext.to_str()) {
            None => Ok(None),
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Ok(Some(FileFormat::Toml)),
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(Some(FileFormat::Json)),
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
        }
    }

    fn parse(self, content: &str) -> Result<Config> {
        Ok(match self {
            FileFormat::Toml => toml::from_str(content)?,
            FileFormat::Json => serde_json::from_str(content)?,
        })
    }
}

type EnvSetter = fn(&mut Config, &str) -> std::result::Result<(), String>;

/// `XSD_MODEL_<suffix>` variables and the setting each one replaces
const ENV_OVERRIDES: &[(&str, EnvSetter)] = &[
    ("BASE_URI", |c, v| {
        c.builder.base_uri = Some(v.to_string());
        Ok(())
    }),
    ("THREADS", |c, v| {
        c.builder.threads = Some(parse_value(v)?);
        Ok(())
    }),
    ("FAIL_FAST", |c, v| {
        c.builder.fail_fast = parse_value(v)?;
        Ok(())
    }),
    ("CACHE", |c, v| {
        c.cache.enabled = parse_value(v)?;
        Ok(())
    }),
    ("CACHE_CAPACITY", |c, v| {
        c.cache.max_entries = parse_value(v)?;
        Ok(())
    }),
    ("ALLOW_REMOTE", |c, v| {
        c.network.allow_remote = parse_value(v)?;
        Ok(())
    }),
    ("TIMEOUT", |c, v| {
        c.network.timeout_seconds = parse_value(v)?;
        Ok(())
    }),
    ("RETRY_ATTEMPTS", |c, v| {
        c.network.retry_attempts = parse_value(v)?;
        Ok(())
    }),
    ("VERBOSE", |c, v| {
        c.output.verbose = parse_value(v)?;
        Ok(())
    }),
    ("QUIET", |c, v| {
        c.output.quiet = parse_value(v)?;
        Ok(())
    }),
    ("FORMAT", |c, v| {
        c.output.format = match v.trim().to_lowercase().as_str() {
            "human" => OutputFormat::Human,
            "json" => OutputFormat::Json,
            "summary" => OutputFormat::Summary,
            _ => return Err(format!("unknown format '{}'", v)),
        };
        Ok(())
    }),
    ("OUTPUT_DIR", |c, v| {
        c.output.directory = Some(PathBuf::from(v));
        Ok(())
    }),
    ("EXTENSIONS", |c, v| {
        c.files.extensions = split_list(v);
        Ok(())
    }),
];

fn parse_value<T: std::str::FromStr>(value: &str) -> std::result::Result<T, String> {
    value
        .trim()
        .parse()
        .map_err(|_| format!("cannot parse '{}'", value))
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Loads and layers configuration
pub struct ConfigManager;

impl ConfigManager {
    /// Defaults, then the config file, then `XSD_MODEL_*`, then the command line
    pub async fn load_config(cli: &Cli) -> Result<Config> {
        let config = match &cli.config {
            Some(path) => Self::load_from_file(path).await?,
            None => Self::find_config_file().await?.unwrap_or_default(),
        };

        let config = Self::apply_environment_overrides(config)?;
        let config = Self::merge_with_cli(config, cli)?;

        Self::validate_config(&config)?;
        Ok(config)
    }

    /// TOML or JSON by extension; a file without one is tried as TOML, then JSON.
    /// Missing keys take defaults.
    pub async fn load_from_file(path: &Path) -> Result<Config> {
        let format = FileFormat::from_path(path)?;
        let content = tokio::fs::read_to_string(path).await?;

        match format {
            Some(format) => format.parse(&content),
            None => FileFormat::Toml
                .parse(&content)
                .or_else(|_| FileFormat::Json.parse(&content)),
        }
    }

    pub async fn find_config_file() -> Result<Option<Config>> {
        let user_dir = dirs::config_dir().map(|dir| dir.join("xsd-model"));
        let candidates = CONFIG_NAMES.iter().map(PathBuf::from).chain(
            user_dir
                .iter()
                .flat_map(|dir| CONFIG_NAMES.iter().map(move |name| dir.join(name))),
        );

        for path in candidates {
            if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                return Self::load_from_file(&path).await.map(Some);
            }
        }
        Ok(None)
    }

    pub fn apply_environment_overrides(config: Config) -> Result<Config> {
        Self::apply_environment_overrides_with(&SystemEnvProvider, config)
    }

    pub fn apply_environment_overrides_with(
        env: &impl EnvProvider,
        mut config: Config,
    ) -> Result<Config> {
        for (suffix, apply) in ENV_OVERRIDES {
            let name = format!("{}{}", ENV_PREFIX, suffix);
            if let Some(value) = env.get(&name) {
                apply(&mut config, &value)
                    .map_err(|reason| ConfigError::Environment(format!("{}: {}", name, reason)))?;
            }
        }
        Ok(config)
    }

    /// Only options given on the command line override; absent flags keep
    /// the configured value. Known namespaces are added to the configured map.
    pub fn merge_with_cli(mut config: Config, cli: &Cli) -> Result<Config> {
        let builder = &mut config.builder;
        if let Some(base_uri) = &cli.base_uri {
            builder.base_uri = Some(base_uri.clone());
        }
        builder.known_namespaces.extend(
            cli.get_known_namespaces()
                .map_err(ConfigError::Validation)?,
        );
        builder.threads = cli.threads.or(builder.threads);
        builder.fail_fast |= cli.fail_fast;

        config.cache.enabled &= !cli.no_cache;
        if let Some(capacity) = cli.cache_capacity {
            config.cache.max_entries = capacity;
        }

        config.network.allow_remote |= cli.allow_remote;
        if let Some(timeout) = cli.timeout {
            config.network.timeout_seconds = timeout;
        }

        let output = &mut config.output;
        if let Some(format) = cli.output_format {
            output.format = format;
        }
        if cli.verbose || cli.debug {
            output.verbose = true;
            output.quiet = false;
        }
        if cli.quiet {
            output.quiet = true;
            output.verbose = false;
        }
        if let Some(directory) = &cli.output_dir {
            output.directory = Some(directory.clone());
        }
        output.recursive |= cli.recursive;
        if let Some(indent) = cli.indent {
            output.indent = indent;
        }

        let files = &mut config.files;
        if let Some(extensions) = cli.get_extensions() {
            files.extensions = extensions;
        }
        if !cli.include_patterns.is_empty() {
            files.include_patterns = cli.include_patterns.clone();
        }
        if !cli.exclude_patterns.is_empty() {
            files.exclude_patterns = cli.exclude_patterns.clone();
        }
        files.max_depth = cli.max_depth.or(files.max_depth);

        Ok(config)
    }

    /// Reports every problem found, not just the first.
    pub fn validate_config(config: &Config) -> Result<()> {
        let mut problems = Vec::new();

        match config.builder.threads {
            Some(0) => problems.push("threads must be greater than 0".to_string()),
            Some(threads) if threads > 1000 => {
                problems.push(format!("threads cannot exceed 1000 (got {})", threads))
            }
            _ => {}
        }
        for (namespace, location) in &config.builder.known_namespaces {
            if location.trim().is_empty() {
                problems.push(format!("known namespace '{}' has an empty location", namespace));
            }
        }

        if config.cache.enabled && config.cache.max_entries == 0 {
            problems.push(
                "cache capacity must be greater than 0 when the cache is enabled".to_string(),
            );
        }

        if config.network.timeout_seconds == 0 {
            problems.push("timeout must be greater than 0".to_string());
        }
        if config.network.retry_attempts > 10 {
            problems.push("retry attempts cannot exceed 10".to_string());
        }

        if config.output.verbose && config.output.quiet {
            problems.push("verbose and quiet are mutually exclusive".to_string());
        }
        if config.output.indent > 16 {
            problems.push("indentation cannot exceed 16 columns".to_string());
        }

        if config.files.extensions.is_empty() {
            problems.push("at least one file extension is required".to_string());
        }
        problems.extend(
            config
                .files
                .extensions
                .iter()
                .filter(|ext| ext.contains(['/', '\\', '.']))
                .map(|ext| format!("invalid file extension '{}'", ext)),
        );

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(problems.join("; ")))
        }
    }

    pub fn get_thread_count(config: &Config) -> usize {
        config.builder.threads.unwrap_or_else(num_cpus::get)
    }
}
