use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum VerbosityLevel {
    /// Only show failures
    Quiet,
    /// Show standard information
    #[default]
    Normal,
    /// Show per-schema details
    Verbose,
    /// Show all available debugging information
    Debug,
}

impl VerbosityLevel {
    /// Default `tracing` filter directive when `RUST_LOG` is not set
    pub fn filter_directive(&self) -> &'static str {
        match self {
            VerbosityLevel::Quiet => "error",
            VerbosityLevel::Normal => "warn",
            VerbosityLevel::Verbose => "info",
            VerbosityLevel::Debug => "debug",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
    Summary,
}

/// Build, resolve and re-emit XML Schema documents
#[derive(Parser, Debug, Clone)]
#[command(name = "xsd-model")]
#[command(about = "Build an object model from XML Schema documents and optionally write it back")]
#[command(version)]
pub struct Cli {
    /// Schema document or directory to scan
    #[arg(help = "Schema document or directory to process")]
    pub path: PathBuf,

    /// Configuration file (TOML or JSON)
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// File extensions to process (comma-separated)
    #[arg(
        short = 'e',
        long = "extensions",
        help = "File extensions to process (e.g., 'xsd,xs')"
    )]
    pub extensions: Option<String>,

    /// Number of worker threads
    #[arg(short = 't', long = "threads")]
    pub threads: Option<usize>,

    #[arg(short = 'v', long = "verbose", help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long = "quiet",
        help = "Quiet mode",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,

    #[arg(long = "debug", help = "Show debugging information", conflicts_with = "quiet")]
    pub debug: bool,

    #[arg(short = 'f', long = "format", value_enum)]
    pub output_format: Option<OutputFormat>,

    /// Base URI for relative known-namespace locations
    #[arg(long = "base-uri")]
    pub base_uri: Option<String>,

    /// Known namespace override, NAMESPACE=LOCATION (repeatable)
    #[arg(
        long = "known-namespace",
        value_name = "NAMESPACE=LOCATION",
        action = clap::ArgAction::Append
    )]
    pub known_namespaces: Vec<String>,

    /// Disable the per-worker resolution cache
    #[arg(long = "no-cache")]
    pub no_cache: bool,

    /// Maximum entries in each resolution cache
    #[arg(long = "cache-capacity")]
    pub cache_capacity: Option<u64>,

    /// HTTP request timeout in seconds
    #[arg(long = "timeout")]
    pub timeout: Option<u64>,

    /// Fetch http(s) schema locations
    #[arg(long = "allow-remote")]
    pub allow_remote: bool,

    /// Write re-emitted documents to this directory
    #[arg(short = 'o', long = "output-dir")]
    pub output_dir: Option<PathBuf>,

    /// Also write every schema reached through include/import/redefine
    #[arg(short = 'r', long = "recursive")]
    pub recursive: bool,

    /// Indentation width of written documents
    #[arg(long = "indent")]
    pub indent: Option<usize>,

    /// Include file patterns (glob syntax)
    #[arg(long = "include", action = clap::ArgAction::Append)]
    pub include_patterns: Vec<String>,

    /// Exclude file patterns (glob syntax)
    #[arg(long = "exclude", action = clap::ArgAction::Append)]
    pub exclude_patterns: Vec<String>,

    /// Maximum directory depth to scan
    #[arg(long = "max-depth")]
    pub max_depth: Option<usize>,

    /// Stop at the first document that fails to build
    #[arg(long = "fail-fast")]
    pub fail_fast: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn get_extensions(&self) -> Option<Vec<String>> {
        self.extensions.as_ref().map(|extensions| {
            extensions
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
    }

    /// Parsed `--known-namespace` pairs
    pub fn get_known_namespaces(&self) -> Result<Vec<(String, String)>, String> {
        self.known_namespaces
            .iter()
            .map(|pair| match pair.split_once('=') {
                Some((namespace, location)) if !location.trim().is_empty() => {
                    Ok((namespace.trim().to_string(), location.trim().to_string()))
                }
                _ => Err(format!("Expected NAMESPACE=LOCATION, got '{}'", pair)),
            })
            .collect()
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.path.exists() {
            return Err(format!("Path does not exist: {}", self.path.display()));
        }
        if let Some(threads) = self.threads
            && threads == 0
        {
            return Err("Number of threads must be greater than 0".to_string());
        }
        self.get_known_namespaces()?;
        Ok(())
    }

    pub fn verbosity(&self) -> VerbosityLevel {
        if self.quiet {
            VerbosityLevel::Quiet
        } else if self.debug {
            VerbosityLevel::Debug
        } else if self.verbose {
            VerbosityLevel::Verbose
        } else {
            VerbosityLevel::Normal
        }
    }
}
