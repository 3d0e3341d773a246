use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use xsd_model::cli::{Cli, VerbosityLevel};
use xsd_model::config::{Config, ConfigManager};
use xsd_model::file_discovery::FileDiscovery;
use xsd_model::output::Output;
use xsd_model::processor::{ProcessorConfig, SchemaProcessor};
use xsd_model::resolver::DefaultResolver;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse_args();
    init_tracing(cli.verbosity());

    cli.validate().map_err(anyhow::Error::msg)?;

    let config = ConfigManager::load_config(&cli)
        .await
        .context("Failed to load configuration")?;
    debug!(?config, "effective configuration");

    let discovery = FileDiscovery::new()
        .with_extensions(config.files.extensions.clone())
        .with_include_patterns(config.files.include_patterns.clone())?
        .with_exclude_patterns(config.files.exclude_patterns.clone())?
        .with_max_depth(config.files.max_depth);

    let resolver = Arc::new(DefaultResolver::new(config.resolver_config()));
    let processor = SchemaProcessor::new(ProcessorConfig::from(&config), resolver)?;

    let results = processor
        .process_path(&cli.path, &discovery)
        .await
        .with_context(|| format!("Failed to process {}", cli.path.display()))?;

    let output = Output::new(verbosity(&cli, &config), config.output.format);
    print!("{}", output.format_results(&results)?);

    Ok(if results.has_failures() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// Logs go to stderr; `RUST_LOG` takes precedence over the verbosity flags.
fn init_tracing(verbosity: VerbosityLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.filter_directive()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn verbosity(cli: &Cli, config: &Config) -> VerbosityLevel {
    if cli.debug {
        VerbosityLevel::Debug
    } else if config.output.quiet {
        VerbosityLevel::Quiet
    } else if config.output.verbose {
        VerbosityLevel::Verbose
    } else {
        VerbosityLevel::Normal
    }
}
