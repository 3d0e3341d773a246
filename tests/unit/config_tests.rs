/// Configuration tests
///
/// These tests verify that configuration:
/// - Loads partial TOML and JSON files over defaults
/// - Accepts `XSD_MODEL_*` overrides through an injected environment
/// - Converts into processor and resolver settings
use std::collections::HashMap;
use std::path::PathBuf;

use tempfile::TempDir;

use xsd_model::config::{Config, ConfigError, ConfigManager, EnvProvider};
use xsd_model::{OutputFormat, ProcessorConfig};

struct MapEnv(HashMap<&'static str, &'static str>);

impl EnvProvider for MapEnv {
    fn get(&self, key: &str) -> Option<String> {
        self.0.get(key).map(|value| value.to_string())
    }
}

#[tokio::test]
async fn test_partial_toml_keeps_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("xsd-model.toml");
    std::fs::write(
        &path,
        r#"
[output]
format = "summary"
"#,
    )
    .unwrap();

    let config = ConfigManager::load_from_file(&path).await.unwrap();

    assert_eq!(config.output.format, OutputFormat::Summary);
    assert_eq!(config.output.indent, 2);
    assert!(config.cache.enabled);
    assert_eq!(config.files.extensions, vec!["xsd"]);
}

#[tokio::test]
async fn test_known_namespaces_from_json() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("xsd-model.json");
    std::fs::write(
        &path,
        r#"{ "builder": { "known_namespaces": { "urn:common": "common/base.xsd" } } }"#,
    )
    .unwrap();

    let config = ConfigManager::load_from_file(&path).await.unwrap();
    let processor = ProcessorConfig::from(&config);

    assert_eq!(
        processor.known_namespaces,
        vec![("urn:common".to_string(), "common/base.xsd".to_string())]
    );
}

#[test]
fn test_environment_layer() {
    let env = MapEnv(HashMap::from([
        ("XSD_MODEL_CACHE_CAPACITY", "64"),
        ("XSD_MODEL_QUIET", "true"),
        ("XSD_MODEL_BASE_URI", "https://example.org/schemas/"),
    ]));

    let config = ConfigManager::apply_environment_overrides_with(&env, Config::default()).unwrap();

    assert_eq!(config.cache.max_entries, 64);
    assert!(config.output.quiet);
    assert_eq!(
        config.builder.base_uri.as_deref(),
        Some("https://example.org/schemas/")
    );
}

#[test]
fn test_invalid_format_in_environment() {
    let env = MapEnv(HashMap::from([("XSD_MODEL_FORMAT", "yaml")]));
    let result = ConfigManager::apply_environment_overrides_with(&env, Config::default());
    assert!(matches!(result, Err(ConfigError::Environment(_))));
}

#[test]
fn test_processor_settings() {
    let mut config = Config::default();
    config.builder.threads = Some(3);
    config.builder.fail_fast = true;
    config.cache.enabled = false;
    config.output.directory = Some(PathBuf::from("out"));
    config.output.recursive = true;
    config.output.indent = 4;

    let processor = ProcessorConfig::from(&config);

    assert_eq!(processor.threads, 3);
    assert!(processor.fail_fast);
    assert!(processor.cache.is_none());
    assert_eq!(processor.output_dir, Some(PathBuf::from("out")));
    assert!(processor.recursive);
    assert_eq!(processor.indent, 4);
}

#[test]
fn test_empty_known_namespace_location_rejected() {
    let mut config = Config::default();
    config
        .builder
        .known_namespaces
        .insert("urn:x".to_string(), " ".to_string());

    assert!(matches!(
        ConfigManager::validate_config(&config),
        Err(ConfigError::Validation(_))
    ));
}
