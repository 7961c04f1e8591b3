use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::ConfigError;

/// Generation options, optionally loaded from `.ocg.yaml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneratorOptions {
    /// Directory the generated units are written to.
    pub output: String,
    pub naming: NamingConfig,
    pub client: ClientConfig,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            output: "generated_client".to_string(),
            naming: NamingConfig::default(),
            client: ClientConfig::default(),
        }
    }
}

/// Naming strategy and aliases.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    pub strategy: NamingStrategy,
    /// Map from resolved operation name (operationId or route-derived) to custom alias.
    pub aliases: IndexMap<String, String>,
}

/// How operation names are derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingStrategy {
    #[default]
    UseOperationId,
    UseRouteBased,
}

/// Client generation options.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Client class name; derived from the API title when absent.
    pub class_name: Option<String>,
    /// Overrides the base URL taken from the first server.
    pub base_url: Option<String>,
    /// Map format hints to stricter target types (`datetime`, `UUID`, ...).
    pub strict_formats: bool,
    pub no_docstrings: bool,
}

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = ".ocg.yaml";

/// Load options from a YAML file. Returns `None` if the file doesn't exist.
pub fn load_config(path: &Path) -> Result<Option<GeneratorOptions>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let options = serde_yaml_ng::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })?;
    Ok(Some(options))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = GeneratorOptions::default();
        assert_eq!(options.output, "generated_client");
        assert_eq!(options.naming.strategy, NamingStrategy::UseOperationId);
        assert!(options.naming.aliases.is_empty());
        assert!(!options.client.strict_formats);
        assert!(options.client.class_name.is_none());
    }

    #[test]
    fn test_parse_options_yaml() {
        let yaml = r#"
output: out
naming:
  strategy: use_route_based
  aliases:
    listPets: pets
client:
  class_name: PetStore
  base_url: https://api.example.com
  strict_formats: true
  no_docstrings: true
"#;
        let options: GeneratorOptions = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(options.output, "out");
        assert_eq!(options.naming.strategy, NamingStrategy::UseRouteBased);
        assert_eq!(options.naming.aliases["listPets"], "pets");
        assert_eq!(options.client.class_name.as_deref(), Some("PetStore"));
        assert_eq!(
            options.client.base_url.as_deref(),
            Some("https://api.example.com")
        );
        assert!(options.client.strict_formats);
        assert!(options.client.no_docstrings);
    }

    #[test]
    fn test_parse_minimal_options() {
        let options: GeneratorOptions = serde_yaml_ng::from_str("output: api\n").unwrap();
        assert_eq!(options.output, "api");
        assert_eq!(options.naming.strategy, NamingStrategy::UseOperationId);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_config(&dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_load_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "naming:\n  strategy: by_magic\n").unwrap();
        assert!(matches!(
            load_config(&path),
            Err(ConfigError::Parse { .. })
        ));
    }
}
