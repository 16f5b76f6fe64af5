//! Configuration management for the CLI
//!
//! This module handles loading configuration from:
//! - Default values
//! - Configuration files (YAML/JSON/TOML)
//! - The `TESSERA_CONFIG` environment variable (through `--config`)
//!
//! Command-line arguments are applied on top by the handlers.

use crate::cli::ConfigFormat;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tessera_schema::{Draft, OutputFormat, ValidationOptions};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Engine settings
    pub validation: ValidationSection,

    /// Schema documents available to `$ref`
    pub schemas: SchemaSection,

    /// Message template overrides, keyed by message key
    pub templates: BTreeMap<String, String>,

    /// Logging settings
    pub logging: LoggingSection,
}

/// Engine settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationSection {
    /// Result shape reported by `validate`
    pub format: OutputFormat,

    /// Draft used when a schema neither declares nor implies one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_draft: Option<Draft>,

    /// Draft forced on schemas without `$schema`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft: Option<Draft>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaSection {
    /// Directories whose documents are preloaded into the registry
    pub directories: Vec<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level (trace, debug, info, warn, error)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    /// Log format (compact, full, json)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl ConfigFormat {
    /// Pick a format from a file extension; JSON is the fallback
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => ConfigFormat::Yaml,
            Some("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Json,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content, ConfigFormat::from_path(path))
            .map_err(|e| Error::config(format!("{}: {}", path.display(), e)))
    }

    /// Parse configuration text
    pub fn parse(content: &str, format: ConfigFormat) -> Result<Self> {
        let config = match format {
            ConfigFormat::Yaml => serde_yaml::from_str(content)?,
            ConfigFormat::Json => serde_json::from_str(content)?,
            ConfigFormat::Toml => toml::from_str(content).map_err(|e| Error::config(e.to_string()))?,
        };
        Ok(config)
    }

    /// Render configuration in the given format
    pub fn render(&self, format: ConfigFormat) -> Result<String> {
        let content = match format {
            ConfigFormat::Yaml => serde_yaml::to_string(self)?,
            ConfigFormat::Json => serde_json::to_string_pretty(self)?,
            ConfigFormat::Toml => toml::to_string_pretty(self)
                .map_err(|e| Error::config(format!("Failed to serialize as TOML: {}", e)))?,
        };
        Ok(content)
    }

    /// Load configuration from default locations
    ///
    /// The first file found wins; without one the defaults apply.
    pub fn load() -> Result<Self> {
        for path in Self::default_config_paths() {
            if path.exists() {
                tracing::debug!(path = %path.display(), "Loading configuration file");
                return Self::from_file(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load configuration from a specific file or default locations
    pub fn load_with_file(file: Option<&Path>) -> Result<Self> {
        match file {
            Some(path) => Self::from_file(path),
            None => Self::load(),
        }
    }

    /// Get default configuration file paths to check
    fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from(".tessera.yaml"),
            PathBuf::from(".tessera.yml"),
            PathBuf::from(".tessera.json"),
            PathBuf::from(".tessera.toml"),
        ];

        if let Some(dir) = Self::user_config_dir() {
            paths.push(dir.join("config.yaml"));
            paths.push(dir.join("config.json"));
            paths.push(dir.join("config.toml"));
        }

        paths
    }

    /// Directory holding the user-level configuration
    pub fn user_config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tessera"))
    }

    /// Save configuration to a file in the format its extension names
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = self.render(ConfigFormat::from_path(path))?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Engine options described by this configuration
    pub fn validation_options(&self) -> ValidationOptions {
        let mut options = ValidationOptions::new().with_output_format(self.validation.format);
        if let Some(draft) = self.validation.default_draft {
            options = options.with_default_draft(draft);
        }
        if let Some(draft) = self.validation.draft {
            options = options.with_draft(draft);
        }
        for (key, template) in &self.templates {
            options = options.with_template(key.clone(), template.clone());
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_yaml_configuration() {
        let content = r#"
validation:
  format: basic
  default_draft: draft-07
schemas:
  directories: [schemas, vendor/schemas]
templates:
  minimum: "too small"
logging:
  level: debug
"#;
        let config = Config::parse(content, ConfigFormat::Yaml).unwrap();
        assert_eq!(config.validation.format, OutputFormat::Basic);
        assert_eq!(config.validation.default_draft, Some(Draft::Draft07));
        assert_eq!(config.validation.draft, None);
        assert_eq!(config.schemas.directories.len(), 2);
        assert_eq!(config.templates["minimum"], "too small");
        assert_eq!(config.logging.level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_missing_sections_take_defaults() {
        let config = Config::parse("{}", ConfigFormat::Json).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.validation.format, OutputFormat::Detailed);
    }

    #[test]
    fn test_unknown_draft_is_a_parse_error() {
        let parsed = Config::parse(r#"{"validation": {"draft": "draft-03"}}"#, ConfigFormat::Json);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_render_and_parse_every_format() {
        let mut config = Config::default();
        config.validation.draft = Some(Draft::Draft2019_09);
        config.schemas.directories.push(PathBuf::from("defs"));
        config.templates.insert("type".to_string(), "wrong type".to_string());

        for format in [ConfigFormat::Yaml, ConfigFormat::Json, ConfigFormat::Toml] {
            let text = config.render(format).unwrap();
            assert_eq!(Config::parse(&text, format).unwrap(), config);
        }
    }

    #[test]
    fn test_from_file_picks_format_by_extension() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[validation]\nformat = \"verbose\"").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.validation.format, OutputFormat::Verbose);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.yaml");
        assert!(matches!(
            Config::load_with_file(Some(&missing)),
            Err(Error::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        Config::default().save(&path).unwrap();
        assert_eq!(Config::from_file(&path).unwrap(), Config::default());
    }

    #[test]
    fn test_validation_options_carry_settings() {
        let mut config = Config::default();
        config.validation.format = OutputFormat::Verbose;
        config.validation.default_draft = Some(Draft::Draft06);
        config.templates.insert("minimum".to_string(), "low".to_string());

        let options = config.validation_options();
        assert_eq!(options.output_format, OutputFormat::Verbose);
        assert_eq!(options.default_draft, Draft::Draft06);
        assert_eq!(options.draft, None);
        assert_eq!(options.templates.get("minimum"), Some("low"));
    }
}
