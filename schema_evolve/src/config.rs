//! Configuration handling for schema_evolve

use serde::{Deserialize, Serialize};
use std::fs;

use crate::error::{Error, Result};

/// Load configuration from a TOML file
pub fn load_from_file(path: &str) -> Result<Config> {
    let config_str = fs::read_to_string(path)
        .map_err(|e| Error::ConfigError(format!("Failed to read config file: {}", e)))?;

    load_from_str(&config_str)
}

/// Parse and validate configuration from a TOML string
pub fn load_from_str(config_str: &str) -> Result<Config> {
    let config: Config = toml::from_str(config_str)
        .map_err(|e| Error::ConfigError(format!("Failed to parse config file: {}", e)))?;

    config.validate()?;
    Ok(config)
}

/// Represents the complete schema_evolve configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub directory: DirectoryConfig,
    pub models: ModelsConfig,
    pub resolver: ResolverConfig,
    pub diff: DiffConfig,
    pub validation: ValidationConfig,
    pub naming: NamingConfig,
    pub logging: Option<LoggingConfig>,
}

impl Config {
    /// Check the configuration for values no component can work with
    pub fn validate(&self) -> Result<()> {
        if self.directory.data_path.trim().is_empty() {
            return Err(Error::ConfigError("directory.data_path must not be empty".to_string()));
        }

        if self.models.paths.is_empty() {
            return Err(Error::ConfigError("models.paths must list at least one directory".to_string()));
        }

        if self.models.extensions.is_empty() {
            return Err(Error::ConfigError("models.extensions must not be empty".to_string()));
        }

        let patterns = [
            ("naming.primary_key_pattern", &self.naming.primary_key_pattern, &["{table}"][..]),
            ("naming.index_pattern", &self.naming.index_pattern, &["{table}"][..]),
            (
                "naming.relation_pattern",
                &self.naming.relation_pattern,
                &["{table}", "{reference}"][..],
            ),
        ];

        for (key, pattern, placeholders) in patterns {
            for placeholder in placeholders {
                if !pattern.contains(placeholder) {
                    return Err(Error::ConfigError(format!(
                        "{} must contain the '{}' placeholder",
                        key, placeholder
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Location of the migration data directory
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct DirectoryConfig {
    pub data_path: String,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            data_path: "data".to_string(),
        }
    }
}

/// Table definition discovery configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ModelsConfig {
    /// Directories scanned for definition files. Relative paths are resolved
    /// against the working directory.
    pub paths: Vec<String>,
    pub exclude_paths: Option<Vec<String>>,
    pub recursive_scan: bool,
    pub extensions: Vec<String>,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            paths: vec!["data/models".to_string()],
            exclude_paths: None,
            recursive_scan: true,
            extensions: vec!["yaml".to_string(), "yml".to_string()],
        }
    }
}

/// Inheritance resolution behavior
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct ResolverConfig {
    /// Reject groups with several base fragments or with branching chains
    /// instead of following the first one found.
    pub strict: bool,
}

/// Schema comparison behavior
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct DiffConfig {
    pub compare_relations: bool,
    pub compare_unique_indexes: bool,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            compare_relations: true,
            compare_unique_indexes: true,
        }
    }
}

/// Schema lint configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ValidationConfig {
    pub enabled: bool,
    pub naming_rules: bool,
    pub recommended_columns: bool,
    pub fail_on_error: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            naming_rules: true,
            recommended_columns: false,
            fail_on_error: true,
        }
    }
}

/// Naming conventions checked by the validator
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct NamingConfig {
    pub primary_key_pattern: String,
    pub index_pattern: String,
    pub relation_pattern: String,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            primary_key_pattern: "{table}_id".to_string(),
            index_pattern: "idx_{table}".to_string(),
            relation_pattern: "fk_{reference}___{table}".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    pub format: String,
    pub stdout: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            format: "text".to_string(),
            stdout: true,
        }
    }
}
