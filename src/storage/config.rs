//! Configuration handling for fixproj
//!
//! Settings come from an optional global `config.toml` (in the platform
//! config directory, or wherever `--config`/`FIXPROJ_CONFIG` points) and an
//! optional `.fixproj.toml` next to the project file. Keys set in the
//! project file win; nested tables are merged key by key.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{FixOptions, Vocabulary};

/// Name of the per-project configuration file
pub const PROJECT_CONFIG_FILE: &str = ".fixproj.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Effective settings for one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Order items of each type by include value
    pub sort_items: bool,

    /// Canonicalize property groups
    pub sort_properties: bool,

    /// Drop repeated include values
    pub delete_duplicates: bool,

    /// Drop items pointing at files that do not exist
    pub delete_missing: bool,

    /// Keep a timestamped copy of the file before overwriting it
    pub backup: bool,

    /// Extensions recognized when the target is a directory
    pub extensions: Vec<String>,

    /// Element and attribute names
    pub vocabulary: Vocabulary,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sort_items: true,
            sort_properties: true,
            delete_duplicates: true,
            delete_missing: true,
            backup: false,
            extensions: ["csproj", "vbproj", "fsproj", "vcxproj", "proj"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            vocabulary: Vocabulary::default(),
        }
    }
}

impl Config {
    /// Loads configuration for a project living in `project_dir`.
    ///
    /// `global_override` replaces the platform config location.
    pub fn load(project_dir: &Path, global_override: Option<&Path>) -> Result<Self> {
        let global_path = match global_override {
            Some(path) => Some(path.to_path_buf()),
            None => Self::global_config_dir().map(|dir| dir.join("config.toml")),
        };

        let global = match global_path {
            Some(path) if path.is_file() => Some(
                fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read global config: {}", path.display()))?,
            ),
            Some(path) if global_override.is_some() => {
                anyhow::bail!("Config file not found: {}", path.display())
            }
            _ => None,
        };

        let project_path = project_dir.join(PROJECT_CONFIG_FILE);
        let project = if project_path.is_file() {
            Some(fs::read_to_string(&project_path).with_context(|| {
                format!("Failed to read project config: {}", project_path.display())
            })?)
        } else {
            None
        };

        Self::from_layers(global.as_deref(), project.as_deref()).context("Failed to load configuration")
    }

    /// Builds configuration from global and project TOML sources
    pub fn from_layers(global: Option<&str>, project: Option<&str>) -> Result<Self, ConfigError> {
        let mut merged = toml::Table::new();
        for source in [global, project].into_iter().flatten() {
            let table: toml::Table =
                toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
            merge_tables(&mut merged, table);
        }

        let config: Config = toml::Value::Table(merged)
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Returns the global config directory
    pub fn global_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("dev", "fixproj", "fixproj").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Pipeline switches for the processor
    pub fn fix_options(&self) -> FixOptions {
        FixOptions {
            delete_duplicates: self.delete_duplicates,
            delete_missing: self.delete_missing,
            sort_items: self.sort_items,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let vocab = &self.vocabulary;
        for (key, value) in [
            ("item_group", &vocab.item_group),
            ("property_group", &vocab.property_group),
            ("include", &vocab.include),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("vocabulary.{} must not be empty", key)));
            }
        }
        if vocab.item_group == vocab.property_group {
            return Err(ConfigError::Invalid(
                "vocabulary.item_group and vocabulary.property_group must differ".to_string(),
            ));
        }
        Ok(())
    }
}

/// Overlays `overlay` onto `base`, merging nested tables
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        if let toml::Value::Table(incoming) = value {
            if let Some(toml::Value::Table(existing)) = base.get_mut(&key) {
                merge_tables(existing, incoming);
                continue;
            }
            base.insert(key, toml::Value::Table(incoming));
        } else {
            base.insert(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config() {
        let config = Config::from_layers(None, None).unwrap();

        assert_eq!(config, Config::default());
        assert!(config.sort_items);
        assert!(!config.backup);
        assert_eq!(config.fix_options(), FixOptions::default());
    }

    #[test]
    fn project_layer_overrides_global() {
        let global = r#"
backup = true
sort_items = false
"#;
        let project = r#"
sort_items = true
"#;

        let config = Config::from_layers(Some(global), Some(project)).unwrap();
        assert!(config.backup);
        assert!(config.sort_items);
    }

    #[test]
    fn vocabulary_tables_merge_per_key() {
        let global = r#"
[vocabulary]
include = "Path"
"#;
        let project = r#"
[vocabulary]
non_file_items = ["Reference", "Custom"]
"#;

        let config = Config::from_layers(Some(global), Some(project)).unwrap();
        assert_eq!(config.vocabulary.include, "Path");
        assert_eq!(config.vocabulary.non_file_items, vec!["Reference", "Custom"]);
        assert_eq!(config.vocabulary.item_group, "ItemGroup");
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = Config::from_layers(Some("sort_items = "), None).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn rejects_empty_vocabulary_names() {
        let err = Config::from_layers(None, Some("[vocabulary]\ninclude = \"\"")).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn load_reads_project_file_and_explicit_global() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(PROJECT_CONFIG_FILE), "delete_missing = false\n").unwrap();
        let global = dir.path().join("global.toml");
        fs::write(&global, "backup = true\n").unwrap();

        let config = Config::load(dir.path(), Some(&global)).unwrap();
        assert!(!config.delete_missing);
        assert!(config.backup);
    }

    #[test]
    fn load_fails_for_missing_explicit_global() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.toml");

        assert!(Config::load(dir.path(), Some(&missing)).is_err());
    }
}
