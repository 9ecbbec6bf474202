//! Parsed, validated runtime configuration.
//!
//! Every field is named and carries an explicit default; nothing reads
//! configuration keys dynamically at call sites.

use crate::core::error::StockpileError;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "stockpile.toml";

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_catalog_file() -> PathBuf {
    PathBuf::from("data/item_catalog.json")
}

fn default_staging_ttl_secs() -> u64 {
    300
}

fn default_text_encoding() -> String {
    "gb18030".to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Directory holding the SQLite database.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Item catalog JSON file (id -> display name).
    #[serde(default = "default_catalog_file")]
    pub catalog_file: PathBuf,
    /// Seconds an announced project waits for its material file.
    #[serde(default = "default_staging_ttl_secs")]
    pub staging_ttl_secs: u64,
    /// Fallback encoding for delimited text exports that are not UTF-8.
    #[serde(default = "default_text_encoding")]
    pub text_encoding: String,
    /// Base identifiers dropped outright during merge.
    #[serde(default)]
    pub exclude: HashSet<String>,
    /// Base identifier remapping applied during merge (identity if absent).
    #[serde(default)]
    pub remap: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            catalog_file: default_catalog_file(),
            staging_ttl_secs: default_staging_ttl_secs(),
            text_encoding: default_text_encoding(),
            exclude: HashSet::new(),
            remap: HashMap::new(),
        }
    }
}

impl Config {
    /// Load `stockpile.toml` from `dir`, falling back to defaults when the
    /// file does not exist.
    pub fn load(dir: &Path) -> Result<Self, StockpileError> {
        let path = dir.join(CONFIG_FILE_NAME);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| StockpileError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), StockpileError> {
        if self.staging_ttl_secs == 0 {
            return Err(StockpileError::Config(
                "staging_ttl_secs must be positive".to_string(),
            ));
        }
        if encoding_rs::Encoding::for_label(self.text_encoding.as_bytes()).is_none() {
            return Err(StockpileError::Config(format!(
                "unknown text_encoding label: {}",
                self.text_encoding
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.staging_ttl_secs, 300);
    }

    #[test]
    fn rejects_unknown_encoding() {
        let config = Config {
            text_encoding: "not-a-charset".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_merge_rules() {
        let config: Config = toml::from_str(
            r#"
            exclude = ["minecraft:water"]
            [remap]
            "minecraft:grass_block" = "minecraft:dirt"
            "#,
        )
        .unwrap();
        assert!(config.exclude.contains("minecraft:water"));
        assert_eq!(
            config.remap.get("minecraft:grass_block").map(String::as_str),
            Some("minecraft:dirt")
        );
    }
}
