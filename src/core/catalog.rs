//! Item catalog: bidirectional mapping between block/item identifiers and
//! display names.
//!
//! Loaded once from a JSON file (`{"items": {"minecraft:stone": "Stone"}}`),
//! read-only at runtime, reloadable on demand. A missing file degrades to an
//! empty catalog so parsing can still proceed with null display names.

use crate::core::error::StockpileError;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Deserialize)]
struct CatalogFile {
    #[serde(default)]
    items: HashMap<String, String>,
}

pub struct ItemCatalog {
    path: PathBuf,
    by_id: HashMap<String, String>,
    by_name: HashMap<String, String>,
}

impl ItemCatalog {
    pub fn load(path: &Path) -> Result<Self, StockpileError> {
        let mut catalog = Self {
            path: path.to_path_buf(),
            by_id: HashMap::new(),
            by_name: HashMap::new(),
        };
        catalog.reload()?;
        Ok(catalog)
    }

    /// Empty catalog, used when no mapping file is configured.
    pub fn empty() -> Self {
        Self {
            path: PathBuf::new(),
            by_id: HashMap::new(),
            by_name: HashMap::new(),
        }
    }

    /// Re-read the mapping file. A missing file yields an empty mapping; a
    /// present but malformed file is a decode error.
    pub fn reload(&mut self) -> Result<(), StockpileError> {
        self.by_id.clear();
        self.by_name.clear();
        if self.path.as_os_str().is_empty() || !self.path.exists() {
            return Ok(());
        }
        let content = fs::read_to_string(&self.path)?;
        let file: CatalogFile = serde_json::from_str(&content)
            .map_err(|e| StockpileError::Decode(format!("{}: {}", self.path.display(), e)))?;
        for (id, name) in file.items {
            self.by_name.insert(name.clone(), id.clone());
            self.by_id.insert(id, name);
        }
        Ok(())
    }

    pub fn display_name(&self, item_id: &str) -> Option<&str> {
        self.by_id.get(item_id).map(String::as_str)
    }

    pub fn item_id(&self, display_name: &str) -> Option<&str> {
        self.by_name.get(display_name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Case-insensitive substring search over ids and names.
    pub fn search(&self, keyword: &str) -> Vec<(&str, &str)> {
        let keyword = keyword.to_lowercase();
        let mut hits: Vec<(&str, &str)> = self
            .by_id
            .iter()
            .filter(|(id, name)| {
                id.to_lowercase().contains(&keyword) || name.to_lowercase().contains(&keyword)
            })
            .map(|(id, name)| (id.as_str(), name.as_str()))
            .collect();
        hits.sort();
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_catalog(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("item_catalog.json");
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn loads_and_reverses() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_catalog(
            tmp.path(),
            r#"{"items": {"minecraft:stone": "Stone", "minecraft:oak_sign": "Oak Sign"}}"#,
        );
        let catalog = ItemCatalog::load(&path).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.display_name("minecraft:stone"), Some("Stone"));
        assert_eq!(catalog.item_id("Oak Sign"), Some("minecraft:oak_sign"));
        assert_eq!(catalog.display_name("minecraft:dirt"), None);
    }

    #[test]
    fn missing_file_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let catalog = ItemCatalog::load(&tmp.path().join("nope.json")).unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn reload_picks_up_changes() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_catalog(tmp.path(), r#"{"items": {"minecraft:stone": "Stone"}}"#);
        let mut catalog = ItemCatalog::load(&path).unwrap();
        assert_eq!(catalog.len(), 1);
        write_catalog(tmp.path(), r#"{"items": {}}"#);
        catalog.reload().unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn search_matches_id_and_name() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_catalog(
            tmp.path(),
            r#"{"items": {"minecraft:stone": "Stone", "minecraft:stone_slab": "Stone Slab"}}"#,
        );
        let catalog = ItemCatalog::load(&path).unwrap();
        assert_eq!(catalog.search("slab").len(), 1);
        assert_eq!(catalog.search("STONE").len(), 2);
    }
}
