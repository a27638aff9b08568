use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::ConfigError;
use crate::graph::Size;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogSource {
    Bundled,
    /// Ask the executor, falling back to the bundled catalog
    #[default]
    Executor,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StorageConfig {
    #[default]
    Memory,
    File { dir: PathBuf },
    Executor,
}

/// Editor settings, kept as JSON on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub catalog_source: CatalogSource,
    pub storage: StorageConfig,
    pub default_node_size: [f64; 2],
    /// Horizontal gap used when placing nodes automatically
    pub node_spacing: f64,
    pub flag_stale_selections: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            catalog_source: CatalogSource::default(),
            storage: StorageConfig::default(),
            default_node_size: [240.0, 96.0],
            node_spacing: 280.0,
            flag_stale_selections: true,
        }
    }
}

impl EditorConfig {
    pub fn node_size(&self) -> Size {
        Size::new(self.default_node_size[0], self.default_node_size[1])
    }

    /// Read the config at `path`, writing the defaults there first if the
    /// file does not exist yet.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !fs::try_exists(path).await? {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).await?;
            }
            Self::default().save(path).await?;
        }

        let content = fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write through a temporary file and rename into place
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;

        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, json).await?;
        fs::rename(&temp_path, path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: EditorConfig =
            serde_json::from_str(r#"{"storage": {"kind": "file", "dir": "/tmp/graphs"}}"#).unwrap();

        assert_eq!(config.storage, StorageConfig::File { dir: PathBuf::from("/tmp/graphs") });
        assert_eq!(config.catalog_source, CatalogSource::Executor);
        assert_eq!(config.node_size(), Size::new(240.0, 96.0));
        assert!(config.flag_stale_selections);
    }
}
