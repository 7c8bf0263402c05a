//! Index configuration via `index.toml`
//!
//! An index directory may carry an `index.toml` next to its three files.
//! `IndexEngine::create_dir` writes the default one if none exists; edit it
//! to rename the files or turn off the per-save fsync.

use std::path::Path;

use catalog_core::{Error, Result};
use catalog_storage::{
    IndexPaths, DEFAULT_DOCUMENTS_FILE, DEFAULT_POSITIONS_FILE, DEFAULT_TREE_FILE,
};
use serde::{Deserialize, Serialize};

/// Config file name placed in the index directory.
pub const CONFIG_FILE_NAME: &str = "index.toml";

/// Index configuration loaded from `index.toml`.
///
/// # Example
///
/// ```toml
/// tree_file = "tree"
/// documents_file = "documents"
/// positions_file = "positions"
/// sync_on_save = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// File name of the tree file inside the index directory.
    #[serde(default = "default_tree_file")]
    pub tree_file: String,
    /// File name of the documents file inside the index directory.
    #[serde(default = "default_documents_file")]
    pub documents_file: String,
    /// File name of the positions file inside the index directory.
    #[serde(default = "default_positions_file")]
    pub positions_file: String,
    /// `fsync` every file at the end of `save`.
    #[serde(default = "default_sync_on_save")]
    pub sync_on_save: bool,
}

fn default_tree_file() -> String {
    DEFAULT_TREE_FILE.to_string()
}

fn default_documents_file() -> String {
    DEFAULT_DOCUMENTS_FILE.to_string()
}

fn default_positions_file() -> String {
    DEFAULT_POSITIONS_FILE.to_string()
}

fn default_sync_on_save() -> bool {
    true
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            tree_file: default_tree_file(),
            documents_file: default_documents_file(),
            positions_file: default_positions_file(),
            sync_on_save: default_sync_on_save(),
        }
    }
}

impl IndexConfig {
    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Catalog index configuration
#
# File names of the three index files, relative to this directory.
tree_file = "tree"
documents_file = "documents"
positions_file = "positions"

# fsync every file at the end of each save (default: true).
# Turning this off is faster for bulk loads but a power loss may
# leave the three files out of step.
sync_on_save = true
"#
    }

    /// Check that the three file names are usable inside one directory.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if a name is empty, contains a path separator,
    /// collides with another name, or with the config file itself.
    pub fn validate(&self) -> Result<()> {
        let names = [
            ("tree_file", &self.tree_file),
            ("documents_file", &self.documents_file),
            ("positions_file", &self.positions_file),
        ];
        for (field, name) in names {
            if name.is_empty() {
                return Err(Error::InvalidConfig(format!("{} is empty", field)));
            }
            if name.contains('/') || name.contains('\\') {
                return Err(Error::InvalidConfig(format!(
                    "{} '{}' must be a plain file name",
                    field, name
                )));
            }
            if name == CONFIG_FILE_NAME || name == "." || name == ".." {
                return Err(Error::InvalidConfig(format!(
                    "{} '{}' is reserved",
                    field, name
                )));
            }
        }
        for (i, (field, name)) in names.iter().enumerate() {
            if let Some((other, _)) = names[i + 1..].iter().find(|(_, n)| n == name) {
                return Err(Error::InvalidConfig(format!(
                    "{} and {} are both '{}'",
                    field, other, name
                )));
            }
        }
        Ok(())
    }

    /// Locations of the three files inside `dir`.
    pub fn paths_in(&self, dir: &Path) -> IndexPaths {
        IndexPaths::in_dir(
            dir,
            &self.tree_file,
            &self.documents_file,
            &self.positions_file,
        )
    }

    /// Read, parse and validate config from a file path.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::InvalidConfig(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: IndexConfig = toml::from_str(&content).map_err(|e| {
            Error::InvalidConfig(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                Error::InvalidConfig(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        self.validate()?;
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::InvalidConfig(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            Error::InvalidConfig(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}
