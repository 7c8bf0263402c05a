//! Index file locations
//!
//! An index is three sibling files. By default they live together in one
//! directory:
//!
//! ```text
//! catalog/
//! ├── index.toml       # Configuration (optional)
//! ├── tree             # Character trie
//! ├── documents        # Posting lists
//! └── positions        # Position lists
//! ```

use std::path::{Path, PathBuf};

use catalog_core::{Error, Result};

/// Default file name of the tree file.
pub const DEFAULT_TREE_FILE: &str = "tree";
/// Default file name of the documents file.
pub const DEFAULT_DOCUMENTS_FILE: &str = "documents";
/// Default file name of the positions file.
pub const DEFAULT_POSITIONS_FILE: &str = "positions";

/// Paths of the three files backing one index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexPaths {
    /// Tree file
    pub tree: PathBuf,
    /// Documents file
    pub documents: PathBuf,
    /// Positions file
    pub positions: PathBuf,
}

impl IndexPaths {
    /// Explicit paths.
    pub fn new(
        tree: impl AsRef<Path>,
        documents: impl AsRef<Path>,
        positions: impl AsRef<Path>,
    ) -> Self {
        IndexPaths {
            tree: tree.as_ref().to_path_buf(),
            documents: documents.as_ref().to_path_buf(),
            positions: positions.as_ref().to_path_buf(),
        }
    }

    /// The three files, named as given, inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>, tree: &str, documents: &str, positions: &str) -> Self {
        let dir = dir.as_ref();
        IndexPaths::new(dir.join(tree), dir.join(documents), dir.join(positions))
    }

    /// The three files under their default names inside `dir`.
    pub fn default_in_dir(dir: impl AsRef<Path>) -> Self {
        IndexPaths::in_dir(
            dir,
            DEFAULT_TREE_FILE,
            DEFAULT_DOCUMENTS_FILE,
            DEFAULT_POSITIONS_FILE,
        )
    }

    /// All three files exist.
    pub fn exists(&self) -> bool {
        self.iter().all(Path::exists)
    }

    /// Check that the three paths name three different files.
    ///
    /// Paths are compared as written; `./tree` and `tree` count as equal,
    /// a symlink to the same file does not.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if two paths coincide.
    pub fn validate(&self) -> Result<()> {
        let named = [
            ("tree", &self.tree),
            ("documents", &self.documents),
            ("positions", &self.positions),
        ];
        for (i, (name, path)) in named.iter().enumerate() {
            for (other, other_path) in &named[i + 1..] {
                if path.components().eq(other_path.components()) {
                    return Err(Error::InvalidConfig(format!(
                        "{} and {} files are both '{}'",
                        name,
                        other,
                        path.display()
                    )));
                }
            }
        }
        Ok(())
    }

    /// Iterate the paths in tree, documents, positions order.
    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        [
            self.tree.as_path(),
            self.documents.as_path(),
            self.positions.as_path(),
        ]
        .into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_names() {
        let paths = IndexPaths::default_in_dir("/data/catalog");
        assert_eq!(paths.tree, PathBuf::from("/data/catalog/tree"));
        assert_eq!(paths.documents, PathBuf::from("/data/catalog/documents"));
        assert_eq!(paths.positions, PathBuf::from("/data/catalog/positions"));
    }

    #[test]
    fn test_exists_needs_all_three() {
        let dir = tempdir().unwrap();
        let paths = IndexPaths::in_dir(dir.path(), "t", "d", "p");
        assert!(!paths.exists());

        std::fs::write(&paths.tree, b"").unwrap();
        std::fs::write(&paths.documents, b"").unwrap();
        assert!(!paths.exists());

        std::fs::write(&paths.positions, b"").unwrap();
        assert!(paths.exists());
    }

    #[test]
    fn test_validate_accepts_distinct_paths() {
        IndexPaths::default_in_dir("/data/catalog").validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_shared_file() {
        let all_same = IndexPaths::new("/idx/one", "/idx/one", "/idx/one");
        assert!(matches!(all_same.validate(), Err(Error::InvalidConfig(_))));

        let dotted = IndexPaths::new("idx/tree", "idx/documents", "idx/./tree");
        let err = dotted.validate().unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
        assert!(err.to_string().contains("tree and positions"));
        assert!(!err.is_fatal());
    }
}
