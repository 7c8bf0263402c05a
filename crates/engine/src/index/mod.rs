//! The index engine
//!
//! [`IndexEngine`] owns the three stores and the staging maps. Mutations
//! are staged in memory; [`IndexEngine::save`] applies them to the stores
//! and flushes. Searches see committed state overlaid with staged changes.
//!
//! # Poisoning
//!
//! An I/O error, corrupt data or a broken invariant observed by any call
//! that touches the stores poisons the engine: staged changes are lost
//! and every later call fails with [`Error::Poisoned`] until the files are
//! reopened. [`IndexEngine::close`] still works on a poisoned engine.

mod commit;
mod inspect;

pub use inspect::{EngineStats, TermEntry};

use std::cell::Cell;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use catalog_core::{DocNo, Error, Position, Result, VersionDate};
use catalog_storage::{build_skeleton, DocumentsStore, IndexPaths, PositionsStore, TreeStore};
use tracing::{info, warn};

use crate::analyzer::{Analyzer, Value};
use crate::config::{IndexConfig, CONFIG_FILE_NAME};
use crate::staging::StagingArea;

/// A persistent trie-backed inverted index.
///
/// Not internally synchronised: one caller at a time. Engines over distinct
/// file sets are independent.
#[derive(Debug)]
pub struct IndexEngine {
    // Field order is drop order: positions, then documents, then tree.
    positions: PositionsStore,
    documents: DocumentsStore,
    tree: TreeStore,
    staging: StagingArea,
    paths: IndexPaths,
    config: IndexConfig,
    poisoned: Cell<bool>,
}

impl IndexEngine {
    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Open an existing index from its three files.
    ///
    /// # Errors
    ///
    /// `IoError` if a file cannot be opened, `CorruptData` if a header or
    /// slot width does not match.
    pub fn open(
        tree_path: impl AsRef<Path>,
        documents_path: impl AsRef<Path>,
        positions_path: impl AsRef<Path>,
    ) -> Result<Self> {
        let paths = IndexPaths::new(tree_path, documents_path, positions_path);
        Self::open_with_config(paths, IndexConfig::default())
    }

    /// Create a new, empty index, truncating any existing files.
    pub fn create(
        tree_path: impl AsRef<Path>,
        documents_path: impl AsRef<Path>,
        positions_path: impl AsRef<Path>,
    ) -> Result<Self> {
        let paths = IndexPaths::new(tree_path, documents_path, positions_path);
        Self::create_with_config(paths, IndexConfig::default())
    }

    /// Open an existing index with explicit settings.
    ///
    /// Only `sync_on_save` is taken from `config`; the file names come from
    /// `paths`.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if two of the paths name the same file.
    pub fn open_with_config(paths: IndexPaths, config: IndexConfig) -> Result<Self> {
        paths.validate()?;
        let tree = TreeStore::open(&paths.tree)?;
        let documents = DocumentsStore::open(&paths.documents)?;
        let positions = PositionsStore::open(&paths.positions)?;
        info!(
            target: "catalog::engine",
            tree = ?paths.tree,
            version = %tree.file().header().version,
            tree_slots = tree.file().number_of_slots(),
            document_slots = documents.file().number_of_slots(),
            position_slots = positions.file().number_of_slots(),
            "Opened index"
        );
        Ok(IndexEngine {
            positions,
            documents,
            tree,
            staging: StagingArea::new(),
            paths,
            config,
            poisoned: Cell::new(false),
        })
    }

    /// Create a new index with explicit settings.
    ///
    /// Fails with `InvalidConfig`, before touching any file, if two of the
    /// paths name the same file.
    pub fn create_with_config(paths: IndexPaths, config: IndexConfig) -> Result<Self> {
        let version = VersionDate::today();
        build_skeleton(&paths, version)?;
        info!(target: "catalog::engine", tree = ?paths.tree, version = %version, "Created index");
        Self::open_with_config(paths, config)
    }

    /// Create a new index inside `dir`.
    ///
    /// # Flow
    ///
    /// 1. Create the directory if needed
    /// 2. Write a default `index.toml` unless one exists
    /// 3. Read and validate it
    /// 4. Build the three files under the configured names
    pub fn create_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let config_path = dir.join(CONFIG_FILE_NAME);
        IndexConfig::write_default_if_missing(&config_path)?;
        let config = IndexConfig::from_file(&config_path)?;
        Self::create_with_config(config.paths_in(dir), config)
    }

    /// Open the index inside `dir`, reading `index.toml` if present.
    pub fn open_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let config_path = dir.join(CONFIG_FILE_NAME);
        let config = if config_path.exists() {
            IndexConfig::from_file(&config_path)?
        } else {
            IndexConfig::default()
        };
        Self::open_with_config(config.paths_in(dir), config)
    }

    /// Close the index, releasing the stores positions first, tree last.
    ///
    /// Unsaved staged changes are discarded.
    pub fn close(self) -> Result<()> {
        let IndexEngine {
            positions,
            documents,
            tree,
            staging,
            paths,
            ..
        } = self;
        if !staging.is_empty() {
            warn!(
                target: "catalog::engine",
                added = staging.added_pairs(),
                removed = staging.removed_pairs(),
                "Closing index with unsaved changes"
            );
        }
        positions.into_file().close()?;
        documents.into_file().close()?;
        tree.into_file().close()?;
        info!(target: "catalog::engine", tree = ?paths.tree, "Closed index");
        Ok(())
    }

    // ========================================================================
    // Staging
    // ========================================================================

    /// Stage one occurrence of `term` at `position` in `doc_no`.
    ///
    /// Cancels a pending removal of the same pair. Never touches disk.
    pub fn index_term(&mut self, term: &str, doc_no: DocNo, position: Position) -> Result<()> {
        self.ensure_usable()?;
        self.staging.stage_insert(term, doc_no, position);
        Ok(())
    }

    /// Stage the removal of `doc_no` from `term`.
    ///
    /// A pending insertion of the same pair is cancelled instead. Removing
    /// a pair that is not indexed is a no-op at save time.
    pub fn unindex_term(&mut self, term: &str, doc_no: DocNo) -> Result<()> {
        self.ensure_usable()?;
        self.staging.stage_removal(term, doc_no);
        Ok(())
    }

    /// Stage every term `analyzer` yields for `value`.
    ///
    /// Returns the number of `(term, position)` pairs staged.
    pub fn index_value<A: Analyzer>(
        &mut self,
        analyzer: &A,
        value: &Value,
        doc_no: DocNo,
    ) -> Result<usize> {
        self.ensure_usable()?;
        let mut staged = 0;
        for (term, position) in analyzer.split(value) {
            self.staging.stage_insert(&term, doc_no, position);
            staged += 1;
        }
        Ok(staged)
    }

    /// Stage the removal of `doc_no` from every distinct term `analyzer`
    /// yields for `value`.
    ///
    /// Returns the number of distinct terms.
    pub fn unindex_value<A: Analyzer>(
        &mut self,
        analyzer: &A,
        value: &Value,
        doc_no: DocNo,
    ) -> Result<usize> {
        self.ensure_usable()?;
        let terms: BTreeSet<String> = analyzer.split(value).map(|(term, _)| term).collect();
        for term in &terms {
            self.staging.stage_removal(term, doc_no);
        }
        Ok(terms.len())
    }

    // ========================================================================
    // Search
    // ========================================================================

    /// Documents containing `term`, with the number of occurrences in each.
    ///
    /// Committed postings are overlaid with staged removals and insertions.
    /// An unknown or empty term gives an empty map.
    pub fn search_word(&self, term: &str) -> Result<BTreeMap<DocNo, u32>> {
        self.ensure_usable()?;
        if term.is_empty() {
            return Ok(BTreeMap::new());
        }
        let mut hits = self.guard(self.committed_postings(term))?;

        if let Some(removed) = self.staging.removed(term) {
            for doc_no in removed {
                hits.remove(doc_no);
            }
        }
        if let Some(added) = self.staging.added(term) {
            for (&doc_no, staged) in added {
                let count = u32::try_from(staged.len()).unwrap_or(u32::MAX);
                if staged.replaces_committed {
                    hits.insert(doc_no, count);
                } else {
                    let entry = hits.entry(doc_no).or_insert(0);
                    *entry = entry.saturating_add(count);
                }
            }
        }
        Ok(hits)
    }

    fn committed_postings(&self, term: &str) -> Result<BTreeMap<DocNo, u32>> {
        let mut hits = BTreeMap::new();
        let Some(node) = self.tree.walk(term)? else {
            return Ok(hits);
        };
        for entry in self.documents.iter(self.tree.documents_head(node)?) {
            let (_, doc) = entry?;
            hits.insert(doc.doc_no, doc.frequency);
        }
        Ok(hits)
    }

    // ========================================================================
    // State
    // ========================================================================

    /// Whether an earlier failure poisoned this engine.
    pub fn is_poisoned(&self) -> bool {
        self.poisoned.get()
    }

    /// Locations of the three files.
    pub fn paths(&self) -> &IndexPaths {
        &self.paths
    }

    /// Settings in effect.
    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Version stamp of the tree file.
    pub fn version(&self) -> VersionDate {
        self.tree.file().header().version
    }

    fn ensure_usable(&self) -> Result<()> {
        if self.poisoned.get() {
            return Err(Error::Poisoned);
        }
        Ok(())
    }

    /// Poison on fatal errors, pass everything through.
    fn guard<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            if e.is_fatal() && !self.poisoned.replace(true) {
                warn!(target: "catalog::engine", error = %e, tree = ?self.paths.tree, "Index engine poisoned");
            }
        }
        result
    }
}
