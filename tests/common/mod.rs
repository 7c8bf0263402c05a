//! Shared test utilities for the end-to-end suite.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from a suite's
//! main.rs.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Once;

pub use catalog::{
    BoolAnalyzer, DocNo, Error, IndexConfig, IndexEngine, IntegerAnalyzer, KeywordAnalyzer,
    TextAnalyzer, Value,
};
use tempfile::TempDir;

// ============================================================================
// Initialization
// ============================================================================

static INIT_TRACING: Once = Once::new();

/// Route engine logs through the test harness writer.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

// ============================================================================
// TestIndex - one engine in a scratch directory
// ============================================================================

/// An engine plus the directory that owns its files.
pub struct TestIndex {
    pub engine: Option<IndexEngine>,
    pub dir: TempDir,
}

impl TestIndex {
    /// Fresh index with the default config.
    pub fn new() -> Self {
        init_tracing();
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let engine = IndexEngine::create_dir(dir.path()).expect("Failed to create index");
        TestIndex {
            engine: Some(engine),
            dir,
        }
    }

    /// Fresh index without per-save fsync.
    pub fn unsynced() -> Self {
        init_tracing();
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let config = IndexConfig {
            sync_on_save: false,
            ..IndexConfig::default()
        };
        config
            .write_to_file(&dir.path().join(catalog::CONFIG_FILE_NAME))
            .expect("Failed to write config");
        let engine = IndexEngine::create_dir(dir.path()).expect("Failed to create index");
        TestIndex {
            engine: Some(engine),
            dir,
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn engine(&mut self) -> &mut IndexEngine {
        self.engine.as_mut().expect("index is closed")
    }

    /// Close and reopen from disk.
    pub fn reopen(&mut self) {
        if let Some(engine) = self.engine.take() {
            engine.close().expect("Failed to close index");
        }
        self.engine = Some(IndexEngine::open_dir(self.dir.path()).expect("Failed to reopen index"));
    }

    pub fn search(&mut self, term: &str) -> BTreeMap<DocNo, u32> {
        self.engine().search_word(term).expect("search failed")
    }

    /// Raw bytes of the three files.
    pub fn file_bytes(&mut self) -> Vec<Vec<u8>> {
        let paths: Vec<PathBuf> = self
            .engine()
            .paths()
            .iter()
            .map(Path::to_path_buf)
            .collect();
        paths
            .iter()
            .map(|p| std::fs::read(p).expect("Failed to read index file"))
            .collect()
    }
}

// ============================================================================
// Catalog - one index per field, as a document catalog uses them
// ============================================================================

/// A catalog record.
#[derive(Debug, Clone)]
pub struct Record {
    pub id: DocNo,
    pub title: &'static str,
    pub tags: Vec<&'static str>,
    pub year: i64,
    pub published: bool,
}

impl Record {
    pub fn new(
        id: DocNo,
        title: &'static str,
        tags: &[&'static str],
        year: i64,
        published: bool,
    ) -> Self {
        Record {
            id,
            title,
            tags: tags.to_vec(),
            year,
            published,
        }
    }

    fn tags_value(&self) -> Value {
        Value::Keywords(self.tags.iter().map(|t| t.to_string()).collect())
    }
}

/// Four field indexes living side by side under one directory.
pub struct Catalog {
    pub title: TestIndexAt,
    pub tags: TestIndexAt,
    pub year: TestIndexAt,
    pub published: TestIndexAt,
    pub dir: TempDir,
}

/// An engine over a sub-directory owned by someone else.
pub struct TestIndexAt {
    pub engine: Option<IndexEngine>,
    pub path: PathBuf,
}

impl TestIndexAt {
    fn create(path: PathBuf) -> Self {
        let engine = IndexEngine::create_dir(&path).expect("Failed to create field index");
        TestIndexAt {
            engine: Some(engine),
            path,
        }
    }

    pub fn engine(&mut self) -> &mut IndexEngine {
        self.engine.as_mut().expect("index is closed")
    }

    fn reopen(&mut self) {
        if let Some(engine) = self.engine.take() {
            engine.close().expect("Failed to close field index");
        }
        self.engine = Some(IndexEngine::open_dir(&self.path).expect("Failed to reopen field index"));
    }
}

impl Catalog {
    pub fn new() -> Self {
        init_tracing();
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        Catalog {
            title: TestIndexAt::create(dir.path().join("title")),
            tags: TestIndexAt::create(dir.path().join("tags")),
            year: TestIndexAt::create(dir.path().join("year")),
            published: TestIndexAt::create(dir.path().join("published")),
            dir,
        }
    }

    pub fn add(&mut self, record: &Record) {
        let id = record.id;
        self.title
            .engine()
            .index_value(&TextAnalyzer, &Value::from(record.title), id)
            .unwrap();
        self.tags
            .engine()
            .index_value(&KeywordAnalyzer, &record.tags_value(), id)
            .unwrap();
        self.year
            .engine()
            .index_value(&IntegerAnalyzer, &Value::Integer(record.year), id)
            .unwrap();
        self.published
            .engine()
            .index_value(&BoolAnalyzer, &Value::Bool(record.published), id)
            .unwrap();
    }

    pub fn remove(&mut self, record: &Record) {
        let id = record.id;
        self.title
            .engine()
            .unindex_value(&TextAnalyzer, &Value::from(record.title), id)
            .unwrap();
        self.tags
            .engine()
            .unindex_value(&KeywordAnalyzer, &record.tags_value(), id)
            .unwrap();
        self.year
            .engine()
            .unindex_value(&IntegerAnalyzer, &Value::Integer(record.year), id)
            .unwrap();
        self.published
            .engine()
            .unindex_value(&BoolAnalyzer, &Value::Bool(record.published), id)
            .unwrap();
    }

    pub fn save(&mut self) {
        for field in self.fields_mut() {
            field.engine().save().unwrap();
        }
    }

    pub fn reopen(&mut self) {
        for field in self.fields_mut() {
            field.reopen();
        }
    }

    fn fields_mut(&mut self) -> [&mut TestIndexAt; 4] {
        [
            &mut self.title,
            &mut self.tags,
            &mut self.year,
            &mut self.published,
        ]
    }

    /// Documents matching every `(field, term)` pair.
    pub fn query(&mut self, terms: &[(&str, &str)]) -> Vec<DocNo> {
        let mut result: Option<Vec<DocNo>> = None;
        for &(field, term) in terms {
            let index = match field {
                "title" => &mut self.title,
                "tags" => &mut self.tags,
                "year" => &mut self.year,
                "published" => &mut self.published,
                other => panic!("unknown field {}", other),
            };
            let docs: Vec<DocNo> = index.engine().search_word(term).unwrap().into_keys().collect();
            result = Some(match result {
                None => docs,
                Some(prev) => prev.into_iter().filter(|d| docs.contains(d)).collect(),
            });
        }
        result.unwrap_or_default()
    }
}
