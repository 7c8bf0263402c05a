//! Catalog - persistent trie-backed inverted index
//!
//! Catalog stores, for every indexed term, the documents it occurs in and
//! the word positions inside each document. Three slotted files hold a
//! character trie, the posting lists and the position lists.
//!
//! # Quick Start
//!
//! ```ignore
//! use catalog::{IndexEngine, TextAnalyzer, Value};
//!
//! let mut index = IndexEngine::create_dir("/data/catalog")?;
//! index.index_value(&TextAnalyzer, &Value::from("The quick brown fox"), 7)?;
//! index.save()?;
//!
//! let hits = index.search_word("fox")?;
//! assert_eq!(hits.get(&7), Some(&1));
//! ```
//!
//! # Architecture
//!
//! All operations go through [`IndexEngine`]. Changes are staged in memory
//! and written by [`IndexEngine::save`]. The storage layer is exposed for
//! offline inspection tools.

pub use catalog_core::{DocNo, Error, Position, Result, SlotNo, VersionDate, NIL};
pub use catalog_engine::*;
pub use catalog_storage::{IndexPaths, IntegrityReport};

/// Slotted stores behind the engine, for inspection tools.
pub mod storage {
    pub use catalog_storage::*;
}
