//! Index engine for the catalog
//!
//! This crate sits on top of the slotted stores:
//! - IndexEngine: staging, search, save, close
//! - Staging maps with insert/remove cancellation
//! - Analyzers turning field values into terms
//! - Configuration via `index.toml`
//! - Inspection: term dump, integrity check, stats
//!
//! The engine is the only component that knows about staging; the stores
//! below it only know slots and links.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analyzer;
pub mod config;
pub mod index;
pub mod staging;

pub use analyzer::{
    Analyzer, BoolAnalyzer, IntegerAnalyzer, KeywordAnalyzer, TextAnalyzer, Value, Words,
};
pub use config::{IndexConfig, CONFIG_FILE_NAME};
pub use index::{EngineStats, IndexEngine, TermEntry};
pub use staging::{StagedPostings, StagingArea};
