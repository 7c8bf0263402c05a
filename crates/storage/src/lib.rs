//! Storage layer for the catalog index
//!
//! This crate implements the three slotted files behind an index:
//! - SlotFile: fixed-width slots, header, free-list, dirty tracking
//! - PositionsStore: per-document position lists
//! - DocumentsStore: per-term posting lists
//! - TreeStore: the character trie
//! - Skeleton builder and index paths
//! - Offline integrity check
//!
//! # Write model
//!
//! Every store mirrors its file body in memory. Mutations touch the mirror
//! and mark slots dirty; nothing reaches the disk until [`SlotFile::flush`].
//! Dropping or closing a store with unflushed writes discards them.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod documents;
pub mod integrity;
pub mod paths;
pub mod positions;
pub mod skeleton;
pub mod slot_file;
pub mod testing;
pub mod tree;

pub use documents::{DocumentSlot, DocumentsStore, PostingChain};
pub use integrity::{verify, IntegrityReport};
pub use paths::{IndexPaths, DEFAULT_DOCUMENTS_FILE, DEFAULT_POSITIONS_FILE, DEFAULT_TREE_FILE};
pub use positions::{PositionChain, PositionSlot, PositionsStore};
pub use skeleton::build_skeleton;
pub use slot_file::{
    FileHeader, SlotFile, SlotLayout, DOCUMENTS_LAYOUT, POSITIONS_LAYOUT, TREE_LAYOUT,
};
pub use tree::{NodeId, PreOrder, SiblingChain, TreeSlot, TreeStore, TrieEntry};
