//! File corruption utilities
//!
//! # Corruption Types
//!
//! - Truncation: removes bytes from a file tail (crash during a save)
//! - Garbage: appends bytes that are not a whole slot (partial write)
//! - Word overwrite: replaces one big-endian word in the header or a slot
//!   (stray write, bad link)

use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use catalog_core::codec::encode_u32;

use crate::documents::DocumentsStore;
use crate::integrity::{verify, IntegrityReport};
use crate::paths::IndexPaths;
use crate::positions::PositionsStore;
use crate::slot_file::{SlotLayout, DOCUMENTS_LAYOUT, POSITIONS_LAYOUT, TREE_LAYOUT};
use crate::tree::TreeStore;

/// One of the three index files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexFile {
    /// The tree file
    Tree,
    /// The documents file
    Documents,
    /// The positions file
    Positions,
}

impl IndexFile {
    /// Layout of this file.
    pub fn layout(self) -> &'static SlotLayout {
        match self {
            IndexFile::Tree => &TREE_LAYOUT,
            IndexFile::Documents => &DOCUMENTS_LAYOUT,
            IndexFile::Positions => &POSITIONS_LAYOUT,
        }
    }
}

/// Index corruption test utilities
pub struct IndexCorruptionTester {
    paths: IndexPaths,
}

impl IndexCorruptionTester {
    /// Create a tester for the index at `paths`
    pub fn new(paths: IndexPaths) -> Self {
        IndexCorruptionTester { paths }
    }

    /// Path of one file
    pub fn path(&self, file: IndexFile) -> &Path {
        match file {
            IndexFile::Tree => &self.paths.tree,
            IndexFile::Documents => &self.paths.documents,
            IndexFile::Positions => &self.paths.positions,
        }
    }

    /// Current length of one file in bytes
    pub fn file_len(&self, file: IndexFile) -> std::io::Result<u64> {
        Ok(std::fs::metadata(self.path(file))?.len())
    }

    /// Truncate a file tail by removing bytes
    ///
    /// Removing more bytes than the file holds empties it.
    pub fn truncate_tail(
        &self,
        file: IndexFile,
        bytes_to_remove: u64,
    ) -> std::io::Result<TruncationResult> {
        let path = self.path(file).to_path_buf();
        let original_size = self.file_len(file)?;
        let new_size = original_size.saturating_sub(bytes_to_remove);

        let handle = std::fs::OpenOptions::new().write(true).open(&path)?;
        handle.set_len(new_size)?;

        Ok(TruncationResult {
            path,
            original_size,
            new_size,
            bytes_removed: original_size - new_size,
        })
    }

    /// Append raw bytes to a file tail
    pub fn append_garbage(&self, file: IndexFile, garbage: &[u8]) -> std::io::Result<GarbageResult> {
        let path = self.path(file).to_path_buf();
        let original_size = self.file_len(file)?;

        let mut handle = std::fs::OpenOptions::new().append(true).open(&path)?;
        handle.write_all(garbage)?;

        Ok(GarbageResult {
            path,
            original_size,
            new_size: original_size + garbage.len() as u64,
            bytes_appended: garbage.len(),
        })
    }

    /// Overwrite the big-endian word at an absolute byte offset
    pub fn overwrite_u32(
        &self,
        file: IndexFile,
        offset: u64,
        value: u32,
    ) -> std::io::Result<CorruptionResult> {
        let path = self.path(file).to_path_buf();
        let mut handle = std::fs::OpenOptions::new().write(true).open(&path)?;
        handle.seek(SeekFrom::Start(offset))?;
        handle.write_all(&encode_u32(value))?;
        handle.sync_all()?;

        Ok(CorruptionResult {
            path,
            offset,
            value,
        })
    }

    /// Overwrite a header word (`offset` within the header)
    pub fn corrupt_header(
        &self,
        file: IndexFile,
        offset: usize,
        value: u32,
    ) -> std::io::Result<CorruptionResult> {
        self.overwrite_u32(file, offset as u64, value)
    }

    /// Overwrite a word inside one slot (`offset` within the slot)
    pub fn corrupt_slot(
        &self,
        file: IndexFile,
        slot: u32,
        offset: usize,
        value: u32,
    ) -> std::io::Result<CorruptionResult> {
        let layout = file.layout();
        let absolute = layout.header_size as u64
            + slot as u64 * layout.slot_size as u64
            + offset as u64;
        self.overwrite_u32(file, absolute, value)
    }

    /// Reopen the three files and run the integrity check
    ///
    /// Never panics; any failure is reported in the result.
    pub fn verify_open(&self) -> OpenVerification {
        let result = TreeStore::open(&self.paths.tree).and_then(|tree| {
            let documents = DocumentsStore::open(&self.paths.documents)?;
            let positions = PositionsStore::open(&self.paths.positions)?;
            verify(&tree, &documents, &positions)
        });
        match result {
            Ok(report) => OpenVerification {
                opened: true,
                error: None,
                report: Some(report),
            },
            Err(e) => OpenVerification {
                opened: false,
                error: Some(e.to_string()),
                report: None,
            },
        }
    }
}

/// Result of a truncation
#[derive(Debug)]
pub struct TruncationResult {
    /// File that was truncated
    pub path: PathBuf,
    /// Original file size
    pub original_size: u64,
    /// New file size after truncation
    pub new_size: u64,
    /// Bytes removed
    pub bytes_removed: u64,
}

/// Result of appending garbage
#[derive(Debug)]
pub struct GarbageResult {
    /// File that was modified
    pub path: PathBuf,
    /// Original file size
    pub original_size: u64,
    /// New file size after append
    pub new_size: u64,
    /// Bytes appended
    pub bytes_appended: usize,
}

/// Result of a word overwrite
#[derive(Debug)]
pub struct CorruptionResult {
    /// File that was modified
    pub path: PathBuf,
    /// Absolute byte offset of the word
    pub offset: u64,
    /// Value written
    pub value: u32,
}

/// Result of [`IndexCorruptionTester::verify_open`]
#[derive(Debug)]
pub struct OpenVerification {
    /// Whether the files opened and passed the integrity check
    pub opened: bool,
    /// Error message if they did not
    pub error: Option<String>,
    /// Integrity counts on success
    pub report: Option<IntegrityReport>,
}
