//! Posting lists
//!
//! Every trie node that terminates an indexed term owns a singly linked list
//! of document entries. Document numbers are unique within one list.
//!
//! ## Slot Format (16 bytes)
//!
//! ```text
//!   doc_no              u32 BE
//!   frequency           u32 BE    (length of the positions list)
//!   positions_head      link      → positions file
//!   next                link      (also the free-list link)
//! ```

use std::path::Path;

use catalog_core::codec::{decode_link, decode_u32, encode_link, encode_u32};
use catalog_core::{DocNo, Error, Result, SlotNo, VersionDate};
use tracing::debug;

use crate::positions::PositionsStore;
use crate::slot_file::{SlotFile, DOCUMENTS_LAYOUT};

const DOC_NO_OFFSET: usize = 0;
const FREQUENCY_OFFSET: usize = 4;
const POSITIONS_OFFSET: usize = 8;
const NEXT_OFFSET: usize = 12;

/// One decoded document slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentSlot {
    /// Document number
    pub doc_no: DocNo,
    /// Number of positions in the positions list
    pub frequency: u32,
    /// Head of the positions list
    pub positions_head: Option<SlotNo>,
    /// Next entry of the same posting list
    pub next: Option<SlotNo>,
}

impl DocumentSlot {
    fn encode(&self) -> [u8; 16] {
        let mut out = [0u8; 16];
        out[DOC_NO_OFFSET..FREQUENCY_OFFSET].copy_from_slice(&encode_u32(self.doc_no));
        out[FREQUENCY_OFFSET..POSITIONS_OFFSET].copy_from_slice(&encode_u32(self.frequency));
        out[POSITIONS_OFFSET..NEXT_OFFSET].copy_from_slice(&encode_link(self.positions_head));
        out[NEXT_OFFSET..].copy_from_slice(&encode_link(self.next));
        out
    }

    fn decode(data: &[u8]) -> Result<Self> {
        Ok(DocumentSlot {
            doc_no: decode_u32(&data[DOC_NO_OFFSET..])?,
            frequency: decode_u32(&data[FREQUENCY_OFFSET..])?,
            positions_head: decode_link(&data[POSITIONS_OFFSET..])?,
            next: decode_link(&data[NEXT_OFFSET..])?,
        })
    }
}

/// Store of posting lists backed by the documents file.
#[derive(Debug)]
pub struct DocumentsStore {
    file: SlotFile,
}

impl DocumentsStore {
    /// Create a fresh documents file.
    pub fn create(path: &Path, version: VersionDate) -> Result<Self> {
        Ok(DocumentsStore {
            file: SlotFile::create(path, &DOCUMENTS_LAYOUT, version)?,
        })
    }

    /// Open an existing documents file.
    pub fn open(path: &Path) -> Result<Self> {
        Ok(DocumentsStore {
            file: SlotFile::open(path, &DOCUMENTS_LAYOUT)?,
        })
    }

    /// The underlying slot file.
    pub fn file(&self) -> &SlotFile {
        &self.file
    }

    /// Mutable access to the underlying slot file.
    pub fn file_mut(&mut self) -> &mut SlotFile {
        &mut self.file
    }

    /// Give up the store, keeping its slot file.
    pub fn into_file(self) -> SlotFile {
        self.file
    }

    /// Decode one slot. The `next` link is range-checked; the positions link
    /// belongs to another file and is checked by whoever follows it.
    pub fn read(&self, slot: SlotNo) -> Result<DocumentSlot> {
        let entry = DocumentSlot::decode(self.file.read_slot(slot)?)?;
        self.file.check_link(entry.next)?;
        Ok(entry)
    }

    /// Linear scan for `doc_no`.
    pub fn find_doc(&self, head: Option<SlotNo>, doc_no: DocNo) -> Result<Option<SlotNo>> {
        for entry in self.iter(head) {
            let (slot, doc) = entry?;
            if doc.doc_no == doc_no {
                return Ok(Some(slot));
            }
        }
        Ok(None)
    }

    /// Prepend a new entry; returns the new list head.
    pub fn insert_doc(
        &mut self,
        head: Option<SlotNo>,
        doc_no: DocNo,
        positions_head: Option<SlotNo>,
        frequency: u32,
    ) -> Result<SlotNo> {
        let slot = self.file.alloc_slot()?;
        let entry = DocumentSlot {
            doc_no,
            frequency,
            positions_head,
            next: head,
        };
        self.file.write_slot(slot, &entry.encode())?;
        Ok(slot)
    }

    /// Unlink the entry for `doc_no`, free its positions and the entry itself.
    ///
    /// Returns the (possibly unchanged) list head.
    pub fn remove_doc(
        &mut self,
        head: Option<SlotNo>,
        doc_no: DocNo,
        positions: &mut PositionsStore,
    ) -> Result<Option<SlotNo>> {
        let mut prev: Option<SlotNo> = None;
        let mut found = None;
        for entry in self.iter(head) {
            let (slot, doc) = entry?;
            if doc.doc_no == doc_no {
                found = Some((slot, doc));
                break;
            }
            prev = Some(slot);
        }
        let Some((slot, doc)) = found else {
            return Ok(head);
        };

        let new_head = match prev {
            None => doc.next,
            Some(prev) => {
                self.file.write_link_field(prev, NEXT_OFFSET, doc.next)?;
                head
            }
        };
        positions.release_chain(doc.positions_head)?;
        self.file.release_slot(slot)?;
        debug!(target: "catalog::storage", doc_no, slot, "Removed document entry");
        Ok(new_head)
    }

    /// Overwrite the stored frequency of an entry.
    pub fn update_frequency(&mut self, slot: SlotNo, frequency: u32) -> Result<()> {
        self.file.write_u32_field(slot, FREQUENCY_OFFSET, frequency)
    }

    /// Overwrite the positions head of an entry.
    pub fn update_positions_head(&mut self, slot: SlotNo, head: Option<SlotNo>) -> Result<()> {
        self.file.write_link_field(slot, POSITIONS_OFFSET, head)
    }

    /// Iterate `(slot, entry)` pairs of a posting list, failing on a cycle.
    pub fn iter(&self, head: Option<SlotNo>) -> PostingChain<'_> {
        PostingChain {
            store: self,
            cursor: head,
            steps: 0,
        }
    }
}

/// Iterator over one posting list.
pub struct PostingChain<'a> {
    store: &'a DocumentsStore,
    cursor: Option<SlotNo>,
    steps: u32,
}

impl Iterator for PostingChain<'_> {
    type Item = Result<(SlotNo, DocumentSlot)>;

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.cursor.take()?;
        if self.steps >= self.store.file.number_of_slots() {
            return Some(Err(Error::invariant("cycle in posting list")));
        }
        self.steps += 1;
        if let Err(e) = self.store.file.check_link(Some(slot)) {
            return Some(Err(e));
        }
        match self.store.read(slot) {
            Ok(entry) => {
                self.cursor = entry.next;
                Some(Ok((slot, entry)))
            }
            Err(e) => Some(Err(e)),
        }
    }
}
