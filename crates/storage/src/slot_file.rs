//! Fixed-width slotted files
//!
//! Each of the three index files is a header followed by a body of
//! equally sized slots. Freed slots are chained through one of their link
//! fields; the header keeps the head of that chain.
//!
//! ## File Format
//!
//! ```text
//! HEADER:
//!   version_date        u32 BE   (proleptic Gregorian ordinal)
//!   number_of_slots     u32 BE
//!   first_root_child    link     (tree file only)
//!   first_empty         link
//!
//! BODY:
//!   slot 0 .. slot n-1, each `slot_size` bytes
//! ```
//!
//! Slot 0 is reserved. It is written as a placeholder (all bytes `0xFF`)
//! the first time the file grows, so no link ever points at it.
//!
//! The whole body is mirrored in memory. Writes land in the mirror and are
//! tracked as dirty slots; [`SlotFile::flush`] writes them out followed by
//! the header.

use std::collections::BTreeSet;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use catalog_core::codec::{decode_link, decode_u32, encode_link, encode_u32};
use catalog_core::{Error, Result, SlotNo, VersionDate, NIL};
use tracing::{debug, warn};

// ============================================================================
// SlotLayout
// ============================================================================

/// Static description of one slotted file flavour.
#[derive(Debug, PartialEq, Eq)]
pub struct SlotLayout {
    /// Short name used in logs and error messages
    pub name: &'static str,
    /// Header width in bytes
    pub header_size: usize,
    /// Slot width in bytes
    pub slot_size: usize,
    /// Byte offset, within a slot, of the link that chains free slots
    pub free_link_offset: usize,
    /// Whether the header carries a `first_root_child` link
    pub has_root_link: bool,
}

/// Trie nodes: `char | documents_head | first_child | next_sibling`.
pub const TREE_LAYOUT: SlotLayout = SlotLayout {
    name: "tree",
    header_size: 16,
    slot_size: 16,
    free_link_offset: 12,
    has_root_link: true,
};

/// Posting entries: `doc_no | frequency | positions_head | next`.
pub const DOCUMENTS_LAYOUT: SlotLayout = SlotLayout {
    name: "documents",
    header_size: 12,
    slot_size: 16,
    free_link_offset: 12,
    has_root_link: false,
};

/// Position entries: `position | next`.
pub const POSITIONS_LAYOUT: SlotLayout = SlotLayout {
    name: "positions",
    header_size: 12,
    slot_size: 8,
    free_link_offset: 4,
    has_root_link: false,
};

// ============================================================================
// FileHeader
// ============================================================================

/// Decoded header of a slotted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    /// Format version stamp
    pub version: VersionDate,
    /// Highest slot index ever allocated plus one (never decreases)
    pub number_of_slots: u32,
    /// First child of the virtual trie root; always `None` outside the tree file
    pub first_root_child: Option<SlotNo>,
    /// Head of the free-list
    pub first_empty: Option<SlotNo>,
}

impl FileHeader {
    /// Header of a brand-new, empty file.
    pub fn skeleton(version: VersionDate) -> Self {
        FileHeader {
            version,
            number_of_slots: 0,
            first_root_child: None,
            first_empty: None,
        }
    }

    /// Serialize for the given layout.
    pub fn encode(&self, layout: &SlotLayout) -> Vec<u8> {
        let mut buf = Vec::with_capacity(layout.header_size);
        buf.extend_from_slice(&self.version.encode());
        buf.extend_from_slice(&encode_u32(self.number_of_slots));
        if layout.has_root_link {
            buf.extend_from_slice(&encode_link(self.first_root_child));
        }
        buf.extend_from_slice(&encode_link(self.first_empty));
        debug_assert_eq!(buf.len(), layout.header_size);
        buf
    }

    /// Deserialize for the given layout. Links are not range-checked here.
    pub fn decode(data: &[u8], layout: &SlotLayout) -> Result<Self> {
        if data.len() < layout.header_size {
            return Err(Error::corrupt(format!(
                "{} header truncated: {} of {} bytes",
                layout.name,
                data.len(),
                layout.header_size
            )));
        }
        let version = VersionDate::decode(&data[0..4])?;
        let number_of_slots = decode_u32(&data[4..8])?;
        let (first_root_child, first_empty) = if layout.has_root_link {
            (decode_link(&data[8..12])?, decode_link(&data[12..16])?)
        } else {
            (None, decode_link(&data[8..12])?)
        };
        Ok(FileHeader {
            version,
            number_of_slots,
            first_root_child,
            first_empty,
        })
    }
}

// ============================================================================
// SlotFile
// ============================================================================

/// A slotted file with an in-memory mirror of its body.
pub struct SlotFile {
    layout: &'static SlotLayout,
    path: PathBuf,
    file: File,
    header: FileHeader,
    body: Vec<u8>,
    dirty: BTreeSet<SlotNo>,
    header_dirty: bool,
}

impl SlotFile {
    /// Create (or truncate) the file and write a skeleton header.
    pub fn create(path: &Path, layout: &'static SlotLayout, version: VersionDate) -> Result<Self> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        let header = FileHeader::skeleton(version);
        file.write_all(&header.encode(layout))?;
        file.sync_all()?;
        debug!(target: "catalog::storage", file = layout.name, path = ?path, "Created slot file");
        Ok(SlotFile {
            layout,
            path: path.to_path_buf(),
            file,
            header,
            body: Vec::new(),
            dirty: BTreeSet::new(),
            header_dirty: false,
        })
    }

    /// Open an existing file, loading header and body.
    ///
    /// A zero-length file is initialised with a skeleton header stamped today.
    pub fn open(path: &Path, layout: &'static SlotLayout) -> Result<Self> {
        let mut file = OpenOptions::new().read(true).write(true).open(path)?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;

        if data.is_empty() {
            let header = FileHeader::skeleton(VersionDate::today());
            file.write_all(&header.encode(layout))?;
            file.sync_all()?;
            debug!(target: "catalog::storage", file = layout.name, path = ?path, "Initialised empty slot file");
            return Ok(SlotFile {
                layout,
                path: path.to_path_buf(),
                file,
                header,
                body: Vec::new(),
                dirty: BTreeSet::new(),
                header_dirty: false,
            });
        }

        let header = FileHeader::decode(&data, layout)?;
        let body = data.split_off(layout.header_size);
        if body.len() % layout.slot_size != 0
            || body.len() / layout.slot_size != header.number_of_slots as usize
        {
            return Err(Error::corrupt(format!(
                "{} slot width mismatch: {} body bytes for {} slots of {} bytes",
                layout.name,
                body.len(),
                header.number_of_slots,
                layout.slot_size
            )));
        }

        let slot_file = SlotFile {
            layout,
            path: path.to_path_buf(),
            file,
            header,
            body,
            dirty: BTreeSet::new(),
            header_dirty: false,
        };
        slot_file.check_link(header.first_empty)?;
        slot_file.check_link(header.first_root_child)?;
        Ok(slot_file)
    }

    /// The layout this file was opened with.
    pub fn layout(&self) -> &'static SlotLayout {
        self.layout
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current in-memory header.
    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    /// Highest slot index ever allocated plus one.
    pub fn number_of_slots(&self) -> u32 {
        self.header.number_of_slots
    }

    /// Head of the free-list.
    pub fn first_empty(&self) -> Option<SlotNo> {
        self.header.first_empty
    }

    /// First child of the virtual trie root.
    pub fn first_root_child(&self) -> Option<SlotNo> {
        self.header.first_root_child
    }

    /// Replace the first child of the virtual trie root.
    pub fn set_first_root_child(&mut self, link: Option<SlotNo>) -> Result<()> {
        if !self.layout.has_root_link {
            return Err(Error::invariant(format!(
                "{} file has no root link",
                self.layout.name
            )));
        }
        self.check_link(link)?;
        self.header.first_root_child = link;
        self.header_dirty = true;
        Ok(())
    }

    /// Whether there are writes not yet flushed to disk.
    pub fn is_dirty(&self) -> bool {
        self.header_dirty || !self.dirty.is_empty()
    }

    /// Validate a decoded link against the slot count.
    pub fn check_link(&self, link: Option<SlotNo>) -> Result<Option<SlotNo>> {
        match link {
            Some(0) => Err(Error::corrupt(format!(
                "{} link points at reserved slot 0",
                self.layout.name
            ))),
            Some(n) if n >= self.header.number_of_slots => Err(Error::corrupt(format!(
                "{} link {} beyond {} slots",
                self.layout.name, n, self.header.number_of_slots
            ))),
            other => Ok(other),
        }
    }

    fn slot_range(&self, slot: SlotNo) -> Result<std::ops::Range<usize>> {
        if slot >= self.header.number_of_slots {
            return Err(Error::corrupt(format!(
                "{} slot {} beyond {} slots",
                self.layout.name, slot, self.header.number_of_slots
            )));
        }
        let start = slot as usize * self.layout.slot_size;
        Ok(start..start + self.layout.slot_size)
    }

    // ------------------------------------------------------------------------
    // Slot access
    // ------------------------------------------------------------------------

    /// Borrow the raw bytes of a slot.
    pub fn read_slot(&self, slot: SlotNo) -> Result<&[u8]> {
        let range = self.slot_range(slot)?;
        Ok(&self.body[range])
    }

    /// Overwrite a whole slot.
    pub fn write_slot(&mut self, slot: SlotNo, bytes: &[u8]) -> Result<()> {
        if bytes.len() != self.layout.slot_size {
            return Err(Error::invariant(format!(
                "{} slot write of {} bytes, expected {}",
                self.layout.name,
                bytes.len(),
                self.layout.slot_size
            )));
        }
        let range = self.slot_range(slot)?;
        self.body[range].copy_from_slice(bytes);
        self.dirty.insert(slot);
        Ok(())
    }

    /// Read a big-endian `u32` field of a slot.
    pub fn read_u32_field(&self, slot: SlotNo, offset: usize) -> Result<u32> {
        let bytes = self.read_slot(slot)?;
        decode_u32(&bytes[offset..])
    }

    /// Read and range-check a link field of a slot.
    pub fn read_link_field(&self, slot: SlotNo, offset: usize) -> Result<Option<SlotNo>> {
        let bytes = self.read_slot(slot)?;
        let link = decode_link(&bytes[offset..])?;
        self.check_link(link)
    }

    /// Write a big-endian `u32` field of a slot.
    pub fn write_u32_field(&mut self, slot: SlotNo, offset: usize, value: u32) -> Result<()> {
        self.write_field(slot, offset, &encode_u32(value))
    }

    /// Write a link field of a slot.
    pub fn write_link_field(
        &mut self,
        slot: SlotNo,
        offset: usize,
        link: Option<SlotNo>,
    ) -> Result<()> {
        self.write_field(slot, offset, &encode_link(link))
    }

    fn write_field(&mut self, slot: SlotNo, offset: usize, bytes: &[u8]) -> Result<()> {
        let range = self.slot_range(slot)?;
        let start = range.start + offset;
        self.body[start..start + bytes.len()].copy_from_slice(bytes);
        self.dirty.insert(slot);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Allocation
    // ------------------------------------------------------------------------

    /// Make sure the reserved slot 0 exists.
    pub fn ensure_reserved(&mut self) {
        if self.header.number_of_slots == 0 {
            self.body.resize(self.layout.slot_size, 0xFF);
            self.header.number_of_slots = 1;
            self.header_dirty = true;
            self.dirty.insert(0);
        }
    }

    /// Hand out a slot, popping the free-list before growing the file.
    ///
    /// The returned slot's contents are unspecified; the caller must write
    /// every field before anything links to it.
    pub fn alloc_slot(&mut self) -> Result<SlotNo> {
        match self.header.first_empty {
            Some(slot) => {
                let next = self.read_link_field(slot, self.layout.free_link_offset)?;
                self.header.first_empty = next;
                self.header_dirty = true;
                debug!(target: "catalog::storage", file = self.layout.name, slot, "Reused free slot");
                Ok(slot)
            }
            None => {
                self.ensure_reserved();
                let slot = self.header.number_of_slots;
                if slot >= NIL - 1 {
                    return Err(Error::invariant(format!(
                        "{} file has no slot numbers left",
                        self.layout.name
                    )));
                }
                let new_len = self.body.len() + self.layout.slot_size;
                self.body.resize(new_len, 0xFF);
                self.header.number_of_slots = slot + 1;
                self.header_dirty = true;
                self.dirty.insert(slot);
                debug!(target: "catalog::storage", file = self.layout.name, slot, "Grew slot file");
                Ok(slot)
            }
        }
    }

    /// Push a single slot onto the free-list.
    pub fn release_slot(&mut self, slot: SlotNo) -> Result<()> {
        self.release_chain(slot, slot)
    }

    /// Splice an already linked chain `head ..= tail` onto the free-list.
    ///
    /// Only the tail's free link and the header are written.
    pub fn release_chain(&mut self, head: SlotNo, tail: SlotNo) -> Result<()> {
        self.check_link(Some(head))?;
        self.check_link(Some(tail))?;
        self.write_link_field(tail, self.layout.free_link_offset, self.header.first_empty)?;
        self.header.first_empty = Some(head);
        self.header_dirty = true;
        Ok(())
    }

    /// Walk the free-list, failing on a cycle.
    pub fn free_slots(&self) -> Result<Vec<SlotNo>> {
        let mut slots = Vec::new();
        let mut cursor = self.header.first_empty;
        while let Some(slot) = cursor {
            if slots.len() >= self.header.number_of_slots as usize {
                return Err(Error::invariant(format!(
                    "{} free-list longer than the file",
                    self.layout.name
                )));
            }
            slots.push(slot);
            cursor = self.read_link_field(slot, self.layout.free_link_offset)?;
        }
        Ok(slots)
    }

    // ------------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------------

    /// Re-read the header from disk, discarding in-memory header changes.
    pub fn load_header(&mut self) -> Result<()> {
        let mut buf = vec![0u8; self.layout.header_size];
        self.file.seek(SeekFrom::Start(0))?;
        self.file.read_exact(&mut buf)?;
        let header = FileHeader::decode(&buf, self.layout)?;
        if header.number_of_slots as usize * self.layout.slot_size != self.body.len() {
            return Err(Error::corrupt(format!(
                "{} header claims {} slots, body holds {}",
                self.layout.name,
                header.number_of_slots,
                self.body.len() / self.layout.slot_size
            )));
        }
        self.header = header;
        self.header_dirty = false;
        Ok(())
    }

    /// Write the in-memory header to disk.
    pub fn store_header(&mut self) -> Result<()> {
        let bytes = self.header.encode(self.layout);
        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(&bytes)?;
        self.header_dirty = false;
        Ok(())
    }

    /// Write dirty slots (contiguous runs in one write each), then the header.
    ///
    /// Returns the number of slots written.
    pub fn flush(&mut self, sync: bool) -> Result<usize> {
        let slot_size = self.layout.slot_size;
        let dirty = std::mem::take(&mut self.dirty);
        let written = dirty.len();
        let mut slots = dirty.into_iter().peekable();
        while let Some(start) = slots.next() {
            let mut end = start;
            while let Some(&next) = slots.peek() {
                if next != end + 1 {
                    break;
                }
                end = next;
                slots.next();
            }
            let from = start as usize * slot_size;
            let to = (end as usize + 1) * slot_size;
            self.file
                .seek(SeekFrom::Start((self.layout.header_size + from) as u64))?;
            self.file.write_all(&self.body[from..to])?;
        }
        if self.header_dirty {
            self.store_header()?;
        }
        if sync {
            self.file.sync_data()?;
        }
        Ok(written)
    }

    /// Sync and close the file. Unflushed writes are discarded.
    pub fn close(mut self) -> Result<()> {
        self.discard_unflushed();
        self.file.sync_all()?;
        Ok(())
    }

    fn discard_unflushed(&mut self) {
        if self.is_dirty() {
            warn!(
                target: "catalog::storage",
                file = self.layout.name,
                slots = self.dirty.len(),
                "Discarding unflushed slot writes"
            );
            self.dirty.clear();
            self.header_dirty = false;
        }
    }
}

impl Drop for SlotFile {
    fn drop(&mut self) {
        self.discard_unflushed();
    }
}

impl std::fmt::Debug for SlotFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotFile")
            .field("layout", &self.layout.name)
            .field("path", &self.path)
            .field("header", &self.header)
            .field("dirty_slots", &self.dirty.len())
            .finish()
    }
}
