//! Position lists
//!
//! Every `(term, document)` pair owns a singly linked list of word positions.
//!
//! ## Slot Format (8 bytes)
//!
//! ```text
//!   position            u32 BE
//!   next                link      (also the free-list link)
//! ```

use std::path::Path;

use catalog_core::codec::{decode_link, decode_u32, encode_link, encode_u32};
use catalog_core::{Error, Position, Result, SlotNo, VersionDate};
use tracing::debug;

use crate::slot_file::{SlotFile, POSITIONS_LAYOUT};

const POSITION_OFFSET: usize = 0;
const NEXT_OFFSET: usize = 4;

/// One decoded position slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionSlot {
    /// Word index within the field value
    pub position: Position,
    /// Next entry of the same list
    pub next: Option<SlotNo>,
}

impl PositionSlot {
    fn encode(&self) -> [u8; 8] {
        let mut out = [0u8; 8];
        out[POSITION_OFFSET..NEXT_OFFSET].copy_from_slice(&encode_u32(self.position));
        out[NEXT_OFFSET..].copy_from_slice(&encode_link(self.next));
        out
    }

    fn decode(data: &[u8]) -> Result<Self> {
        Ok(PositionSlot {
            position: decode_u32(&data[POSITION_OFFSET..])?,
            next: decode_link(&data[NEXT_OFFSET..])?,
        })
    }
}

/// Store of position lists backed by the positions file.
#[derive(Debug)]
pub struct PositionsStore {
    file: SlotFile,
}

impl PositionsStore {
    /// Create a fresh positions file.
    pub fn create(path: &Path, version: VersionDate) -> Result<Self> {
        Ok(PositionsStore {
            file: SlotFile::create(path, &POSITIONS_LAYOUT, version)?,
        })
    }

    /// Open an existing positions file.
    pub fn open(path: &Path) -> Result<Self> {
        Ok(PositionsStore {
            file: SlotFile::open(path, &POSITIONS_LAYOUT)?,
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

    /// Decode one slot, range-checking its link.
    pub fn read(&self, slot: SlotNo) -> Result<PositionSlot> {
        let entry = PositionSlot::decode(self.file.read_slot(slot)?)?;
        self.file.check_link(entry.next)?;
        Ok(entry)
    }

    /// Prepend `position` to the list starting at `head`; returns the new head.
    pub fn push_position(&mut self, position: Position, head: Option<SlotNo>) -> Result<SlotNo> {
        let slot = self.file.alloc_slot()?;
        let entry = PositionSlot {
            position,
            next: head,
        };
        self.file.write_slot(slot, &entry.encode())?;
        Ok(slot)
    }

    /// Push every position in order onto the list starting at `head`.
    pub fn push_all(
        &mut self,
        positions: &[Position],
        mut head: Option<SlotNo>,
    ) -> Result<Option<SlotNo>> {
        for &position in positions {
            head = Some(self.push_position(position, head)?);
        }
        Ok(head)
    }

    /// Splice the whole list starting at `head` onto the free-list.
    ///
    /// Walks to the tail, then writes only the tail link and the header.
    /// Returns the number of released slots.
    pub fn release_chain(&mut self, head: Option<SlotNo>) -> Result<usize> {
        let Some(first) = head else {
            return Ok(0);
        };
        let mut tail = first;
        let mut released = 0;
        for entry in self.iter(head) {
            let (slot, _) = entry?;
            tail = slot;
            released += 1;
        }
        self.file.release_chain(first, tail)?;
        debug!(target: "catalog::storage", head = first, released, "Released positions chain");
        Ok(released)
    }

    /// All positions of a list, in chain order.
    pub fn collect(&self, head: Option<SlotNo>) -> Result<Vec<Position>> {
        self.iter(head)
            .map(|entry| entry.map(|(_, slot)| slot.position))
            .collect()
    }

    /// Number of entries in a list.
    pub fn chain_len(&self, head: Option<SlotNo>) -> Result<usize> {
        let mut len = 0;
        for entry in self.iter(head) {
            entry?;
            len += 1;
        }
        Ok(len)
    }

    /// Iterate `(slot, entry)` pairs of a list, failing on a cycle.
    pub fn iter(&self, head: Option<SlotNo>) -> PositionChain<'_> {
        PositionChain {
            store: self,
            cursor: head,
            steps: 0,
        }
    }
}

/// Iterator over one position list.
pub struct PositionChain<'a> {
    store: &'a PositionsStore,
    cursor: Option<SlotNo>,
    steps: u32,
}

impl Iterator for PositionChain<'_> {
    type Item = Result<(SlotNo, PositionSlot)>;

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.cursor.take()?;
        if self.steps >= self.store.file.number_of_slots() {
            return Some(Err(Error::invariant("cycle in positions chain")));
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

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store() -> (tempfile::TempDir, PositionsStore) {
        let dir = tempdir().unwrap();
        let store = PositionsStore::create(&dir.path().join("positions"), VersionDate::today())
            .unwrap();
        (dir, store)
    }

    #[test]
    fn test_push_prepends() {
        let (_dir, mut store) = store();
        let head = store.push_all(&[3, 5, 8], None).unwrap();
        assert_eq!(store.collect(head).unwrap(), vec![8, 5, 3]);
        assert_eq!(store.chain_len(head).unwrap(), 3);
    }

    #[test]
    fn test_empty_chain() {
        let (_dir, mut store) = store();
        assert!(store.collect(None).unwrap().is_empty());
        assert_eq!(store.release_chain(None).unwrap(), 0);
        assert_eq!(store.file().first_empty(), None);
    }

    #[test]
    fn test_release_chain_splices_whole_list() {
        let (_dir, mut store) = store();
        let first = store.push_all(&[1], None).unwrap();
        store.release_chain(first).unwrap();
        let second = store.push_all(&[10, 20, 30], None).unwrap();
        // The single freed slot was reused for the first push of the new list.
        assert_eq!(store.file().number_of_slots(), 4);

        assert_eq!(store.release_chain(second).unwrap(), 3);
        let free = store.file().free_slots().unwrap();
        assert_eq!(free.len(), 3);
        assert_eq!(free[0], second.unwrap());
    }

    #[test]
    fn test_released_slots_reused_before_growth() {
        let (_dir, mut store) = store();
        let head = store.push_all(&[1, 2], None).unwrap();
        store.release_chain(head).unwrap();
        let slots = store.file().number_of_slots();
        store.push_all(&[7, 9], None).unwrap();
        assert_eq!(store.file().number_of_slots(), slots);
        assert!(store.file().free_slots().unwrap().is_empty());
    }

    #[test]
    fn test_cycle_detected() {
        let (_dir, mut store) = store();
        let head = store.push_all(&[1, 2], None).unwrap().unwrap();
        let tail = store.iter(Some(head)).last().unwrap().unwrap().0;
        store.file_mut().write_link_field(tail, NEXT_OFFSET, Some(head)).unwrap();
        assert!(matches!(
            store.collect(Some(head)),
            Err(Error::InvariantViolation(_))
        ));
    }
}
