//! Offline consistency check of the three files
//!
//! Walks everything reachable from the trie root and cross-checks it with
//! the free-lists:
//!
//! - every slot except the reserved slot 0 is reachable XOR free
//! - no slot is reached twice
//! - document numbers are unique within a posting list
//! - a document's `frequency` equals the length of its positions list
//!
//! Only persisted (flushed or in-memory mirrored) state is inspected; staged
//! engine changes are invisible here.

use std::collections::BTreeSet;

use catalog_core::{Error, Result, SlotNo};

use crate::documents::DocumentsStore;
use crate::positions::PositionsStore;
use crate::slot_file::SlotFile;
use crate::tree::{NodeId, TreeStore};

/// Counts gathered by a successful [`verify`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntegrityReport {
    /// Trie nodes, excluding the virtual root
    pub tree_nodes: usize,
    /// Terms (including the empty term) with a non-empty posting list
    pub indexed_terms: usize,
    /// Document entries reachable from the trie
    pub postings: usize,
    /// Position entries reachable from document entries
    pub positions: usize,
    /// Free slots in the tree file
    pub free_tree_slots: usize,
    /// Free slots in the documents file
    pub free_document_slots: usize,
    /// Free slots in the positions file
    pub free_position_slots: usize,
}

impl IntegrityReport {
    /// Whether nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.indexed_terms == 0
    }
}

/// Marks slots of one file as they are reached.
struct SlotMarks {
    name: &'static str,
    seen: Vec<bool>,
}

impl SlotMarks {
    fn new(file: &SlotFile) -> Self {
        let mut seen = vec![false; file.number_of_slots() as usize];
        if let Some(reserved) = seen.first_mut() {
            *reserved = true;
        }
        SlotMarks {
            name: file.layout().name,
            seen,
        }
    }

    fn mark(&mut self, slot: SlotNo, via: &str) -> Result<()> {
        let Some(seen) = self.seen.get_mut(slot as usize) else {
            return Err(Error::corrupt(format!(
                "{} slot {} out of range",
                self.name, slot
            )));
        };
        if *seen {
            return Err(Error::invariant(format!(
                "{} slot {} reached twice (via {})",
                self.name, slot, via
            )));
        }
        *seen = true;
        Ok(())
    }

    fn mark_free(&mut self, file: &SlotFile) -> Result<usize> {
        let free = file.free_slots()?;
        for &slot in &free {
            self.mark(slot, "free-list")?;
        }
        Ok(free.len())
    }

    fn finish(self) -> Result<()> {
        match self.seen.iter().position(|seen| !seen) {
            Some(slot) => Err(Error::invariant(format!(
                "{} slot {} is neither reachable nor free",
                self.name, slot
            ))),
            None => Ok(()),
        }
    }
}

/// Check the persisted structure of one index.
pub fn verify(
    tree: &TreeStore,
    documents: &DocumentsStore,
    positions: &PositionsStore,
) -> Result<IntegrityReport> {
    let mut report = IntegrityReport::default();
    let mut tree_marks = SlotMarks::new(tree.file());
    let mut doc_marks = SlotMarks::new(documents.file());
    let mut pos_marks = SlotMarks::new(positions.file());

    for entry in tree.preorder() {
        let entry = entry?;
        if let NodeId::Slot(slot) = entry.node {
            tree_marks.mark(slot, &entry.term)?;
            report.tree_nodes += 1;
        }
        if entry.documents_head.is_none() {
            continue;
        }
        report.indexed_terms += 1;

        let mut doc_nos = BTreeSet::new();
        for posting in documents.iter(entry.documents_head) {
            let (slot, doc) = posting?;
            doc_marks.mark(slot, &entry.term)?;
            if !doc_nos.insert(doc.doc_no) {
                return Err(Error::invariant(format!(
                    "document {} listed twice for term {:?}",
                    doc.doc_no, entry.term
                )));
            }
            report.postings += 1;

            let mut length = 0u32;
            for position in positions.iter(doc.positions_head) {
                let (slot, _) = position?;
                pos_marks.mark(slot, &entry.term)?;
                length += 1;
            }
            if length != doc.frequency {
                return Err(Error::invariant(format!(
                    "term {:?} document {}: frequency {} but {} positions",
                    entry.term, doc.doc_no, doc.frequency, length
                )));
            }
            report.positions += length as usize;
        }
    }

    report.free_tree_slots = tree_marks.mark_free(tree.file())?;
    report.free_document_slots = doc_marks.mark_free(documents.file())?;
    report.free_position_slots = pos_marks.mark_free(positions.file())?;
    tree_marks.finish()?;
    doc_marks.finish()?;
    pos_marks.finish()?;
    Ok(report)
}
