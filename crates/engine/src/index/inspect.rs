//! Read-only views of the committed index

use catalog_core::Result;
use catalog_storage::{verify, IntegrityReport, SlotFile};

use super::IndexEngine;

/// One indexed term in a dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermEntry {
    /// The term (empty for the root)
    pub term: String,
    /// Number of committed documents containing it
    pub documents: usize,
}

/// Slot and staging counters of an engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// `number_of_slots` of the tree file
    pub tree_slots: u32,
    /// `number_of_slots` of the documents file
    pub document_slots: u32,
    /// `number_of_slots` of the positions file
    pub position_slots: u32,
    /// Free-list length of the tree file
    pub free_tree_slots: usize,
    /// Free-list length of the documents file
    pub free_document_slots: usize,
    /// Free-list length of the positions file
    pub free_position_slots: usize,
    /// Terms with staged insertions
    pub staged_terms: usize,
    /// (term, document) pairs with staged insertions
    pub staged_postings: usize,
    /// (term, document) pairs with staged removals
    pub pending_removals: usize,
    /// Whether the engine is poisoned
    pub poisoned: bool,
}

impl IndexEngine {
    /// Every committed term with a non-empty posting list, in trie
    /// pre-order with siblings in insertion order.
    pub fn terms(&self) -> Result<Vec<TermEntry>> {
        self.ensure_usable()?;
        self.guard(self.collect_terms())
    }

    fn collect_terms(&self) -> Result<Vec<TermEntry>> {
        let mut terms = Vec::new();
        for entry in self.tree.preorder() {
            let entry = entry?;
            if entry.documents_head.is_none() {
                continue;
            }
            let mut documents = 0;
            for posting in self.documents.iter(entry.documents_head) {
                posting?;
                documents += 1;
            }
            terms.push(TermEntry {
                term: entry.term,
                documents,
            });
        }
        Ok(terms)
    }

    /// Verify the committed structure of all three files.
    ///
    /// Staged changes are not considered.
    pub fn check(&self) -> Result<IntegrityReport> {
        self.ensure_usable()?;
        self.guard(verify(&self.tree, &self.documents, &self.positions))
    }

    /// Slot counts, free-list lengths and staging counters.
    pub fn stats(&self) -> Result<EngineStats> {
        self.ensure_usable()?;
        self.guard(self.collect_stats())
    }

    fn collect_stats(&self) -> Result<EngineStats> {
        let free = |file: &SlotFile| file.free_slots().map(|slots| slots.len());
        Ok(EngineStats {
            tree_slots: self.tree.file().number_of_slots(),
            document_slots: self.documents.file().number_of_slots(),
            position_slots: self.positions.file().number_of_slots(),
            free_tree_slots: free(self.tree.file())?,
            free_document_slots: free(self.documents.file())?,
            free_position_slots: free(self.positions.file())?,
            staged_terms: self.staging.added_terms(),
            staged_postings: self.staging.added_pairs(),
            pending_removals: self.staging.removed_pairs(),
            poisoned: self.is_poisoned(),
        })
    }
}
