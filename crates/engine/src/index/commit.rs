//! Applying staged changes to the stores

use catalog_core::{DocNo, Error, Result, SlotNo};
use tracing::{debug, info};

use super::IndexEngine;
use crate::staging::{AddedTerms, RemovedTerms, StagedPostings};

/// What one save did.
#[derive(Debug, Default)]
struct CommitCounts {
    removals: usize,
    additions: usize,
    merges: usize,
}

impl IndexEngine {
    /// Commit every staged change and flush the three files.
    ///
    /// Removals are applied before insertions, so slots freed by this save
    /// are reused by it. Files are flushed positions first, tree last. On
    /// any failure the engine is poisoned; no rollback is attempted.
    pub fn save(&mut self) -> Result<()> {
        self.ensure_usable()?;
        let (added, removed) = self.staging.take();
        let result = self.commit(&added, &removed);
        self.guard(result)
    }

    fn commit(&mut self, added: &AddedTerms, removed: &RemovedTerms) -> Result<()> {
        let mut counts = CommitCounts::default();
        for (term, docs) in removed {
            let Some(node) = self.tree.walk(term)? else {
                debug!(target: "catalog::engine", term = %term, "Skipping removal for unknown term");
                continue;
            };
            let original = self.tree.documents_head(node)?;
            let mut head = original;
            for &doc_no in docs {
                head = self.documents.remove_doc(head, doc_no, &mut self.positions)?;
                counts.removals += 1;
            }
            if head != original {
                self.tree.set_documents_head(node, head)?;
            }
        }

        for (term, docs) in added {
            let node = self.tree.walk_or_create(term)?;
            let original = self.tree.documents_head(node)?;
            let mut head = original;
            for (&doc_no, staged) in docs {
                head = self.apply_postings(head, doc_no, staged, &mut counts)?;
            }
            if head != original {
                self.tree.set_documents_head(node, head)?;
            }
        }

        let sync = self.config.sync_on_save;
        let written = [
            self.positions.file_mut().flush(sync)?,
            self.documents.file_mut().flush(sync)?,
            self.tree.file_mut().flush(sync)?,
        ];
        info!(
            target: "catalog::engine",
            removals = counts.removals,
            additions = counts.additions,
            merges = counts.merges,
            slots_written = written.iter().sum::<usize>(),
            tree_slots = self.tree.file().number_of_slots(),
            document_slots = self.documents.file().number_of_slots(),
            position_slots = self.positions.file().number_of_slots(),
            "Saved index"
        );
        Ok(())
    }

    /// Write one staged (term, document) pair under the posting list at
    /// `head`; returns the new list head.
    fn apply_postings(
        &mut self,
        mut head: Option<SlotNo>,
        doc_no: DocNo,
        staged: &StagedPostings,
        counts: &mut CommitCounts,
    ) -> Result<Option<SlotNo>> {
        let added = u32::try_from(staged.len())
            .map_err(|_| Error::invariant(format!("too many positions for document {}", doc_no)))?;
        if staged.replaces_committed {
            head = self.documents.remove_doc(head, doc_no, &mut self.positions)?;
            counts.removals += 1;
        }

        match self.documents.find_doc(head, doc_no)? {
            Some(slot) => {
                let entry = self.documents.read(slot)?;
                let frequency = entry.frequency.checked_add(added).ok_or_else(|| {
                    Error::invariant(format!("frequency overflow for document {}", doc_no))
                })?;
                let positions_head = self
                    .positions
                    .push_all(&staged.positions, entry.positions_head)?;
                self.documents.update_positions_head(slot, positions_head)?;
                self.documents.update_frequency(slot, frequency)?;
                counts.merges += 1;
            }
            None => {
                let positions_head = self.positions.push_all(&staged.positions, None)?;
                head = Some(
                    self.documents
                        .insert_doc(head, doc_no, positions_head, added)?,
                );
                counts.additions += 1;
            }
        }
        Ok(head)
    }
}
