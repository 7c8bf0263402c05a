//! In-memory staging of index changes between saves
//!
//! Two maps hold everything `save` will apply:
//!
//! - `added`: term → document → positions to push
//! - `removed`: term → documents whose committed posting must go
//!
//! Terms are handed to `save` in the order they were first staged, so trie
//! siblings end up in insertion order. A (term, document) pair is never in
//! both maps. Staging an insertion for a
//! pair with a pending removal cancels the removal and marks the insertion
//! as *replacing* the committed posting; staging a removal for a pair with
//! a pending insertion cancels the insertion.

use std::collections::{BTreeMap, BTreeSet};

use catalog_core::{DocNo, Position};
use smallvec::SmallVec;

/// Positions staged for one (term, document) pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagedPostings {
    /// Positions in staging order
    pub positions: SmallVec<[Position; 4]>,
    /// The committed posting for this pair is dropped before these positions
    /// are written
    pub replaces_committed: bool,
}

impl StagedPostings {
    /// Number of staged positions.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether no position is staged.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Staged insertions of one term.
#[derive(Debug)]
struct StagedTerm {
    /// When the term was first staged
    seq: u64,
    docs: BTreeMap<DocNo, StagedPostings>,
}

/// Staged insertions per term, in first-staged order.
pub type AddedTerms = Vec<(String, BTreeMap<DocNo, StagedPostings>)>;
/// Staged removals per term.
pub type RemovedTerms = BTreeMap<String, BTreeSet<DocNo>>;

/// The staging maps of one engine.
#[derive(Debug, Default)]
pub struct StagingArea {
    added: BTreeMap<String, StagedTerm>,
    removed: RemovedTerms,
    next_seq: u64,
}

impl StagingArea {
    /// Empty staging area.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage `position` of `term` in `doc_no`.
    pub fn stage_insert(&mut self, term: &str, doc_no: DocNo, position: Position) {
        let cancelled = match self.removed.get_mut(term) {
            Some(docs) => {
                let hit = docs.remove(&doc_no);
                if docs.is_empty() {
                    self.removed.remove(term);
                }
                hit
            }
            None => false,
        };

        let seq = self.next_seq;
        let staged_term = self
            .added
            .entry(term.to_string())
            .or_insert_with(|| StagedTerm {
                seq,
                docs: BTreeMap::new(),
            });
        if staged_term.seq == seq {
            self.next_seq += 1;
        }
        let staged = staged_term.docs.entry(doc_no).or_default();
        staged.replaces_committed |= cancelled;
        staged.positions.push(position);
    }

    /// Stage the removal of `doc_no` from `term`.
    pub fn stage_removal(&mut self, term: &str, doc_no: DocNo) {
        if let Some(staged_term) = self.added.get_mut(term) {
            if let Some(staged) = staged_term.docs.remove(&doc_no) {
                if staged_term.docs.is_empty() {
                    self.added.remove(term);
                }
                if !staged.replaces_committed {
                    return;
                }
            }
        }
        self.removed
            .entry(term.to_string())
            .or_default()
            .insert(doc_no);
    }

    /// Staged insertions for `term`.
    pub fn added(&self, term: &str) -> Option<&BTreeMap<DocNo, StagedPostings>> {
        self.added.get(term).map(|staged| &staged.docs)
    }

    /// Staged removals for `term`.
    pub fn removed(&self, term: &str) -> Option<&BTreeSet<DocNo>> {
        self.removed.get(term)
    }

    /// Whether `(term, doc_no)` has a pending removal.
    pub fn is_removed(&self, term: &str, doc_no: DocNo) -> bool {
        self.removed
            .get(term)
            .is_some_and(|docs| docs.contains(&doc_no))
    }

    /// Whether nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// Number of terms with staged insertions.
    pub fn added_terms(&self) -> usize {
        self.added.len()
    }

    /// Number of (term, document) pairs with staged insertions.
    pub fn added_pairs(&self) -> usize {
        self.added.values().map(|staged| staged.docs.len()).sum()
    }

    /// Number of (term, document) pairs with staged removals.
    pub fn removed_pairs(&self) -> usize {
        self.removed.values().map(BTreeSet::len).sum()
    }

    /// Empty both maps, handing their contents to the caller.
    ///
    /// Insertions come back in first-staged term order.
    pub fn take(&mut self) -> (AddedTerms, RemovedTerms) {
        let mut added: Vec<(String, StagedTerm)> =
            std::mem::take(&mut self.added).into_iter().collect();
        added.sort_by_key(|(_, staged)| staged.seq);
        let added = added
            .into_iter()
            .map(|(term, staged)| (term, staged.docs))
            .collect();
        self.next_seq = 0;
        (added, std::mem::take(&mut self.removed))
    }

    /// Drop everything staged.
    pub fn clear(&mut self) {
        self.added.clear();
        self.removed.clear();
        self.next_seq = 0;
    }
}
