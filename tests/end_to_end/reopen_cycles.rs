//! Multiple write/save/close/reopen cycles.

use crate::common::*;

#[test]
fn many_cycles_accumulate() {
    let mut index = TestIndex::new();
    for cycle in 0..5u32 {
        for doc in 0..10u32 {
            index
                .engine()
                .index_term(&format!("term{}", doc % 3), cycle * 10 + doc, doc)
                .unwrap();
        }
        index.engine().save().unwrap();
        index.reopen();
    }

    let hits = index.search("term0");
    // docs 0, 3, 6, 9 in each of 5 cycles
    assert_eq!(hits.len(), 20);
    assert!(hits.values().all(|&f| f == 1));
    let report = index.engine().check().unwrap();
    assert_eq!(report.postings, 50);
}

#[test]
fn unsaved_changes_do_not_survive() {
    let mut index = TestIndex::new();
    index.engine().index_term("saved", 1, 0).unwrap();
    index.engine().save().unwrap();
    index.engine().index_term("unsaved", 1, 0).unwrap();
    index.engine().unindex_term("saved", 1).unwrap();
    index.reopen();

    assert_eq!(index.search("saved").len(), 1);
    assert!(index.search("unsaved").is_empty());
}

#[test]
fn free_slots_reused_across_reopen() {
    let mut index = TestIndex::unsynced();
    for doc in 0..8 {
        index.engine().index_term("churn", doc, 0).unwrap();
    }
    index.engine().save().unwrap();
    let grown = index.engine().stats().unwrap();

    for doc in 0..8 {
        index.engine().unindex_term("churn", doc).unwrap();
    }
    index.engine().save().unwrap();
    index.reopen();
    assert_eq!(index.engine().stats().unwrap().free_document_slots, 8);

    for doc in 100..108 {
        index.engine().index_term("other", doc, 0).unwrap();
    }
    index.engine().save().unwrap();
    let after = index.engine().stats().unwrap();
    assert_eq!(after.document_slots, grown.document_slots);
    assert_eq!(after.position_slots, grown.position_slots);
    assert_eq!(after.free_document_slots, 0);
}

#[test]
fn idempotent_save_after_reopen() {
    let mut index = TestIndex::new();
    index.engine().index_term("a", 1, 0).unwrap();
    index.engine().save().unwrap();
    index.reopen();
    let before = index.file_bytes();

    index.engine().save().unwrap();
    index.reopen();
    assert_eq!(index.file_bytes(), before);
}
