//! Term dumps and integrity reports through the public API.

use crate::common::*;
use catalog::storage::testing::{IndexCorruptionTester, IndexFile};
use catalog::IndexPaths;

#[test]
fn dump_follows_insertion_order() {
    let mut index = TestIndex::new();
    for (term, doc) in [("zebra", 1), ("apple", 2), ("zoo", 3), ("", 4)] {
        index.engine().index_term(term, doc, 0).unwrap();
    }
    index.engine().save().unwrap();

    let terms: Vec<String> = index
        .engine()
        .terms()
        .unwrap()
        .into_iter()
        .map(|t| t.term)
        .collect();
    assert_eq!(terms, vec!["", "zebra", "zoo", "apple"]);
}

#[test]
fn check_reports_clean_index() {
    let mut index = TestIndex::new();
    index
        .engine()
        .index_value(&TextAnalyzer, &Value::from("one two two three"), 1)
        .unwrap();
    index.engine().save().unwrap();

    let report = index.engine().check().unwrap();
    assert_eq!(report.indexed_terms, 3);
    assert_eq!(report.postings, 3);
    assert_eq!(report.positions, 4);
}

#[test]
fn damaged_frequency_is_reported_and_poisons() {
    let mut index = TestIndex::new();
    index.engine().index_term("word", 1, 0).unwrap();
    index.engine().save().unwrap();
    if let Some(engine) = index.engine.take() {
        engine.close().unwrap();
    }

    let tester = IndexCorruptionTester::new(IndexPaths::default_in_dir(index.path()));
    tester.corrupt_slot(IndexFile::Documents, 1, 4, 3).unwrap();
    index.reopen();

    // search trusts the stored frequency; the check does not
    assert_eq!(index.search("word").get(&1), Some(&3));
    let err = index.engine().check().unwrap_err();
    assert!(matches!(err, Error::InvariantViolation(_)));
    assert!(index.engine().is_poisoned());
}
