//! A small document catalog: one field index per attribute, queried by
//! intersecting posting lists.

use crate::common::*;

fn records() -> Vec<Record> {
    vec![
        Record::new(1, "The Rust Programming Language", &["rust", "book"], 2018, true),
        Record::new(2, "Programming in Lua", &["lua", "book"], 2016, true),
        Record::new(3, "Rust for Rustaceans", &["rust", "book"], 2021, false),
        Record::new(4, "The rust belt: a history", &["history"], 2021, true),
    ]
}

#[test]
fn query_across_fields() {
    let mut catalog = Catalog::new();
    for record in records() {
        catalog.add(&record);
    }
    // staged results are visible before the save
    assert_eq!(catalog.query(&[("title", "rust")]), vec![1, 3, 4]);

    catalog.save();
    assert_eq!(catalog.query(&[("title", "rust")]), vec![1, 3, 4]);
    assert_eq!(catalog.query(&[("title", "rustaceans")]), vec![3]);
    assert_eq!(catalog.query(&[("tags", "rust")]), vec![1, 3]);
    assert_eq!(
        catalog.query(&[("tags", "book"), ("published", BoolAnalyzer::term(true))]),
        vec![1, 2]
    );
    let year = IntegerAnalyzer::term(2021);
    assert_eq!(catalog.query(&[("year", year.as_str())]), vec![3, 4]);
    assert_eq!(catalog.query(&[("title", "programming"), ("tags", "lua")]), vec![2]);
}

#[test]
fn title_word_frequency() {
    let mut catalog = Catalog::new();
    catalog.add(&Record::new(9, "Buffalo buffalo Buffalo buffalo", &[], 1990, true));
    catalog.save();

    let hits = catalog.title.engine().search_word("buffalo").unwrap();
    assert_eq!(hits.get(&9), Some(&4));
}

#[test]
fn update_record_replaces_terms() {
    let mut catalog = Catalog::new();
    let old = Record::new(5, "Draft title", &["draft"], 2020, false);
    catalog.add(&old);
    catalog.save();

    let new = Record::new(5, "Final title", &["final"], 2020, true);
    catalog.remove(&old);
    catalog.add(&new);
    catalog.save();

    assert!(catalog.query(&[("title", "draft")]).is_empty());
    assert_eq!(catalog.query(&[("title", "final")]), vec![5]);
    // "title" was removed and re-added: counted once, not twice
    let hits = catalog.title.engine().search_word("title").unwrap();
    assert_eq!(hits.get(&5), Some(&1));
    assert!(catalog.query(&[("tags", "draft")]).is_empty());
    assert_eq!(catalog.query(&[("published", "1")]), vec![5]);
    assert!(catalog.query(&[("published", "0")]).is_empty());
    for field in [&mut catalog.title, &mut catalog.tags, &mut catalog.year, &mut catalog.published] {
        field.engine().check().unwrap();
    }
}

#[test]
fn catalog_survives_reopen() {
    let mut catalog = Catalog::new();
    for record in records() {
        catalog.add(&record);
    }
    catalog.save();
    catalog.remove(&records()[0]);
    catalog.save();
    catalog.reopen();

    assert_eq!(catalog.query(&[("title", "rust")]), vec![3, 4]);
    assert_eq!(catalog.query(&[("tags", "book")]), vec![2, 3]);
}
