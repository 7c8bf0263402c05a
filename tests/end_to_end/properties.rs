//! Random catalog edits checked against an in-memory model, through saves
//! and reopens.

use std::collections::{BTreeMap, BTreeSet};

use crate::common::*;
use catalog::Analyzer;
use proptest::prelude::*;

const TITLES: [&str; 5] = [
    "red fox",
    "Red Riding Hood",
    "the quick brown fox",
    "brown bear, brown bear",
    "hood",
];
const TAGS: [&str; 3] = ["animal", "story", "colour"];

#[derive(Debug, Clone)]
enum Edit {
    Add { id: u32, title: usize, tags: Vec<usize>, year: i64, published: bool },
    Remove(u32),
    Save,
    Reopen,
}

fn edit_strategy() -> impl Strategy<Value = Edit> {
    prop_oneof![
        5 => (
            1u32..8,
            0..TITLES.len(),
            prop::collection::vec(0..TAGS.len(), 0..3),
            1990i64..1995,
            any::<bool>(),
        )
            .prop_map(|(id, title, tags, year, published)| Edit::Add {
                id,
                title,
                tags,
                year,
                published,
            }),
        3 => (1u32..8).prop_map(Edit::Remove),
        1 => Just(Edit::Save),
        1 => Just(Edit::Reopen),
    ]
}

fn record(id: u32, title: usize, tags: &[usize], year: i64, published: bool) -> Record {
    let tags: Vec<&'static str> = tags
        .iter()
        .map(|&t| TAGS[t])
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    Record::new(id, TITLES[title], &tags, year, published)
}

/// Documents the model expects for one `(field, term)` query.
fn expected(model: &BTreeMap<u32, Record>, field: &str, term: &str) -> Vec<DocNo> {
    model
        .values()
        .filter(|r| match field {
            "title" => TextAnalyzer
                .split(&Value::from(r.title))
                .any(|(word, _)| word == term),
            "tags" => r.tags.iter().any(|t| *t == term),
            "year" => IntegerAnalyzer::term(r.year) == term,
            "published" => BoolAnalyzer::term(r.published) == term,
            _ => false,
        })
        .map(|r| r.id)
        .collect()
}

fn queries() -> Vec<(&'static str, String)> {
    let mut queries: Vec<(&'static str, String)> = ["red", "fox", "hood", "brown", "bear", "the"]
        .iter()
        .map(|w| ("title", w.to_string()))
        .collect();
    queries.extend(TAGS.iter().map(|t| ("tags", t.to_string())));
    queries.extend((1990..1995).map(|y| ("year", IntegerAnalyzer::term(y))));
    queries.push(("published", "1".to_string()));
    queries.push(("published", "0".to_string()));
    queries
}

fn assert_matches_model(catalog: &mut Catalog, model: &BTreeMap<u32, Record>) {
    for (field, term) in queries() {
        assert_eq!(
            catalog.query(&[(field, term.as_str())]),
            expected(model, field, &term),
            "{} = {:?}",
            field,
            term
        );
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Staged, saved and reopened catalogs answer every query the way the
    /// model does.
    #[test]
    fn prop_catalog_survives_reopen(edits in prop::collection::vec(edit_strategy(), 1..30)) {
        let mut catalog = Catalog::new();
        let mut model: BTreeMap<u32, Record> = BTreeMap::new();

        for edit in &edits {
            match edit {
                Edit::Add { id, title, tags, year, published } => {
                    if model.contains_key(id) {
                        continue;
                    }
                    let r = record(*id, *title, tags, *year, *published);
                    catalog.add(&r);
                    model.insert(*id, r);
                }
                Edit::Remove(id) => {
                    if let Some(r) = model.remove(id) {
                        catalog.remove(&r);
                    }
                }
                Edit::Save => catalog.save(),
                Edit::Reopen => {
                    // close discards staged edits, so commit them first
                    catalog.save();
                    catalog.reopen();
                }
            }
            assert_matches_model(&mut catalog, &model);
        }

        catalog.save();
        catalog.reopen();
        assert_matches_model(&mut catalog, &model);
        for field in [&mut catalog.title, &mut catalog.tags, &mut catalog.year, &mut catalog.published] {
            field.engine().check().unwrap();
        }
        // one year term per record
        prop_assert_eq!(catalog.year.engine().check().unwrap().postings, model.len());
    }
}
