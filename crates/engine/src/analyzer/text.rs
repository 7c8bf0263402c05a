//! Word splitting for free text

use std::str::Chars;

use catalog_core::Position;

use super::{Analyzer, Value};

/// Splits text into lower-cased runs of alphanumeric characters.
///
/// Everything that is not alphanumeric separates words and is dropped.
/// Positions count words across all pieces of a multi-keyword value.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextAnalyzer;

impl Analyzer for TextAnalyzer {
    fn split(&self, value: &Value) -> impl Iterator<Item = (String, Position)> {
        value
            .texts()
            .flat_map(Words::new)
            .zip(0..)
    }
}

/// Lazy iterator over the words of one string.
#[derive(Debug, Clone)]
pub struct Words<'a> {
    chars: Chars<'a>,
}

impl<'a> Words<'a> {
    /// Words of `text`.
    pub fn new(text: &'a str) -> Self {
        Words {
            chars: text.chars(),
        }
    }
}

impl Iterator for Words<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let mut word = String::new();
        for c in self.chars.by_ref() {
            if c.is_alphanumeric() {
                word.extend(c.to_lowercase());
            } else if !word.is_empty() {
                return Some(word);
            }
        }
        (!word.is_empty()).then_some(word)
    }
}
