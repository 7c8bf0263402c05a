//! Single-term analyzers

use catalog_core::Position;

use super::{Analyzer, Value};

/// Indexes each keyword as one term at position 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordAnalyzer;

impl Analyzer for KeywordAnalyzer {
    fn split(&self, value: &Value) -> impl Iterator<Item = (String, Position)> {
        value
            .texts()
            .filter(|keyword| !keyword.is_empty())
            .map(|keyword| (keyword.to_string(), 0))
    }
}

/// Indexes an integer right-aligned in a 10-column field.
///
/// Lexical order of the terms matches numeric order for values in
/// `0..10_000_000_000`.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntegerAnalyzer;

impl IntegerAnalyzer {
    /// The term an integer is indexed under.
    pub fn term(n: i64) -> String {
        format!("{:>10}", n)
    }
}

impl Analyzer for IntegerAnalyzer {
    fn split(&self, value: &Value) -> impl Iterator<Item = (String, Position)> {
        value
            .as_integer()
            .map(|n| (Self::term(n), 0))
            .into_iter()
    }
}

/// Indexes a boolean as `"1"` or `"0"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoolAnalyzer;

impl BoolAnalyzer {
    /// The term a boolean is indexed under.
    pub fn term(b: bool) -> &'static str {
        if b {
            "1"
        } else {
            "0"
        }
    }
}

impl Analyzer for BoolAnalyzer {
    fn split(&self, value: &Value) -> impl Iterator<Item = (String, Position)> {
        value
            .as_bool()
            .map(|b| (Self::term(b).to_string(), 0))
            .into_iter()
    }
}
