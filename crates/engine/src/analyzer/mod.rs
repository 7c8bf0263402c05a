//! Field analyzers
//!
//! An analyzer turns a field value into the `(term, position)` pairs the
//! engine indexes. The engine itself never looks inside a value; all
//! type-specific encoding happens here.
//!
//! | Analyzer | Accepts | Terms |
//! |---|---|---|
//! | [`TextAnalyzer`] | text, keywords | lower-cased alphanumeric words, positions 0, 1, 2, … |
//! | [`KeywordAnalyzer`] | text, keywords | each non-empty keyword verbatim, position 0 |
//! | [`IntegerAnalyzer`] | integers | the number right-aligned in 10 columns, position 0 |
//! | [`BoolAnalyzer`] | booleans | `"1"` or `"0"`, position 0 |
//!
//! A value of a type the analyzer does not accept yields no terms.

mod scalar;
mod text;

pub use scalar::{BoolAnalyzer, IntegerAnalyzer, KeywordAnalyzer};
pub use text::{TextAnalyzer, Words};

use catalog_core::Position;

/// A field value handed to an analyzer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Free text
    Text(String),
    /// A single keyword
    Keyword(String),
    /// Several keywords
    Keywords(Vec<String>),
    /// An integer
    Integer(i64),
    /// A boolean
    Bool(bool),
}

impl Value {
    /// The string pieces of a textual value, in order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        let slice: &[String] = match self {
            Value::Text(s) | Value::Keyword(s) => std::slice::from_ref(s),
            Value::Keywords(list) => list,
            Value::Integer(_) | Value::Bool(_) => &[],
        };
        slice.iter().map(String::as_str)
    }

    /// The integer, if this is an integer value.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// The boolean, if this is a boolean value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// Splits a field value into indexable terms.
pub trait Analyzer {
    /// Produces a finite lazy sequence of `(term, position)` pairs.
    ///
    /// Positions are zero-based word indexes within the value.
    fn split(&self, value: &Value) -> impl Iterator<Item = (String, Position)>;
}
