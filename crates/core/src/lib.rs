//! Core types for the catalog index
//!
//! This crate defines the foundational pieces shared by the storage and
//! engine crates:
//! - Error: Error type and `Result` alias
//! - codec: Fixed and variable-length integers, characters, strings, links
//! - VersionDate: File version stamps stored as proleptic Gregorian ordinals
//! - Aliases for document numbers, positions and slot numbers

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod error;
pub mod types;
pub mod version;

pub use error::{Error, Result};
pub use types::{DocNo, Position, SlotNo, NIL};
pub use version::VersionDate;
