//! Testing utilities for corruption handling
//!
//! The index does no journaling, so the interesting failure modes are
//! damaged files: a crash mid-save leaves a short file, a stray write leaves
//! a bad link, a partial append leaves trailing bytes. These helpers produce
//! each of those on purpose.
//!
//! # Example
//!
//! ```ignore
//! use catalog_storage::testing::{IndexCorruptionTester, IndexFile};
//!
//! let tester = IndexCorruptionTester::new(paths);
//! tester.truncate_tail(IndexFile::Documents, 3)?;
//! let verification = tester.verify_open();
//! assert!(!verification.opened);
//! ```

mod corruption;

pub use corruption::{
    CorruptionResult, GarbageResult, IndexCorruptionTester, IndexFile, OpenVerification,
    TruncationResult,
};
