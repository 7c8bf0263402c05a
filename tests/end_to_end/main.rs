//! End-to-end tests through the public `catalog` API.

#[path = "../common/mod.rs"]
mod common;

mod catalog_workflow;
mod inspection;
mod properties;
mod reopen_cycles;
