//! Skeleton builder for brand-new indexes

use catalog_core::{Result, VersionDate};
use tracing::info;

use crate::documents::DocumentsStore;
use crate::paths::IndexPaths;
use crate::positions::PositionsStore;
use crate::tree::TreeStore;

/// Create (or truncate) the three files with empty headers stamped `version`.
///
/// Every file ends up header-only: no slots, nil free-list and, for the
/// tree file, a nil root child. Nothing is written unless the three paths
/// are distinct.
pub fn build_skeleton(paths: &IndexPaths, version: VersionDate) -> Result<()> {
    paths.validate()?;
    TreeStore::create(&paths.tree, version)?.into_file().close()?;
    DocumentsStore::create(&paths.documents, version)?.into_file().close()?;
    PositionsStore::create(&paths.positions, version)?.into_file().close()?;
    info!(target: "catalog::storage", version = %version, tree = ?paths.tree, "Built index skeleton");
    Ok(())
}
