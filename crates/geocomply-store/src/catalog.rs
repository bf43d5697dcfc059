//! Catalog document loading.

use std::path::Path;

use geocomply_core::{Catalog, LawArtifact};
use tracing::info;

use crate::StoreError;

/// Default location of the catalog written by the extraction tool.
pub const DEFAULT_CATALOG_PATH: &str = "files/main/directory.json";

/// Load the catalog document (a JSON array of law artifacts) from disk.
///
/// The result is meant to be loaded once at startup and shared read-only.
pub fn load_catalog(path: &Path) -> Result<Catalog, StoreError> {
    if !path.exists() {
        return Err(StoreError::CatalogNotFound(path.to_path_buf()));
    }
    let raw = std::fs::read_to_string(path)?;
    let artifacts: Vec<LawArtifact> =
        serde_json::from_str(&raw).map_err(|source| StoreError::InvalidCatalog {
            path: path.to_path_buf(),
            source,
        })?;
    let catalog = Catalog::from_artifacts(artifacts);
    info!(
        path = %path.display(),
        laws = catalog.law_count(),
        rules = catalog.rule_count(),
        "loaded catalog"
    );
    Ok(catalog)
}
