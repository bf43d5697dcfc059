use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("catalog file not found: {0}")]
    CatalogNotFound(std::path::PathBuf),

    #[error("invalid catalog document {path}: {source}")]
    InvalidCatalog {
        path: std::path::PathBuf,
        source: serde_json::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
