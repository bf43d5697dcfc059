//! Storage layer: catalog document, catalog context selection, run logs.

mod error;
pub use error::StoreError;

pub mod catalog;
pub mod context;
pub mod runlog;

pub use catalog::{DEFAULT_CATALOG_PATH, load_catalog};
pub use context::{CatalogContext, ContextLimits, build_context};
pub use runlog::{CSV_HEADER, CsvLog, DEFAULT_CSV_LOG, JsonlLog};
