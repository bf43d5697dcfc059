pub mod catalog;
pub mod record;
pub mod verdict;

pub use catalog::{Catalog, LawArtifact, Rule, UNCLASSIFIED_JURISDICTION};
pub use record::{RunRecord, SourceMetadata};
pub use verdict::{AuditResult, Classification, Verdict, VerdictError};
