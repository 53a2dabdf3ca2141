//! Export and import pipelines.
//!
//! Both run strictly sequentially (one collection, one document, one file
//! at a time) and abort at the first error.

pub mod export;
pub mod import;

pub use export::{ApiKeysSummary, ExportOptions, ExportReport, ExportService, ExportSummary};
pub use import::{ApiKeysImported, ImportOptions, ImportReport, ImportService, ImportSummary};
