//! Archive import/export subsystem.
//!
//! Moves collections between a [`Store`](crate::storage::Store) and a local
//! directory tree.
//!
//! # Architecture
//!
//! - **Naming** maps document names to file names and back
//! - **Formats** read and write the two on-disk layouts
//! - **Discovery** finds collection directories below an archive root
//! - **Batch** groups imported records into bounded insert calls
//! - **Services** orchestrate the export and import pipelines
//!
//! # Examples
//!
//! ## Export everything
//!
//! ```rust,ignore
//! use fluxion_archive::io::{ExportOptions, ExportService};
//!
//! let report = ExportService::new(&store).run(&ExportOptions::all("backup"))?;
//! println!("exported {} records", report.total_records());
//! ```
//!
//! ## Import a legacy collection
//!
//! ```rust,ignore
//! use fluxion_archive::io::{Format, ImportOptions, ImportService};
//!
//! let options = ImportOptions::new("backup")
//!     .with_collection("cell_info")
//!     .with_format(Format::Legacy);
//! let report = ImportService::new(&store).run(&options)?;
//! ```

pub mod batch;
pub mod discovery;
pub mod formats;
pub mod naming;
pub mod services;
pub mod snapshot;
pub mod traits;

// Re-exports for convenience
pub use batch::{BATCH_SIZE, BatchSink};
pub use discovery::discover_collections;
pub use formats::{DocumentArchive, Format};
pub use naming::{collection_dir, decode_document_name, encode_document_name};
pub use services::{
    ApiKeysImported, ApiKeysSummary, ExportOptions, ExportReport, ExportService, ExportSummary,
    ImportOptions, ImportReport, ImportService, ImportSummary,
};
pub use traits::{RecordSink, RecordSource};
