//! Store abstraction.
//!
//! The archive pipelines talk to a FluxionDB store only through the
//! [`Store`] trait. Two backends are provided:
//! - **`SqliteStore`**: the server's on-disk database, used by the CLI
//! - **`MemoryStore`**: non-persistent, used in tests

// Dropping the connection guard slightly earlier has no benefit.
#![allow(clippy::significant_drop_tightening)]

pub mod filter;
pub mod memory;
pub mod sqlite;
pub mod traits;

pub use filter::NameFilter;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::Store;
