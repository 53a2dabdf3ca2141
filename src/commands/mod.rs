//! Command handlers module.
//!
//! - `io.rs`: `export` and `import` commands

mod io;

pub use io::{cmd_export, cmd_import};
