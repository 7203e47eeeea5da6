//! Tooling
//!
//! Command-line access to identity generation, join validation, and local
//! ingestion/export.

pub mod cli;

pub use cli::{Cli, CliContext, Commands};
