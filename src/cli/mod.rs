//! CLI module
//!
//! # Commands
//!
//! - `fetch` - Page through an endpoint, printing snapshots and records
//! - `validate` - Check a configuration file

mod commands;
mod runner;

pub use commands::{Cli, Commands, FetchArgs, OutputFormat};
pub use runner::Runner;
