//! e2e-kit CLI library
//!
//! Flag parsing, environment derivation, project scaffolding, the lint gate
//! and the `cargo test` subprocess behind the `e2e-kit` binary.

#![warn(missing_docs)]

mod commands;
mod config;
mod error;
pub mod handlers;
mod output;
mod runner;

pub use commands::Cli;
pub use config::{parse_slowmo, parse_timeout, RunOptions, DEFAULT_SLOWMO_MS};
pub use error::{CliError, CliResult};
pub use output::{header_lines, Reporter};
pub use runner::{is_watched, TestRunner, WATCH_DEBOUNCE, WATCH_EXTENSIONS};
