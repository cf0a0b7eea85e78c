//! Command handlers - kept out of main.rs for testability

pub mod init;
pub mod lint;

pub use init::{execute_init, needs_init, scaffold, ScaffoldReport, TEMPLATES};
pub use lint::lint_gate;
