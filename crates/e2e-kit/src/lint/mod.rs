//! Static checks for e2e test files
//!
//! ## Detection Rules
//!
//! | Rule ID | Description |
//! |---------|-------------|
//! | E2E-ST-001 | More than one test function in a single test file |
//!
//! The runtime enforcer is authoritative; the lint catches violations
//! before a browser is ever launched.

pub mod single_test;

pub use single_test::{lint_dir, lint_file, lint_source, SingleTestVisitor, SINGLE_TEST_RULE};

use std::fmt;

/// Severity levels for lint findings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintSeverity {
    /// Must be fixed
    Error,
    /// Should be reviewed
    Warning,
}

impl fmt::Display for LintSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// A lint finding with location and suggestion
#[derive(Debug, Clone)]
pub struct LintError {
    /// Rule identifier (e.g., "E2E-ST-001")
    pub rule: String,
    /// Human-readable message
    pub message: String,
    /// File path
    pub file: String,
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
    /// Severity level
    pub severity: LintSeverity,
    /// Suggested fix
    pub suggestion: Option<String>,
}

impl fmt::Display for LintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}]: {} ({}:{}:{})",
            self.severity, self.rule, self.message, self.file, self.line, self.column
        )?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, "\n  = help: {suggestion}")?;
        }
        Ok(())
    }
}

/// Findings across one or more files
#[derive(Debug, Default)]
pub struct LintReport {
    /// All findings
    pub errors: Vec<LintError>,
    /// Files analyzed
    pub files_analyzed: usize,
}

impl LintReport {
    /// Whether any finding is an error
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.errors
            .iter()
            .any(|e| e.severity == LintSeverity::Error)
    }

    /// Number of error findings
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.errors
            .iter()
            .filter(|e| e.severity == LintSeverity::Error)
            .count()
    }

    /// Merge another report into this one
    pub fn merge(&mut self, other: Self) {
        self.errors.extend(other.errors);
        self.files_analyzed += other.files_analyzed;
    }
}

impl fmt::Display for LintReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for error in &self.errors {
            writeln!(f, "{error}")?;
        }
        write!(
            f,
            "{} file(s) checked, {} error(s)",
            self.files_analyzed,
            self.error_count()
        )
    }
}
