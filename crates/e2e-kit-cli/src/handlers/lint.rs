//! Pre-run single-test lint gate

use crate::output::Reporter;
use e2e_kit::lint::{lint_dir, LintReport};
use std::path::Path;

/// Lint `tests_dir` and print findings as warnings.
///
/// The gate never blocks the run; the runtime enforcer rejects the second
/// test with a proper failure. Returns `None` when the directory is absent
/// or unreadable.
pub fn lint_gate(tests_dir: &Path, reporter: &Reporter) -> Option<LintReport> {
    if !tests_dir.is_dir() {
        return None;
    }
    match lint_dir(tests_dir) {
        Ok(report) => {
            if report.has_errors() {
                reporter.lint_warnings(&report);
            }
            Some(report)
        }
        Err(e) => {
            tracing::warn!(dir = %tests_dir.display(), error = %e, "lint gate skipped");
            None
        }
    }
}
