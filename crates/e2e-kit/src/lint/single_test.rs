//! AST check that each e2e test file declares exactly one test.
//!
//! Any function whose attributes include a path ending in `test` counts,
//! so `#[test]`, `#[tokio::test]` and `#[tokio::test(flavor = "...")]` are
//! all seen. Nested modules are walked too.

use super::{LintError, LintReport, LintSeverity};
use crate::result::{E2eError, E2eResult};
use std::path::Path;
use syn::spanned::Spanned;
use syn::visit::Visit;
use syn::{Attribute, ImplItemFn, ItemFn};

/// Rule id for a second test in one file
pub const SINGLE_TEST_RULE: &str = "E2E-ST-001";

fn is_test_attribute(attr: &Attribute) -> bool {
    attr.path()
        .segments
        .last()
        .is_some_and(|segment| segment.ident == "test")
}

/// Collects test functions in source order
#[derive(Debug)]
pub struct SingleTestVisitor {
    file: String,
    /// (name, line, column) of each test function
    pub tests: Vec<(String, usize, usize)>,
}

impl SingleTestVisitor {
    /// Visitor for one file
    #[must_use]
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            tests: Vec::new(),
        }
    }

    fn record(&mut self, attrs: &[Attribute], ident: &syn::Ident) {
        if attrs.iter().any(is_test_attribute) {
            let start = ident.span().start();
            self.tests
                .push((ident.to_string(), start.line, start.column + 1));
        }
    }

    /// Findings for every test after the first
    #[must_use]
    pub fn into_errors(self) -> Vec<LintError> {
        let Some((first, _, _)) = self.tests.first().cloned() else {
            return Vec::new();
        };
        let total = self.tests.len();
        self.tests
            .into_iter()
            .skip(1)
            .map(|(name, line, column)| LintError {
                rule: SINGLE_TEST_RULE.to_string(),
                message: format!(
                    "test `{name}` is one of {total} tests in this file; only one test per file is allowed"
                ),
                file: self.file.clone(),
                line,
                column,
                severity: LintSeverity::Error,
                suggestion: Some(format!(
                    "move `{name}` into its own file next to the one holding `{first}`"
                )),
            })
            .collect()
    }
}

impl<'ast> Visit<'ast> for SingleTestVisitor {
    fn visit_item_fn(&mut self, node: &'ast ItemFn) {
        self.record(&node.attrs, &node.sig.ident);
        syn::visit::visit_item_fn(self, node);
    }

    fn visit_impl_item_fn(&mut self, node: &'ast ImplItemFn) {
        self.record(&node.attrs, &node.sig.ident);
        syn::visit::visit_impl_item_fn(self, node);
    }
}

/// Lint one file's source text
///
/// # Errors
///
/// Returns [`E2eError::Config`] if the source does not parse.
pub fn lint_source(file: &str, source: &str) -> E2eResult<LintReport> {
    let syntax = syn::parse_file(source).map_err(|e| E2eError::Config {
        message: format!("{file}:{}: parse error: {e}", e.span().start().line),
    })?;

    let mut visitor = SingleTestVisitor::new(file);
    visitor.visit_file(&syntax);

    Ok(LintReport {
        errors: visitor.into_errors(),
        files_analyzed: 1,
    })
}

/// Lint a file on disk
pub fn lint_file(path: &Path) -> E2eResult<LintReport> {
    let source = std::fs::read_to_string(path)?;
    lint_source(&path.display().to_string(), &source)
}

/// Lint every `*.rs` file directly inside `dir`
///
/// Subdirectories hold shared helpers such as data builders and are not
/// test targets. Files that fail to parse are logged and skipped; the
/// compiler reports them properly.
pub fn lint_dir(dir: &Path) -> E2eResult<LintReport> {
    let mut report = LintReport::default();
    let mut paths: Vec<_> = std::fs::read_dir(dir)?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "rs"))
        .collect();
    paths.sort();

    for path in paths {
        match lint_file(&path) {
            Ok(file_report) => report.merge(file_report),
            Err(e) => tracing::warn!(file = %path.display(), error = %e, "skipping unparsable test file"),
        }
    }
    Ok(report)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_single_test_is_clean() {
        let source = r#"
#[tokio::test]
async fn login_success() {}

fn helper() {}
"#;
        let report = lint_source("tests/login_e2e.rs", source).unwrap();
        assert!(!report.has_errors());
        assert_eq!(report.files_analyzed, 1);
    }

    #[test]
    fn test_second_test_is_flagged() {
        let source = r#"
#[test]
fn first() {}

#[test]
fn second() {}
"#;
        let report = lint_source("tests/two_e2e.rs", source).unwrap();
        assert_eq!(report.error_count(), 1);
        let err = &report.errors[0];
        assert_eq!(err.rule, SINGLE_TEST_RULE);
        assert_eq!(err.line, 6);
        assert_eq!(err.column, 4);
        assert!(err.message.contains("second"));
        assert!(err.to_string().starts_with("error[E2E-ST-001]"));
    }

    #[test]
    fn test_attribute_variants_and_nested_modules() {
        let source = r#"
#[tokio::test(flavor = "multi_thread")]
async fn a() {}

mod inner {
    #[test]
    fn b() {}
}
"#;
        let report = lint_source("x.rs", source).unwrap();
        assert_eq!(report.error_count(), 1);
        assert!(report.errors[0].message.contains("2 tests"));
    }

    #[test]
    fn test_non_test_attributes_ignored() {
        let source = r#"
#[inline]
fn a() {}
#[allow(dead_code)]
fn testing() {}
"#;
        let report = lint_source("x.rs", source).unwrap();
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_parse_error() {
        assert!(lint_source("bad.rs", "fn (").is_err());
    }

    #[test]
    fn test_lint_dir_skips_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("one_e2e.rs"), "#[test] fn a() {}").unwrap();
        std::fs::write(
            dir.path().join("two_e2e.rs"),
            "#[test] fn a() {}\n#[test] fn b() {}",
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.md"), "#[test]").unwrap();
        std::fs::create_dir(dir.path().join("databuilders")).unwrap();
        std::fs::write(
            dir.path().join("databuilders/mod.rs"),
            "#[test] fn a() {}\n#[test] fn b() {}",
        )
        .unwrap();

        let report = lint_dir(dir.path()).unwrap();
        assert_eq!(report.files_analyzed, 2);
        assert_eq!(report.error_count(), 1);
        assert!(report.to_string().contains("2 file(s) checked, 1 error(s)"));
    }
}
