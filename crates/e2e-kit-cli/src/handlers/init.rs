//! Project scaffolding

use crate::error::CliResult;
use crate::output::Reporter;
use e2e_kit::CONFIG_FILE_NAME;
use std::path::{Path, PathBuf};

/// Directory holding e2e test files
pub const TESTS_DIR: &str = "tests";

/// Directory holding data builders, inside the tests directory
pub const DATABUILDERS_DIR: &str = "tests/databuilders";

/// Files written by `init`, relative to the project root
pub const TEMPLATES: &[(&str, &str)] = &[
    (CONFIG_FILE_NAME, include_str!("../../templates/e2e.config.yaml")),
    (
        "tests/example_login_success_e2e.rs",
        include_str!("../../templates/example_login_success_e2e.rs"),
    ),
    (
        "tests/example_login_invalid_e2e.rs",
        include_str!("../../templates/example_login_invalid_e2e.rs"),
    ),
    (
        "tests/example_form_validation_e2e.rs",
        include_str!("../../templates/example_form_validation_e2e.rs"),
    ),
    (
        "tests/databuilders/mod.rs",
        include_str!("../../templates/databuilders_mod.rs"),
    ),
];

/// What a scaffold run did
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScaffoldReport {
    /// Directories created, relative to the root
    pub created_dirs: Vec<PathBuf>,
    /// Files written, relative to the root
    pub created_files: Vec<PathBuf>,
    /// Files left alone because they already existed
    pub skipped_files: Vec<PathBuf>,
}

/// Whether a project still needs scaffolding
#[must_use]
pub fn needs_init(root: &Path) -> bool {
    !root.join(TESTS_DIR).exists() && !root.join(CONFIG_FILE_NAME).exists()
}

/// Create directories and example files; existing files are never overwritten
pub fn scaffold(root: &Path) -> CliResult<ScaffoldReport> {
    let mut report = ScaffoldReport::default();

    for dir in [TESTS_DIR, DATABUILDERS_DIR] {
        let target = root.join(dir);
        if !target.exists() {
            std::fs::create_dir_all(&target)?;
            report.created_dirs.push(PathBuf::from(dir));
        }
    }

    for (relative, contents) in TEMPLATES {
        let target = root.join(relative);
        if target.exists() {
            report.skipped_files.push(PathBuf::from(relative));
            continue;
        }
        std::fs::write(&target, contents)?;
        report.created_files.push(PathBuf::from(relative));
    }

    tracing::debug!(
        created = report.created_files.len(),
        skipped = report.skipped_files.len(),
        "scaffold finished"
    );
    Ok(report)
}

/// Scaffold `root` and print what happened
pub fn execute_init(root: &Path, reporter: &Reporter) -> CliResult<ScaffoldReport> {
    reporter.init_banner();
    let report = scaffold(root)?;
    for dir in &report.created_dirs {
        reporter.created_dir(dir);
    }
    for file in &report.created_files {
        reporter.created_file(file);
    }
    for file in &report.skipped_files {
        reporter.skipped_file(file);
    }
    reporter.next_steps();
    Ok(report)
}
