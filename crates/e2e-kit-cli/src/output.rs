//! Launcher console output

use crate::config::RunOptions;
use console::{style, Emoji, Term};
use e2e_kit::lint::LintReport;
use std::path::Path;

static TEST_TUBE: Emoji<'_, '_> = Emoji("🧪 ", "");
static TARGET: Emoji<'_, '_> = Emoji("🎯 ", "");
static SCREEN: Emoji<'_, '_> = Emoji("🖥️  ", "");
static WRENCH: Emoji<'_, '_> = Emoji("🔧 ", "");
static TIMER: Emoji<'_, '_> = Emoji("⏱️  ", "");
static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "");
static SEARCH: Emoji<'_, '_> = Emoji("🔍 ", "");
static FOLDER: Emoji<'_, '_> = Emoji("📁 ", "");
static PAGE: Emoji<'_, '_> = Emoji("📄 ", "");
static PARTY: Emoji<'_, '_> = Emoji("🎉 ", "");
static BULB: Emoji<'_, '_> = Emoji("💡 ", "");

/// Writes launcher messages to stdout
#[derive(Debug)]
pub struct Reporter {
    term: Term,
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter {
    /// Reporter on stdout
    #[must_use]
    pub fn new() -> Self {
        Self {
            term: Term::stdout(),
        }
    }

    fn line(&self, text: &str) {
        let _ = self.term.write_line(text);
    }

    /// Header printed before the test process starts
    pub fn header(&self, options: &RunOptions) {
        for line in header_lines(options) {
            self.line(&line);
        }
        self.line("");
    }

    /// Auto-init notice
    pub fn auto_init(&self) {
        self.line(&format!("{SEARCH}No e2e-kit configuration detected."));
        self.line(&format!("{ROCKET}Initializing your project automatically...\n"));
    }

    /// Scaffolding banner
    pub fn init_banner(&self) {
        self.line(&format!("{ROCKET}Initializing e2e-kit project...\n"));
    }

    /// A created directory
    pub fn created_dir(&self, relative: &Path) {
        self.line(&format!("{FOLDER}Created directory: {}/", relative.display()));
    }

    /// A created file
    pub fn created_file(&self, relative: &Path) {
        self.line(&format!("{PAGE}Created: {}", relative.display()));
    }

    /// A file left untouched
    pub fn skipped_file(&self, relative: &Path) {
        self.line(&format!(
            "{}",
            style(format!("   Skipped (exists): {}", relative.display())).dim()
        ));
    }

    /// Closing lines of a scaffold run
    pub fn next_steps(&self) {
        self.line(&format!(
            "\n{}",
            style("✅ e2e-kit project initialized successfully!").green().bold()
        ));
        self.line("\nNext steps:");
        self.line("1. Add e2e-kit (with the \"browser\" feature) and tokio to [dev-dependencies]");
        self.line("2. Test examples: e2e-kit");
        self.line("3. Edit the example tests to match your application");
        self.line("4. Create your own test files in tests/ (one test per file)");
    }

    /// Lint findings, shown as warnings
    pub fn lint_warnings(&self, report: &LintReport) {
        for finding in &report.errors {
            self.line(&format!("{} {finding}", style("warning:").yellow().bold()));
        }
    }

    /// Notice after a successful REPL run
    pub fn repl_notice(&self) {
        self.line(&format!("\n{PARTY}Tests completed successfully!"));
        self.line(&format!(
            "{WRENCH}REPL mode: Browser window should remain open for debugging."
        ));
        self.line(&format!("{BULB}Close the browser window manually when done."));
    }

    /// Watch mode banner
    pub fn watching(&self, paths: &[&Path]) {
        let shown: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
        self.line(&format!("\nWatching for changes in {}...", shown.join(", ")));
        self.line("Press Ctrl+C to stop\n");
    }

    /// A change that triggers a re-run
    pub fn changed(&self, path: &Path) {
        self.line(&format!(
            "\n[{}] File changed: {}",
            chrono::Local::now().format("%H:%M:%S"),
            path.display()
        ));
    }

    /// Error line on stderr
    pub fn failure(&self, message: &str) {
        eprintln!("{} {message}", style("❌").red().bold());
    }
}

/// Header lines for a run, without styling
#[must_use]
pub fn header_lines(options: &RunOptions) -> Vec<String> {
    let mut lines = vec![
        format!("{TEST_TUBE}e2e-kit Test Runner"),
        format!(
            "{TARGET}Running test: {}",
            options.test_name.as_deref().unwrap_or("all tests")
        ),
        format!(
            "{SCREEN}Browser mode: {}",
            if options.use_local_browser {
                "visible"
            } else {
                "headless"
            }
        ),
    ];
    if options.repl {
        lines.push(format!(
            "{WRENCH}REPL mode: enabled (browser will stay open)"
        ));
    }
    if options.slowmo > 0 {
        lines.push(format!("{TIMER}Slow motion: {}ms", options.slowmo));
    }
    lines
}
