//! CLI definition using clap

use crate::config::{parse_slowmo, parse_timeout, RunOptions};
use clap::Parser;

const AFTER_HELP: &str = "\
COMMANDS:
  init                      Initialize an e2e-kit project (writes example files)

EXAMPLES:
  e2e-kit init                               # Initialize project with example files
  e2e-kit                                    # Run all tests (auto-initializes if needed)
  e2e-kit login-success                      # Run one test (headless with step logging)
  e2e-kit --useLocalBrowser true             # Run all tests with a visible browser
  e2e-kit login-success --repl               # Run a test and keep the browser open
  e2e-kit --debug --verbose                  # Run with debug logging and verbose output
  e2e-kit login-success --slowmo 100         # Run with 100ms delay between actions
  e2e-kit --watch                            # Re-run tests when files change
  e2e-kit --silent                           # Run without step logging
  e2e-kit login-success --no-steps           # Run one test without step logging

ENVIRONMENT:
  Tests run headless by default for CI/automation.
  Use --useLocalBrowser true for local development and debugging.
  Step logging is enabled by default and shows real-time test progress.

NOTE:
  If neither a tests/ directory nor e2e.config.yaml is found,
  the project is initialized automatically before running.";

/// e2e-kit: run fluent browser end-to-end tests
#[derive(Parser, Debug, Default)]
#[command(name = "e2e-kit")]
#[command(author, version, about, long_about = None)]
#[command(after_help = AFTER_HELP)]
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// `init`, or the name of the test to run (all tests when omitted)
    #[arg(value_name = "COMMAND|TEST_NAME")]
    pub positional: Vec<String>,

    /// Run with a visible browser (`true`) instead of headless
    #[arg(long = "useLocalBrowser", value_name = "true|false")]
    pub use_local_browser: Option<String>,

    /// Keep the browser open after the test for debugging
    #[arg(long)]
    pub repl: bool,

    /// Debug logging and devtools
    #[arg(long)]
    pub debug: bool,

    /// Re-run tests when files change
    #[arg(short, long)]
    pub watch: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Per-test timeout in milliseconds (default: 30000)
    #[arg(long, value_name = "MS")]
    pub timeout: Option<String>,

    /// Delay between browser actions in milliseconds (default: 0)
    #[arg(long, value_name = "MS")]
    pub slowmo: Option<String>,

    /// Take a screenshot when a test fails
    #[arg(long)]
    pub screenshot: bool,

    /// No step logging at all
    #[arg(long)]
    pub silent: bool,

    /// Disable step-by-step logging only
    #[arg(long = "no-steps")]
    pub no_steps: bool,
}

impl Cli {
    /// Resolve raw arguments into run options
    #[must_use]
    pub fn options(&self) -> RunOptions {
        let init = self.positional.iter().any(|arg| arg == "init");
        let test_name = if init {
            None
        } else {
            self.positional.first().cloned()
        };

        RunOptions {
            test_name,
            init,
            use_local_browser: self.use_local_browser.as_deref() == Some("true"),
            repl: self.repl,
            debug: self.debug,
            watch: self.watch,
            verbose: self.verbose,
            timeout: parse_timeout(self.timeout.as_deref()),
            slowmo: parse_slowmo(self.slowmo.as_deref()),
            screenshot: self.screenshot,
            silent: self.silent,
            steps: !self.silent && !self.no_steps,
        }
    }
}
