//! e2e-kit: launcher for one-test-per-file browser suites
//!
//! ## Usage
//!
//! ```bash
//! e2e-kit                              # Run all tests
//! e2e-kit login-success --slowmo 100   # One test, visible browser, slowed down
//! e2e-kit init                         # Scaffold example tests
//! ```

use clap::Parser;
use e2e_kit_cli::handlers::{execute_init, needs_init};
use e2e_kit_cli::{Cli, CliResult, Reporter, TestRunner};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let options = cli.options();
    e2e_kit::logging::init_with(options.debug);

    match run(options) {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            Reporter::new().failure(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

fn run(options: e2e_kit_cli::RunOptions) -> CliResult<i32> {
    let root = std::env::current_dir()?;
    let reporter = Reporter::new();

    if options.init {
        execute_init(&root, &reporter)?;
        return Ok(0);
    }

    if needs_init(&root) {
        reporter.auto_init();
        execute_init(&root, &reporter)?;
        println!();
    }

    TestRunner::new(options, root)?.run()
}
