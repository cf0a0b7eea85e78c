//! `cargo test` subprocess and watch mode

use crate::config::RunOptions;
use crate::error::{CliError, CliResult};
use crate::handlers::lint_gate;
use crate::output::Reporter;
use e2e_kit::ProjectConfig;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::mpsc;
use std::time::Duration;

/// Quiet period before a batch of changes triggers a re-run
pub const WATCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Extensions whose changes trigger a re-run
pub const WATCH_EXTENSIONS: &[&str] = &["rs", "toml", "yaml"];

/// Whether a changed path should trigger a re-run
#[must_use]
pub fn is_watched(path: &Path) -> bool {
    let in_target = path.components().any(|c| c.as_os_str() == "target");
    let extension_matches = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| WATCH_EXTENSIONS.contains(&ext));
    extension_matches && !in_target
}

/// Runs the project's e2e tests through cargo
#[derive(Debug)]
pub struct TestRunner {
    options: RunOptions,
    root: PathBuf,
    project: ProjectConfig,
    reporter: Reporter,
}

impl TestRunner {
    /// Runner for the project at `root`
    pub fn new(options: RunOptions, root: impl Into<PathBuf>) -> CliResult<Self> {
        let root = root.into();
        let project = ProjectConfig::load_from_root(&root)?;
        Ok(Self {
            options,
            root,
            project,
            reporter: Reporter::new(),
        })
    }

    /// Resolved tests directory
    #[must_use]
    pub fn tests_dir(&self) -> PathBuf {
        self.root.join(&self.project.tests_dir)
    }

    /// The subprocess command, ready to spawn
    #[must_use]
    pub fn command(&self) -> Command {
        let cargo = std::env::var_os("CARGO").unwrap_or_else(|| "cargo".into());
        let mut command = Command::new(cargo);
        command
            .args(self.options.cargo_args())
            .envs(self.options.environment())
            .current_dir(&self.root);
        command
    }

    /// Lint, run once, and return the child's exit code
    pub fn run_once(&self) -> CliResult<i32> {
        self.reporter.header(&self.options);
        lint_gate(&self.tests_dir(), &self.reporter);

        tracing::debug!(args = ?self.options.cargo_args(), "spawning cargo test");
        let status = self
            .command()
            .status()
            .map_err(|e| CliError::spawn(e.to_string()))?;

        // Killed by a signal
        let code = status.code().unwrap_or(1);
        if self.options.repl && code == 0 {
            self.reporter.repl_notice();
        }
        Ok(code)
    }

    /// Run, then re-run on every debounced batch of changes
    pub fn watch(&self) -> CliResult<i32> {
        let mut last = self.run_once()?;

        let (tx, rx) = mpsc::channel::<PathBuf>();
        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| match res {
                Ok(event) => {
                    for path in event.paths.into_iter().filter(|p| is_watched(p)) {
                        let _ = tx.send(path);
                    }
                }
                Err(e) => tracing::warn!(error = %e, "watch error"),
            },
            notify::Config::default(),
        )?;

        let tests_dir = self.tests_dir();
        let src_dir = self.root.join("src");
        let mut watched: Vec<&Path> = Vec::new();
        for dir in [tests_dir.as_path(), src_dir.as_path()] {
            if dir.is_dir() {
                watcher.watch(dir, RecursiveMode::Recursive)?;
                watched.push(dir);
            }
        }
        self.reporter.watching(&watched);

        while let Ok(first) = rx.recv() {
            loop {
                match rx.recv_timeout(WATCH_DEBOUNCE) {
                    Ok(_) => {}
                    Err(mpsc::RecvTimeoutError::Timeout) => break,
                    Err(mpsc::RecvTimeoutError::Disconnected) => return Ok(last),
                }
            }
            self.reporter.changed(&first);
            last = self.run_once()?;
        }
        Ok(last)
    }

    /// Run according to the options
    pub fn run(&self) -> CliResult<i32> {
        if self.options.watch {
            self.watch()
        } else {
            self.run_once()
        }
    }
}
