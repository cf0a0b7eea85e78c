//! Real-time step logging.
//!
//! Shows only the current step: every `step()` overwrites the previous
//! status line, so a running test reads as one live line that ends in a
//! final success or failure message.
//!
//! Whether anything is printed is decided once, from the environment the
//! launcher prepares (see [`StepPolicy`]).

use console::{Emoji, Term};
use std::io::Write;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

/// Clears the current terminal line and returns the cursor to column 0
pub const CLEAR_LINE: &str = "\r\x1b[K";

/// Message printed by [`StepLogger::success`] callers that have nothing better
pub const DEFAULT_SUCCESS_MESSAGE: &str = "Test completed successfully";

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

static TEST_TUBE: Emoji<'_, '_> = Emoji("🧪 ", "");
static PIN: Emoji<'_, '_> = Emoji("📍 ", "> ");
static CHECK: Emoji<'_, '_> = Emoji("✅ ", "[ok] ");
static CROSS: Emoji<'_, '_> = Emoji("❌ ", "[fail] ");
static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "[info] ");

/// Step logging policy derived from the environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepPolicy {
    /// Steps are shown
    Enabled,
    /// `JEST_SILENT=true`
    Silent,
    /// `JEST_NO_STEPS=true`
    NoSteps,
    /// `CI=true` without `JEST_FORCE_STEPS`
    Ci,
}

impl StepPolicy {
    /// Compute the policy from the process environment
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Compute the policy from an arbitrary variable lookup.
    ///
    /// Priority: silent, then no-steps, then CI without force, then enabled.
    #[must_use]
    pub fn from_env_with<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let is_true = |key: &str| lookup(key).is_some_and(|v| v == "true");

        if is_true("JEST_SILENT") {
            Self::Silent
        } else if is_true("JEST_NO_STEPS") {
            Self::NoSteps
        } else if is_true("CI") && lookup("JEST_FORCE_STEPS").is_none() {
            Self::Ci
        } else {
            Self::Enabled
        }
    }

    /// Whether steps should be printed
    #[must_use]
    pub const fn is_enabled(self) -> bool {
        matches!(self, Self::Enabled)
    }
}

impl Default for StepPolicy {
    fn default() -> Self {
        Self::Enabled
    }
}

#[derive(Debug)]
enum StepSink {
    Term(Term),
    Buffer(Vec<u8>),
}

impl StepSink {
    fn write(&mut self, text: &str) {
        // Step output is best-effort; a closed stdout must not fail a test
        match self {
            Self::Term(term) => {
                let _ = term.write_str(text);
                let _ = term.flush();
            }
            Self::Buffer(buf) => {
                let _ = buf.write_all(text.as_bytes());
            }
        }
    }
}

#[derive(Debug)]
struct StepState {
    enabled: bool,
    current_step: String,
    step_count: usize,
    start: Option<Instant>,
    sink: StepSink,
}

impl StepState {
    fn elapsed(&self) -> String {
        self.start.map_or_else(
            || "0.00s".to_string(),
            |start| format!("{:.2}s", start.elapsed().as_secs_f64()),
        )
    }

    fn finish(&mut self, marker: &Emoji<'_, '_>, message: &str) {
        let timestamp = self.elapsed();
        self.sink.write(CLEAR_LINE);
        self.sink
            .write(&format!("{marker}{message} [{timestamp}]\n{RULE}\n\n"));
        self.current_step.clear();
    }
}

/// Single-line progress reporter for one test at a time
#[derive(Debug)]
pub struct StepLogger {
    state: Mutex<StepState>,
}

impl StepLogger {
    /// Create a logger that writes to stdout
    #[must_use]
    pub fn new(policy: StepPolicy) -> Self {
        Self::with_sink(policy.is_enabled(), StepSink::Term(Term::stdout()))
    }

    /// Create a logger that writes into memory (see [`StepLogger::captured`])
    #[must_use]
    pub fn buffered(enabled: bool) -> Self {
        Self::with_sink(enabled, StepSink::Buffer(Vec::new()))
    }

    /// Create a logger that prints nothing
    #[must_use]
    pub fn disabled() -> Self {
        Self::buffered(false)
    }

    fn with_sink(enabled: bool, sink: StepSink) -> Self {
        Self {
            state: Mutex::new(StepState {
                enabled,
                current_step: String::new(),
                step_count: 0,
                start: None,
                sink,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StepState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reset counters and print the test banner
    pub fn start(&self, test_name: &str) {
        let mut state = self.lock();
        if !state.enabled {
            return;
        }
        state.start = Some(Instant::now());
        state.step_count = 0;
        state.current_step.clear();
        state
            .sink
            .write(&format!("\n{TEST_TUBE}Starting test: {test_name}\n{RULE}\n"));
    }

    /// Show the current step, overwriting the previous one
    pub fn step(&self, action: &str, detail: &str) {
        let mut state = self.lock();
        if !state.enabled {
            return;
        }
        state.step_count += 1;
        let timestamp = state.elapsed();
        let text = if detail.is_empty() {
            format!("{PIN}{action} [{timestamp}]")
        } else {
            format!("{PIN}{action} {detail} [{timestamp}]")
        };
        state.sink.write(CLEAR_LINE);
        state.sink.write(&text);
        state.current_step = text;
    }

    /// Terminate the step line with a success status
    pub fn success(&self, message: &str) {
        let mut state = self.lock();
        if state.enabled {
            state.finish(&CHECK, message);
        }
    }

    /// Terminate the step line with a failure status
    pub fn error(&self, message: &str) {
        let mut state = self.lock();
        if state.enabled {
            state.finish(&CROSS, message);
        }
    }

    /// Print a note above the current step, then restore the step line
    pub fn info(&self, message: &str) {
        let mut state = self.lock();
        if !state.enabled {
            return;
        }
        state.sink.write(CLEAR_LINE);
        state.sink.write(&format!("{INFO}{message}\n"));
        if !state.current_step.is_empty() {
            let step = state.current_step.clone();
            state.sink.write(&step);
        }
    }

    /// Enable or disable output
    pub fn set_enabled(&self, enabled: bool) {
        self.lock().enabled = enabled;
    }

    /// Whether output is enabled
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.lock().enabled
    }

    /// Number of steps since the last `start`
    #[must_use]
    pub fn step_count(&self) -> usize {
        self.lock().step_count
    }

    /// Text of the step currently displayed
    #[must_use]
    pub fn current_step(&self) -> String {
        self.lock().current_step.clone()
    }

    /// Elapsed time since `start`, formatted like the step suffix
    #[must_use]
    pub fn elapsed(&self) -> String {
        self.lock().elapsed()
    }

    /// Everything written so far, for buffered loggers
    #[must_use]
    pub fn captured(&self) -> String {
        match &self.lock().sink {
            StepSink::Buffer(buf) => String::from_utf8_lossy(buf).into_owned(),
            StepSink::Term(_) => String::new(),
        }
    }
}

impl Default for StepLogger {
    fn default() -> Self {
        Self::new(StepPolicy::from_env())
    }
}
