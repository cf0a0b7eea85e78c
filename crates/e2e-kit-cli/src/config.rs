//! Launcher options and the environment they hand to test processes

use e2e_kit::{parse_leading_u64, DEFAULT_TIMEOUT_MS};

/// Default slow-motion delay
pub const DEFAULT_SLOWMO_MS: u64 = 0;

/// Options for one launcher invocation
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct RunOptions {
    /// Test-name filter; all tests when unset
    pub test_name: Option<String>,
    /// Scaffold the project and exit
    pub init: bool,
    /// Visible browser instead of headless
    pub use_local_browser: bool,
    /// Keep the browser open after the run
    pub repl: bool,
    /// Debug logging and devtools
    pub debug: bool,
    /// Re-run on file changes
    pub watch: bool,
    /// Verbose cargo output
    pub verbose: bool,
    /// Per-test timeout in milliseconds
    pub timeout: u64,
    /// Delay between browser actions in milliseconds
    pub slowmo: u64,
    /// Screenshot on failure
    pub screenshot: bool,
    /// No step logging and no summary lines
    pub silent: bool,
    /// Step logging
    pub steps: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            test_name: None,
            init: false,
            use_local_browser: false,
            repl: false,
            debug: false,
            watch: false,
            verbose: false,
            timeout: DEFAULT_TIMEOUT_MS,
            slowmo: DEFAULT_SLOWMO_MS,
            screenshot: false,
            silent: false,
            steps: true,
        }
    }
}

/// `--timeout` value; malformed or zero falls back to the default
#[must_use]
pub fn parse_timeout(raw: Option<&str>) -> u64 {
    raw.and_then(parse_leading_u64)
        .filter(|ms| *ms > 0)
        .unwrap_or(DEFAULT_TIMEOUT_MS)
}

/// `--slowmo` value; malformed falls back to the default
#[must_use]
pub fn parse_slowmo(raw: Option<&str>) -> u64 {
    raw.and_then(parse_leading_u64)
        .unwrap_or(DEFAULT_SLOWMO_MS)
}

impl RunOptions {
    /// Whether the browser window will be shown
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.use_local_browser || self.repl || self.slowmo > 0
    }

    /// Variables added to the test process environment, in a fixed order
    #[must_use]
    pub fn environment(&self) -> Vec<(&'static str, String)> {
        let mut env = Vec::new();

        let mut ci = !self.use_local_browser;
        if self.repl {
            env.push(("PUPPETEER_REPL", "true".to_string()));
            ci = false;
        }
        if self.slowmo > 0 {
            env.push(("PUPPETEER_SLOWMO", self.slowmo.to_string()));
            ci = false;
        }
        env.insert(0, ("CI", ci.to_string()));

        if self.screenshot {
            env.push(("JEST_E2E_SCREENSHOT", "true".to_string()));
        }

        if self.silent {
            env.push(("JEST_SILENT", "true".to_string()));
        } else if !self.steps {
            env.push(("JEST_NO_STEPS", "true".to_string()));
        } else if self.is_visible() {
            env.push(("JEST_FORCE_STEPS", "true".to_string()));
        }

        env.push(("JEST_TIMEOUT", self.timeout.to_string()));

        if self.debug {
            env.push(("DEBUG", "true".to_string()));
        }
        env
    }

    /// Arguments after `cargo`
    #[must_use]
    pub fn cargo_args(&self) -> Vec<String> {
        let mut args = vec!["test".to_string()];
        if let Some(name) = &self.test_name {
            args.push(name.clone());
        }
        args.push(if self.verbose { "--verbose" } else { "--quiet" }.to_string());
        args.extend(
            ["--", "--nocapture", "--test-threads=1"]
                .iter()
                .map(|a| (*a).to_string()),
        );
        args
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use e2e_kit::StepPolicy;

    fn lookup(env: &[(&'static str, String)], key: &str) -> Option<String> {
        env.iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.clone())
    }

    #[test]
    fn test_defaults_are_headless() {
        let env = RunOptions::default().environment();
        assert_eq!(
            env,
            vec![
                ("CI", "true".to_string()),
                ("JEST_TIMEOUT", "30000".to_string()),
            ]
        );
    }

    #[test]
    fn test_slowmo_forces_visible_browser() {
        let opts = RunOptions {
            test_name: Some("login-success".to_string()),
            slowmo: 100,
            ..RunOptions::default()
        };
        let env = opts.environment();
        assert_eq!(lookup(&env, "PUPPETEER_SLOWMO").as_deref(), Some("100"));
        assert_eq!(lookup(&env, "CI").as_deref(), Some("false"));
        assert_eq!(lookup(&env, "JEST_FORCE_STEPS").as_deref(), Some("true"));
        assert_eq!(opts.cargo_args()[1], "login-success");
    }

    #[test]
    fn test_repl_forces_visible_browser() {
        let env = RunOptions {
            repl: true,
            ..RunOptions::default()
        }
        .environment();
        assert_eq!(lookup(&env, "PUPPETEER_REPL").as_deref(), Some("true"));
        assert_eq!(lookup(&env, "CI").as_deref(), Some("false"));
    }

    #[test]
    fn test_local_browser() {
        let env = RunOptions {
            use_local_browser: true,
            ..RunOptions::default()
        }
        .environment();
        assert_eq!(lookup(&env, "CI").as_deref(), Some("false"));
        assert_eq!(lookup(&env, "JEST_FORCE_STEPS").as_deref(), Some("true"));
    }

    #[test]
    fn test_silent_wins_over_no_steps() {
        let env = RunOptions {
            silent: true,
            steps: false,
            use_local_browser: true,
            ..RunOptions::default()
        }
        .environment();
        assert_eq!(lookup(&env, "JEST_SILENT").as_deref(), Some("true"));
        assert!(lookup(&env, "JEST_NO_STEPS").is_none());
        assert!(lookup(&env, "JEST_FORCE_STEPS").is_none());

        let policy = StepPolicy::from_env_with(|k| lookup(&env, k));
        assert!(!policy.is_enabled());
    }

    #[test]
    fn test_no_steps() {
        let env = RunOptions {
            steps: false,
            ..RunOptions::default()
        }
        .environment();
        assert_eq!(lookup(&env, "JEST_NO_STEPS").as_deref(), Some("true"));
    }

    #[test]
    fn test_screenshot_and_debug() {
        let env = RunOptions {
            screenshot: true,
            debug: true,
            ..RunOptions::default()
        }
        .environment();
        assert_eq!(lookup(&env, "JEST_E2E_SCREENSHOT").as_deref(), Some("true"));
        assert_eq!(lookup(&env, "DEBUG").as_deref(), Some("true"));
    }

    #[test]
    fn test_environment_is_deterministic() {
        let opts = RunOptions {
            repl: true,
            slowmo: 20,
            screenshot: true,
            ..RunOptions::default()
        };
        assert_eq!(opts.environment(), opts.environment());
    }

    #[test]
    fn test_numeric_parsing() {
        assert_eq!(parse_timeout(Some("abc")), 30_000);
        assert_eq!(parse_timeout(Some("0")), 30_000);
        assert_eq!(parse_timeout(Some("5000")), 5_000);
        assert_eq!(parse_timeout(None), 30_000);
        assert_eq!(parse_slowmo(Some("100ms")), 100);
        assert_eq!(parse_slowmo(Some("fast")), 0);
    }

    #[test]
    fn test_cargo_args() {
        assert_eq!(
            RunOptions::default().cargo_args(),
            vec!["test", "--quiet", "--", "--nocapture", "--test-threads=1"]
        );
        let verbose = RunOptions {
            verbose: true,
            ..RunOptions::default()
        };
        assert!(verbose.cargo_args().contains(&"--verbose".to_string()));
        assert!(!verbose.cargo_args().contains(&"--quiet".to_string()));
    }
}
