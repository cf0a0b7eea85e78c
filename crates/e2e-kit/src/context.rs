//! Run configuration and per-process context.
//!
//! The launcher communicates with test processes through environment
//! variables; [`RunConfig`] reads them back. Project-level launch settings
//! live in `e2e.config.yaml` ([`ProjectConfig`]).

use crate::device::Device;
use crate::driver::{PageDriver, Viewport, DEFAULT_TIMEOUT_MS};
use crate::enforcer::SingleTestEnforcer;
use crate::result::E2eResult;
use crate::step_logger::{StepLogger, StepPolicy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

/// Project config file name, looked up at the project root
pub const CONFIG_FILE_NAME: &str = "e2e.config.yaml";

/// Slow-motion default when `NODE_ENV=development` and no explicit value
pub const DEVELOPMENT_SLOW_MO_MS: u64 = 50;

/// Browser arguments applied unless the project overrides them
pub const DEFAULT_BROWSER_ARGS: &[&str] = &[
    "--no-sandbox",
    "--disable-setuid-sandbox",
    "--disable-dev-shm-usage",
];

/// Contents of `e2e.config.yaml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Initial viewport
    pub viewport: Viewport,
    /// Extra browser command-line arguments
    pub args: Vec<String>,
    /// Chromium executable, auto-detected when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executable: Option<PathBuf>,
    /// User agent override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Directory holding the e2e test files
    pub tests_dir: PathBuf,
    /// Where failure screenshots are written
    pub screenshot_dir: PathBuf,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            args: DEFAULT_BROWSER_ARGS.iter().map(|a| (*a).to_string()).collect(),
            executable: None,
            user_agent: None,
            tests_dir: PathBuf::from("tests"),
            screenshot_dir: PathBuf::from("target/e2e-screenshots"),
        }
    }
}

impl ProjectConfig {
    /// Parse YAML text
    pub fn from_yaml(text: &str) -> E2eResult<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml_ng::from_str(text)?)
    }

    /// Load from a file; a missing file yields defaults
    pub fn load(path: &Path) -> E2eResult<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_yaml(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Load `e2e.config.yaml` from a project root
    pub fn load_from_root(root: &Path) -> E2eResult<Self> {
        Self::load(&root.join(CONFIG_FILE_NAME))
    }

    /// Project root of the running test: `CARGO_MANIFEST_DIR`, else the cwd
    #[must_use]
    pub fn discover_root() -> PathBuf {
        std::env::var_os("CARGO_MANIFEST_DIR")
            .map(PathBuf::from)
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Serialize as YAML
    pub fn to_yaml(&self) -> E2eResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }
}

/// Settings a test process receives from the launcher
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Run the browser headless (`CI=true`)
    pub headless: bool,
    /// Delay applied to every interaction (ms)
    pub slow_mo: u64,
    /// Open devtools (`DEBUG=true`)
    pub devtools: bool,
    /// Keep the browser open after the test (`PUPPETEER_REPL=true`)
    pub repl: bool,
    /// Save a screenshot when a test fails (`JEST_E2E_SCREENSHOT=true`)
    pub screenshot_on_failure: bool,
    /// Per-test timeout (ms)
    pub timeout: u64,
    /// Step display policy
    pub step_policy: StepPolicy,
    /// Project launch settings
    pub project: ProjectConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::from_env_with(|_| None)
    }
}

impl RunConfig {
    /// Read the process environment and the project's config file
    pub fn from_env() -> E2eResult<Self> {
        let project = ProjectConfig::load_from_root(&ProjectConfig::discover_root())?;
        Ok(Self::from_env_with(|key| std::env::var(key).ok()).with_project(project))
    }

    /// Build from an arbitrary variable lookup, with default project settings.
    ///
    /// Absent or malformed values fall back to defaults.
    #[must_use]
    pub fn from_env_with<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let is_true = |key: &str| lookup(key).is_some_and(|v| v == "true");

        let slow_mo = lookup("PUPPETEER_SLOWMO")
            .and_then(|v| parse_leading_u64(&v))
            .unwrap_or_else(|| {
                if lookup("NODE_ENV").is_some_and(|v| v == "development") {
                    DEVELOPMENT_SLOW_MO_MS
                } else {
                    0
                }
            });

        let timeout = lookup("JEST_TIMEOUT")
            .and_then(|v| parse_leading_u64(&v))
            .filter(|ms| *ms > 0)
            .unwrap_or(DEFAULT_TIMEOUT_MS);

        Self {
            headless: is_true("CI"),
            slow_mo,
            devtools: is_true("DEBUG"),
            repl: is_true("PUPPETEER_REPL"),
            screenshot_on_failure: is_true("JEST_E2E_SCREENSHOT"),
            timeout,
            step_policy: StepPolicy::from_env_with(&lookup),
            project: ProjectConfig::default(),
        }
    }

    /// Replace the project settings
    #[must_use]
    pub fn with_project(mut self, project: ProjectConfig) -> Self {
        self.project = project;
        self
    }
}

/// Parse the leading ASCII digits of `value`, if any
#[must_use]
pub fn parse_leading_u64(value: &str) -> Option<u64> {
    let digits: String = value
        .trim_start()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

/// Browser launch settings derived from a [`RunConfig`]
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchConfig {
    /// Headless mode
    pub headless: bool,
    /// Open devtools
    pub devtools: bool,
    /// Interaction delay (ms)
    pub slow_mo: u64,
    /// Initial viewport
    pub viewport: Viewport,
    /// Browser arguments
    pub args: Vec<String>,
    /// Chromium executable
    pub executable: Option<PathBuf>,
    /// User agent override
    pub user_agent: Option<String>,
    /// Keep the browser open on close
    pub keep_open: bool,
}

impl LaunchConfig {
    /// Derive launch settings
    #[must_use]
    pub fn from_run_config(config: &RunConfig) -> Self {
        Self {
            headless: config.headless,
            devtools: config.devtools,
            slow_mo: config.slow_mo,
            viewport: config.project.viewport,
            args: config.project.args.clone(),
            executable: config.project.executable.clone(),
            user_agent: config.project.user_agent.clone(),
            keep_open: config.repl,
        }
    }
}

/// Everything a test process shares: config, step logger, enforcer
#[derive(Debug, Clone)]
pub struct RunContext {
    config: Arc<RunConfig>,
    logger: Arc<StepLogger>,
    enforcer: Arc<Mutex<SingleTestEnforcer>>,
}

impl RunContext {
    /// Context with a stdout step logger following the config's policy
    #[must_use]
    pub fn new(config: RunConfig) -> Self {
        let logger = Arc::new(StepLogger::new(config.step_policy));
        Self::with_logger(config, logger)
    }

    /// Context with an explicit logger
    #[must_use]
    pub fn with_logger(config: RunConfig, logger: Arc<StepLogger>) -> Self {
        Self {
            config: Arc::new(config),
            logger,
            enforcer: Arc::new(Mutex::new(SingleTestEnforcer::new())),
        }
    }

    /// Context from the process environment
    pub fn from_env() -> E2eResult<Self> {
        Ok(Self::new(RunConfig::from_env()?))
    }

    /// The context shared by every test in this process.
    ///
    /// Built from the environment on first use. Sharing it is what lets the
    /// enforcer see a second test registered by the same file.
    pub fn process() -> E2eResult<Self> {
        static PROCESS: OnceLock<RunContext> = OnceLock::new();

        if let Some(ctx) = PROCESS.get() {
            return Ok(ctx.clone());
        }
        let ctx = Self::from_env()?;
        Ok(PROCESS.get_or_init(|| ctx).clone())
    }

    /// Run configuration
    #[must_use]
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Step logger
    #[must_use]
    pub fn logger(&self) -> &Arc<StepLogger> {
        &self.logger
    }

    /// Shared single-test enforcer
    #[must_use]
    pub fn enforcer(&self) -> &Arc<Mutex<SingleTestEnforcer>> {
        &self.enforcer
    }

    /// Launch settings for this run
    #[must_use]
    pub fn launch_config(&self) -> LaunchConfig {
        LaunchConfig::from_run_config(&self.config)
    }

    /// Device facade over `driver` using this run's logger
    #[must_use]
    pub fn device(&self, driver: Arc<dyn PageDriver>) -> Device {
        Device::new(driver, Arc::clone(&self.logger))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> RunConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        RunConfig::from_env_with(|key| map.get(key).cloned())
    }

    mod run_config_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let cfg = config(&[]);
            assert!(!cfg.headless);
            assert_eq!(cfg.slow_mo, 0);
            assert!(!cfg.repl);
            assert_eq!(cfg.timeout, 30_000);
            assert_eq!(cfg.step_policy, StepPolicy::Enabled);
            assert_eq!(cfg, RunConfig::default());
        }

        #[test]
        fn test_launcher_variables() {
            let cfg = config(&[
                ("CI", "false"),
                ("PUPPETEER_SLOWMO", "100"),
                ("PUPPETEER_REPL", "true"),
                ("JEST_E2E_SCREENSHOT", "true"),
                ("JEST_TIMEOUT", "60000"),
                ("DEBUG", "true"),
                ("JEST_FORCE_STEPS", "true"),
            ]);
            assert!(!cfg.headless);
            assert_eq!(cfg.slow_mo, 100);
            assert!(cfg.repl);
            assert!(cfg.screenshot_on_failure);
            assert_eq!(cfg.timeout, 60_000);
            assert!(cfg.devtools);
            assert!(cfg.step_policy.is_enabled());
        }

        #[test]
        fn test_ci_is_headless_and_quiet() {
            let cfg = config(&[("CI", "true")]);
            assert!(cfg.headless);
            assert_eq!(cfg.step_policy, StepPolicy::Ci);
        }

        #[test]
        fn test_malformed_values_fall_back() {
            let cfg = config(&[("PUPPETEER_SLOWMO", "fast"), ("JEST_TIMEOUT", "0")]);
            assert_eq!(cfg.slow_mo, 0);
            assert_eq!(cfg.timeout, 30_000);
        }

        #[test]
        fn test_development_slow_mo() {
            assert_eq!(config(&[("NODE_ENV", "development")]).slow_mo, 50);
            let explicit = config(&[("NODE_ENV", "development"), ("PUPPETEER_SLOWMO", "0")]);
            assert_eq!(explicit.slow_mo, 0);
        }

        #[test]
        fn test_parse_leading_digits() {
            assert_eq!(parse_leading_u64("100ms"), Some(100));
            assert_eq!(parse_leading_u64(" 42"), Some(42));
            assert_eq!(parse_leading_u64("abc"), None);
            assert_eq!(parse_leading_u64(""), None);
        }
    }

    mod project_config_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let cfg = ProjectConfig::default();
            assert_eq!(cfg.viewport, Viewport::new(1280, 720));
            assert_eq!(cfg.args.len(), 3);
            assert_eq!(cfg.tests_dir, PathBuf::from("tests"));
        }

        #[test]
        fn test_partial_yaml_keeps_defaults() {
            let cfg = ProjectConfig::from_yaml("viewport:\n  width: 800\n  height: 600\n").unwrap();
            assert_eq!(cfg.viewport.width, 800);
            assert_eq!(cfg.args, ProjectConfig::default().args);
        }

        #[test]
        fn test_empty_yaml_is_default() {
            assert_eq!(ProjectConfig::from_yaml("").unwrap(), ProjectConfig::default());
        }

        #[test]
        fn test_invalid_yaml_is_error() {
            assert!(ProjectConfig::from_yaml("viewport: [1, 2").is_err());
        }

        #[test]
        fn test_missing_file_is_default() {
            let dir = tempfile::tempdir().unwrap();
            let cfg = ProjectConfig::load_from_root(dir.path()).unwrap();
            assert_eq!(cfg, ProjectConfig::default());
        }

        #[test]
        fn test_yaml_roundtrip_through_file() {
            let dir = tempfile::tempdir().unwrap();
            let mut cfg = ProjectConfig::default();
            cfg.executable = Some(PathBuf::from("/usr/bin/chromium"));
            std::fs::write(dir.path().join(CONFIG_FILE_NAME), cfg.to_yaml().unwrap()).unwrap();
            assert_eq!(ProjectConfig::load_from_root(dir.path()).unwrap(), cfg);
        }
    }

    mod context_tests {
        use super::*;
        use crate::driver::MockDriver;

        #[test]
        fn test_launch_config_from_run_config() {
            let cfg = config(&[("CI", "true"), ("PUPPETEER_REPL", "true")]);
            let launch = LaunchConfig::from_run_config(&cfg);
            assert!(launch.headless);
            assert!(launch.keep_open);
            assert_eq!(launch.viewport.width, 1280);
            assert!(launch.args.contains(&"--no-sandbox".to_string()));
        }

        #[test]
        fn test_context_shares_logger() {
            let logger = Arc::new(StepLogger::buffered(true));
            let ctx = RunContext::with_logger(RunConfig::default(), logger.clone());
            let device = ctx.device(Arc::new(MockDriver::new()));
            assert!(Arc::ptr_eq(device.logger(), &logger));
            assert!(Arc::ptr_eq(ctx.clone().logger(), &logger));
        }
    }
}
