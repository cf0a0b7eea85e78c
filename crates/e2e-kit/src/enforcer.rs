//! One test per file.
//!
//! Each e2e file under `tests/` is its own test binary and must register
//! exactly one test. [`SingleTestEnforcer`] counts registrations per file
//! path; [`TestFile`] is the registration wrapper tests call, so a second
//! body is rejected before it can ever run.

use crate::context::RunContext;
use crate::device::Device;
use crate::driver::ScreenshotOptions;
use crate::result::{E2eError, E2eResult};
use crate::step_logger::DEFAULT_SUCCESS_MESSAGE;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::PoisonError;
use std::time::Duration;

/// Registration counts per test file
#[derive(Debug, Default)]
pub struct SingleTestEnforcer {
    counts: HashMap<PathBuf, usize>,
    current: Option<PathBuf>,
}

impl SingleTestEnforcer {
    /// Create an empty enforcer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A file's run starts: clear its counter
    pub fn begin_file(&mut self, path: &Path) {
        self.counts.remove(path);
        self.current = Some(path.to_path_buf());
    }

    /// Begin `path` unless it is already the file being run
    pub fn enter_file(&mut self, path: &Path) {
        if self.current.as_deref() != Some(path) {
            self.begin_file(path);
        }
    }

    /// Count a registration, rejecting any after the first
    pub fn register(&mut self, path: &Path, test_name: &str) -> E2eResult<()> {
        let count = self.counts.entry(path.to_path_buf()).or_insert(0);
        let previous = *count;
        *count += 1;

        if previous >= 1 {
            let file = path
                .file_name()
                .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
            tracing::error!(file = %file, test = test_name, "second test registered");
            eprintln!("{}", violation_banner(&file, previous + 1));
            return Err(E2eError::SingleTestViolation {
                file,
                count: previous + 1,
            });
        }

        tracing::debug!(path = %path.display(), test = test_name, "test registered");
        Ok(())
    }

    /// Registrations seen for `path`
    #[must_use]
    pub fn count(&self, path: &Path) -> usize {
        self.counts.get(path).copied().unwrap_or(0)
    }
}

fn violation_banner(file: &str, count: usize) -> String {
    let rule = "=".repeat(60);
    format!(
        "\n{rule}\n\
         SINGLE TEST RULE VIOLATION\n\n\
         File: {file}\n\
         Error: Only ONE test is allowed per file.\n\n\
         This file already has {count} tests.\n\n\
         Each file should contain:\n\
         - One E2eSetup configuration\n\
         - One TestFile::test registration\n\
         {rule}\n"
    )
}

type TestBody = Box<dyn FnOnce() -> BoxFuture<'static, E2eResult<()>> + Send>;

/// The single test of one e2e file
///
/// ```ignore
/// let ctx = RunContext::process()?;
/// let mut file = TestFile::new(&ctx, file!());
/// file.test("agent can log in", move || async move {
///     device.navigate("http://localhost:3000/login").await?;
///     device.expect("welcome-message").to_be_visible().await?;
///     Ok(())
/// })?;
/// file.run().await
/// ```
pub struct TestFile {
    ctx: RunContext,
    path: PathBuf,
    test: Option<(String, TestBody)>,
    screenshot_device: Option<Device>,
}

impl std::fmt::Debug for TestFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestFile")
            .field("path", &self.path)
            .field("test", &self.test_name())
            .field("screenshot_device", &self.screenshot_device.is_some())
            .finish()
    }
}

impl TestFile {
    /// Open the file for registration
    #[must_use]
    pub fn new(ctx: &RunContext, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        ctx.enforcer()
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .enter_file(&path);
        Self {
            ctx: ctx.clone(),
            path,
            test: None,
            screenshot_device: None,
        }
    }

    /// Register the file's test; a second registration is rejected and dropped
    pub fn test<F, Fut>(&mut self, name: &str, body: F) -> E2eResult<()>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = E2eResult<()>> + Send + 'static,
    {
        self.ctx
            .enforcer()
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .register(&self.path, name)?;
        self.test = Some((name.to_string(), Box::new(move || body().boxed())));
        Ok(())
    }

    /// Device to capture when the test fails and screenshots are enabled
    #[must_use]
    pub fn with_screenshot_device(mut self, device: Device) -> Self {
        self.screenshot_device = Some(device);
        self
    }

    /// Name of the registered test
    #[must_use]
    pub fn test_name(&self) -> Option<&str> {
        self.test.as_ref().map(|(name, _)| name.as_str())
    }

    /// Path the file was opened with
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run the registered test under the configured timeout
    pub async fn run(self) -> E2eResult<()> {
        let Self {
            ctx,
            path,
            test,
            screenshot_device,
        } = self;
        let config = ctx.config();
        crate::logging::init_with(config.devtools);

        let (name, body) = test.ok_or_else(|| E2eError::InvalidState {
            message: format!("no test registered in {}", path.display()),
        })?;

        let logger = ctx.logger();
        logger.start(&name);

        let result = match tokio::time::timeout(Duration::from_millis(config.timeout), body()).await
        {
            Ok(result) => result,
            Err(_) => Err(E2eError::Timeout { ms: config.timeout }),
        };

        match &result {
            Ok(()) => logger.success(DEFAULT_SUCCESS_MESSAGE),
            Err(err) => {
                if config.screenshot_on_failure {
                    if let Some(device) = &screenshot_device {
                        let target = config
                            .project
                            .screenshot_dir
                            .join(format!("{}.png", slug(&name)));
                        capture_failure(device, target).await;
                    }
                }
                logger.error(&err.to_string());
            }
        }
        result
    }
}

async fn capture_failure(device: &Device, target: PathBuf) {
    let options = ScreenshotOptions {
        path: Some(target.clone()),
        ..ScreenshotOptions::default()
    };
    match device.screenshot_with(options).await {
        Ok(_) => device
            .logger()
            .info(&format!("Screenshot saved to {}", target.display())),
        Err(e) => tracing::warn!(error = %e, "failure screenshot not saved"),
    }
}

fn slug(name: &str) -> String {
    let raw: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    let trimmed = raw.trim_matches('-');
    if trimmed.is_empty() {
        "test".to_string()
    } else {
        trimmed.to_string()
    }
}
