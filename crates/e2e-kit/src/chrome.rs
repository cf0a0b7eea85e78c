//! Chrome-flavoured device facade.
//!
//! [`ChromeDevice`] wraps a [`Device`] and fills Chrome defaults into any
//! option the caller left unset: navigation waits for network idle, typing
//! follows the slow-motion delay, screenshots are PNG. It also exposes the
//! DevTools capabilities of the driver (metrics, interception, emulation,
//! cookies, network waits).

use crate::context::{RunConfig, RunContext};
use crate::device::{Device, DeviceOps};
use crate::driver::{
    js_string, Cookie, DeviceDescriptor, ImageFormat, NavigateOptions, PageDriver,
    ScreenshotOptions, TypeOptions, Viewport, WaitUntil, DEFAULT_TIMEOUT_MS,
};
use crate::result::E2eResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Default mobile viewport width
pub const MOBILE_VIEWPORT_WIDTH: u32 = 375;

/// Default mobile viewport height
pub const MOBILE_VIEWPORT_HEIGHT: u32 = 667;

/// Default screenshot quality
pub const SCREENSHOT_QUALITY: u8 = 90;

/// Chrome facade settings
#[derive(Debug, Clone, PartialEq)]
pub struct ChromeOptions {
    /// Headless browser
    pub headless: bool,
    /// Open devtools
    pub devtools: bool,
    /// Interaction delay, also the default typing delay (ms)
    pub slow_mo: u64,
    /// Viewport
    pub viewport: Viewport,
    /// User agent override
    pub user_agent: Option<String>,
    /// Leave the browser open on close (REPL mode)
    pub keep_open: bool,
}

impl Default for ChromeOptions {
    fn default() -> Self {
        Self {
            headless: false,
            devtools: false,
            slow_mo: 0,
            viewport: Viewport::default(),
            user_agent: None,
            keep_open: false,
        }
    }
}

impl ChromeOptions {
    /// Options for the current run
    #[must_use]
    pub fn from_config(config: &RunConfig) -> Self {
        Self {
            headless: config.headless,
            devtools: config.devtools,
            slow_mo: config.slow_mo,
            viewport: config.project.viewport,
            user_agent: config.project.user_agent.clone(),
            keep_open: config.repl,
        }
    }
}

/// Performance metrics with the commonly read values pulled out
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Used JS heap (bytes)
    pub js_heap_used_size: Option<f64>,
    /// Total JS heap (bytes)
    pub js_heap_total_size: Option<f64>,
    /// First paint (ms)
    pub first_paint: Option<f64>,
    /// First contentful paint (ms)
    pub first_contentful_paint: Option<f64>,
    /// Every raw metric
    pub metrics: BTreeMap<String, f64>,
}

/// Console method used by [`ChromeDevice::log`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// `console.log`
    Log,
    /// `console.info`
    #[default]
    Info,
    /// `console.warn`
    Warn,
    /// `console.error`
    Error,
    /// `console.debug`
    Debug,
}

impl LogLevel {
    /// Console method name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Log => "log",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Debug => "debug",
        }
    }
}

/// Device facade with Chrome defaults and DevTools capabilities
#[derive(Debug, Clone)]
pub struct ChromeDevice {
    device: Device,
    options: ChromeOptions,
}

impl ChromeDevice {
    /// Wrap a device
    #[must_use]
    pub fn new(device: Device, options: ChromeOptions) -> Self {
        Self { device, options }
    }

    /// Facade over `driver` configured from the run
    #[must_use]
    pub fn from_context(ctx: &RunContext, driver: Arc<dyn PageDriver>) -> Self {
        Self::new(ctx.device(driver), ChromeOptions::from_config(ctx.config()))
    }

    /// Launch Chromium for this run
    #[cfg(feature = "browser")]
    pub async fn launch(ctx: &RunContext) -> E2eResult<Self> {
        let driver = crate::chromium::ChromiumDriver::launch(&ctx.launch_config()).await?;
        Ok(Self::from_context(ctx, Arc::new(driver)))
    }

    /// Facade settings
    #[must_use]
    pub fn options(&self) -> &ChromeOptions {
        &self.options
    }

    fn driver(&self) -> &Arc<dyn PageDriver> {
        self.device.driver()
    }

    /// Announce devtools in the page console
    pub async fn enable_devtools(&self) -> E2eResult<()> {
        self.driver()
            .evaluate("console.log('Chrome DevTools enabled for E2E testing')")
            .await?;
        Ok(())
    }

    /// Heap and paint metrics plus every raw metric
    pub async fn performance_metrics(&self) -> E2eResult<PerformanceMetrics> {
        let page = self.driver().metrics().await?;
        Ok(PerformanceMetrics {
            js_heap_used_size: page.metrics.get("JSHeapUsedSize").copied(),
            js_heap_total_size: page.metrics.get("JSHeapTotalSize").copied(),
            first_paint: page.first_paint_ms,
            first_contentful_paint: page.first_contentful_paint_ms,
            metrics: page.metrics,
        })
    }

    /// Abort every request whose URL contains one of `patterns`
    pub async fn intercept_network<S: AsRef<str> + Sync>(&self, patterns: &[S]) -> E2eResult<()> {
        let patterns: Vec<String> = patterns.iter().map(|p| p.as_ref().to_string()).collect();
        tracing::debug!(?patterns, "request interception");
        self.driver().set_request_interception(&patterns).await
    }

    /// Emulate a device
    pub async fn emulate_device(&self, device: &DeviceDescriptor) -> E2eResult<()> {
        tracing::debug!(device = %device.name, "emulating device");
        self.driver().emulate(device).await
    }

    /// Switch to the default 375x667 mobile viewport
    pub async fn set_mobile_viewport(&self) -> E2eResult<()> {
        self.set_mobile_viewport_size(MOBILE_VIEWPORT_WIDTH, MOBILE_VIEWPORT_HEIGHT)
            .await
    }

    /// Switch to a mobile viewport of the given size
    pub async fn set_mobile_viewport_size(&self, width: u32, height: u32) -> E2eResult<()> {
        let viewport = Viewport {
            is_mobile: true,
            ..Viewport::new(width, height)
        };
        self.driver().set_viewport(&viewport).await
    }

    /// Make sure touch events exist in the page
    pub async fn simulate_touch(&self) -> E2eResult<()> {
        self.driver()
            .evaluate(
                "(() => { if (!('ontouchstart' in window)) { \
                 window.TouchEvent = window.TouchEvent || class TouchEvent extends Event {}; } })()",
            )
            .await?;
        Ok(())
    }

    /// Set a cookie
    pub async fn add_cookie(&self, cookie: &Cookie) -> E2eResult<()> {
        self.driver().set_cookie(cookie).await
    }

    /// Cookies visible to the page
    pub async fn get_cookies(&self) -> E2eResult<Vec<Cookie>> {
        self.driver().cookies().await
    }

    /// Delete every cookie
    pub async fn clear_cookies(&self) -> E2eResult<()> {
        let cookies = self.driver().cookies().await?;
        if cookies.is_empty() {
            return Ok(());
        }
        self.driver().delete_cookies(&cookies).await
    }

    /// Wait for a response whose URL contains `pattern` (default 30 s)
    pub async fn wait_for_response(
        &self,
        pattern: &str,
        timeout: Option<Duration>,
    ) -> E2eResult<String> {
        self.driver()
            .wait_for_response(pattern, timeout.unwrap_or(default_wait()))
            .await
    }

    /// Wait for a request whose URL contains `pattern` (default 30 s)
    pub async fn wait_for_request(
        &self,
        pattern: &str,
        timeout: Option<Duration>,
    ) -> E2eResult<String> {
        self.driver()
            .wait_for_request(pattern, timeout.unwrap_or(default_wait()))
            .await
    }

    /// Write a debug line to the page console
    pub async fn debug(&self, message: &str) -> E2eResult<()> {
        let script = format!("console.log({})", js_string(&format!("E2E Debug: {message}")));
        self.driver().evaluate(&script).await?;
        Ok(())
    }

    /// Write to the page console at `level`
    pub async fn log(&self, level: LogLevel, message: &str) -> E2eResult<()> {
        let method = level.as_str();
        let text = format!("E2E Log [{}]: {message}", method.to_uppercase());
        let script = format!("console.{method}({})", js_string(&text));
        self.driver().evaluate(&script).await?;
        Ok(())
    }

    /// Close the page, staying open in REPL mode
    pub async fn close(&self) -> E2eResult<()> {
        self.driver().close(self.options.keep_open).await
    }
}

const fn default_wait() -> Duration {
    Duration::from_millis(DEFAULT_TIMEOUT_MS)
}

#[async_trait]
impl DeviceOps for ChromeDevice {
    fn base(&self) -> &Device {
        &self.device
    }

    async fn navigate_with(&self, url: &str, mut options: NavigateOptions) -> E2eResult<()> {
        options.wait_until.get_or_insert(WaitUntil::NetworkIdle0);
        options.timeout.get_or_insert(DEFAULT_TIMEOUT_MS);
        self.device.navigate_with(url, options).await
    }

    async fn type_text_with(
        &self,
        selector: &str,
        text: &str,
        mut options: TypeOptions,
    ) -> E2eResult<()> {
        options.delay.get_or_insert(self.options.slow_mo);
        self.device.type_text_with(selector, text, options).await
    }

    async fn screenshot_with(&self, mut options: ScreenshotOptions) -> E2eResult<Vec<u8>> {
        options.format.get_or_insert(ImageFormat::Png);
        options.full_page.get_or_insert(false);
        options.quality.get_or_insert(SCREENSHOT_QUALITY);
        self.device.screenshot_with(options).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::driver::{MockDriver, MockElement, PageMetrics};
    use crate::step_logger::StepLogger;

    fn chrome(options: ChromeOptions) -> (Arc<MockDriver>, ChromeDevice) {
        let driver = Arc::new(
            MockDriver::new().with_element(MockElement::new("input").matching("email-input")),
        );
        let device = Device::new(driver.clone(), Arc::new(StepLogger::disabled()));
        (driver, ChromeDevice::new(device, options))
    }

    mod option_tests {
        use super::*;

        #[test]
        fn test_default_options() {
            let options = ChromeOptions::default();
            assert!(!options.headless);
            assert!(!options.devtools);
            assert_eq!(options.slow_mo, 0);
            assert_eq!(options.viewport, Viewport::new(1280, 720));
            assert!(options.user_agent.is_none());
        }

        #[test]
        fn test_from_config() {
            let config = RunConfig {
                slow_mo: 100,
                repl: true,
                ..RunConfig::default()
            };
            let options = ChromeOptions::from_config(&config);
            assert_eq!(options.slow_mo, 100);
            assert!(options.keep_open);
        }

        #[test]
        fn test_log_level_names() {
            assert_eq!(LogLevel::default().as_str(), "info");
            assert_eq!(LogLevel::Warn.as_str(), "warn");
        }
    }

    mod override_tests {
        use super::*;

        #[tokio::test]
        async fn test_navigate_fills_defaults() {
            let (driver, chrome) = chrome(ChromeOptions::default());
            chrome.navigate("http://localhost:3000").await.unwrap();
            let expected = NavigateOptions {
                wait_until: Some(WaitUntil::NetworkIdle0),
                timeout: Some(30_000),
            };
            assert!(driver.was_called(&format!("goto:http://localhost:3000:{expected:?}")));
        }

        #[tokio::test]
        async fn test_navigate_caller_options_win() {
            let (driver, chrome) = chrome(ChromeOptions::default());
            let options = NavigateOptions {
                wait_until: Some(WaitUntil::Load),
                timeout: None,
            };
            chrome.navigate_with("http://x.test", options).await.unwrap();
            let expected = NavigateOptions {
                wait_until: Some(WaitUntil::Load),
                timeout: Some(30_000),
            };
            assert!(driver.was_called(&format!("goto:http://x.test:{expected:?}")));
        }

        #[tokio::test]
        async fn test_type_uses_slow_mo_delay() {
            let options = ChromeOptions {
                slow_mo: 75,
                ..ChromeOptions::default()
            };
            let (driver, chrome) = chrome(options);
            chrome.type_text("email-input", "a").await.unwrap();
            let expected = TypeOptions { delay: Some(75) };
            assert!(driver.history().iter().any(|c| c.ends_with(&format!("{expected:?}"))));
        }

        #[tokio::test]
        async fn test_screenshot_defaults() {
            let (driver, chrome) = chrome(ChromeOptions::default());
            chrome.screenshot().await.unwrap();
            let expected = ScreenshotOptions {
                path: None,
                format: Some(ImageFormat::Png),
                full_page: Some(false),
                quality: Some(90),
            };
            assert!(driver.was_called(&format!("screenshot:{expected:?}")));
        }

        #[tokio::test]
        async fn test_inherited_operations_delegate() {
            let (_, chrome) = chrome(ChromeOptions::default());
            assert!(chrome.exists("email-input").await.unwrap());
            chrome.expect("email-input").to_exist().await.unwrap();
        }
    }

    mod capability_tests {
        use super::*;

        #[tokio::test]
        async fn test_performance_metrics() {
            let (driver, chrome) = chrome(ChromeOptions::default());
            let mut metrics = BTreeMap::new();
            metrics.insert("JSHeapUsedSize".to_string(), 1024.0);
            metrics.insert("Nodes".to_string(), 42.0);
            driver.set_metrics(PageMetrics {
                metrics,
                first_paint_ms: Some(12.5),
                first_contentful_paint_ms: None,
            });

            let perf = chrome.performance_metrics().await.unwrap();
            assert_eq!(perf.js_heap_used_size, Some(1024.0));
            assert!(perf.js_heap_total_size.is_none());
            assert_eq!(perf.first_paint, Some(12.5));
            assert_eq!(perf.metrics.get("Nodes"), Some(&42.0));
        }

        #[tokio::test]
        async fn test_intercept_network() {
            let (driver, chrome) = chrome(ChromeOptions::default());
            chrome.intercept_network(&["analytics", ".png"]).await.unwrap();
            assert!(driver.is_blocked("https://x.test/logo.png"));
            assert!(!driver.is_blocked("https://x.test/api"));
        }

        #[tokio::test]
        async fn test_mobile_viewport_defaults() {
            let (driver, chrome) = chrome(ChromeOptions::default());
            chrome.set_mobile_viewport().await.unwrap();
            let vp = driver.viewport().unwrap();
            assert_eq!((vp.width, vp.height), (375, 667));
            assert!(vp.is_mobile);
        }

        #[tokio::test]
        async fn test_emulate_device() {
            let (driver, chrome) = chrome(ChromeOptions::default());
            chrome
                .emulate_device(&DeviceDescriptor::PIXEL_7)
                .await
                .unwrap();
            assert_eq!(driver.viewport().unwrap().width, 412);
        }

        #[tokio::test]
        async fn test_cookie_lifecycle() {
            let (_, chrome) = chrome(ChromeOptions::default());
            chrome.add_cookie(&Cookie::new("session", "abc")).await.unwrap();
            assert_eq!(chrome.get_cookies().await.unwrap().len(), 1);
            chrome.clear_cookies().await.unwrap();
            assert!(chrome.get_cookies().await.unwrap().is_empty());
            chrome.clear_cookies().await.unwrap();
        }

        #[tokio::test]
        async fn test_network_waits() {
            let (driver, chrome) = chrome(ChromeOptions::default());
            driver.push_request("http://x.test/api/login");
            let url = chrome.wait_for_request("/api/login", None).await.unwrap();
            assert_eq!(url, "http://x.test/api/login");
            assert!(chrome
                .wait_for_response("/api/login", Some(Duration::from_millis(1)))
                .await
                .is_err());
        }

        #[tokio::test]
        async fn test_console_helpers() {
            let (driver, chrome) = chrome(ChromeOptions::default());
            chrome.debug("checkpoint").await.unwrap();
            chrome.log(LogLevel::Warn, "careful").await.unwrap();
            chrome.enable_devtools().await.unwrap();
            chrome.simulate_touch().await.unwrap();
            let history = driver.history();
            assert!(history.contains(&"evaluate:console.log(\"E2E Debug: checkpoint\")".to_string()));
            assert!(history.contains(&"evaluate:console.warn(\"E2E Log [WARN]: careful\")".to_string()));
        }

        #[tokio::test]
        async fn test_close_honours_keep_open() {
            let options = ChromeOptions {
                keep_open: true,
                ..ChromeOptions::default()
            };
            let (driver, chrome) = chrome(options);
            chrome.close().await.unwrap();
            assert!(driver.was_called("close:true"));
        }
    }
}
