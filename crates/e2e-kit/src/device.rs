//! Device facade.
//!
//! [`Device`] is what a test talks to. Every selector argument goes through
//! [`resolve`], so `device.click("submit-button")` clicks
//! `[data-testid="submit-button"]`, and every call shows one step in the
//! [`StepLogger`].
//!
//! [`DeviceOps`] is the same contract as a trait, so browser-specific
//! facades (see [`crate::ChromeDevice`]) can wrap a `Device` and override
//! just the calls they change.

use crate::driver::{
    ClickOptions, ElementHandle, ElementProperty, NavigateOptions, PageDriver, ScreenshotOptions,
    TypeOptions, WaitOptions,
};
use crate::expect::Expectation;
use crate::result::{E2eError, E2eResult};
use crate::selector::{display_selector, display_text, resolve};
use crate::step_logger::StepLogger;
use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

/// Selector-resolving, step-logging page facade
#[derive(Debug, Clone)]
pub struct Device {
    driver: Arc<dyn PageDriver>,
    logger: Arc<StepLogger>,
}

impl Device {
    /// Wrap a driver
    #[must_use]
    pub fn new(driver: Arc<dyn PageDriver>, logger: Arc<StepLogger>) -> Self {
        Self { driver, logger }
    }

    /// Underlying driver
    #[must_use]
    pub fn driver(&self) -> &Arc<dyn PageDriver> {
        &self.driver
    }

    /// Step logger shared with the run
    #[must_use]
    pub fn logger(&self) -> &Arc<StepLogger> {
        &self.logger
    }

    fn step(&self, action: &str, detail: &str) {
        tracing::debug!(action, detail, "device step");
        self.logger.step(action, detail);
    }

    /// Navigate to a URL
    pub async fn navigate(&self, url: &str) -> E2eResult<()> {
        self.navigate_with(url, NavigateOptions::default()).await
    }

    /// Navigate to a URL with explicit options
    pub async fn navigate_with(&self, url: &str, options: NavigateOptions) -> E2eResult<()> {
        self.step("Navigating", &format!("to {url}"));
        self.driver.goto(url, &options).await
    }

    /// Click an element
    pub async fn click(&self, selector: &str) -> E2eResult<()> {
        self.click_with(selector, ClickOptions::default()).await
    }

    /// Click an element with explicit options
    pub async fn click_with(&self, selector: &str, options: ClickOptions) -> E2eResult<()> {
        self.step("Clicking", &format!("\"{}\"", display_selector(selector)));
        self.driver.click(&resolve(selector), &options).await
    }

    /// Type text into an element
    pub async fn type_text(&self, selector: &str, text: &str) -> E2eResult<()> {
        self.type_text_with(selector, text, TypeOptions::default())
            .await
    }

    /// Type text into an element with explicit options
    pub async fn type_text_with(
        &self,
        selector: &str,
        text: &str,
        options: TypeOptions,
    ) -> E2eResult<()> {
        self.step(
            "Typing",
            &format!(
                "\"{}\" into \"{}\"",
                display_text(text),
                display_selector(selector)
            ),
        );
        self.driver
            .type_text(&resolve(selector), text, &options)
            .await
    }

    /// Select an option value, returning the selected values
    pub async fn select(&self, selector: &str, value: &str) -> E2eResult<Vec<String>> {
        self.step(
            "Selecting",
            &format!("\"{value}\" from \"{}\"", display_selector(selector)),
        );
        self.driver
            .select(&resolve(selector), &[value.to_string()])
            .await
    }

    /// Wait for an element to appear
    pub async fn wait_for(&self, selector: &str) -> E2eResult<ElementHandle> {
        self.wait_for_with(selector, WaitOptions::default()).await
    }

    /// Wait for an element with explicit options
    pub async fn wait_for_with(
        &self,
        selector: &str,
        options: WaitOptions,
    ) -> E2eResult<ElementHandle> {
        self.step(
            "Waiting for",
            &format!("\"{}\"", display_selector(selector)),
        );
        self.driver
            .wait_for_selector(&resolve(selector), &options)
            .await
    }

    /// First matching element, if any
    pub async fn get(&self, selector: &str) -> E2eResult<Option<ElementHandle>> {
        self.step("Getting element", &format!("\"{selector}\""));
        self.driver.query_selector(&resolve(selector)).await
    }

    /// All matching elements
    pub async fn get_all(&self, selector: &str) -> E2eResult<Vec<ElementHandle>> {
        self.step("Getting all elements", &format!("\"{selector}\""));
        self.driver.query_selector_all(&resolve(selector)).await
    }

    /// Text content of the first match
    pub async fn get_text(&self, selector: &str) -> E2eResult<String> {
        self.step("Getting text from", &format!("\"{selector}\""));
        let text = self
            .driver
            .element_property(&resolve(selector), &ElementProperty::TextContent)
            .await?;
        Ok(text.unwrap_or_default())
    }

    /// Form value of the first match
    pub async fn get_value(&self, selector: &str) -> E2eResult<Option<String>> {
        self.step("Getting value from", &format!("\"{selector}\""));
        self.driver
            .element_property(&resolve(selector), &ElementProperty::Value)
            .await
    }

    /// Whether any element matches
    pub async fn exists(&self, selector: &str) -> E2eResult<bool> {
        self.step("Checking if exists", &format!("\"{selector}\""));
        Ok(self
            .driver
            .query_selector(&resolve(selector))
            .await?
            .is_some())
    }

    /// Whether the first match intersects the viewport; `false` when absent
    pub async fn is_visible(&self, selector: &str) -> E2eResult<bool> {
        self.step("Checking if visible", &format!("\"{selector}\""));
        Ok(self
            .driver
            .is_intersecting_viewport(&resolve(selector))
            .await?
            .unwrap_or(false))
    }

    /// Start a fluent assertion
    #[must_use]
    pub fn expect(&self, selector: &str) -> Expectation<'_> {
        Expectation::new(self, selector)
    }

    /// Raw-CSS variant that skips selector resolution
    #[must_use]
    pub fn css(&self) -> CssDevice<'_> {
        CssDevice { device: self }
    }

    /// Current URL
    pub async fn url(&self) -> E2eResult<String> {
        self.step("Getting URL", "");
        self.driver.url().await
    }

    /// Document title
    pub async fn title(&self) -> E2eResult<String> {
        self.step("Getting title", "");
        self.driver.title().await
    }

    /// Document HTML
    pub async fn content(&self) -> E2eResult<String> {
        self.step("Getting page content", "");
        self.driver.content().await
    }

    /// Evaluate JavaScript in the page
    pub async fn evaluate(&self, script: &str) -> E2eResult<serde_json::Value> {
        self.step("Evaluating JavaScript", "");
        self.driver.evaluate(script).await
    }

    /// Capture the page
    pub async fn screenshot(&self) -> E2eResult<Vec<u8>> {
        self.screenshot_with(ScreenshotOptions::default()).await
    }

    /// Capture the page with explicit options, writing `options.path` if set
    pub async fn screenshot_with(&self, options: ScreenshotOptions) -> E2eResult<Vec<u8>> {
        self.step("Taking screenshot", "");
        let bytes = self.driver.screenshot(&options).await?;
        if let Some(path) = &options.path {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(path, &bytes)
                .await
                .map_err(|e| E2eError::ScreenshotError {
                    message: format!("{}: {e}", path.display()),
                })?;
        }
        Ok(bytes)
    }

    /// Sleep
    pub async fn wait(&self, ms: u64) -> E2eResult<()> {
        self.step("Waiting", &format!("{ms}ms"));
        tokio::time::sleep(Duration::from_millis(ms)).await;
        Ok(())
    }

    /// Wait for the current navigation to finish
    pub async fn wait_for_navigation(&self) -> E2eResult<()> {
        self.wait_for_navigation_with(NavigateOptions::default())
            .await
    }

    /// Wait for navigation with explicit options
    pub async fn wait_for_navigation_with(&self, options: NavigateOptions) -> E2eResult<()> {
        self.step("Waiting for navigation", "");
        self.driver.wait_for_navigation(&options).await
    }
}

/// Raw CSS selector operations, no test-id resolution
#[derive(Debug, Clone, Copy)]
pub struct CssDevice<'a> {
    device: &'a Device,
}

impl CssDevice<'_> {
    /// Click
    pub async fn click(&self, selector: &str) -> E2eResult<()> {
        self.device.step("CSS Click", &format!("\"{selector}\""));
        self.device
            .driver
            .click(selector, &ClickOptions::default())
            .await
    }

    /// Type text
    pub async fn type_text(&self, selector: &str, text: &str) -> E2eResult<()> {
        self.device
            .step("CSS Type", &format!("\"{text}\" into \"{selector}\""));
        self.device
            .driver
            .type_text(selector, text, &TypeOptions::default())
            .await
    }

    /// Wait for an element
    pub async fn wait_for(&self, selector: &str) -> E2eResult<ElementHandle> {
        self.device.step("CSS Wait for", &format!("\"{selector}\""));
        self.device
            .driver
            .wait_for_selector(selector, &WaitOptions::default())
            .await
    }

    /// First match
    pub async fn get(&self, selector: &str) -> E2eResult<Option<ElementHandle>> {
        self.device.step("CSS Get", &format!("\"{selector}\""));
        self.device.driver.query_selector(selector).await
    }

    /// All matches
    pub async fn get_all(&self, selector: &str) -> E2eResult<Vec<ElementHandle>> {
        self.device.step("CSS Get All", &format!("\"{selector}\""));
        self.device.driver.query_selector_all(selector).await
    }

    /// Text content of the first match
    pub async fn get_text(&self, selector: &str) -> E2eResult<String> {
        self.device
            .step("CSS Get Text from", &format!("\"{selector}\""));
        let text = self
            .device
            .driver
            .element_property(selector, &ElementProperty::TextContent)
            .await?;
        Ok(text.unwrap_or_default())
    }

    /// Whether any element matches
    pub async fn exists(&self, selector: &str) -> E2eResult<bool> {
        self.device
            .step("CSS Check exists", &format!("\"{selector}\""));
        Ok(self.device.driver.query_selector(selector).await?.is_some())
    }
}

/// The device contract as a composable capability.
///
/// Every method defaults to the [`Device`] returned by `base()`; wrappers
/// override only what they change.
#[async_trait]
pub trait DeviceOps: Send + Sync + Debug {
    /// The generic facade this one builds on
    fn base(&self) -> &Device;

    /// Navigate with default options
    async fn navigate(&self, url: &str) -> E2eResult<()> {
        self.navigate_with(url, NavigateOptions::default()).await
    }

    /// Navigate
    async fn navigate_with(&self, url: &str, options: NavigateOptions) -> E2eResult<()> {
        self.base().navigate_with(url, options).await
    }

    /// Click
    async fn click(&self, selector: &str) -> E2eResult<()> {
        self.base().click(selector).await
    }

    /// Type text with default options
    async fn type_text(&self, selector: &str, text: &str) -> E2eResult<()> {
        self.type_text_with(selector, text, TypeOptions::default())
            .await
    }

    /// Type text
    async fn type_text_with(
        &self,
        selector: &str,
        text: &str,
        options: TypeOptions,
    ) -> E2eResult<()> {
        self.base().type_text_with(selector, text, options).await
    }

    /// Select an option value
    async fn select(&self, selector: &str, value: &str) -> E2eResult<Vec<String>> {
        self.base().select(selector, value).await
    }

    /// Wait for an element
    async fn wait_for(&self, selector: &str) -> E2eResult<ElementHandle> {
        self.base().wait_for(selector).await
    }

    /// First match
    async fn get(&self, selector: &str) -> E2eResult<Option<ElementHandle>> {
        self.base().get(selector).await
    }

    /// All matches
    async fn get_all(&self, selector: &str) -> E2eResult<Vec<ElementHandle>> {
        self.base().get_all(selector).await
    }

    /// Text content
    async fn get_text(&self, selector: &str) -> E2eResult<String> {
        self.base().get_text(selector).await
    }

    /// Form value
    async fn get_value(&self, selector: &str) -> E2eResult<Option<String>> {
        self.base().get_value(selector).await
    }

    /// Existence check
    async fn exists(&self, selector: &str) -> E2eResult<bool> {
        self.base().exists(selector).await
    }

    /// Visibility check
    async fn is_visible(&self, selector: &str) -> E2eResult<bool> {
        self.base().is_visible(selector).await
    }

    /// Fluent assertion
    fn expect(&self, selector: &str) -> Expectation<'_> {
        self.base().expect(selector)
    }

    /// Current URL
    async fn url(&self) -> E2eResult<String> {
        self.base().url().await
    }

    /// Document title
    async fn title(&self) -> E2eResult<String> {
        self.base().title().await
    }

    /// Document HTML
    async fn content(&self) -> E2eResult<String> {
        self.base().content().await
    }

    /// Evaluate JavaScript
    async fn evaluate(&self, script: &str) -> E2eResult<serde_json::Value> {
        self.base().evaluate(script).await
    }

    /// Screenshot with default options
    async fn screenshot(&self) -> E2eResult<Vec<u8>> {
        self.screenshot_with(ScreenshotOptions::default()).await
    }

    /// Screenshot
    async fn screenshot_with(&self, options: ScreenshotOptions) -> E2eResult<Vec<u8>> {
        self.base().screenshot_with(options).await
    }

    /// Sleep
    async fn wait(&self, ms: u64) -> E2eResult<()> {
        self.base().wait(ms).await
    }

    /// Wait for navigation
    async fn wait_for_navigation(&self) -> E2eResult<()> {
        self.base().wait_for_navigation().await
    }
}

impl DeviceOps for Device {
    fn base(&self) -> &Device {
        self
    }
}
