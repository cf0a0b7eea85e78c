//! Page driver capability.
//!
//! [`PageDriver`] is the browser-automation surface every facade is built
//! on. Selectors reaching a driver are already resolved to CSS.
//!
//! - [`MockDriver`]: in-memory page for unit tests
//! - `ChromiumDriver` (feature `browser`): Chrome DevTools Protocol via chromiumoxide

use crate::result::{E2eError, E2eResult};
use crate::selector::resolve;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::{BTreeMap, VecDeque};
use std::fmt::Debug;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Default timeout for waits and navigation (ms)
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Navigation completion condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WaitUntil {
    /// `load` event fired
    Load,
    /// `DOMContentLoaded` event fired
    DomContentLoaded,
    /// No network connections for 500 ms
    NetworkIdle0,
    /// At most two network connections for 500 ms
    NetworkIdle2,
}

/// Options for navigation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigateOptions {
    /// When navigation counts as finished
    pub wait_until: Option<WaitUntil>,
    /// Timeout in milliseconds
    pub timeout: Option<u64>,
}

/// Options for clicks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClickOptions {
    /// Delay between mouse down and up (ms)
    pub delay: Option<u64>,
    /// Number of clicks
    pub click_count: Option<u32>,
}

/// Options for typing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeOptions {
    /// Delay between key presses (ms)
    pub delay: Option<u64>,
}

/// Options for selector waits
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WaitOptions {
    /// Also require the element to be visible
    pub visible: bool,
    /// Timeout in milliseconds
    pub timeout: Option<u64>,
}

impl WaitOptions {
    /// Timeout with the default applied
    #[must_use]
    pub fn timeout_ms(&self) -> u64 {
        self.timeout.unwrap_or(DEFAULT_TIMEOUT_MS)
    }
}

/// Screenshot image format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG (lossless)
    Png,
    /// JPEG
    Jpeg,
}

/// Options for screenshots
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScreenshotOptions {
    /// Write the image to this file as well as returning it
    pub path: Option<PathBuf>,
    /// Image format
    pub format: Option<ImageFormat>,
    /// Capture beyond the viewport
    pub full_page: Option<bool>,
    /// JPEG quality, ignored for PNG
    pub quality: Option<u8>,
}

/// A matched DOM element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Resolved selector the element was found with
    pub selector: String,
    /// Position among all matches
    pub index: usize,
    /// Lowercase tag name
    pub tag_name: String,
    /// Text content at query time
    pub text_content: Option<String>,
}

impl ElementHandle {
    /// Create a new element handle
    #[must_use]
    pub fn new(selector: impl Into<String>, index: usize, tag_name: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            index,
            tag_name: tag_name.into(),
            text_content: None,
        }
    }
}

/// Element property read by a single-element extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementProperty {
    /// `textContent`
    TextContent,
    /// `value`
    Value,
    /// `className`
    ClassName,
    /// `getAttribute(name)`
    Attribute(String),
}

impl ElementProperty {
    /// JavaScript expression reading this property from `el`
    #[must_use]
    pub fn js_expression(&self) -> String {
        match self {
            Self::TextContent => "el.textContent".to_string(),
            Self::Value => "(el.value === undefined ? null : String(el.value))".to_string(),
            Self::ClassName => "el.className".to_string(),
            Self::Attribute(name) => format!("el.getAttribute({})", js_string(name)),
        }
    }
}

/// Quote a string as a JavaScript literal
#[must_use]
pub fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

/// Page performance metrics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageMetrics {
    /// Every raw metric reported by the browser
    pub metrics: BTreeMap<String, f64>,
    /// Time to first paint (ms)
    pub first_paint_ms: Option<f64>,
    /// Time to first contentful paint (ms)
    pub first_contentful_paint_ms: Option<f64>,
}

/// Browser cookie
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    /// Name
    pub name: String,
    /// Value
    pub value: String,
    /// Domain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// URL the cookie is scoped to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Cookie {
    /// Create a cookie with name and value only
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            ..Self::default()
        }
    }

    /// Scope the cookie to a domain
    #[must_use]
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }
}

/// Page viewport
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Width in CSS pixels
    pub width: u32,
    /// Height in CSS pixels
    pub height: u32,
    /// Device scale factor
    #[serde(default = "default_scale")]
    pub device_scale_factor: f64,
    /// Mobile meta-viewport handling
    #[serde(default)]
    pub is_mobile: bool,
    /// Touch events supported
    #[serde(default)]
    pub has_touch: bool,
}

const fn default_scale() -> f64 {
    1.0
}

impl Viewport {
    /// Desktop viewport of the given size
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            device_scale_factor: 1.0,
            is_mobile: false,
            has_touch: false,
        }
    }

    /// Mobile touch viewport of the given size
    #[must_use]
    pub const fn mobile(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            device_scale_factor: 2.0,
            is_mobile: true,
            has_touch: true,
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280, 720)
    }
}

/// Device descriptor for emulation
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceDescriptor {
    /// Device name
    pub name: Cow<'static, str>,
    /// Viewport
    pub viewport: Viewport,
    /// User agent string
    pub user_agent: Cow<'static, str>,
}

impl DeviceDescriptor {
    /// iPhone 14 Pro
    pub const IPHONE_14_PRO: Self = Self {
        name: Cow::Borrowed("iPhone 14 Pro"),
        viewport: Viewport {
            width: 393,
            height: 852,
            device_scale_factor: 3.0,
            is_mobile: true,
            has_touch: true,
        },
        user_agent: Cow::Borrowed(
            "Mozilla/5.0 (iPhone; CPU iPhone OS 16_0 like Mac OS X) AppleWebKit/605.1.15",
        ),
    };

    /// Pixel 7
    pub const PIXEL_7: Self = Self {
        name: Cow::Borrowed("Pixel 7"),
        viewport: Viewport {
            width: 412,
            height: 915,
            device_scale_factor: 2.625,
            is_mobile: true,
            has_touch: true,
        },
        user_agent: Cow::Borrowed(
            "Mozilla/5.0 (Linux; Android 13; Pixel 7) AppleWebKit/537.36 Chrome/120.0.0.0 Mobile",
        ),
    };

    /// iPad Pro 12.9
    pub const IPAD_PRO_12_9: Self = Self {
        name: Cow::Borrowed("iPad Pro 12.9"),
        viewport: Viewport {
            width: 1024,
            height: 1366,
            device_scale_factor: 2.0,
            is_mobile: true,
            has_touch: true,
        },
        user_agent: Cow::Borrowed(
            "Mozilla/5.0 (iPad; CPU OS 16_0 like Mac OS X) AppleWebKit/605.1.15",
        ),
    };

    /// Custom descriptor
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        viewport: Viewport,
        user_agent: impl Into<String>,
    ) -> Self {
        Self {
            name: Cow::Owned(name.into()),
            viewport,
            user_agent: Cow::Owned(user_agent.into()),
        }
    }
}

/// Browser-automation capability consumed by the device facades
#[async_trait]
pub trait PageDriver: Send + Sync + Debug {
    /// Navigate to a URL
    async fn goto(&self, url: &str, options: &NavigateOptions) -> E2eResult<()>;

    /// Wait for the current navigation to finish
    async fn wait_for_navigation(&self, options: &NavigateOptions) -> E2eResult<()>;

    /// Click the first element matching `selector`
    async fn click(&self, selector: &str, options: &ClickOptions) -> E2eResult<()>;

    /// Type `text` into the first element matching `selector`
    async fn type_text(&self, selector: &str, text: &str, options: &TypeOptions)
        -> E2eResult<()>;

    /// Select option values on a `<select>`, returning the selected values
    async fn select(&self, selector: &str, values: &[String]) -> E2eResult<Vec<String>>;

    /// Wait until an element matches, failing with `Timeout`
    async fn wait_for_selector(
        &self,
        selector: &str,
        options: &WaitOptions,
    ) -> E2eResult<ElementHandle>;

    /// First match, if any
    async fn query_selector(&self, selector: &str) -> E2eResult<Option<ElementHandle>>;

    /// All matches
    async fn query_selector_all(&self, selector: &str) -> E2eResult<Vec<ElementHandle>>;

    /// Read a property of the first match; `ElementNotFound` when nothing matches
    async fn element_property(
        &self,
        selector: &str,
        property: &ElementProperty,
    ) -> E2eResult<Option<String>>;

    /// Whether the first match intersects the viewport; `None` when absent
    async fn is_intersecting_viewport(&self, selector: &str) -> E2eResult<Option<bool>>;

    /// Current URL
    async fn url(&self) -> E2eResult<String>;

    /// Document title
    async fn title(&self) -> E2eResult<String>;

    /// Serialized document HTML
    async fn content(&self) -> E2eResult<String>;

    /// Evaluate JavaScript in the page
    async fn evaluate(&self, script: &str) -> E2eResult<serde_json::Value>;

    /// Capture the page as image bytes
    async fn screenshot(&self, options: &ScreenshotOptions) -> E2eResult<Vec<u8>>;

    /// Performance metrics
    async fn metrics(&self) -> E2eResult<PageMetrics>;

    /// Cookies visible to the page
    async fn cookies(&self) -> E2eResult<Vec<Cookie>>;

    /// Set a cookie
    async fn set_cookie(&self, cookie: &Cookie) -> E2eResult<()>;

    /// Delete cookies
    async fn delete_cookies(&self, cookies: &[Cookie]) -> E2eResult<()>;

    /// Abort requests whose URL contains any pattern; continue the rest
    async fn set_request_interception(&self, block_patterns: &[String]) -> E2eResult<()>;

    /// Emulate a device
    async fn emulate(&self, device: &DeviceDescriptor) -> E2eResult<()>;

    /// Change the viewport
    async fn set_viewport(&self, viewport: &Viewport) -> E2eResult<()>;

    /// Wait for a response whose URL contains `pattern`, returning that URL
    async fn wait_for_response(&self, pattern: &str, timeout: Duration) -> E2eResult<String>;

    /// Wait for a request whose URL contains `pattern`, returning that URL
    async fn wait_for_request(&self, pattern: &str, timeout: Duration) -> E2eResult<String>;

    /// Close the page; with `keep_open` wait for the user to close the browser
    async fn close(&self, keep_open: bool) -> E2eResult<()>;
}

/// Element on a [`MockDriver`] page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockElement {
    /// Resolved selectors this element matches
    pub selectors: Vec<String>,
    /// Tag name
    pub tag_name: String,
    /// Text content
    pub text: String,
    /// Form value, `None` for non-form elements
    pub value: Option<String>,
    /// Class attribute
    pub class_name: String,
    /// Other attributes
    pub attributes: BTreeMap<String, String>,
    /// Intersects the viewport
    pub visible: bool,
}

impl MockElement {
    /// Visible element with the given tag, matching the tag selector
    #[must_use]
    pub fn new(tag_name: impl Into<String>) -> Self {
        let tag_name = tag_name.into();
        Self {
            selectors: vec![tag_name.clone()],
            tag_name,
            visible: true,
            ..Self::default()
        }
    }

    /// Also match `selector` (resolved, so test-id tokens work)
    #[must_use]
    pub fn matching(mut self, selector: &str) -> Self {
        self.selectors.push(resolve(selector));
        self
    }

    /// Set text content
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set form value
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Set class attribute, also matching `.class` for each token
    #[must_use]
    pub fn with_class(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = class_name.into();
        let tokens: Vec<String> = self
            .class_name
            .split_whitespace()
            .map(|t| format!(".{t}"))
            .collect();
        self.selectors.extend(tokens);
        self
    }

    /// Set an attribute
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Set visibility
    #[must_use]
    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    fn matches(&self, selector: &str) -> bool {
        self.selectors.iter().any(|s| s == selector)
    }

    fn property(&self, property: &ElementProperty) -> Option<String> {
        match property {
            ElementProperty::TextContent => Some(self.text.clone()),
            ElementProperty::Value => self.value.clone(),
            ElementProperty::ClassName => Some(self.class_name.clone()),
            ElementProperty::Attribute(name) => {
                if name == "class" {
                    Some(self.class_name.clone())
                } else {
                    self.attributes.get(name).cloned()
                }
            }
        }
    }

    fn handle(&self, selector: &str, index: usize) -> ElementHandle {
        ElementHandle {
            selector: selector.to_string(),
            index,
            tag_name: self.tag_name.to_lowercase(),
            text_content: Some(self.text.clone()),
        }
    }
}

#[derive(Debug, Default)]
struct MockPage {
    url: String,
    title: String,
    content: String,
    elements: Vec<MockElement>,
    cookies: Vec<Cookie>,
    eval_results: VecDeque<serde_json::Value>,
    screenshot: Vec<u8>,
    metrics: PageMetrics,
    responses: Vec<String>,
    requests: Vec<String>,
    blocked: Vec<String>,
    viewport: Option<Viewport>,
    emulated: Option<DeviceDescriptor>,
    closed: bool,
    history: Vec<String>,
}

impl MockPage {
    fn record(&mut self, call: String) {
        self.history.push(call);
    }

    fn first(&self, selector: &str) -> Option<&MockElement> {
        self.elements.iter().find(|e| e.matches(selector))
    }

    fn first_mut(&mut self, selector: &str) -> E2eResult<&mut MockElement> {
        self.elements
            .iter_mut()
            .find(|e| e.matches(selector))
            .ok_or_else(|| E2eError::ElementNotFound {
                selector: selector.to_string(),
            })
    }
}

/// In-memory page driver for tests
///
/// Elements are matched by exact resolved selector; no CSS engine is involved.
#[derive(Debug, Default)]
pub struct MockDriver {
    page: Mutex<MockPage>,
}

impl MockDriver {
    /// Create an empty page at `about:blank`
    #[must_use]
    pub fn new() -> Self {
        let driver = Self::default();
        driver.lock().url = "about:blank".to_string();
        driver
    }

    fn lock(&self) -> MutexGuard<'_, MockPage> {
        self.page.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add an element, builder style
    #[must_use]
    pub fn with_element(self, element: MockElement) -> Self {
        self.add_element(element);
        self
    }

    /// Add an element
    pub fn add_element(&self, element: MockElement) {
        self.lock().elements.push(element);
    }

    /// Remove every element matching `selector` (resolved)
    pub fn remove_elements(&self, selector: &str) {
        let resolved = resolve(selector);
        self.lock().elements.retain(|e| !e.matches(&resolved));
    }

    /// Set the document title
    pub fn set_title(&self, title: impl Into<String>) {
        self.lock().title = title.into();
    }

    /// Set the document HTML
    pub fn set_content(&self, content: impl Into<String>) {
        self.lock().content = content.into();
    }

    /// Queue a result for the next `evaluate`
    pub fn push_eval_result(&self, value: serde_json::Value) {
        self.lock().eval_results.push_back(value);
    }

    /// Set screenshot bytes
    pub fn set_screenshot(&self, bytes: Vec<u8>) {
        self.lock().screenshot = bytes;
    }

    /// Set performance metrics
    pub fn set_metrics(&self, metrics: PageMetrics) {
        self.lock().metrics = metrics;
    }

    /// Record a network response URL
    pub fn push_response(&self, url: impl Into<String>) {
        self.lock().responses.push(url.into());
    }

    /// Record a network request URL
    pub fn push_request(&self, url: impl Into<String>) {
        self.lock().requests.push(url.into());
    }

    /// Current block patterns
    #[must_use]
    pub fn blocked_patterns(&self) -> Vec<String> {
        self.lock().blocked.clone()
    }

    /// Whether a request to `url` would be aborted
    #[must_use]
    pub fn is_blocked(&self, url: &str) -> bool {
        self.lock().blocked.iter().any(|p| url.contains(p.as_str()))
    }

    /// Last viewport set
    #[must_use]
    pub fn viewport(&self) -> Option<Viewport> {
        self.lock().viewport
    }

    /// Last emulated device
    #[must_use]
    pub fn emulated(&self) -> Option<DeviceDescriptor> {
        self.lock().emulated.clone()
    }

    /// Whether `close` was called
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.lock().history.clone()
    }

    /// Check if method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.lock().history.iter().any(|c| c.starts_with(method))
    }
}

#[async_trait]
impl PageDriver for MockDriver {
    async fn goto(&self, url: &str, options: &NavigateOptions) -> E2eResult<()> {
        let mut page = self.lock();
        page.record(format!("goto:{url}:{options:?}"));
        page.url = url.to_string();
        Ok(())
    }

    async fn wait_for_navigation(&self, options: &NavigateOptions) -> E2eResult<()> {
        self.lock()
            .record(format!("wait_for_navigation:{options:?}"));
        Ok(())
    }

    async fn click(&self, selector: &str, options: &ClickOptions) -> E2eResult<()> {
        let mut page = self.lock();
        page.record(format!("click:{selector}:{options:?}"));
        page.first_mut(selector).map(|_| ())
    }

    async fn type_text(
        &self,
        selector: &str,
        text: &str,
        options: &TypeOptions,
    ) -> E2eResult<()> {
        let mut page = self.lock();
        page.record(format!("type_text:{selector}:{text}:{options:?}"));
        let element = page.first_mut(selector)?;
        let mut value = element.value.take().unwrap_or_default();
        value.push_str(text);
        element.value = Some(value);
        Ok(())
    }

    async fn select(&self, selector: &str, values: &[String]) -> E2eResult<Vec<String>> {
        let mut page = self.lock();
        page.record(format!("select:{selector}:{}", values.join(",")));
        let element = page.first_mut(selector)?;
        element.value = values.first().cloned();
        Ok(values.to_vec())
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        options: &WaitOptions,
    ) -> E2eResult<ElementHandle> {
        let mut page = self.lock();
        page.record(format!("wait_for_selector:{selector}"));
        page.first(selector)
            .filter(|e| !options.visible || e.visible)
            .map(|e| e.handle(selector, 0))
            .ok_or(E2eError::Timeout {
                ms: options.timeout_ms(),
            })
    }

    async fn query_selector(&self, selector: &str) -> E2eResult<Option<ElementHandle>> {
        let mut page = self.lock();
        page.record(format!("query_selector:{selector}"));
        Ok(page.first(selector).map(|e| e.handle(selector, 0)))
    }

    async fn query_selector_all(&self, selector: &str) -> E2eResult<Vec<ElementHandle>> {
        let mut page = self.lock();
        page.record(format!("query_selector_all:{selector}"));
        Ok(page
            .elements
            .iter()
            .filter(|e| e.matches(selector))
            .enumerate()
            .map(|(i, e)| e.handle(selector, i))
            .collect())
    }

    async fn element_property(
        &self,
        selector: &str,
        property: &ElementProperty,
    ) -> E2eResult<Option<String>> {
        let mut page = self.lock();
        page.record(format!("element_property:{selector}:{property:?}"));
        page.first(selector)
            .map(|e| e.property(property))
            .ok_or_else(|| E2eError::ElementNotFound {
                selector: selector.to_string(),
            })
    }

    async fn is_intersecting_viewport(&self, selector: &str) -> E2eResult<Option<bool>> {
        let mut page = self.lock();
        page.record(format!("is_intersecting_viewport:{selector}"));
        Ok(page.first(selector).map(|e| e.visible))
    }

    async fn url(&self) -> E2eResult<String> {
        Ok(self.lock().url.clone())
    }

    async fn title(&self) -> E2eResult<String> {
        Ok(self.lock().title.clone())
    }

    async fn content(&self) -> E2eResult<String> {
        Ok(self.lock().content.clone())
    }

    async fn evaluate(&self, script: &str) -> E2eResult<serde_json::Value> {
        let mut page = self.lock();
        page.record(format!("evaluate:{script}"));
        Ok(page
            .eval_results
            .pop_front()
            .unwrap_or(serde_json::Value::Null))
    }

    async fn screenshot(&self, options: &ScreenshotOptions) -> E2eResult<Vec<u8>> {
        let mut page = self.lock();
        page.record(format!("screenshot:{options:?}"));
        Ok(page.screenshot.clone())
    }

    async fn metrics(&self) -> E2eResult<PageMetrics> {
        Ok(self.lock().metrics.clone())
    }

    async fn cookies(&self) -> E2eResult<Vec<Cookie>> {
        Ok(self.lock().cookies.clone())
    }

    async fn set_cookie(&self, cookie: &Cookie) -> E2eResult<()> {
        let mut page = self.lock();
        page.record(format!("set_cookie:{}", cookie.name));
        page.cookies.retain(|c| c.name != cookie.name);
        page.cookies.push(cookie.clone());
        Ok(())
    }

    async fn delete_cookies(&self, cookies: &[Cookie]) -> E2eResult<()> {
        let mut page = self.lock();
        page.record(format!("delete_cookies:{}", cookies.len()));
        page.cookies
            .retain(|c| !cookies.iter().any(|d| d.name == c.name));
        Ok(())
    }

    async fn set_request_interception(&self, block_patterns: &[String]) -> E2eResult<()> {
        let mut page = self.lock();
        page.record(format!("set_request_interception:{}", block_patterns.join(",")));
        page.blocked = block_patterns.to_vec();
        Ok(())
    }

    async fn emulate(&self, device: &DeviceDescriptor) -> E2eResult<()> {
        let mut page = self.lock();
        page.record(format!("emulate:{}", device.name));
        page.viewport = Some(device.viewport);
        page.emulated = Some(device.clone());
        Ok(())
    }

    async fn set_viewport(&self, viewport: &Viewport) -> E2eResult<()> {
        let mut page = self.lock();
        page.record(format!("set_viewport:{}x{}", viewport.width, viewport.height));
        page.viewport = Some(*viewport);
        Ok(())
    }

    async fn wait_for_response(&self, pattern: &str, timeout: Duration) -> E2eResult<String> {
        let mut page = self.lock();
        page.record(format!("wait_for_response:{pattern}"));
        page.responses
            .iter()
            .find(|url| url.contains(pattern))
            .cloned()
            .ok_or(E2eError::Timeout {
                ms: timeout.as_millis() as u64,
            })
    }

    async fn wait_for_request(&self, pattern: &str, timeout: Duration) -> E2eResult<String> {
        let mut page = self.lock();
        page.record(format!("wait_for_request:{pattern}"));
        page.requests
            .iter()
            .find(|url| url.contains(pattern))
            .cloned()
            .ok_or(E2eError::Timeout {
                ms: timeout.as_millis() as u64,
            })
    }

    async fn close(&self, keep_open: bool) -> E2eResult<()> {
        let mut page = self.lock();
        page.record(format!("close:{keep_open}"));
        page.closed = true;
        Ok(())
    }
}
