//! Chromium page driver over the Chrome DevTools Protocol.
//!
//! Element work runs as JavaScript in the page with JSON-quoted selectors;
//! interception, metrics, emulation and cookies go through CDP commands.

use crate::context::LaunchConfig;
use crate::driver::{
    js_string, ClickOptions, Cookie, DeviceDescriptor, ElementHandle, ElementProperty,
    ImageFormat, NavigateOptions, PageDriver, PageMetrics, ScreenshotOptions, TypeOptions,
    Viewport, WaitOptions, WaitUntil, DEFAULT_TIMEOUT_MS,
};
use crate::result::{E2eError, E2eResult};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::{
    SetDeviceMetricsOverrideParams, SetTouchEmulationEnabledParams, SetUserAgentOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::fetch::{
    ContinueRequestParams, DisableParams as FetchDisableParams, EnableParams as FetchEnableParams,
    EventRequestPaused, FailRequestParams,
};
use chromiumoxide::cdp::browser_protocol::network::{
    CookieParam, DeleteCookiesParams, EnableParams as NetworkEnableParams, ErrorReason,
    EventRequestWillBeSent, EventResponseReceived,
};
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, CaptureScreenshotParams,
};
use chromiumoxide::cdp::browser_protocol::performance::{
    EnableParams as PerformanceEnableParams, GetMetricsParams,
};
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt::Display;
use std::sync::{Arc, PoisonError};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

const POLL_INTERVAL: Duration = Duration::from_millis(50);
const NETWORK_IDLE_WINDOW: Duration = Duration::from_millis(500);

fn page_err(e: impl Display) -> E2eError {
    E2eError::page(e.to_string())
}

#[derive(Debug, Deserialize)]
struct ElementInfo {
    tag: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PropertyProbe {
    found: bool,
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaintEntry {
    name: String,
    start_time: f64,
}

/// Chromium controlled over CDP
#[derive(Debug)]
pub struct ChromiumDriver {
    browser: Arc<Mutex<Browser>>,
    page: Page,
    handler: JoinHandle<()>,
    interceptor: std::sync::Mutex<Option<JoinHandle<()>>>,
    slow_mo: Duration,
}

impl ChromiumDriver {
    /// Launch a browser and open a blank page
    pub async fn launch(config: &LaunchConfig) -> E2eResult<Self> {
        let mut builder = BrowserConfig::builder()
            .window_size(config.viewport.width, config.viewport.height)
            .args(config.args.clone());

        if !config.headless {
            builder = builder.with_head();
        }
        if config.devtools {
            builder = builder.arg("--auto-open-devtools-for-tabs");
        }
        if let Some(path) = &config.executable {
            builder = builder.chrome_executable(path);
        }

        let cdp_config = builder
            .build()
            .map_err(|message| E2eError::BrowserLaunchError { message })?;

        let (browser, mut handler) =
            Browser::launch(cdp_config)
                .await
                .map_err(|e| E2eError::BrowserLaunchError {
                    message: e.to_string(),
                })?;

        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(page_err)?;

        tracing::info!(
            headless = config.headless,
            slow_mo = config.slow_mo,
            "chromium launched"
        );

        let driver = Self {
            browser: Arc::new(Mutex::new(browser)),
            page,
            handler: handle,
            interceptor: std::sync::Mutex::new(None),
            slow_mo: Duration::from_millis(config.slow_mo),
        };

        driver.set_viewport(&config.viewport).await?;
        if let Some(ua) = &config.user_agent {
            driver
                .page
                .execute(SetUserAgentOverrideParams::new(ua.clone()))
                .await
                .map_err(page_err)?;
        }
        Ok(driver)
    }

    async fn slow_down(&self) {
        if !self.slow_mo.is_zero() {
            tokio::time::sleep(self.slow_mo).await;
        }
    }

    async fn eval_value(&self, script: &str) -> E2eResult<serde_json::Value> {
        let params = EvaluateParams::builder()
            .expression(script)
            .await_promise(true)
            .return_by_value(true)
            .build()
            .map_err(page_err)?;
        let result = self
            .page
            .evaluate_expression(params)
            .await
            .map_err(page_err)?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn eval_as<T: DeserializeOwned>(&self, script: &str) -> E2eResult<T> {
        Ok(serde_json::from_value(self.eval_value(script).await?)?)
    }

    async fn element_info(&self, selector: &str) -> E2eResult<Option<ElementInfo>> {
        let script = format!(
            "(() => {{ const el = document.querySelector({sel}); \
             return el ? {{ tag: el.tagName.toLowerCase(), text: el.textContent }} : null; }})()",
            sel = js_string(selector)
        );
        self.eval_as(&script).await
    }

    async fn network_idle(&self, timeout: Duration) -> E2eResult<()> {
        let probe = "performance.getEntriesByType('resource').length";
        let wait = async {
            let mut last: u64 = self.eval_as(probe).await?;
            loop {
                tokio::time::sleep(NETWORK_IDLE_WINDOW).await;
                let now: u64 = self.eval_as(probe).await?;
                if now == last {
                    return Ok::<(), E2eError>(());
                }
                last = now;
            }
        };
        tokio::time::timeout(timeout, wait)
            .await
            .map_err(|_| E2eError::Timeout {
                ms: timeout.as_millis() as u64,
            })?
    }

    async fn settle(&self, options: &NavigateOptions, timeout: Duration) -> E2eResult<()> {
        match options.wait_until {
            Some(WaitUntil::NetworkIdle0 | WaitUntil::NetworkIdle2) => {
                self.network_idle(timeout).await
            }
            _ => Ok(()),
        }
    }

    fn abort_interceptor(&self) {
        let mut slot = self
            .interceptor
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(task) = slot.take() {
            task.abort();
        }
    }
}

fn timeout_of(options: &NavigateOptions) -> Duration {
    Duration::from_millis(options.timeout.unwrap_or(DEFAULT_TIMEOUT_MS))
}

#[async_trait]
impl PageDriver for ChromiumDriver {
    async fn goto(&self, url: &str, options: &NavigateOptions) -> E2eResult<()> {
        let timeout = timeout_of(options);
        let navigation = async {
            self.page
                .goto(url)
                .await
                .map_err(|e| E2eError::NavigationError {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;
            self.settle(options, timeout).await
        };
        tokio::time::timeout(timeout, navigation)
            .await
            .map_err(|_| E2eError::NavigationError {
                url: url.to_string(),
                message: format!("timed out after {}ms", timeout.as_millis()),
            })?
    }

    async fn wait_for_navigation(&self, options: &NavigateOptions) -> E2eResult<()> {
        let timeout = timeout_of(options);
        let navigation = async {
            self.page
                .wait_for_navigation()
                .await
                .map_err(page_err)?;
            self.settle(options, timeout).await
        };
        tokio::time::timeout(timeout, navigation)
            .await
            .map_err(|_| E2eError::Timeout {
                ms: timeout.as_millis() as u64,
            })?
    }

    async fn click(&self, selector: &str, options: &ClickOptions) -> E2eResult<()> {
        self.slow_down().await;
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| E2eError::ElementNotFound {
                selector: selector.to_string(),
            })?;
        for i in 0..options.click_count.unwrap_or(1).max(1) {
            if i > 0 {
                if let Some(delay) = options.delay {
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                }
            }
            element.click().await.map_err(page_err)?;
        }
        Ok(())
    }

    async fn type_text(
        &self,
        selector: &str,
        text: &str,
        options: &TypeOptions,
    ) -> E2eResult<()> {
        self.slow_down().await;
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| E2eError::ElementNotFound {
                selector: selector.to_string(),
            })?;
        element.click().await.map_err(page_err)?;

        match options.delay.filter(|d| *d > 0) {
            Some(delay) => {
                for ch in text.chars() {
                    element.type_str(ch.to_string()).await.map_err(page_err)?;
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                }
            }
            None => {
                element.type_str(text).await.map_err(page_err)?;
            }
        }
        Ok(())
    }

    async fn select(&self, selector: &str, values: &[String]) -> E2eResult<Vec<String>> {
        self.slow_down().await;
        let wanted = serde_json::to_string(values)?;
        let script = format!(
            "(() => {{ const el = document.querySelector({sel}); if (!el) return null; \
             const wanted = {wanted}; const picked = []; \
             for (const opt of el.options) {{ opt.selected = wanted.includes(opt.value); \
             if (opt.selected) picked.push(opt.value); }} \
             el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
             el.dispatchEvent(new Event('change', {{ bubbles: true }})); \
             return picked; }})()",
            sel = js_string(selector)
        );
        let picked: Option<Vec<String>> = self.eval_as(&script).await?;
        picked.ok_or_else(|| E2eError::ElementNotFound {
            selector: selector.to_string(),
        })
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        options: &WaitOptions,
    ) -> E2eResult<ElementHandle> {
        let timeout_ms = options.timeout_ms();
        let poll = async {
            loop {
                if let Some(info) = self.element_info(selector).await? {
                    let ready = !options.visible
                        || self.is_intersecting_viewport(selector).await? == Some(true);
                    if ready {
                        return Ok::<_, E2eError>(ElementHandle {
                            selector: selector.to_string(),
                            index: 0,
                            tag_name: info.tag,
                            text_content: info.text,
                        });
                    }
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        };
        tokio::time::timeout(Duration::from_millis(timeout_ms), poll)
            .await
            .map_err(|_| E2eError::Timeout { ms: timeout_ms })?
    }

    async fn query_selector(&self, selector: &str) -> E2eResult<Option<ElementHandle>> {
        Ok(self.element_info(selector).await?.map(|info| ElementHandle {
            selector: selector.to_string(),
            index: 0,
            tag_name: info.tag,
            text_content: info.text,
        }))
    }

    async fn query_selector_all(&self, selector: &str) -> E2eResult<Vec<ElementHandle>> {
        let script = format!(
            "Array.from(document.querySelectorAll({sel})).map(el => \
             ({{ tag: el.tagName.toLowerCase(), text: el.textContent }}))",
            sel = js_string(selector)
        );
        let infos: Vec<ElementInfo> = self.eval_as(&script).await?;
        Ok(infos
            .into_iter()
            .enumerate()
            .map(|(index, info)| ElementHandle {
                selector: selector.to_string(),
                index,
                tag_name: info.tag,
                text_content: info.text,
            })
            .collect())
    }

    async fn element_property(
        &self,
        selector: &str,
        property: &ElementProperty,
    ) -> E2eResult<Option<String>> {
        let script = format!(
            "(() => {{ const el = document.querySelector({sel}); \
             if (!el) return {{ found: false, value: null }}; \
             return {{ found: true, value: {expr} }}; }})()",
            sel = js_string(selector),
            expr = property.js_expression()
        );
        let probe: PropertyProbe = self.eval_as(&script).await?;
        if probe.found {
            Ok(probe.value)
        } else {
            Err(E2eError::ElementNotFound {
                selector: selector.to_string(),
            })
        }
    }

    async fn is_intersecting_viewport(&self, selector: &str) -> E2eResult<Option<bool>> {
        let script = format!(
            "(() => {{ const el = document.querySelector({sel}); if (!el) return null; \
             return new Promise(resolve => {{ \
             const observer = new IntersectionObserver(entries => {{ \
             resolve(entries[0].intersectionRatio > 0); observer.disconnect(); }}); \
             observer.observe(el); }}); }})()",
            sel = js_string(selector)
        );
        self.eval_as(&script).await
    }

    async fn url(&self) -> E2eResult<String> {
        Ok(self
            .page
            .url()
            .await
            .map_err(page_err)?
            .unwrap_or_default())
    }

    async fn title(&self) -> E2eResult<String> {
        Ok(self
            .page
            .get_title()
            .await
            .map_err(page_err)?
            .unwrap_or_default())
    }

    async fn content(&self) -> E2eResult<String> {
        self.page.content().await.map_err(page_err)
    }

    async fn evaluate(&self, script: &str) -> E2eResult<serde_json::Value> {
        self.eval_value(script).await
    }

    async fn screenshot(&self, options: &ScreenshotOptions) -> E2eResult<Vec<u8>> {
        let mut builder = CaptureScreenshotParams::builder()
            .capture_beyond_viewport(options.full_page.unwrap_or(false));
        builder = match options.format.unwrap_or(ImageFormat::Png) {
            ImageFormat::Png => builder.format(CaptureScreenshotFormat::Png),
            ImageFormat::Jpeg => builder
                .format(CaptureScreenshotFormat::Jpeg)
                .quality(i64::from(options.quality.unwrap_or(90))),
        };

        let screenshot = self
            .page
            .execute(builder.build())
            .await
            .map_err(|e| E2eError::ScreenshotError {
                message: e.to_string(),
            })?;

        use base64::Engine;
        base64::engine::general_purpose::STANDARD
            .decode(&screenshot.data)
            .map_err(|e| E2eError::ScreenshotError {
                message: e.to_string(),
            })
    }

    async fn metrics(&self) -> E2eResult<PageMetrics> {
        self.page
            .execute(PerformanceEnableParams::default())
            .await
            .map_err(page_err)?;
        let raw = self
            .page
            .execute(GetMetricsParams::default())
            .await
            .map_err(page_err)?;

        let paints: Vec<PaintEntry> = self
            .eval_as(
                "performance.getEntriesByType('paint')\
                 .map(e => ({ name: e.name, startTime: e.startTime }))",
            )
            .await?;
        let paint = |name: &str| {
            paints
                .iter()
                .find(|p| p.name == name)
                .map(|p| p.start_time)
        };

        Ok(PageMetrics {
            metrics: raw
                .metrics
                .iter()
                .map(|m| (m.name.clone(), m.value))
                .collect(),
            first_paint_ms: paint("first-paint"),
            first_contentful_paint_ms: paint("first-contentful-paint"),
        })
    }

    async fn cookies(&self) -> E2eResult<Vec<Cookie>> {
        let cookies = self.page.get_cookies().await.map_err(page_err)?;
        Ok(cookies
            .into_iter()
            .map(|c| Cookie {
                name: c.name,
                value: c.value,
                domain: Some(c.domain),
                path: Some(c.path),
                url: None,
            })
            .collect())
    }

    async fn set_cookie(&self, cookie: &Cookie) -> E2eResult<()> {
        let mut param = CookieParam::new(cookie.name.clone(), cookie.value.clone());
        param.domain.clone_from(&cookie.domain);
        param.path.clone_from(&cookie.path);
        param.url = match (&cookie.url, &cookie.domain) {
            (Some(url), _) => Some(url.clone()),
            (None, Some(_)) => None,
            (None, None) => self.page.url().await.map_err(page_err)?,
        };
        self.page.set_cookie(param).await.map_err(page_err)?;
        Ok(())
    }

    async fn delete_cookies(&self, cookies: &[Cookie]) -> E2eResult<()> {
        let params: Vec<DeleteCookiesParams> = cookies
            .iter()
            .map(|c| {
                let mut param = DeleteCookiesParams::new(c.name.clone());
                param.domain.clone_from(&c.domain);
                param.path.clone_from(&c.path);
                param.url.clone_from(&c.url);
                param
            })
            .collect();
        self.page.delete_cookies(params).await.map_err(page_err)?;
        Ok(())
    }

    async fn set_request_interception(&self, block_patterns: &[String]) -> E2eResult<()> {
        self.abort_interceptor();
        if block_patterns.is_empty() {
            self.page
                .execute(FetchDisableParams::default())
                .await
                .map_err(page_err)?;
            return Ok(());
        }

        let mut paused = self
            .page
            .event_listener::<EventRequestPaused>()
            .await
            .map_err(page_err)?;
        let page = self.page.clone();
        let patterns = block_patterns.to_vec();
        let task = tokio::spawn(async move {
            while let Some(event) = paused.next().await {
                let url = &event.request.url;
                let outcome = if patterns.iter().any(|p| url.contains(p.as_str())) {
                    tracing::debug!(%url, "request blocked");
                    page.execute(FailRequestParams::new(
                        event.request_id.clone(),
                        ErrorReason::BlockedByClient,
                    ))
                    .await
                    .map(|_| ())
                } else {
                    page.execute(ContinueRequestParams::new(event.request_id.clone()))
                        .await
                        .map(|_| ())
                };
                if let Err(e) = outcome {
                    tracing::warn!(error = %e, %url, "paused request not resolved");
                }
            }
        });
        *self
            .interceptor
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(task);

        self.page
            .execute(FetchEnableParams::default())
            .await
            .map_err(page_err)?;
        Ok(())
    }

    async fn emulate(&self, device: &DeviceDescriptor) -> E2eResult<()> {
        self.set_viewport(&device.viewport).await?;
        self.page
            .execute(SetUserAgentOverrideParams::new(device.user_agent.to_string()))
            .await
            .map_err(page_err)?;
        Ok(())
    }

    async fn set_viewport(&self, viewport: &Viewport) -> E2eResult<()> {
        self.page
            .execute(SetDeviceMetricsOverrideParams::new(
                i64::from(viewport.width),
                i64::from(viewport.height),
                viewport.device_scale_factor,
                viewport.is_mobile,
            ))
            .await
            .map_err(page_err)?;
        self.page
            .execute(SetTouchEmulationEnabledParams::new(viewport.has_touch))
            .await
            .map_err(page_err)?;
        Ok(())
    }

    async fn wait_for_response(&self, pattern: &str, timeout: Duration) -> E2eResult<String> {
        self.page
            .execute(NetworkEnableParams::default())
            .await
            .map_err(page_err)?;
        let mut events = self
            .page
            .event_listener::<EventResponseReceived>()
            .await
            .map_err(page_err)?;
        let matched = async {
            while let Some(event) = events.next().await {
                if event.response.url.contains(pattern) {
                    return Some(event.response.url.clone());
                }
            }
            None
        };
        match tokio::time::timeout(timeout, matched).await {
            Ok(Some(url)) => Ok(url),
            Ok(None) => Err(E2eError::page("network event stream closed")),
            Err(_) => Err(E2eError::Timeout {
                ms: timeout.as_millis() as u64,
            }),
        }
    }

    async fn wait_for_request(&self, pattern: &str, timeout: Duration) -> E2eResult<String> {
        self.page
            .execute(NetworkEnableParams::default())
            .await
            .map_err(page_err)?;
        let mut events = self
            .page
            .event_listener::<EventRequestWillBeSent>()
            .await
            .map_err(page_err)?;
        let matched = async {
            while let Some(event) = events.next().await {
                if event.request.url.contains(pattern) {
                    return Some(event.request.url.clone());
                }
            }
            None
        };
        match tokio::time::timeout(timeout, matched).await {
            Ok(Some(url)) => Ok(url),
            Ok(None) => Err(E2eError::page("network event stream closed")),
            Err(_) => Err(E2eError::Timeout {
                ms: timeout.as_millis() as u64,
            }),
        }
    }

    async fn close(&self, keep_open: bool) -> E2eResult<()> {
        self.abort_interceptor();
        let mut browser = self.browser.lock().await;
        if keep_open {
            tracing::info!("REPL mode: waiting for the browser window to be closed");
        } else {
            browser.close().await.map_err(page_err)?;
        }
        browser.wait().await.map_err(page_err)?;
        self.handler.abort();
        Ok(())
    }
}
