//! e2e-kit: fluent end-to-end browser tests over Chromium
//!
//! Tests drive a page through a [`Device`], address elements with CSS or
//! bare `data-testid` values, and assert with [`Expectation`]. Every action
//! is announced by the [`StepLogger`] so a failing run shows exactly where
//! it stopped.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                      e2e-kit Architecture                      │
//! ├───────────────────────────────────────────────────────────────┤
//! │   ┌───────────┐    ┌────────────┐    ┌──────────────┐         │
//! │   │ TestFile  │    │ Device /   │    │ PageDriver   │         │
//! │   │ (one test │───►│ Chrome     │───►│ (chromium or │         │
//! │   │  per file)│    │ Device     │    │  mock)       │         │
//! │   └───────────┘    └────────────┘    └──────────────┘         │
//! │         │                │                                    │
//! │         ▼                ▼                                    │
//! │   RunContext       StepLogger + Expectation                   │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use e2e_kit::prelude::*;
//!
//! # async fn demo(device: ChromeDevice) -> E2eResult<()> {
//! device.navigate("https://example.test/login").await?;
//! device.type_text("email-input", "agent@example.test").await?;
//! device.click("login-button").await?;
//! device.expect("dashboard").to_be_visible().await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::large_stack_frames))]

mod assertion;
mod chrome;
#[cfg(feature = "browser")]
mod chromium;
mod context;
mod data_builder;
mod device;
mod driver;
mod enforcer;
mod expect;
mod result;
mod selector;
mod setup;
mod step_logger;

/// Single-test-per-file static check
pub mod lint;

/// Tracing subscriber setup
pub mod logging;

pub use assertion::{Assertion, AssertionResult};
pub use chrome::{
    ChromeDevice, ChromeOptions, LogLevel, PerformanceMetrics, MOBILE_VIEWPORT_HEIGHT,
    MOBILE_VIEWPORT_WIDTH, SCREENSHOT_QUALITY,
};
#[cfg(feature = "browser")]
pub use chromium::ChromiumDriver;
pub use context::{
    parse_leading_u64, LaunchConfig, ProjectConfig, RunConfig, RunContext, CONFIG_FILE_NAME,
    DEFAULT_BROWSER_ARGS, DEVELOPMENT_SLOW_MO_MS,
};
pub use data_builder::{AgentTestDataBuilder, DataBuilder, TestData};
pub use device::{CssDevice, Device, DeviceOps};
pub use driver::{
    js_string, ClickOptions, Cookie, DeviceDescriptor, ElementHandle, ElementProperty,
    ImageFormat, MockDriver, MockElement, NavigateOptions, PageDriver, PageMetrics,
    ScreenshotOptions, TypeOptions, Viewport, WaitOptions, WaitUntil, DEFAULT_TIMEOUT_MS,
};
pub use enforcer::{SingleTestEnforcer, TestFile};
pub use expect::Expectation;
pub use result::{E2eError, E2eResult};
pub use selector::{
    display_selector, display_text, resolve, Selector, DISPLAY_SELECTOR_MAX, DISPLAY_TEXT_MAX,
    HTML_TAGS,
};
pub use setup::{
    Devices, E2eSetup, E2eSetupBuilder, Hook, HookContext, SetupSummary, DEFAULT_ENVIRONMENT,
};
pub use step_logger::{StepLogger, StepPolicy, CLEAR_LINE, DEFAULT_SUCCESS_MESSAGE};

/// Everything a test file usually needs
pub mod prelude {
    #[cfg(feature = "browser")]
    pub use super::chromium::ChromiumDriver;
    pub use super::{
        resolve, AgentTestDataBuilder, ChromeDevice, ChromeOptions, ClickOptions, Cookie,
        DataBuilder, Device, DeviceDescriptor, DeviceOps, E2eError, E2eResult, E2eSetup,
        Expectation, LogLevel, NavigateOptions, PageDriver, RunContext, ScreenshotOptions,
        TestData, TestFile, TypeOptions, Viewport, WaitOptions, WaitUntil,
    };
}
