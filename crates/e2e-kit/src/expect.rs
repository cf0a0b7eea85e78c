//! Fluent element assertions.
//!
//! ```ignore
//! device.expect("welcome-banner").to_contain("Welcome").await?;
//! device.expect(".error").not().to_exist().await?;
//! ```
//!
//! A handle is immutable: `not()` returns a new, negated handle over the
//! same resolved selector.

use crate::assertion::{Assertion, AssertionResult};
use crate::device::Device;
use crate::driver::ElementProperty;
use crate::result::{E2eError, E2eResult};
use crate::selector::resolve;

/// Pending assertion about the elements matching one selector
#[derive(Debug, Clone)]
#[must_use = "an expectation does nothing until a predicate is awaited"]
pub struct Expectation<'a> {
    device: &'a Device,
    selector: String,
    resolved: String,
    negated: bool,
}

impl<'a> Expectation<'a> {
    pub(crate) fn new(device: &'a Device, selector: &str) -> Self {
        Self {
            device,
            selector: selector.to_string(),
            resolved: resolve(selector),
            negated: false,
        }
    }

    /// The negated form of this expectation
    pub fn not(&self) -> Self {
        Self {
            negated: !self.negated,
            ..self.clone()
        }
    }

    /// Selector as written
    #[must_use]
    pub fn selector(&self) -> &str {
        &self.selector
    }

    /// Selector after resolution
    #[must_use]
    pub fn resolved(&self) -> &str {
        &self.resolved
    }

    /// Whether this handle is negated
    #[must_use]
    pub const fn is_negated(&self) -> bool {
        self.negated
    }

    fn step(&self, action: &str, affirmative: &str, negative: &str) {
        let phrase = if self.negated { negative } else { affirmative };
        self.device
            .logger()
            .step(action, &format!("\"{}\" {phrase}", self.selector));
    }

    fn assertion_name(&self, name: &str) -> String {
        if self.negated {
            format!("not.{name}")
        } else {
            name.to_string()
        }
    }

    fn check(
        &self,
        name: &str,
        result: AssertionResult,
        expected: String,
        actual: Option<String>,
    ) -> E2eResult<()> {
        if result.negate(self.negated).passed {
            Ok(())
        } else {
            Err(self.failure(name, expected, actual))
        }
    }

    fn failure(&self, name: &str, expected: String, actual: Option<String>) -> E2eError {
        E2eError::AssertionFailed {
            selector: self.selector.clone(),
            assertion: self.assertion_name(name),
            expected,
            actual,
        }
    }

    /// Extract a property, mapping a missing element to an assertion failure
    async fn extract(
        &self,
        name: &str,
        property: ElementProperty,
        expected: &str,
    ) -> E2eResult<Option<String>> {
        match self
            .device
            .driver()
            .element_property(&self.resolved, &property)
            .await
        {
            Ok(value) => Ok(value),
            Err(E2eError::ElementNotFound { .. }) => {
                Err(self.failure(name, expected.to_string(), None))
            }
            Err(e) => Err(e),
        }
    }

    /// At least one element matches
    pub async fn to_exist(&self) -> E2eResult<()> {
        self.step("Verifying", "exists", "does not exist");
        let found = self
            .device
            .driver()
            .query_selector(&self.resolved)
            .await?
            .is_some();
        self.check(
            "to_exist",
            Assertion::is_true(found, "element not found"),
            "element".to_string(),
            found.then(|| "element".to_string()),
        )
    }

    /// The first match intersects the viewport.
    ///
    /// The negated form also passes when nothing matches.
    pub async fn to_be_visible(&self) -> E2eResult<()> {
        self.step("Verifying", "is visible", "is not visible");
        let visible = self
            .device
            .driver()
            .is_intersecting_viewport(&self.resolved)
            .await?;
        match visible {
            None if self.negated => Ok(()),
            None => Err(self.failure("to_be_visible", "visible".to_string(), None)),
            Some(visible) => self.check(
                "to_be_visible",
                Assertion::is_true(visible, "element not visible"),
                "visible".to_string(),
                Some(if visible { "visible" } else { "hidden" }.to_string()),
            ),
        }
    }

    /// Text content contains `text`
    pub async fn to_contain(&self, text: &str) -> E2eResult<()> {
        self.step(
            "Verifying text",
            &format!("contains \"{text}\""),
            &format!("does not contain \"{text}\""),
        );
        let expected = format!("{text:?}");
        let actual = self
            .extract("to_contain", ElementProperty::TextContent, &expected)
            .await?
            .unwrap_or_default();
        self.check(
            "to_contain",
            Assertion::contains(&actual, text),
            expected,
            Some(format!("{actual:?}")),
        )
    }

    /// Trimmed text content equals `text`
    pub async fn to_have_text(&self, text: &str) -> E2eResult<()> {
        self.step(
            "Verifying exact text",
            &format!("equals \"{text}\""),
            &format!("does not equal \"{text}\""),
        );
        let expected = format!("{text:?}");
        let actual = self
            .extract("to_have_text", ElementProperty::TextContent, &expected)
            .await?
            .unwrap_or_default();
        let actual = actual.trim();
        self.check(
            "to_have_text",
            Assertion::equals(text, actual),
            expected,
            Some(format!("{actual:?}")),
        )
    }

    /// Form value equals `value`
    pub async fn to_have_value(&self, value: &str) -> E2eResult<()> {
        self.step(
            "Verifying value",
            &format!("equals \"{value}\""),
            &format!("does not equal \"{value}\""),
        );
        let expected = format!("{value:?}");
        let actual = self
            .extract("to_have_value", ElementProperty::Value, &expected)
            .await?;
        self.check(
            "to_have_value",
            Assertion::equals(&Some(value), &actual.as_deref()),
            expected,
            actual.map(|a| format!("{a:?}")),
        )
    }

    /// Attribute `name` equals `value`
    pub async fn to_have_attribute(&self, name: &str, value: &str) -> E2eResult<()> {
        let detail = format!("{name}={value}");
        self.step("Verifying attribute", &detail, &detail);
        let expected = format!("{name}={value:?}");
        let actual = self
            .extract(
                "to_have_attribute",
                ElementProperty::Attribute(name.to_string()),
                &expected,
            )
            .await?;
        self.check(
            "to_have_attribute",
            Assertion::equals(&Some(value), &actual.as_deref()),
            expected,
            actual.map(|a| format!("{name}={a:?}")),
        )
    }

    /// Class list contains `class_name` as a whole token
    pub async fn to_have_class(&self, class_name: &str) -> E2eResult<()> {
        let detail = format!("has class \"{class_name}\"");
        self.step("Verifying class", &detail, &detail);
        let expected = format!("{class_name:?}");
        let actual = self
            .extract("to_have_class", ElementProperty::ClassName, &expected)
            .await?
            .unwrap_or_default();
        self.check(
            "to_have_class",
            Assertion::has_token(&actual, class_name),
            expected,
            Some(format!("{actual:?}")),
        )
    }

    /// Exactly `count` elements match
    pub async fn to_have_count(&self, count: usize) -> E2eResult<()> {
        let detail = format!("has {count} elements");
        self.step("Verifying count", &detail, &detail);
        let elements = self
            .device
            .driver()
            .query_selector_all(&self.resolved)
            .await?;
        self.check(
            "to_have_count",
            Assertion::has_length(&elements, count),
            count.to_string(),
            Some(elements.len().to_string()),
        )
    }
}
