//! Smart selector resolution.
//!
//! Test authors write either a literal CSS selector (`.error-banner`,
//! `#login`, `form > input`, `button`) or a bare test-id token
//! (`email-input`). Tokens are expanded to a `data-testid` attribute
//! selector; everything recognized as CSS passes through untouched.
//!
//! ```
//! use e2e_kit::resolve;
//!
//! assert_eq!(resolve("submit-button"), r#"[data-testid="submit-button"]"#);
//! assert_eq!(resolve(".error"), ".error");
//! assert_eq!(resolve("BUTTON"), "BUTTON");
//! ```

/// Tag names that are always treated as CSS, compared case-insensitively
pub const HTML_TAGS: &[&str] = &[
    "html", "body", "head", "div", "span", "p", "a", "img", "ul", "li", "ol", "table", "tr", "td",
    "th", "form", "input", "button", "textarea", "select", "option", "label", "h1", "h2", "h3",
    "h4", "h5", "h6", "nav", "header", "footer", "section", "article", "main", "aside",
];

/// Maximum selector length shown in step messages
pub const DISPLAY_SELECTOR_MAX: usize = 30;

/// Maximum typed-text length shown in step messages
pub const DISPLAY_TEXT_MAX: usize = 20;

/// Selector classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Literal CSS selector, used as-is
    Css(String),
    /// Test ID token (data-testid attribute value)
    TestId(String),
}

impl Selector {
    /// Classify a raw selector string
    #[must_use]
    pub fn classify(raw: &str) -> Self {
        if is_css(raw) {
            Self::Css(raw.to_string())
        } else {
            Self::TestId(raw.to_string())
        }
    }

    /// Create a test ID selector
    #[must_use]
    pub fn test_id(id: impl Into<String>) -> Self {
        Self::TestId(id.into())
    }

    /// Render as a CSS selector the page can query
    ///
    /// Quote characters inside a test ID are not escaped.
    #[must_use]
    pub fn to_css(&self) -> String {
        match self {
            Self::Css(css) => css.clone(),
            Self::TestId(id) => format!("[data-testid=\"{id}\"]"),
        }
    }

    /// Whether the selector was recognized as literal CSS
    #[must_use]
    pub const fn is_css(&self) -> bool {
        matches!(self, Self::Css(_))
    }
}

fn is_css(raw: &str) -> bool {
    raw.starts_with(['.', '#', '['])
        || raw.contains(['>', ' ', ':', '*'])
        || HTML_TAGS.iter().any(|tag| tag.eq_ignore_ascii_case(raw))
}

/// Resolve a selector or test-id token into a CSS selector.
///
/// Pure and deterministic; re-resolving any output returns it unchanged.
#[must_use]
pub fn resolve(selector: &str) -> String {
    Selector::classify(selector).to_css()
}

/// Shorten a selector for single-line step output
#[must_use]
pub fn display_selector(selector: &str) -> String {
    truncate(selector, DISPLAY_SELECTOR_MAX)
}

/// Shorten typed text for single-line step output
#[must_use]
pub fn display_text(text: &str) -> String {
    truncate(text, DISPLAY_TEXT_MAX)
}

fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() > max {
        let head: String = value.chars().take(max).collect();
        format!("{head}...")
    } else {
        value.to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    mod classify_tests {
        use super::*;

        #[test]
        fn test_prefix_patterns_are_css() {
            for raw in [".error-banner", "#login", "[name='email']"] {
                assert_eq!(Selector::classify(raw), Selector::Css(raw.to_string()));
            }
        }

        #[test]
        fn test_embedded_patterns_are_css() {
            for raw in ["form>input", "div span", "input:focus", "*", "ul>li*"] {
                assert!(Selector::classify(raw).is_css(), "{raw} should be css");
            }
        }

        #[test]
        fn test_tag_names_case_insensitive() {
            assert!(Selector::classify("button").is_css());
            assert!(Selector::classify("BODY").is_css());
            assert!(Selector::classify("H1").is_css());
        }

        #[test]
        fn test_unknown_tag_is_test_id() {
            // Not on the allow-list, even though browsers know it
            assert_eq!(
                Selector::classify("canvas"),
                Selector::TestId("canvas".to_string())
            );
        }

        #[test]
        fn test_token_is_test_id() {
            assert_eq!(
                Selector::classify("email-input"),
                Selector::test_id("email-input")
            );
        }
    }

    mod resolve_tests {
        use super::*;

        #[test]
        fn test_resolve_token() {
            assert_eq!(resolve("submit-button"), "[data-testid=\"submit-button\"]");
        }

        #[test]
        fn test_resolve_css_unchanged() {
            assert_eq!(resolve(".success-message"), ".success-message");
            assert_eq!(resolve("body"), "body");
        }

        #[test]
        fn test_resolve_does_not_escape_quotes() {
            assert_eq!(resolve("a\"b"), "[data-testid=\"a\"b\"]");
        }

        #[test]
        fn test_resolve_is_idempotent_on_outputs() {
            let once = resolve("password-input");
            assert_eq!(resolve(&once), once);
        }
    }

    mod display_tests {
        use super::*;

        #[test]
        fn test_short_selector_unchanged() {
            assert_eq!(display_selector("email-input"), "email-input");
        }

        #[test]
        fn test_long_selector_truncated() {
            let long = "a".repeat(40);
            let shown = display_selector(&long);
            assert_eq!(shown, format!("{}...", "a".repeat(30)));
        }

        #[test]
        fn test_text_truncated_at_twenty() {
            assert_eq!(display_text("abcdefghijklmnopqrstuvwxyz"), "abcdefghijklmnopqrst...");
            assert_eq!(display_text("exactly twenty chars"), "exactly twenty chars");
        }

        #[test]
        fn test_truncate_multibyte() {
            let text = "é".repeat(25);
            assert_eq!(display_text(&text), format!("{}...", "é".repeat(20)));
        }
    }

    proptest! {
        #[test]
        fn prop_prefixed_selectors_unchanged(
            prefix in "[.#\\[]",
            rest in "[a-z0-9_-]{0,16}"
        ) {
            let raw = format!("{prefix}{rest}");
            prop_assert_eq!(resolve(&raw), raw);
        }

        #[test]
        fn prop_embedded_patterns_unchanged(
            head in "[a-z]{1,8}",
            sep in "[> :*]",
            tail in "[a-z]{0,8}"
        ) {
            let raw = format!("{head}{sep}{tail}");
            prop_assert_eq!(resolve(&raw), raw);
        }

        #[test]
        fn prop_tokens_become_test_ids(token in "[a-z][a-z0-9_-]{2,20}") {
            prop_assume!(!HTML_TAGS.contains(&token.as_str()));
            prop_assert_eq!(resolve(&token), format!("[data-testid=\"{token}\"]"));
        }

        #[test]
        fn prop_resolve_idempotent(raw in "[a-zA-Z0-9.#:> _-]{1,24}") {
            let once = resolve(&raw);
            prop_assert_eq!(resolve(&once), once.clone());
        }

        #[test]
        fn prop_tag_case_insensitive(idx in 0..HTML_TAGS.len()) {
            let upper = HTML_TAGS[idx].to_uppercase();
            prop_assert_eq!(resolve(&upper), upper);
        }
    }
}
