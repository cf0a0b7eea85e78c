//! Result and error types for e2e-kit.

use thiserror::Error;

/// Result type for e2e-kit operations
pub type E2eResult<T> = Result<T, E2eError>;

/// Errors that can occur in e2e-kit
#[derive(Debug, Error)]
pub enum E2eError {
    /// A fluent assertion did not hold
    #[error(
        "expect({selector:?}).{assertion}: expected {expected}, received {}",
        .actual.as_deref().unwrap_or("null")
    )]
    AssertionFailed {
        /// Selector as written by the test author
        selector: String,
        /// Predicate name, prefixed with `not.` when negated
        assertion: String,
        /// Expected value
        expected: String,
        /// Actual value (`None` when the element or attribute is absent)
        actual: Option<String>,
    },

    /// No element matched a selector that had to resolve
    #[error("No element matches selector {selector:?}")]
    ElementNotFound {
        /// Resolved selector
        selector: String,
    },

    /// Operation timed out
    #[error("Operation timed out after {ms}ms")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    NavigationError {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunchError {
        /// Error message
        message: String,
    },

    /// Page error
    #[error("Page error: {message}")]
    PageError {
        /// Error message
        message: String,
    },

    /// Screenshot error
    #[error("Screenshot failed: {message}")]
    ScreenshotError {
        /// Error message
        message: String,
    },

    /// A second test was registered in one file
    #[error(
        "SINGLE TEST RULE VIOLATION in {file}: only one test is allowed per file, found {count}"
    )]
    SingleTestViolation {
        /// File name
        file: String,
        /// Number of registrations attempted so far
        count: usize,
    },

    /// A data builder never overrode `generate`
    #[error("generate() must be implemented by {builder}")]
    DataBuilderNotImplemented {
        /// Builder name
        builder: String,
    },

    /// Named device lookup failed
    #[error("Unknown device: {name}")]
    UnknownDevice {
        /// Device name
        name: String,
    },

    /// Invalid state (operation called in wrong state)
    #[error("Invalid state: {message}")]
    InvalidState {
        /// Error message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl E2eError {
    /// Create a page error
    #[must_use]
    pub fn page(message: impl Into<String>) -> Self {
        Self::PageError {
            message: message.into(),
        }
    }

    /// Check whether this is an assertion failure
    #[must_use]
    pub const fn is_assertion(&self) -> bool {
        matches!(self, Self::AssertionFailed { .. })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_assertion_failed_display() {
        let err = E2eError::AssertionFailed {
            selector: "email-input".to_string(),
            assertion: "to_have_value".to_string(),
            expected: "\"a@b.c\"".to_string(),
            actual: Some("\"\"".to_string()),
        };
        let text = err.to_string();
        assert!(text.contains("expect(\"email-input\").to_have_value"));
        assert!(text.contains("expected \"a@b.c\""));
        assert!(text.contains("received \"\""));
        assert!(err.is_assertion());
    }

    #[test]
    fn test_assertion_failed_absent_actual() {
        let err = E2eError::AssertionFailed {
            selector: ".banner".to_string(),
            assertion: "to_exist".to_string(),
            expected: "element".to_string(),
            actual: None,
        };
        assert!(err.to_string().ends_with("received null"));
    }

    #[test]
    fn test_single_test_violation_display() {
        let err = E2eError::SingleTestViolation {
            file: "login_e2e.rs".to_string(),
            count: 2,
        };
        let text = err.to_string();
        assert!(text.contains("SINGLE TEST RULE VIOLATION"));
        assert!(text.contains("login_e2e.rs"));
        assert!(!err.is_assertion());
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: E2eError = io_err.into();
        assert!(err.to_string().contains("I/O"));
    }
}
