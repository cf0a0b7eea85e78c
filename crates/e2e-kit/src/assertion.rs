//! Comparison primitives behind the fluent element assertions.
//!
//! Each primitive produces an [`AssertionResult`]; [`AssertionResult::negate`]
//! flips it for the `not()` form so every predicate shares one comparison.

use std::fmt::Debug;

/// Result of an assertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionResult {
    /// Whether the assertion passed
    pub passed: bool,
    /// Human-readable message
    pub message: String,
}

impl AssertionResult {
    /// Create a passing assertion result
    #[must_use]
    pub const fn pass() -> Self {
        Self {
            passed: true,
            message: String::new(),
        }
    }

    /// Create a failing assertion result
    #[must_use]
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
        }
    }

    /// Invert the outcome when `negated` is set
    #[must_use]
    pub fn negate(self, negated: bool) -> Self {
        if !negated {
            return self;
        }
        if self.passed {
            Self::fail("expected the opposite to hold")
        } else {
            Self::pass()
        }
    }
}

/// Assertion helpers
#[derive(Debug, Clone, Copy)]
pub struct Assertion;

impl Assertion {
    /// Assert two values are equal
    #[must_use]
    pub fn equals<T: PartialEq + Debug + ?Sized>(expected: &T, actual: &T) -> AssertionResult {
        if expected == actual {
            AssertionResult::pass()
        } else {
            AssertionResult::fail(format!("expected {expected:?}, got {actual:?}"))
        }
    }

    /// Assert a string contains a substring
    #[must_use]
    pub fn contains(haystack: &str, needle: &str) -> AssertionResult {
        if haystack.contains(needle) {
            AssertionResult::pass()
        } else {
            AssertionResult::fail(format!("expected '{haystack}' to contain '{needle}'"))
        }
    }

    /// Assert a whitespace-separated token list contains `token`
    #[must_use]
    pub fn has_token(list: &str, token: &str) -> AssertionResult {
        if list.split_whitespace().any(|t| t == token) {
            AssertionResult::pass()
        } else {
            AssertionResult::fail(format!("expected '{list}' to include token '{token}'"))
        }
    }

    /// Assert a condition is true
    #[must_use]
    pub fn is_true(condition: bool, message: &str) -> AssertionResult {
        if condition {
            AssertionResult::pass()
        } else {
            AssertionResult::fail(message)
        }
    }

    /// Assert a collection has expected length
    #[must_use]
    pub fn has_length<T>(collection: &[T], expected: usize) -> AssertionResult {
        if collection.len() == expected {
            AssertionResult::pass()
        } else {
            AssertionResult::fail(format!(
                "expected length {expected}, got {}",
                collection.len()
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equals_str() {
        assert!(Assertion::equals("a", "a").passed);
        let result = Assertion::equals("a", "b");
        assert!(!result.passed);
        assert!(result.message.contains("\"b\""));
    }

    #[test]
    fn test_contains() {
        assert!(Assertion::contains("Welcome back", "Welcome").passed);
        assert!(!Assertion::contains("Welcome", "bye").passed);
    }

    #[test]
    fn test_has_token_is_not_substring() {
        assert!(Assertion::has_token("btn btn-primary", "btn-primary").passed);
        assert!(!Assertion::has_token("btn-primary", "btn").passed);
        assert!(!Assertion::has_token("", "btn").passed);
    }

    #[test]
    fn test_has_length() {
        assert!(Assertion::has_length(&[1, 2, 3], 3).passed);
        assert!(!Assertion::has_length::<u8>(&[], 1).passed);
    }

    #[test]
    fn test_is_true() {
        assert!(Assertion::is_true(true, "x").passed);
        assert_eq!(Assertion::is_true(false, "x").message, "x");
    }

    mod negate_tests {
        use super::*;

        #[test]
        fn test_negate_false_is_identity() {
            let result = Assertion::contains("abc", "z");
            assert_eq!(result.clone().negate(false), result);
        }

        #[test]
        fn test_negate_flips_pass() {
            assert!(!AssertionResult::pass().negate(true).passed);
        }

        #[test]
        fn test_negate_flips_fail() {
            assert!(AssertionResult::fail("nope").negate(true).passed);
        }
    }
}
