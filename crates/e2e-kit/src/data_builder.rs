//! Test data builders.
//!
//! A builder produces a flat key/value [`TestData`] record for one test.
//! Implementors must override [`DataBuilder::generate`]; the default fails
//! with [`E2eError::DataBuilderNotImplemented`].

use crate::result::{E2eError, E2eResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::Debug;

/// Flat key/value record handed to a test
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TestData {
    fields: BTreeMap<String, Value>,
}

impl TestData {
    /// Empty record
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field, builder style
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Set a field
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Field value
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Field value when it is a string
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// String field that must be present
    pub fn require_str(&self, key: &str) -> E2eResult<&str> {
        self.get_str(key).ok_or_else(|| E2eError::Config {
            message: format!("test data has no string field {key:?}"),
        })
    }

    /// Field names
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Number of fields
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no fields
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Producer of test data
pub trait DataBuilder: Send + Sync + Debug {
    /// Builder name, used in errors and setup summaries
    fn name(&self) -> &str;

    /// Builder version
    fn version(&self) -> &str {
        "1"
    }

    /// Produce the record
    fn generate(&self) -> E2eResult<TestData> {
        Err(E2eError::DataBuilderNotImplemented {
            builder: self.name().to_string(),
        })
    }
}

/// Credentials of the sample agent account
#[derive(Debug, Clone, Copy, Default)]
pub struct AgentTestDataBuilder;

impl AgentTestDataBuilder {
    /// Create the builder
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl DataBuilder for AgentTestDataBuilder {
    fn name(&self) -> &str {
        "AgentTestDataBuilder"
    }

    fn generate(&self) -> E2eResult<TestData> {
        Ok(TestData::new()
            .with("userEmail", "agent@anilathomes.com")
            .with("userPassword", "Password.123$"))
    }
}
