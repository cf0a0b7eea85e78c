//! Test data builders shared by the e2e tests.
//!
//! Implement [`DataBuilder`] for each kind of account or record a test
//! needs. `generate` must be overridden; the default fails the test.

#![allow(dead_code)]

pub use e2e_kit::{DataBuilder, E2eResult, TestData};

/// Credentials of the agent account used by the login examples
#[derive(Debug, Clone, Copy, Default)]
pub struct AgentTestDataBuilder;

impl AgentTestDataBuilder {
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
