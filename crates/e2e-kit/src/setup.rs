//! Test-environment configurator.
//!
//! [`E2eSetup`] bundles what one test needs: named devices, a data builder,
//! an environment name and optional lifecycle hooks.
//!
//! ```ignore
//! let setup = E2eSetup::builder()
//!     .data_builder(AgentTestDataBuilder::new())
//!     .device("device", Arc::new(chrome))
//!     .build();
//! let data = setup.test_data()?;
//! let device = setup.device("device")?;
//! ```

use crate::data_builder::{DataBuilder, TestData};
use crate::device::DeviceOps;
use crate::result::{E2eError, E2eResult};
use futures::future::BoxFuture;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Named devices
pub type Devices = BTreeMap<String, Arc<dyn DeviceOps>>;

/// Environment used when none is set
pub const DEFAULT_ENVIRONMENT: &str = "test";

/// What a lifecycle hook receives
#[derive(Debug, Clone)]
pub struct HookContext {
    /// Devices at the time the hook runs
    pub devices: Devices,
    /// Test data (empty without a builder)
    pub data: TestData,
}

/// Async lifecycle hook
pub type Hook = Arc<dyn Fn(HookContext) -> BoxFuture<'static, E2eResult<()>> + Send + Sync>;

#[derive(Default, Clone)]
struct Hooks {
    before_all: Option<Hook>,
    after_all: Option<Hook>,
    before_each: Option<Hook>,
    after_each: Option<Hook>,
}

/// Snapshot of a setup, for debugging
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SetupSummary {
    /// Extra settings
    pub config: BTreeMap<String, serde_json::Value>,
    /// Environment name
    pub environment: String,
    /// Device names
    pub devices: Vec<String>,
    /// Whether a data builder is set
    pub has_data_builder: bool,
    /// Whether the setup is initialized
    pub initialized: bool,
}

/// Builder for [`E2eSetup`]
#[derive(Debug, Default)]
pub struct E2eSetupBuilder {
    data_builder: Option<Arc<dyn DataBuilder>>,
    devices: Devices,
    environment: Option<String>,
    config: BTreeMap<String, serde_json::Value>,
}

impl E2eSetupBuilder {
    /// Set the data builder
    #[must_use]
    pub fn data_builder(mut self, builder: impl DataBuilder + 'static) -> Self {
        self.data_builder = Some(Arc::new(builder));
        self
    }

    /// Register a named device
    #[must_use]
    pub fn device(mut self, name: impl Into<String>, device: Arc<dyn DeviceOps>) -> Self {
        self.devices.insert(name.into(), device);
        self
    }

    /// Set the environment name
    #[must_use]
    pub fn environment(mut self, env: impl Into<String>) -> Self {
        self.environment = Some(env.into());
        self
    }

    /// Set an extra setting
    #[must_use]
    pub fn setting(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }

    /// Finish
    #[must_use]
    pub fn build(self) -> E2eSetup {
        E2eSetup {
            data_builder: self.data_builder,
            devices: self.devices,
            environment: self.environment,
            config: self.config,
            cached_data: Mutex::new(None),
            hooks: Hooks::default(),
            initialized: true,
        }
    }
}

/// Per-test environment: devices, data and hooks
pub struct E2eSetup {
    data_builder: Option<Arc<dyn DataBuilder>>,
    devices: Devices,
    environment: Option<String>,
    config: BTreeMap<String, serde_json::Value>,
    cached_data: Mutex<Option<TestData>>,
    hooks: Hooks,
    initialized: bool,
}

impl std::fmt::Debug for E2eSetup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("E2eSetup")
            .field("summary", &self.debug())
            .finish_non_exhaustive()
    }
}

impl Default for E2eSetup {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl E2eSetup {
    /// Start building a setup
    #[must_use]
    pub fn builder() -> E2eSetupBuilder {
        E2eSetupBuilder::default()
    }

    /// Test data, generated once and cached
    pub fn test_data(&self) -> E2eResult<TestData> {
        let mut cached = self
            .cached_data
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(data) = cached.as_ref() {
            return Ok(data.clone());
        }
        let data = match &self.data_builder {
            Some(builder) => {
                tracing::debug!(builder = builder.name(), version = builder.version(), "generating test data");
                builder.generate()?
            }
            None => TestData::new(),
        };
        *cached = Some(data.clone());
        Ok(data)
    }

    /// All devices
    #[must_use]
    pub fn devices(&self) -> Devices {
        self.devices.clone()
    }

    /// One device by name
    pub fn device(&self, name: &str) -> E2eResult<Arc<dyn DeviceOps>> {
        self.devices
            .get(name)
            .cloned()
            .ok_or_else(|| E2eError::UnknownDevice {
                name: name.to_string(),
            })
    }

    /// Add or replace a device
    pub fn add_device(&mut self, name: impl Into<String>, device: Arc<dyn DeviceOps>) -> &mut Self {
        self.devices.insert(name.into(), device);
        self
    }

    /// Remove a device
    pub fn remove_device(&mut self, name: &str) -> &mut Self {
        self.devices.remove(name);
        self
    }

    /// Replace the data builder, discarding cached data
    pub fn set_data_builder(&mut self, builder: impl DataBuilder + 'static) -> &mut Self {
        self.data_builder = Some(Arc::new(builder));
        *self
            .cached_data
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner) = None;
        self
    }

    /// Merge extra settings
    pub fn update_config(&mut self, settings: BTreeMap<String, serde_json::Value>) -> &mut Self {
        self.config.extend(settings);
        self.initialized = true;
        self
    }

    /// Environment name, `"test"` by default
    #[must_use]
    pub fn environment(&self) -> &str {
        self.environment.as_deref().unwrap_or(DEFAULT_ENVIRONMENT)
    }

    /// Set the environment name
    pub fn set_environment(&mut self, env: impl Into<String>) -> &mut Self {
        self.environment = Some(env.into());
        self
    }

    /// Drop builder, devices and cached data
    pub fn reset(&mut self) -> &mut Self {
        self.data_builder = None;
        self.devices.clear();
        *self
            .cached_data
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner) = None;
        self.initialized = false;
        self
    }

    /// Summary for debugging
    #[must_use]
    pub fn debug(&self) -> SetupSummary {
        SetupSummary {
            config: self.config.clone(),
            environment: self.environment().to_string(),
            devices: self.devices.keys().cloned().collect(),
            has_data_builder: self.data_builder.is_some(),
            initialized: self.initialized,
        }
    }

    /// Hook run once before the test
    pub fn before_all<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(HookContext) -> BoxFuture<'static, E2eResult<()>> + Send + Sync + 'static,
    {
        self.hooks.before_all = Some(Arc::new(hook));
        self
    }

    /// Hook run once after the test
    pub fn after_all<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(HookContext) -> BoxFuture<'static, E2eResult<()>> + Send + Sync + 'static,
    {
        self.hooks.after_all = Some(Arc::new(hook));
        self
    }

    /// Hook run before each test body
    pub fn before_each<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(HookContext) -> BoxFuture<'static, E2eResult<()>> + Send + Sync + 'static,
    {
        self.hooks.before_each = Some(Arc::new(hook));
        self
    }

    /// Hook run after each test body
    pub fn after_each<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(HookContext) -> BoxFuture<'static, E2eResult<()>> + Send + Sync + 'static,
    {
        self.hooks.after_each = Some(Arc::new(hook));
        self
    }

    async fn run_hook(&self, hook: Option<&Hook>) -> E2eResult<()> {
        let Some(hook) = hook else {
            return Ok(());
        };
        let ctx = HookContext {
            devices: self.devices(),
            data: self.test_data()?,
        };
        hook(ctx).await
    }

    /// Run the `before_all` hook, if set
    pub async fn run_before_all(&self) -> E2eResult<()> {
        self.run_hook(self.hooks.before_all.as_ref()).await
    }

    /// Run the `after_all` hook, if set
    pub async fn run_after_all(&self) -> E2eResult<()> {
        self.run_hook(self.hooks.after_all.as_ref()).await
    }

    /// Run the `before_each` hook, if set
    pub async fn run_before_each(&self) -> E2eResult<()> {
        self.run_hook(self.hooks.before_each.as_ref()).await
    }

    /// Run the `after_each` hook, if set
    pub async fn run_after_each(&self) -> E2eResult<()> {
        self.run_hook(self.hooks.after_each.as_ref()).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::data_builder::AgentTestDataBuilder;
    use crate::device::Device;
    use crate::driver::MockDriver;
    use crate::step_logger::StepLogger;
    use futures::FutureExt;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn device() -> Arc<dyn DeviceOps> {
        Arc::new(Device::new(
            Arc::new(MockDriver::new()),
            Arc::new(StepLogger::disabled()),
        ))
    }

    #[derive(Debug)]
    struct Counting(Arc<AtomicUsize>);

    impl DataBuilder for Counting {
        fn name(&self) -> &str {
            "Counting"
        }

        fn generate(&self) -> E2eResult<TestData> {
            let n = self.0.fetch_add(1, Ordering::SeqCst);
            Ok(TestData::new().with("n", n))
        }
    }

    mod data_tests {
        use super::*;

        #[test]
        fn test_data_from_builder() {
            let setup = E2eSetup::builder()
                .data_builder(AgentTestDataBuilder::new())
                .build();
            let data = setup.test_data().unwrap();
            assert_eq!(data.get_str("userEmail"), Some("agent@anilathomes.com"));
        }

        #[test]
        fn test_data_is_cached() {
            let calls = Arc::new(AtomicUsize::new(0));
            let setup = E2eSetup::builder()
                .data_builder(Counting(calls.clone()))
                .build();
            setup.test_data().unwrap();
            setup.test_data().unwrap();
            assert_eq!(calls.load(Ordering::SeqCst), 1);
        }

        #[test]
        fn test_no_builder_is_empty() {
            assert!(E2eSetup::default().test_data().unwrap().is_empty());
        }

        #[test]
        fn test_set_data_builder_discards_cache() {
            let mut setup = E2eSetup::default();
            assert!(setup.test_data().unwrap().is_empty());
            setup.set_data_builder(AgentTestDataBuilder::new());
            assert_eq!(setup.test_data().unwrap().len(), 2);
        }
    }

    mod device_tests {
        use super::*;

        #[test]
        fn test_named_devices() {
            let mut setup = E2eSetup::builder().device("device", device()).build();
            assert!(setup.device("device").is_ok());
            let err = setup.device("tablet").unwrap_err();
            assert!(matches!(err, E2eError::UnknownDevice { ref name } if name == "tablet"));

            setup.add_device("tablet", device());
            assert_eq!(setup.devices().len(), 2);
            setup.remove_device("device");
            assert_eq!(setup.debug().devices, vec!["tablet".to_string()]);
        }

        #[test]
        fn test_environment_default_and_override() {
            let mut setup = E2eSetup::default();
            assert_eq!(setup.environment(), "test");
            setup.set_environment("staging");
            assert_eq!(setup.environment(), "staging");
            let built = E2eSetup::builder().environment("ci").build();
            assert_eq!(built.environment(), "ci");
        }

        #[test]
        fn test_reset_and_debug() {
            let mut setup = E2eSetup::builder()
                .data_builder(AgentTestDataBuilder::new())
                .device("device", device())
                .setting("baseUrl", "http://localhost:3000")
                .build();
            let summary = setup.debug();
            assert!(summary.has_data_builder);
            assert!(summary.initialized);
            assert_eq!(summary.config["baseUrl"], "http://localhost:3000");

            setup.reset();
            let summary = setup.debug();
            assert!(!summary.has_data_builder);
            assert!(!summary.initialized);
            assert!(summary.devices.is_empty());
            assert!(setup.test_data().unwrap().is_empty());
        }

        #[test]
        fn test_update_config_merges() {
            let mut setup = E2eSetup::builder().setting("a", 1).build();
            let mut extra = BTreeMap::new();
            extra.insert("b".to_string(), serde_json::json!(2));
            setup.update_config(extra);
            assert_eq!(setup.debug().config.len(), 2);
        }

        #[test]
        fn test_summary_serializes() {
            let json = serde_json::to_value(E2eSetup::default().debug()).unwrap();
            assert_eq!(json["environment"], "test");
        }
    }

    mod hook_tests {
        use super::*;

        #[tokio::test]
        async fn test_hooks_receive_devices_and_data() {
            let seen = Arc::new(AtomicUsize::new(0));
            let counter = seen.clone();
            let mut setup = E2eSetup::builder()
                .data_builder(AgentTestDataBuilder::new())
                .device("device", device())
                .build();
            setup.before_each(move |ctx| {
                let counter = counter.clone();
                async move {
                    assert!(ctx.devices.contains_key("device"));
                    assert!(ctx.data.get_str("userEmail").is_some());
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
                .boxed()
            });

            setup.run_before_each().await.unwrap();
            setup.run_before_each().await.unwrap();
            assert_eq!(seen.load(Ordering::SeqCst), 2);
        }

        #[tokio::test]
        async fn test_unset_hooks_are_noops() {
            let setup = E2eSetup::default();
            setup.run_before_all().await.unwrap();
            setup.run_after_all().await.unwrap();
            setup.run_after_each().await.unwrap();
        }

        #[tokio::test]
        async fn test_hook_error_propagates() {
            let mut setup = E2eSetup::default();
            setup.after_all(|_| async { Err(E2eError::page("teardown failed")) }.boxed());
            assert!(setup.run_after_all().await.is_err());
        }
    }
}
