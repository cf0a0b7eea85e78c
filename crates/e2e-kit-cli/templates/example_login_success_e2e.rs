//! Example: successful login.
//!
//! Shows the test environment setup with a data builder, navigation that
//! waits for the network to go idle, form filling, and content checks.

mod databuilders;

use databuilders::AgentTestDataBuilder;
use e2e_kit::prelude::*;
use std::sync::Arc;

#[tokio::test]
async fn login_success() -> E2eResult<()> {
    let ctx = RunContext::process()?;
    let chrome = Arc::new(ChromeDevice::launch(&ctx).await?);
    let setup = E2eSetup::builder()
        .data_builder(AgentTestDataBuilder::new())
        .device("device", chrome.clone())
        .build();

    let mut file = TestFile::new(&ctx, file!()).with_screenshot_device(chrome.base().clone());
    file.test("User can login successfully with valid credentials", move || async move {
        let device = setup.device("device")?;
        let data = setup.test_data()?;

        device
            .navigate_with(
                "https://anilathomes.com/login",
                NavigateOptions {
                    wait_until: Some(WaitUntil::NetworkIdle0),
                    ..NavigateOptions::default()
                },
            )
            .await?;

        device.type_text("email-input", data.require_str("userEmail")?).await?;
        device.type_text("password-input", data.require_str("userPassword")?).await?;
        device.click("submit-button").await?;

        device.wait(3000).await?;

        device.expect("body").to_contain("Agent Dashboard").await?;
        device.expect("body").not().to_contain("Login Failed").await?;
        Ok(())
    })?;

    let result = file.run().await;
    chrome.close().await?;
    result
}
