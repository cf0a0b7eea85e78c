//! Example: form validation with the fluent expect API.
//!
//! Covers existence and visibility checks, value checks and the `not()`
//! modifier.

mod databuilders;

use databuilders::AgentTestDataBuilder;
use e2e_kit::prelude::*;
use std::sync::Arc;

#[tokio::test]
async fn form_validation() -> E2eResult<()> {
    let ctx = RunContext::process()?;
    let chrome = Arc::new(ChromeDevice::launch(&ctx).await?);
    let setup = E2eSetup::builder()
        .data_builder(AgentTestDataBuilder::new())
        .device("device", chrome.clone())
        .build();

    let mut file = TestFile::new(&ctx, file!()).with_screenshot_device(chrome.base().clone());
    file.test("Form validation using fluent expect API", move || async move {
        let device = setup.device("device")?;
        let data = setup.test_data()?;
        let email = data.require_str("userEmail")?;

        device.navigate("https://anilathomes.com/login").await?;

        device.expect("email-input").to_exist().await?;
        device.expect("password-input").to_be_visible().await?;
        device.expect("submit-button").to_exist().await?;

        device.expect(".success-message").not().to_exist().await?;
        device.expect(".error-banner").not().to_be_visible().await?;

        device.type_text("email-input", email).await?;
        device.type_text("password-input", "testpass").await?;

        device.expect("email-input").to_have_value(email).await?;

        device.expect("email-input").not().to_have_value("wrong@email.com").await?;
        device.expect("password-input").not().to_have_value("wrongpass").await?;
        Ok(())
    })?;

    let result = file.run().await;
    chrome.close().await?;
    result
}
