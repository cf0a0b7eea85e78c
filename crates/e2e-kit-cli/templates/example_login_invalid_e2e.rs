//! Example: login with bad credentials.
//!
//! Uses hard-coded data for the error case and checks that the page does
//! not redirect away from the login form.

mod databuilders;

use databuilders::AgentTestDataBuilder;
use e2e_kit::prelude::*;
use std::sync::Arc;

#[tokio::test]
async fn login_invalid() -> E2eResult<()> {
    let ctx = RunContext::process()?;
    let chrome = Arc::new(ChromeDevice::launch(&ctx).await?);
    let setup = E2eSetup::builder()
        .data_builder(AgentTestDataBuilder::new())
        .device("device", chrome.clone())
        .build();

    let mut file = TestFile::new(&ctx, file!()).with_screenshot_device(chrome.base().clone());
    file.test("Login should fail with invalid credentials", move || async move {
        let device = setup.device("device")?;

        device.navigate("https://anilathomes.com/login").await?;

        device.type_text("email-input", "invalid@example.com").await?;
        device.type_text("password-input", "wrongpassword").await?;
        device.click("submit-button").await?;

        device.wait(2000).await?;

        let url = device.url().await?;
        if url.contains("/login") {
            Ok(())
        } else {
            Err(E2eError::AssertionFailed {
                selector: "page".to_string(),
                assertion: "url".to_string(),
                expected: "/login".to_string(),
                actual: Some(url),
            })
        }
    })?;

    let result = file.run().await;
    chrome.close().await?;
    result
}
