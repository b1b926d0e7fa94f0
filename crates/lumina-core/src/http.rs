//! Shared HTTP client for external APIs.

use std::time::Duration;

use crate::error::Result;

/// Builds the client used for every external call.
///
/// The timeout bounds each request end to end; a timed-out call surfaces as
/// [`crate::CoreError::Http`] and is treated as a soft failure by callers.
pub fn build_client(timeout: Duration, user_agent: &str) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()?;
    Ok(client)
}
