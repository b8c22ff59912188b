//! Shared HTTP plumbing for the adapter clients.

use std::time::Duration;

use syncline_core::AdapterError;
use url::Url;

/// Default request timeout applied when a client config does not override it.
pub(crate) const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Builds the reqwest client every adapter uses.
///
/// # Panics
///
/// Panics if the HTTP client cannot be created (should not happen in practice).
pub(crate) fn build_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .expect("Failed to create HTTP client")
}

/// Validates a configured base URL and returns it without a trailing slash.
///
/// Clients append their own paths, so a trailing slash would double up.
pub(crate) fn normalize_base_url(base_url: &str, what: &str) -> Result<String, AdapterError> {
    if base_url.trim().is_empty() {
        return Err(AdapterError::invalid_config(format!(
            "{what} base URL must not be empty"
        )));
    }

    let parsed = Url::parse(base_url)
        .map_err(|e| AdapterError::invalid_config(format!("{what} base URL is invalid: {e}")))?;

    if !parsed.has_host() {
        return Err(AdapterError::invalid_config(format!(
            "{what} base URL has no host: {base_url}"
        )));
    }

    Ok(base_url.trim_end_matches('/').to_string())
}

/// Turns a non-success response into a `Status` error carrying the body.
pub(crate) async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, AdapterError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let mut message = response.text().await.unwrap_or_default();
    if message.is_empty() {
        message = status
            .canonical_reason()
            .unwrap_or("unexpected status")
            .to_string();
    }

    Err(AdapterError::status(status.as_u16(), message))
}
