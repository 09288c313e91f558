//! Shared HTTP plumbing for provider fetchers.
//!
//! All outbound calls go through [`get_json`], which wraps the request in
//! the retry policy and maps failures onto the [`FetchError`] taxonomy.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::error::FetchError;
use super::retry::RetryPolicy;

/// Per-request timeout; the orchestration deadline is applied separately.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A client with `Accept: application/json` preset.
pub(crate) fn client() -> Client {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    Client::builder()
        .default_headers(headers)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// GET `url` with the given query parameters and headers, retrying per
/// `policy`, and decode the JSON body into `T`.
///
/// Transport errors and retryable statuses (5xx, 429, 408) are retried up
/// to the policy bound with exponential backoff; every retry is logged.
/// Once attempts are exhausted the last failure is classified and returned
/// unchanged. A body that fails to decode is a validation error.
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &Client,
    url: &str,
    query: &[(&str, &str)],
    headers: &[(&str, &str)],
    policy: &RetryPolicy,
) -> Result<T, FetchError> {
    let mut attempt = 0u32;

    loop {
        let mut request = client.get(url).query(query);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        match request.send().await {
            Err(err) => {
                if RetryPolicy::should_retry(true, None) && attempt < policy.max_retries {
                    let backoff = policy.backoff_for_attempt(attempt);
                    attempt += 1;
                    debug!(url, attempt, error = %err, "retrying request after transport error");
                    tokio::time::sleep(backoff).await;
                    continue;
                }
                return Err(FetchError::from_transport(err));
            }
            Ok(response) => {
                let status = response.status().as_u16();

                if !response.status().is_success() {
                    if RetryPolicy::should_retry(false, Some(status)) && attempt < policy.max_retries
                    {
                        let backoff = policy.backoff_for_attempt(attempt);
                        attempt += 1;
                        debug!(url, attempt, status, "retrying request after status");
                        tokio::time::sleep(backoff).await;
                        continue;
                    }
                    return Err(FetchError::classify_status(status));
                }

                let body = response.text().await.map_err(FetchError::from_transport)?;
                return serde_json::from_str(&body).map_err(|e| {
                    FetchError::validation(format!("failed to decode response body: {e}"))
                });
            }
        }
    }
}
