//! The fetcher contract shared by every data source.

use async_trait::async_trait;

use super::error::FetchError;

/// One configured request for a single financial data point.
///
/// Implementations own their credentials, identifier, and HTTP client, and
/// are shared with the orchestrator behind `Arc<dyn Fetcher>`. Cancellation
/// is cooperative: callers drop the `fetch` future (e.g. via a timeout
/// wrapper) and every await point inside it — rate-limit wait, HTTP call —
/// stops promptly.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Retrieve the data point. All failures surface as [`FetchError`];
    /// implementations never panic.
    async fn fetch(&self) -> Result<f64, FetchError>;

    /// Hierarchical key for this data point, `source:identifier`.
    ///
    /// Pure and infallible: the key is stable across calls and independent
    /// of fetch outcome, so failures can still be reported under it.
    fn key(&self) -> String;
}

/// The result of executing one fetcher.
#[derive(Debug)]
pub struct Outcome {
    pub key: String,
    pub result: Result<f64, FetchError>,
}

/// Normalize an identifier for use in a key.
///
/// Identifiers containing spaces or commas (street addresses, mostly) are
/// lowercased with commas stripped and spaces collapsed to underscores so
/// the key stays a single flat token. Anything else passes through
/// unchanged.
pub fn normalize_identifier(raw: &str) -> String {
    if raw.contains(' ') || raw.contains(',') {
        raw.to_lowercase().replace(',', "").replace(' ', "_")
    } else {
        raw.to_string()
    }
}
