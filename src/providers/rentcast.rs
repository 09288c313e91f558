//! Rentcast property valuation fetcher.
//!
//! Queries the automated valuation endpoint for a property described by
//! address and basic attributes. Rentcast cannot distinguish "no estimate"
//! from a zero estimate, so a zero or absent price is always an error
//! rather than a $0 valuation.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::fetch::http;
use crate::fetch::{normalize_identifier, FetchError, Fetcher, RateLimiter, RetryPolicy};

const SOURCE: &str = "rentcast";
const DEFAULT_BASE_URL: &str = "https://api.rentcast.io/v1";

/// Attributes describing the property to value.
#[derive(Debug, Clone)]
pub struct PropertyParams {
    pub address: String,
    pub property_type: String,
    pub bedrooms: u32,
    pub bathrooms: f64,
    pub square_footage: u32,
}

/// Valuation response. Only `price` binds; the range and the nested
/// subject-property/comparables detail are retained for introspection.
#[derive(Debug, Clone, Deserialize)]
pub struct ValuationResponse {
    #[serde(default)]
    pub price: f64,

    #[serde(rename = "priceRangeLow", default)]
    pub price_range_low: f64,

    #[serde(rename = "priceRangeHigh", default)]
    pub price_range_high: f64,

    #[serde(rename = "subjectProperty", default)]
    pub subject_property: Option<serde_json::Value>,

    #[serde(default)]
    pub comparables: Option<serde_json::Value>,
}

/// Fetches a property valuation estimate.
pub struct ValuationFetcher {
    api_key: String,
    params: PropertyParams,
    base_url: String,
    client: reqwest::Client,
    limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
    /// Last successful full response, kept for introspection only.
    last_response: Mutex<Option<ValuationResponse>>,
}

impl ValuationFetcher {
    pub fn new(api_key: impl Into<String>, params: PropertyParams, limiter: Arc<RateLimiter>) -> Self {
        Self {
            api_key: api_key.into(),
            params,
            base_url: DEFAULT_BASE_URL.to_string(),
            client: http::client(),
            limiter,
            retry: RetryPolicy::default(),
            last_response: Mutex::new(None),
        }
    }

    /// Point the fetcher at a different endpoint (used by tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The full response from the most recent successful fetch, if any.
    pub fn last_response(&self) -> Option<ValuationResponse> {
        self.last_response
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or(None)
    }
}

#[async_trait]
impl Fetcher for ValuationFetcher {
    async fn fetch(&self) -> Result<f64, FetchError> {
        self.limiter.wait(SOURCE).await;

        debug!(address = %self.params.address, "fetching property valuation");

        let url = format!("{}/avm/value", self.base_url);
        let bedrooms = self.params.bedrooms.to_string();
        let bathrooms = format!("{:.1}", self.params.bathrooms);
        let square_footage = self.params.square_footage.to_string();

        let response: ValuationResponse = http::get_json(
            &self.client,
            &url,
            &[
                ("address", self.params.address.as_str()),
                ("propertyType", self.params.property_type.as_str()),
                ("bedrooms", bedrooms.as_str()),
                ("bathrooms", bathrooms.as_str()),
                ("squareFootage", square_footage.as_str()),
            ],
            &[("X-Api-Key", self.api_key.as_str())],
            &self.retry,
        )
        .await?;

        // A zero estimate is indistinguishable from a missing one.
        if response.price <= 0.0 {
            return Err(FetchError::validation(format!(
                "price not found in response for {}",
                self.params.address
            )));
        }

        let price = response.price;
        if let Ok(mut guard) = self.last_response.lock() {
            *guard = Some(response);
        }

        Ok(price)
    }

    fn key(&self) -> String {
        format!("{SOURCE}:{}", normalize_identifier(&self.params.address))
    }
}
