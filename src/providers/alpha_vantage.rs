//! AlphaVantage stock quote fetcher.
//!
//! Uses the GLOBAL_QUOTE endpoint. AlphaVantage reports rate limiting and
//! other soft failures inside a 200 body ("Note"/"Information"/"Error
//! Message" keys), so a response without a quote is inspected for those
//! before being reported as missing data.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::fetch::http;
use crate::fetch::{normalize_identifier, FetchError, Fetcher, RateLimiter, RetryPolicy};

const SOURCE: &str = "alphavantage";
const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co/query";

/// GLOBAL_QUOTE response. Only the price binds; the soft-failure keys are
/// carried so notices can be surfaced instead of a bare "missing price".
#[derive(Debug, Deserialize)]
struct GlobalQuoteResponse {
    #[serde(rename = "Global Quote")]
    global_quote: Option<GlobalQuote>,

    #[serde(rename = "Note")]
    note: Option<String>,

    #[serde(rename = "Information")]
    information: Option<String>,

    #[serde(rename = "Error Message")]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GlobalQuote {
    #[serde(rename = "05. price")]
    price: Option<String>,
}

/// Fetches the current price for a stock symbol.
pub struct QuoteFetcher {
    api_key: String,
    symbol: String,
    base_url: String,
    client: reqwest::Client,
    limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
}

impl QuoteFetcher {
    pub fn new(
        api_key: impl Into<String>,
        symbol: impl Into<String>,
        limiter: Arc<RateLimiter>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            symbol: symbol.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            client: http::client(),
            limiter,
            retry: RetryPolicy::default(),
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

    /// Extract the price from a decoded response.
    ///
    /// A missing quote with a textual notice (rate limit note, invalid-key
    /// message, premium upsell) surfaces the notice; a quote without a
    /// parseable price is equally a validation failure.
    fn parse_price(&self, response: &GlobalQuoteResponse) -> Result<f64, FetchError> {
        let price = response
            .global_quote
            .as_ref()
            .and_then(|quote| quote.price.as_deref())
            .filter(|price| !price.is_empty());

        let Some(price) = price else {
            if let Some(message) = response
                .error_message
                .as_deref()
                .or(response.note.as_deref())
                .or(response.information.as_deref())
            {
                return Err(FetchError::validation(format!(
                    "provider notice for {}: {message}",
                    self.symbol
                )));
            }
            return Err(FetchError::validation(format!(
                "price not found in response for {}",
                self.symbol
            )));
        };

        price.parse::<f64>().map_err(|_| {
            FetchError::validation(format!("failed to parse stock price: {price}"))
        })
    }
}

#[async_trait]
impl Fetcher for QuoteFetcher {
    async fn fetch(&self) -> Result<f64, FetchError> {
        self.limiter.wait(SOURCE).await;

        debug!(symbol = %self.symbol, "fetching stock quote");

        let response: GlobalQuoteResponse = http::get_json(
            &self.client,
            &self.base_url,
            &[
                ("function", "GLOBAL_QUOTE"),
                ("symbol", self.symbol.as_str()),
                ("apikey", self.api_key.as_str()),
            ],
            &[],
            &self.retry,
        )
        .await?;

        self.parse_price(&response)
    }

    fn key(&self) -> String {
        format!("{SOURCE}:{}", normalize_identifier(&self.symbol))
    }
}
