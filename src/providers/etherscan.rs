//! Etherscan wallet balance fetcher.
//!
//! Values a wallet in USD with two sequential calls: the current ETH/USD
//! price, then the address balance in wei. The wei amount is scaled with
//! decimal arithmetic so large balances never round through an `f64`
//! before conversion.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use crate::fetch::http;
use crate::fetch::{normalize_identifier, FetchError, Fetcher, RateLimiter, RetryPolicy};

const SOURCE: &str = "etherscan";
const DEFAULT_BASE_URL: &str = "https://api.etherscan.io/v2/api";

/// ETH uses 18 decimal places: 1 ETH = 10^18 wei.
const WEI_DECIMALS: u32 = 18;

/// Etherscan response for the `ethprice` action.
#[derive(Debug, Deserialize)]
struct EthPriceResponse {
    result: EthPriceResult,
}

#[derive(Debug, Deserialize)]
struct EthPriceResult {
    #[serde(default)]
    ethusd: String,
}

/// Etherscan response for the `balance` action. The balance arrives as a
/// decimal wei string.
#[derive(Debug, Deserialize)]
struct BalanceResponse {
    #[serde(default)]
    result: String,
}

/// Fetches an Ethereum wallet balance valued in USD.
pub struct WalletFetcher {
    api_key: String,
    address: String,
    base_url: String,
    client: reqwest::Client,
    limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
}

impl WalletFetcher {
    pub fn new(
        api_key: impl Into<String>,
        address: impl Into<String>,
        limiter: Arc<RateLimiter>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            address: address.into(),
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

    async fn fetch_eth_price(&self) -> Result<Decimal, FetchError> {
        self.limiter.wait(SOURCE).await;

        debug!(address = %self.address, "fetching ETH/USD price");

        let response: EthPriceResponse = http::get_json(
            &self.client,
            &self.base_url,
            &[
                ("chainid", "1"),
                ("module", "stats"),
                ("action", "ethprice"),
                ("apikey", self.api_key.as_str()),
            ],
            &[],
            &self.retry,
        )
        .await?;

        let raw = response.result.ethusd;
        if raw.is_empty() {
            return Err(FetchError::validation("ETH price not found in response"));
        }

        Decimal::from_str(&raw)
            .map_err(|_| FetchError::validation(format!("failed to parse ETH price: {raw}")))
    }
}

/// Convert a wei balance string to its USD value at the given ETH price.
fn wallet_value(wei: &str, eth_usd: Decimal) -> Result<f64, FetchError> {
    let wei = Decimal::from_str(wei)
        .map_err(|_| FetchError::validation(format!("failed to parse balance: {wei}")))?;

    let eth = wei / Decimal::from(10u64.pow(WEI_DECIMALS));
    (eth * eth_usd)
        .to_f64()
        .ok_or_else(|| FetchError::validation("balance value out of range"))
}

#[async_trait]
impl Fetcher for WalletFetcher {
    async fn fetch(&self) -> Result<f64, FetchError> {
        // The balance is only meaningful priced, so the price comes first.
        let eth_usd = self.fetch_eth_price().await?;

        self.limiter.wait(SOURCE).await;

        debug!(address = %self.address, "fetching wallet balance");

        let response: BalanceResponse = http::get_json(
            &self.client,
            &self.base_url,
            &[
                ("chainid", "1"),
                ("module", "account"),
                ("action", "balance"),
                ("address", self.address.as_str()),
                ("tag", "latest"),
                ("apikey", self.api_key.as_str()),
            ],
            &[],
            &self.retry,
        )
        .await?;

        if response.result.is_empty() {
            return Err(FetchError::validation("balance not found in response"));
        }

        wallet_value(&response.result, eth_usd)
    }

    fn key(&self) -> String {
        format!("{SOURCE}:{}", normalize_identifier(&self.address))
    }
}
