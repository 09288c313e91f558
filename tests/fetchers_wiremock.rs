use std::sync::Arc;

use anyhow::Result;
use finfetch::fetch::{FetchError, Fetcher, Orchestrator, RateLimiter};
use finfetch::providers::{PropertyParams, QuoteFetcher, ValuationFetcher, WalletFetcher};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_etherscan(server: &MockServer) {
    Mock::given(method("GET"))
        .and(query_param("action", "ethprice"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{
                "status": "1",
                "message": "OK",
                "result": { "ethusd": "2500.00" }
            }"#,
            "application/json",
        ))
        .mount(server)
        .await;

    // 10 ETH in wei.
    Mock::given(method("GET"))
        .and(query_param("action", "balance"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{
                "status": "1",
                "message": "OK",
                "result": "10000000000000000000"
            }"#,
            "application/json",
        ))
        .mount(server)
        .await;
}

async fn mount_quote(server: &MockServer, symbol: &str, price: &str) {
    let body = format!(
        r#"{{
            "Global Quote": {{
                "01. symbol": "{symbol}",
                "05. price": "{price}"
            }}
        }}"#
    );

    Mock::given(method("GET"))
        .and(query_param("function", "GLOBAL_QUOTE"))
        .and(query_param("symbol", symbol))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/json"))
        .mount(server)
        .await;
}

async fn mount_valuation(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/avm/value"))
        .and(header("X-Api-Key", "test_rentcast_key"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{
                "price": 250000.00,
                "priceRangeLow": 230000.00,
                "priceRangeHigh": 270000.00,
                "subjectProperty": {
                    "formattedAddress": "5500 Grand Lake Dr, San Antonio, TX 78244",
                    "bedrooms": 3,
                    "bathrooms": 2.0,
                    "squareFootage": 1878
                },
                "comparables": []
            }"#,
            "application/json",
        ))
        .mount(server)
        .await;
}

fn property_params() -> PropertyParams {
    PropertyParams {
        address: "5500 Grand Lake Dr, San Antonio, TX 78244".to_string(),
        property_type: "Single Family".to_string(),
        bedrooms: 3,
        bathrooms: 2.0,
        square_footage: 1878,
    }
}

#[tokio::test]
async fn all_fetchers_produce_one_outcome_each() -> Result<()> {
    let etherscan = MockServer::start().await;
    let alphavantage = MockServer::start().await;
    let rentcast = MockServer::start().await;

    mount_etherscan(&etherscan).await;
    mount_quote(&alphavantage, "AAPL", "178.23").await;
    mount_quote(&alphavantage, "GOOGL", "142.56").await;
    mount_valuation(&rentcast).await;

    let limiter = Arc::new(RateLimiter::unlimited());
    let fetchers: Vec<Arc<dyn Fetcher>> = vec![
        Arc::new(
            WalletFetcher::new(
                "test_etherscan_key",
                "0x742d35Cc6634C0532925a3b844Bc9e7595f0bEb",
                Arc::clone(&limiter),
            )
            .with_base_url(etherscan.uri()),
        ),
        Arc::new(
            QuoteFetcher::new("test_av_key", "AAPL", Arc::clone(&limiter))
                .with_base_url(alphavantage.uri()),
        ),
        Arc::new(
            QuoteFetcher::new("test_av_key", "GOOGL", Arc::clone(&limiter))
                .with_base_url(alphavantage.uri()),
        ),
        Arc::new(
            ValuationFetcher::new("test_rentcast_key", property_params(), Arc::clone(&limiter))
                .with_base_url(rentcast.uri()),
        ),
    ];

    let orchestrator = Orchestrator::new(fetchers);
    let outcomes = orchestrator.run(None).await?;

    assert_eq!(outcomes.len(), 4);

    let value_of = |key: &str| -> f64 {
        let outcome = outcomes
            .iter()
            .find(|o| o.key == key)
            .unwrap_or_else(|| panic!("missing outcome for {key}"));
        *outcome
            .result
            .as_ref()
            .unwrap_or_else(|e| panic!("{key} failed: {e}"))
    };

    // 10 ETH at $2500.
    assert_eq!(
        value_of("etherscan:0x742d35Cc6634C0532925a3b844Bc9e7595f0bEb"),
        25000.0
    );
    assert_eq!(value_of("alphavantage:AAPL"), 178.23);
    assert_eq!(value_of("alphavantage:GOOGL"), 142.56);
    assert_eq!(
        value_of("rentcast:5500_grand_lake_dr_san_antonio_tx_78244"),
        250000.0
    );

    Ok(())
}

#[tokio::test]
async fn failing_fetcher_does_not_abort_siblings() -> Result<()> {
    let alphavantage = MockServer::start().await;
    let rentcast = MockServer::start().await;

    mount_quote(&alphavantage, "AAPL", "178.23").await;

    // Rentcast only ever answers with a server error.
    Mock::given(method("GET"))
        .and(path("/avm/value"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&rentcast)
        .await;

    let limiter = Arc::new(RateLimiter::unlimited());
    let no_retry = finfetch::fetch::RetryPolicy::no_retry();

    let fetchers: Vec<Arc<dyn Fetcher>> = vec![
        Arc::new(
            QuoteFetcher::new("test_av_key", "AAPL", Arc::clone(&limiter))
                .with_base_url(alphavantage.uri()),
        ),
        Arc::new(
            ValuationFetcher::new("test_rentcast_key", property_params(), Arc::clone(&limiter))
                .with_base_url(rentcast.uri())
                .with_retry_policy(no_retry),
        ),
    ];

    let outcomes = Orchestrator::new(fetchers).run(None).await?;
    assert_eq!(outcomes.len(), 2);

    let quote = outcomes
        .iter()
        .find(|o| o.key == "alphavantage:AAPL")
        .unwrap();
    assert_eq!(*quote.result.as_ref().unwrap(), 178.23);

    let valuation = outcomes
        .iter()
        .find(|o| o.key.starts_with("rentcast:"))
        .unwrap();
    assert!(matches!(
        valuation.result.as_ref().unwrap_err(),
        FetchError::Server { status: 500 }
    ));

    Ok(())
}

#[tokio::test]
async fn wallet_fails_when_price_call_fails() -> Result<()> {
    let etherscan = MockServer::start().await;

    // Only the balance action is mocked; the price call 404s, so the whole
    // unit must fail without a partial value.
    Mock::given(method("GET"))
        .and(query_param("action", "balance"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"status": "1", "message": "OK", "result": "10000000000000000000"}"#,
            "application/json",
        ))
        .mount(&etherscan)
        .await;

    let limiter = Arc::new(RateLimiter::unlimited());
    let fetcher = WalletFetcher::new("key", "0xabc", Arc::clone(&limiter))
        .with_base_url(etherscan.uri())
        .with_retry_policy(finfetch::fetch::RetryPolicy::no_retry());

    let err = fetcher.fetch().await.unwrap_err();
    assert!(matches!(err, FetchError::Client { status: 404, .. }));

    // The balance endpoint was never consulted.
    let requests = etherscan.received_requests().await.unwrap_or_default();
    assert!(requests
        .iter()
        .all(|r| r.url.query().unwrap_or_default().contains("ethprice")));

    Ok(())
}

#[tokio::test]
async fn zero_valuation_is_an_error_not_a_value() -> Result<()> {
    let rentcast = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/avm/value"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"price": 0, "priceRangeLow": 0, "priceRangeHigh": 0}"#,
            "application/json",
        ))
        .mount(&rentcast)
        .await;

    let limiter = Arc::new(RateLimiter::unlimited());
    let fetcher = ValuationFetcher::new("test_rentcast_key", property_params(), limiter)
        .with_base_url(rentcast.uri());

    let err = fetcher.fetch().await.unwrap_err();
    assert!(matches!(err, FetchError::Validation { .. }));
    assert!(fetcher.last_response().is_none());

    Ok(())
}

#[tokio::test]
async fn valuation_retains_full_response_for_introspection() -> Result<()> {
    let rentcast = MockServer::start().await;
    mount_valuation(&rentcast).await;

    let limiter = Arc::new(RateLimiter::unlimited());
    let fetcher = ValuationFetcher::new("test_rentcast_key", property_params(), limiter)
        .with_base_url(rentcast.uri());

    let value = fetcher.fetch().await?;
    assert_eq!(value, 250000.0);

    let full = fetcher.last_response().expect("full response retained");
    assert_eq!(full.price_range_low, 230000.0);
    assert_eq!(full.price_range_high, 270000.0);
    assert!(full.subject_property.is_some());

    Ok(())
}

#[tokio::test]
async fn quote_rate_limit_note_surfaces_as_validation() -> Result<()> {
    let alphavantage = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"Note": "Thank you for using Alpha Vantage! Our standard API rate limit is 25 requests per day."}"#,
            "application/json",
        ))
        .mount(&alphavantage)
        .await;

    let limiter = Arc::new(RateLimiter::unlimited());
    let fetcher =
        QuoteFetcher::new("test_av_key", "AAPL", limiter).with_base_url(alphavantage.uri());

    let err = fetcher.fetch().await.unwrap_err();
    assert!(matches!(err, FetchError::Validation { .. }));
    assert!(err.to_string().contains("rate limit"));

    Ok(())
}
