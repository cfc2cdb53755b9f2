//! Behavior-driven tests for QuoteClient
//!
//! These tests verify HOW the client turns provider documents into quotes,
//! series and search results, and how each failure kind reaches the caller.

use governor::clock::FakeRelativeClock;
use markstro_core::{
    AlphaVantageProvider, ClientConfig, FallbackMode, HttpError, HttpResponse, ProviderConfig,
    ProviderEndpoint, QuoteClient, QuoteError, QuoteErrorKind, QuoteOrigin,
};
use markstro_tests::{body, symbol, ScriptedHttpClient};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

// =============================================================================
// Harness
// =============================================================================

fn client_with(
    http: &ScriptedHttpClient,
    config: ClientConfig,
) -> QuoteClient<FakeRelativeClock> {
    let provider = AlphaVantageProvider::with_http_client(Arc::new(http.clone()), config.provider.clone());
    QuoteClient::with_clock(Arc::new(provider), &config, FakeRelativeClock::default())
}

fn client(http: &ScriptedHttpClient) -> QuoteClient<FakeRelativeClock> {
    client_with(http, ClientConfig::default())
}

fn demo_client(http: &ScriptedHttpClient) -> QuoteClient<FakeRelativeClock> {
    client_with(
        http,
        ClientConfig {
            fallback: FallbackMode::Demo,
            ..ClientConfig::default()
        },
    )
}

fn ibm_quote() -> serde_json::Value {
    json!({
        "Global Quote": {
            "01. symbol": "IBM",
            "02. open": "187.9000",
            "03. high": "189.2600",
            "04. low": "185.8500",
            "05. price": "188.4400",
            "06. volume": "4031427",
            "07. latest trading day": "2024-03-08",
            "08. previous close": "187.6600",
            "09. change": "0.7800",
            "10. change percent": "0.4156%"
        }
    })
}

fn daily_series(days: i64) -> (serde_json::Value, time::Date) {
    let start = time::macros::date!(2024 - 01 - 01);
    let mut entries = serde_json::Map::new();
    for offset in 0..days {
        let date = start + time::Duration::days(offset);
        let close = format!("{}.00", 100 + offset);
        entries.insert(
            date.to_string(),
            json!({
                "1. open": close,
                "2. high": close,
                "3. low": close,
                "4. close": close,
                "5. volume": "1000"
            }),
        );
    }
    (json!({ "Time Series (Daily)": entries }), start)
}

// =============================================================================
// Quotes
// =============================================================================

#[tokio::test]
async fn when_provider_returns_global_quote_client_parses_every_field() {
    // Given: A provider answering with a full Global Quote
    let http = ScriptedHttpClient::replying([body(ibm_quote())]);
    let client = client(&http);

    // When: The dashboard fetches the quote
    let quote = client.fetch_quote(&symbol("ibm")).await.expect("live quote");

    // Then: Every field is mapped and the quote is live
    assert_eq!(quote.symbol.as_str(), "IBM");
    assert_eq!(quote.price, 188.44);
    assert_eq!(quote.open, 187.9);
    assert_eq!(quote.high, 189.26);
    assert_eq!(quote.low, 185.85);
    assert_eq!(quote.volume, 4_031_427);
    assert_eq!(quote.change, 0.78);
    assert_eq!(quote.change_percent, 0.4156);
    assert_eq!(quote.origin, QuoteOrigin::Live);

    // And: The request targeted GLOBAL_QUOTE for the normalized symbol
    let requests = http.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].url.contains("function=GLOBAL_QUOTE&symbol=IBM"));
}

#[tokio::test]
async fn when_provider_sends_error_message_quote_fails_as_invalid_symbol_and_is_not_cached() {
    // Given: A provider that rejects ZZZZ twice
    let rejection = json!({ "Error Message": "Invalid API call. Please retry or visit the documentation." });
    let http = ScriptedHttpClient::replying([body(rejection.clone()), body(rejection)]);
    let client = client(&http);

    // When: The dashboard fetches ZZZZ
    let err = client.fetch_quote(&symbol("ZZZZ")).await.expect_err("must fail");

    // Then: The failure is InvalidSymbol and nothing was cached
    assert_eq!(err.kind(), QuoteErrorKind::InvalidSymbol);
    assert!(!err.retryable());
    assert!(client.cache().is_empty().await);

    // And: A retry goes back to the provider
    let _ = client.fetch_quote(&symbol("ZZZZ")).await;
    assert_eq!(http.requests().len(), 2);
}

#[tokio::test]
async fn when_provider_sends_throttle_notice_quote_fails_as_provider_throttled() {
    for field in ["Note", "Information"] {
        // Given: A provider that answers with its own throttle notice
        let mut notice = serde_json::Map::new();
        notice.insert(field.to_owned(), json!("API call frequency exceeded"));
        let http = ScriptedHttpClient::replying([body(serde_json::Value::Object(notice))]);
        let client = client(&http);

        // When: The dashboard fetches a quote
        let err = client.fetch_quote(&symbol("AAPL")).await.expect_err("must fail");

        // Then: The failure is ProviderThrottled with the fixed cooldown
        assert!(
            matches!(err, QuoteError::ProviderThrottled { .. }),
            "{field} should be a throttle notice"
        );
        assert_eq!(err.retry_after(), Some(Duration::from_secs(60)));
    }
}

#[tokio::test]
async fn when_global_quote_is_empty_quote_fails_as_no_data() {
    // Given: A provider that knows the symbol but has nothing to report
    let http = ScriptedHttpClient::replying([body(json!({ "Global Quote": {} }))]);
    let client = client(&http);

    // When / Then
    let err = client.fetch_quote(&symbol("DELISTED")).await.expect_err("must fail");
    assert_eq!(err.code(), "quote.no_data");
}

#[tokio::test]
async fn when_transport_fails_quote_fails_as_network_failure() {
    // Given: A transport that times out
    let http = ScriptedHttpClient::replying([Err(HttpError::timeout("request timeout"))]);
    let client = client(&http);

    // When / Then: The failure is retryable
    let err = client.fetch_quote(&symbol("AAPL")).await.expect_err("must fail");
    assert_eq!(err.kind(), QuoteErrorKind::NetworkFailure);
    assert!(err.retryable());
    assert!(matches!(
        err,
        QuoteError::NetworkFailure {
            timed_out: true,
            ..
        }
    ));
}

#[tokio::test]
async fn when_body_is_not_json_quote_fails_as_malformed_response() {
    // Given: A captive portal answering with HTML
    let http = ScriptedHttpClient::replying([Ok(HttpResponse::ok_json("<html>login</html>"))]);
    let client = client(&http);

    // When / Then
    let err = client.fetch_quote(&symbol("AAPL")).await.expect_err("must fail");
    assert_eq!(err.kind(), QuoteErrorKind::MalformedResponse);
}

// =============================================================================
// Time Series
// =============================================================================

#[tokio::test]
async fn when_provider_returns_ninety_days_series_keeps_sixty_most_recent_oldest_first() {
    // Given: A provider series of 90 daily entries
    let (document, start) = daily_series(90);
    let http = ScriptedHttpClient::replying([body(document)]);
    let client = client(&http);

    // When: The dashboard fetches the time series
    let series = client
        .fetch_time_series(&symbol("AAPL"))
        .await
        .expect("series");

    // Then: Exactly the 60 most recent days remain, oldest first
    assert_eq!(series.len(), 60);
    let first = series.first().expect("first bar");
    let last = series.last().expect("last bar");
    assert_eq!(first.date.into_inner(), start + time::Duration::days(30));
    assert_eq!(last.date.into_inner(), start + time::Duration::days(89));
    assert!(series
        .bars
        .windows(2)
        .all(|pair| pair[0].date < pair[1].date));
    assert_eq!(last.close, 189.0);
}

#[tokio::test]
async fn when_one_daily_bar_is_incomplete_the_rest_of_the_series_survives() {
    // Given: Two days where the later one lacks its close
    let http = ScriptedHttpClient::replying([body(json!({
        "Time Series (Daily)": {
            "2024-01-02": { "1. open": "101.0", "2. high": "102.0", "3. low": "100.0", "4. close": "101.5", "5. volume": "900" },
            "2024-01-03": { "1. open": "101.5", "2. high": "103.0", "3. low": "101.0", "5. volume": "800" }
        }
    }))]);
    let client = client(&http);

    // When: The dashboard fetches the time series
    let series = client
        .fetch_time_series(&symbol("AAPL"))
        .await
        .expect("series");

    // Then: Only the complete bar is kept
    assert_eq!(series.len(), 1);
    assert_eq!(series.bars[0].close, 101.5);
}

#[tokio::test]
async fn when_series_is_missing_fetch_fails_as_no_chart_data() {
    // Given: A response without the daily series key
    let http = ScriptedHttpClient::replying([body(json!({ "Meta Data": { "2. Symbol": "AAPL" } }))]);
    let client = client(&http);

    // When / Then
    let err = client
        .fetch_time_series(&symbol("AAPL"))
        .await
        .expect_err("must fail");
    assert_eq!(err.kind(), QuoteErrorKind::NoChartData);
    assert!(client.cache().is_empty().await);
}

#[tokio::test]
async fn when_series_is_cached_second_fetch_skips_provider() {
    // Given: A client that already fetched a series
    let (document, _) = daily_series(5);
    let http = ScriptedHttpClient::replying([body(document)]);
    let client = client(&http);
    let first = client.fetch_time_series(&symbol("AAPL")).await.expect("series");

    // When: The same series is requested again
    let second = client.fetch_time_series(&symbol("AAPL")).await.expect("cached series");

    // Then: It comes from cache
    assert_eq!(first, second);
    assert_eq!(http.requests().len(), 1);
}

// =============================================================================
// Search
// =============================================================================

#[tokio::test]
async fn when_searching_matches_keep_provider_order_and_are_never_cached() {
    // Given: A provider returning two ranked matches, twice
    let matches = json!({
        "bestMatches": [
            { "1. symbol": "TSLA", "2. name": "Tesla Inc", "3. type": "Equity", "4. region": "United States", "8. currency": "USD" },
            { "1. symbol": "TL0.DEX", "2. name": "Tesla Inc", "3. type": "Equity", "4. region": "XETRA", "8. currency": "EUR" }
        ]
    });
    let http = ScriptedHttpClient::replying([body(matches.clone()), body(matches)]);
    let client = client(&http);

    // When: The same query runs twice
    let first = client.search_symbols("tesla motors").await.expect("matches");
    let second = client.search_symbols("tesla motors").await.expect("matches");

    // Then: Order is preserved and both calls reached the provider
    assert_eq!(first, second);
    assert_eq!(first[0].symbol, "TSLA");
    assert_eq!(first[1].region, "XETRA");
    let requests = http.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].url.contains("keywords=tesla%20motors"));
    assert_eq!(client.rate_status().remaining, 3);
}

#[tokio::test]
async fn when_search_has_no_matches_result_is_empty() {
    let http = ScriptedHttpClient::replying([body(json!({ "bestMatches": [] }))]);
    let client = client(&http);

    let matches = client.search_symbols("qwxz").await.expect("empty result");

    assert!(matches.is_empty());
}

// =============================================================================
// Demo Mode
// =============================================================================

#[tokio::test]
async fn when_demo_mode_is_on_failures_become_marked_synthetic_quotes() {
    // Given: Demo mode and a provider that keeps failing
    let http = ScriptedHttpClient::replying([
        body(json!({ "Error Message": "Invalid API call." })),
        Err(HttpError::new("connection refused")),
    ]);
    let client = demo_client(&http);

    // When: The dashboard fetches quotes
    let rejected = client.fetch_quote(&symbol("ZZZZ")).await.expect("synthetic quote");
    let offline = client.fetch_quote(&symbol("AAPL")).await.expect("synthetic quote");

    // Then: Both are synthetic and nothing was cached
    assert_eq!(rejected.origin, QuoteOrigin::Synthetic);
    assert_eq!(offline.origin, QuoteOrigin::Synthetic);
    assert_eq!(offline.symbol.as_str(), "AAPL");
    assert!(client.cache().is_empty().await);
}

#[tokio::test]
async fn when_demo_mode_is_on_local_rate_limit_is_still_reported() {
    // Given: Demo mode with a single-call budget already spent
    let http = ScriptedHttpClient::replying([body(ibm_quote())]);
    let config = ClientConfig {
        fallback: FallbackMode::Demo,
        rate_limit: markstro_core::RateLimitConfig {
            max_calls: 1,
            cooldown: Duration::from_millis(60_000),
        },
        ..ClientConfig::default()
    };
    let client = client_with(&http, config);
    client.fetch_quote(&symbol("IBM")).await.expect("live quote");

    // When: Another uncached symbol is requested
    let err = client.fetch_quote(&symbol("AAPL")).await.expect_err("must fail");

    // Then: The countdown is surfaced, not masked
    assert!(matches!(err, QuoteError::RateLimitExceeded { .. }));
}

#[tokio::test]
async fn when_demo_mode_is_on_time_series_is_never_fabricated() {
    let http = ScriptedHttpClient::replying([Err(HttpError::new("connection refused"))]);
    let client = demo_client(&http);

    let err = client
        .fetch_time_series(&symbol("AAPL"))
        .await
        .expect_err("must fail");

    assert_eq!(err.kind(), QuoteErrorKind::NetworkFailure);
}

#[tokio::test]
async fn when_demo_mode_is_on_failed_search_returns_one_synthetic_match() {
    let http = ScriptedHttpClient::replying([Err(HttpError::new("connection refused"))]);
    let client = demo_client(&http);

    let matches = client.search_symbols("acme").await.expect("synthetic match");

    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].symbol, "ACME");
    assert_eq!(matches[0].name, "ACME Inc.");
}

// =============================================================================
// Proxy Endpoint
// =============================================================================

#[tokio::test]
async fn when_proxy_is_configured_requests_carry_bearer_token_and_no_api_key() {
    // Given: A client routed through a backend proxy
    let http = ScriptedHttpClient::replying([body(ibm_quote())]);
    let config = ClientConfig {
        provider: ProviderConfig {
            endpoint: ProviderEndpoint::proxy("https://dash.example.test/api", "session-jwt"),
            ..ProviderConfig::default()
        },
        ..ClientConfig::default()
    };
    let client = client_with(&http, config);

    // When: A quote is fetched
    client.fetch_quote(&symbol("IBM")).await.expect("live quote");

    // Then: The proxy saw the bearer credential and no api key
    let request = &http.requests()[0];
    assert!(request.url.starts_with("https://dash.example.test/api/query?"));
    assert!(!request.url.contains("apikey"));
    assert_eq!(
        request.headers.get("authorization").map(String::as_str),
        Some("Bearer session-jwt")
    );
}

#[tokio::test]
async fn when_proxy_answers_429_quote_fails_as_provider_throttled() {
    let http = ScriptedHttpClient::replying([Ok(HttpResponse {
        status: 429,
        body: String::new(),
    })]);
    let client = client(&http);

    let err = client.fetch_quote(&symbol("AAPL")).await.expect_err("must fail");

    assert_eq!(err.kind(), QuoteErrorKind::ProviderThrottled);
}
