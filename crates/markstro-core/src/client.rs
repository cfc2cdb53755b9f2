//! Quote orchestration: cache, then admission, then provider, then cache.
//!
//! Every logical request walks the same states:
//!
//! ```text
//! CHECK_CACHE ──hit──▶ RETURN
//!      │
//!      ▼
//! CHECK_RATE_LIMIT ──deny──▶ RateLimitExceeded { wait }
//!      │
//!      ▼
//! FETCH ─▶ SCREEN SENTINELS ─▶ PARSE ─▶ CACHE_STORE ─▶ RETURN
//! ```
//!
//! Search skips both cache states. Failures after admission may be replaced by
//! synthetic data when [`FallbackMode::Demo`] is configured.

use std::sync::Arc;
use std::time::Duration;

use governor::clock::{Clock, DefaultClock};
use serde_json::Value;

use crate::cache::CacheStore;
use crate::config::{ClientConfig, FallbackMode};
use crate::error::ConfigError;
use crate::fallback;
use crate::provider::payload::{self, Sentinel};
use crate::provider::{AlphaVantageProvider, ProviderFunction, QuoteProvider};
use crate::rate_limiter::RateLimiter;
use crate::{Quote, QuoteError, Symbol, SymbolMatch, TimeSeries, ValidationError};

/// Trading days kept by [`QuoteClient::fetch_time_series`].
pub const TIME_SERIES_DAYS: usize = 60;

/// Search hits a dashboard should display.
pub const SEARCH_DISPLAY_LIMIT: usize = 8;

/// Value stored in the client's response cache.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedResponse {
    Quote(Quote),
    TimeSeries(TimeSeries),
}

/// Snapshot of the admission window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateStatus {
    pub max_calls: u32,
    pub remaining: u32,
    /// Zero while `remaining > 0`.
    pub retry_in: Duration,
}

/// Fetches quotes, daily history and symbol matches from one provider.
pub struct QuoteClient<C: Clock = DefaultClock> {
    provider: Arc<dyn QuoteProvider>,
    cache: CacheStore<CachedResponse, C>,
    limiter: Arc<RateLimiter<C>>,
    fallback: FallbackMode,
    throttle_cooldown: Duration,
}

impl QuoteClient<DefaultClock> {
    /// Build a client that talks to Alpha Vantage as described by `config`.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let provider = Arc::new(AlphaVantageProvider::new(config.provider.clone()));
        Ok(Self::with_clock(provider, config, DefaultClock::default()))
    }
}

impl<C: Clock> QuoteClient<C> {
    /// Build a client around `provider`, with a fresh cache and window driven by `clock`.
    pub fn with_clock(provider: Arc<dyn QuoteProvider>, config: &ClientConfig, clock: C) -> Self {
        Self::with_parts(
            provider,
            CacheStore::with_clock(config.cache, clock.clone()),
            Arc::new(RateLimiter::with_clock(config.rate_limit, clock)),
        )
        .with_fallback(config.fallback)
        .with_throttle_cooldown(config.provider.throttle_cooldown)
    }

    /// Build a client from explicit collaborators.
    ///
    /// Clients sharing one `limiter` share one call budget.
    pub fn with_parts(
        provider: Arc<dyn QuoteProvider>,
        cache: CacheStore<CachedResponse, C>,
        limiter: Arc<RateLimiter<C>>,
    ) -> Self {
        Self {
            provider,
            cache,
            limiter,
            fallback: FallbackMode::default(),
            throttle_cooldown: Duration::from_secs(60),
        }
    }

    #[must_use]
    pub fn with_fallback(mut self, fallback: FallbackMode) -> Self {
        self.fallback = fallback;
        self
    }

    #[must_use]
    pub fn with_throttle_cooldown(mut self, cooldown: Duration) -> Self {
        self.throttle_cooldown = cooldown;
        self
    }

    pub const fn fallback(&self) -> FallbackMode {
        self.fallback
    }

    pub fn cache(&self) -> &CacheStore<CachedResponse, C> {
        &self.cache
    }

    pub fn rate_limiter(&self) -> &RateLimiter<C> {
        &self.limiter
    }

    /// Latest quote for `symbol`, served from cache while fresh.
    pub async fn fetch_quote(&self, symbol: &Symbol) -> Result<Quote, QuoteError> {
        let key = quote_key(symbol);
        if let Some(CachedResponse::Quote(quote)) = self.cache.get(&key).await {
            tracing::debug!(%symbol, "quote cache hit");
            return Ok(quote);
        }
        tracing::debug!(%symbol, "quote cache miss");

        self.admit(ProviderFunction::GlobalQuote)?;

        match self.fetch_live_quote(symbol).await {
            Ok(quote) => {
                self.cache
                    .set(key, CachedResponse::Quote(quote.clone()))
                    .await;
                Ok(quote)
            }
            Err(error) if self.demo_may_replace(&error) => {
                tracing::warn!(%symbol, code = error.code(), %error, "serving synthetic quote");
                Ok(fallback::synthetic_quote(symbol))
            }
            Err(error) => Err(error),
        }
    }

    /// The most recent [`TIME_SERIES_DAYS`] daily bars, oldest first.
    ///
    /// History is never fabricated, so demo mode does not apply here.
    pub async fn fetch_time_series(&self, symbol: &Symbol) -> Result<TimeSeries, QuoteError> {
        let key = time_series_key(symbol);
        if let Some(CachedResponse::TimeSeries(series)) = self.cache.get(&key).await {
            tracing::debug!(%symbol, "time series cache hit");
            return Ok(series);
        }
        tracing::debug!(%symbol, "time series cache miss");

        self.admit(ProviderFunction::TimeSeriesDaily)?;

        let document = self.provider.daily_series(symbol).await?;
        self.screen(&document, |_| QuoteError::InvalidSymbol {
            symbol: symbol.clone(),
        })?;
        let series = payload::parse_daily_series(document, symbol, TIME_SERIES_DAYS)?;

        self.cache
            .set(key, CachedResponse::TimeSeries(series.clone()))
            .await;
        Ok(series)
    }

    /// Provider-ranked matches for free-text `query`. Never cached.
    ///
    /// Callers display at most [`SEARCH_DISPLAY_LIMIT`] of them.
    pub async fn search_symbols(&self, query: &str) -> Result<Vec<SymbolMatch>, QuoteError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ValidationError::EmptyQuery.into());
        }

        self.admit(ProviderFunction::SymbolSearch)?;

        match self.fetch_live_matches(query).await {
            Ok(matches) => Ok(matches),
            Err(error) if self.demo_may_replace(&error) => {
                tracing::warn!(query, code = error.code(), %error, "serving synthetic search match");
                Ok(vec![fallback::synthetic_match(query)])
            }
            Err(error) => Err(error),
        }
    }

    /// Drops every cached response.
    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }

    /// Drops cached responses for one symbol. Returns whether any existed.
    pub async fn invalidate(&self, symbol: &Symbol) -> bool {
        let quote = self.cache.remove(&quote_key(symbol)).await;
        let series = self.cache.remove(&time_series_key(symbol)).await;
        quote || series
    }

    pub fn rate_status(&self) -> RateStatus {
        let remaining = self.limiter.remaining();
        let retry_in = if remaining > 0 {
            Duration::ZERO
        } else {
            self.limiter.wait_time()
        };
        RateStatus {
            max_calls: self.limiter.config().max_calls,
            remaining,
            retry_in,
        }
    }

    async fn fetch_live_quote(&self, symbol: &Symbol) -> Result<Quote, QuoteError> {
        let document = self.provider.global_quote(symbol).await?;
        self.screen(&document, |_| QuoteError::InvalidSymbol {
            symbol: symbol.clone(),
        })?;
        payload::parse_global_quote(document, symbol)
    }

    async fn fetch_live_matches(&self, query: &str) -> Result<Vec<SymbolMatch>, QuoteError> {
        let document = self.provider.symbol_search(query).await?;
        self.screen(&document, |message| {
            QuoteError::malformed(format!("provider rejected search: {message}"))
        })?;
        payload::parse_symbol_search(document)
    }

    fn admit(&self, function: ProviderFunction) -> Result<(), QuoteError> {
        self.limiter.try_admit().map_err(|wait| {
            tracing::warn!(
                %function,
                wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
                "local rate limit reached"
            );
            QuoteError::RateLimitExceeded { wait }
        })
    }

    /// Maps provider sentinels to errors before any payload is read.
    fn screen<F>(&self, document: &Value, on_error: F) -> Result<(), QuoteError>
    where
        F: FnOnce(String) -> QuoteError,
    {
        match payload::detect_sentinel(document) {
            None => Ok(()),
            Some(Sentinel::Error(message)) => {
                tracing::warn!(%message, "provider returned an error message");
                Err(on_error(message))
            }
            Some(Sentinel::Throttle(notice)) => {
                tracing::warn!(%notice, "provider throttle notice");
                Err(QuoteError::ProviderThrottled {
                    retry_after: self.throttle_cooldown,
                    notice,
                })
            }
        }
    }

    fn demo_may_replace(&self, error: &QuoteError) -> bool {
        self.fallback == FallbackMode::Demo && fallback::is_substitutable(error)
    }
}

fn quote_key(symbol: &Symbol) -> String {
    format!("quote_{symbol}")
}

fn time_series_key(symbol: &Symbol) -> String {
    format!("timeseries_{symbol}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderFuture;
    use governor::clock::FakeRelativeClock;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticProvider {
        document: Value,
        calls: AtomicUsize,
    }

    impl StaticProvider {
        fn new(document: Value) -> Arc<Self> {
            Arc::new(Self {
                document,
                calls: AtomicUsize::new(0),
            })
        }

        fn respond(&self) -> ProviderFuture<'_> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let document = self.document.clone();
            Box::pin(async move { Ok(document) })
        }
    }

    impl QuoteProvider for StaticProvider {
        fn global_quote<'a>(&'a self, _symbol: &'a Symbol) -> ProviderFuture<'a> {
            self.respond()
        }

        fn daily_series<'a>(&'a self, _symbol: &'a Symbol) -> ProviderFuture<'a> {
            self.respond()
        }

        fn symbol_search<'a>(&'a self, _keywords: &'a str) -> ProviderFuture<'a> {
            self.respond()
        }
    }

    fn client(provider: Arc<StaticProvider>, fallback: FallbackMode) -> QuoteClient<FakeRelativeClock> {
        let config = ClientConfig {
            fallback,
            ..ClientConfig::default()
        };
        QuoteClient::with_clock(provider, &config, FakeRelativeClock::default())
    }

    fn aapl() -> Symbol {
        Symbol::parse("AAPL").expect("valid symbol")
    }

    #[tokio::test]
    async fn second_quote_is_served_from_cache() {
        let provider = StaticProvider::new(json!({ "Global Quote": { "05. price": "150.00" } }));
        let client = client(Arc::clone(&provider), FallbackMode::Disabled);

        let first = client.fetch_quote(&aapl()).await.expect("live quote");
        let second = client.fetch_quote(&aapl()).await.expect("cached quote");

        assert_eq!(first, second);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert_eq!(client.rate_status().remaining, 4);
    }

    #[tokio::test]
    async fn throttle_notice_uses_configured_cooldown() {
        let provider = StaticProvider::new(json!({ "Note": "Thank you for using Alpha Vantage!" }));
        let client = client(provider, FallbackMode::Disabled)
            .with_throttle_cooldown(Duration::from_secs(90));

        let err = client.fetch_quote(&aapl()).await.expect_err("must fail");

        assert_eq!(err.retry_after(), Some(Duration::from_secs(90)));
        assert!(client.cache().is_empty().await);
    }

    #[tokio::test]
    async fn demo_mode_substitutes_without_caching() {
        let provider = StaticProvider::new(json!({ "Global Quote": {} }));
        let client = client(Arc::clone(&provider), FallbackMode::Demo);

        let quote = client.fetch_quote(&aapl()).await.expect("synthetic quote");

        assert!(!quote.is_live());
        assert!(client.cache().is_empty().await);

        client.fetch_quote(&aapl()).await.expect("synthetic quote");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn empty_search_consumes_no_budget() {
        let provider = StaticProvider::new(json!({ "bestMatches": [] }));
        let client = client(Arc::clone(&provider), FallbackMode::Disabled);

        let err = client.search_symbols("   ").await.expect_err("must fail");

        assert_eq!(err, QuoteError::Validation(ValidationError::EmptyQuery));
        assert_eq!(client.rate_status().remaining, 5);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn invalidate_drops_both_keys_for_symbol() {
        let provider = StaticProvider::new(json!({ "Global Quote": { "05. price": "1.00" } }));
        let client = client(provider, FallbackMode::Disabled);
        client.fetch_quote(&aapl()).await.expect("live quote");

        assert!(client.invalidate(&aapl()).await);
        assert!(!client.invalidate(&aapl()).await);
    }
}
