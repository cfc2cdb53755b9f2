//! # Markstro Core
//!
//! Client-side data-freshness and rate-limiting layer for the markstro stock
//! dashboard.
//!
//! ## Overview
//!
//! - **TTL cache** with lazy expiry and LRU bounding
//! - **Sliding-window rate limiter** with atomic admission
//! - **Provider abstraction** over Alpha Vantage, direct or proxied
//! - **Typed errors** so the dashboard can show one message per failure kind
//! - **Opt-in demo mode** that substitutes clearly-marked synthetic quotes
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`cache`] | TTL cache keyed by request |
//! | [`client`] | `QuoteClient` orchestration |
//! | [`config`] | Configuration and environment loading |
//! | [`domain`] | Domain models (Quote, TimeSeries, SymbolMatch) |
//! | [`error`] | Error taxonomy |
//! | [`fallback`] | Synthetic demo data |
//! | [`http_client`] | HTTP transport abstraction |
//! | [`provider`] | Provider trait and Alpha Vantage parsing |
//! | [`rate_limiter`] | Sliding-window admission control |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use markstro_core::{ClientConfig, QuoteClient, Symbol};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::from_env()?;
//!     let client = QuoteClient::from_config(&config)?;
//!
//!     let quote = client.fetch_quote(&Symbol::parse("AAPL")?).await?;
//!     println!("AAPL price: ${:.2}", quote.price);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  CLI / Dashboard│
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │  QuoteClient    │────▶│ CacheStore       │
//! └────────┬────────┘     └──────────────────┘
//!          │              ┌──────────────────┐
//!          ├─────────────▶│ RateLimiter      │
//!          │              └──────────────────┘
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ QuoteProvider   │────▶│ HttpClient       │
//! │ (Alpha Vantage) │     │ (reqwest)        │
//! └─────────────────┘     └──────────────────┘
//! ```

pub mod cache;
pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod fallback;
pub mod http_client;
pub mod provider;
pub mod rate_limiter;

pub use cache::CacheStore;
pub use client::{CachedResponse, QuoteClient, RateStatus, SEARCH_DISPLAY_LIMIT, TIME_SERIES_DAYS};
pub use config::{
    CacheConfig, ClientConfig, FallbackMode, ProviderConfig, ProviderEndpoint, RateLimitConfig,
};
pub use domain::{
    DailyBar, Quote, QuoteFields, QuoteOrigin, Symbol, SymbolMatch, TimeSeries, TradingDay,
};
pub use error::{wait_seconds, ConfigError, QuoteError, QuoteErrorKind, ValidationError};
pub use http_client::{
    HttpAuth, HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient,
};
pub use provider::{AlphaVantageProvider, ProviderFunction, ProviderFuture, QuoteProvider};
pub use rate_limiter::RateLimiter;
