//! External quote provider abstraction.
//!
//! A [`QuoteProvider`] performs the network call and hands back the decoded
//! JSON document untouched. Interpreting sentinels and payloads is the job of
//! [`payload`], driven by `QuoteClient`, so that every provider shares one set
//! of error semantics.

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

use crate::{QuoteError, Symbol};

mod alphavantage;
pub mod payload;

pub use alphavantage::AlphaVantageProvider;

/// Provider query functions used by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderFunction {
    GlobalQuote,
    TimeSeriesDaily,
    SymbolSearch,
}

impl ProviderFunction {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GlobalQuote => "GLOBAL_QUOTE",
            Self::TimeSeriesDaily => "TIME_SERIES_DAILY",
            Self::SymbolSearch => "SYMBOL_SEARCH",
        }
    }
}

impl Display for ProviderFunction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Boxed future returned by provider calls.
pub type ProviderFuture<'a> = Pin<Box<dyn Future<Output = Result<Value, QuoteError>> + Send + 'a>>;

/// Source of raw provider documents.
///
/// Implementations report transport problems as
/// [`QuoteError::NetworkFailure`] and undecodable bodies as
/// [`QuoteError::MalformedResponse`]. They must not retry.
pub trait QuoteProvider: Send + Sync {
    /// Latest-session quote document for `symbol`.
    fn global_quote<'a>(&'a self, symbol: &'a Symbol) -> ProviderFuture<'a>;

    /// Day-indexed price history document for `symbol`.
    fn daily_series<'a>(&'a self, symbol: &'a Symbol) -> ProviderFuture<'a>;

    /// Symbol search document for free-text `keywords`.
    fn symbol_search<'a>(&'a self, keywords: &'a str) -> ProviderFuture<'a>;
}
