use std::fmt::{Display, Formatter};
use std::time::Duration;

use thiserror::Error;

use crate::domain::Symbol;
use crate::http_client::HttpError;

/// Validation errors for user input and provider field shapes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol must start with an ASCII letter or '^': '{ch}'")]
    SymbolInvalidStart { ch: char },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("search query cannot be empty")]
    EmptyQuery,

    #[error("trading day must be YYYY-MM-DD: '{value}'")]
    InvalidTradingDay { value: String },

    #[error("field '{field}' is missing")]
    MissingField { field: &'static str },
    #[error("field '{field}' is not a number: '{value}'")]
    NotANumber { field: &'static str, value: String },
    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },
}

/// Coarse classification of [`QuoteError`], used for exit codes and messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuoteErrorKind {
    RateLimitExceeded,
    InvalidSymbol,
    ProviderThrottled,
    NoData,
    NoChartData,
    NetworkFailure,
    MalformedResponse,
    Validation,
}

impl QuoteErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RateLimitExceeded => "rate_limited",
            Self::InvalidSymbol => "invalid_symbol",
            Self::ProviderThrottled => "provider_throttled",
            Self::NoData => "no_data",
            Self::NoChartData => "no_chart_data",
            Self::NetworkFailure => "network_failure",
            Self::MalformedResponse => "malformed_response",
            Self::Validation => "validation",
        }
    }
}

impl Display for QuoteErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed failure surfaced by `QuoteClient`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum QuoteError {
    /// Local sliding-window budget is exhausted.
    #[error("rate limit reached; retry in {}s", wait_seconds(.wait))]
    RateLimitExceeded { wait: Duration },

    #[error("invalid symbol '{symbol}'")]
    InvalidSymbol { symbol: Symbol },

    /// The provider itself answered with a throttle notice.
    #[error("provider throttled the request; retry in {}s", wait_seconds(.retry_after))]
    ProviderThrottled { retry_after: Duration, notice: String },

    #[error("no quote data available for '{symbol}'")]
    NoData { symbol: Symbol },

    #[error("no chart data available for '{symbol}'")]
    NoChartData { symbol: Symbol },

    #[error("network failure: {message}")]
    NetworkFailure { message: String, timed_out: bool },

    #[error("malformed provider response: {message}")]
    MalformedResponse { message: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl QuoteError {
    pub const fn kind(&self) -> QuoteErrorKind {
        match self {
            Self::RateLimitExceeded { .. } => QuoteErrorKind::RateLimitExceeded,
            Self::InvalidSymbol { .. } => QuoteErrorKind::InvalidSymbol,
            Self::ProviderThrottled { .. } => QuoteErrorKind::ProviderThrottled,
            Self::NoData { .. } => QuoteErrorKind::NoData,
            Self::NoChartData { .. } => QuoteErrorKind::NoChartData,
            Self::NetworkFailure { .. } => QuoteErrorKind::NetworkFailure,
            Self::MalformedResponse { .. } => QuoteErrorKind::MalformedResponse,
            Self::Validation(_) => QuoteErrorKind::Validation,
        }
    }

    pub const fn code(&self) -> &'static str {
        match self.kind() {
            QuoteErrorKind::RateLimitExceeded => "quote.rate_limited",
            QuoteErrorKind::InvalidSymbol => "quote.invalid_symbol",
            QuoteErrorKind::ProviderThrottled => "quote.provider_throttled",
            QuoteErrorKind::NoData => "quote.no_data",
            QuoteErrorKind::NoChartData => "quote.no_chart_data",
            QuoteErrorKind::NetworkFailure => "quote.network_failure",
            QuoteErrorKind::MalformedResponse => "quote.malformed_response",
            QuoteErrorKind::Validation => "quote.validation",
        }
    }

    /// Whether repeating the same call can succeed without user correction.
    pub const fn retryable(&self) -> bool {
        matches!(
            self.kind(),
            QuoteErrorKind::RateLimitExceeded
                | QuoteErrorKind::ProviderThrottled
                | QuoteErrorKind::NetworkFailure
        )
    }

    /// Minimum delay before a retry is worth attempting, when one is known.
    pub const fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimitExceeded { wait } => Some(*wait),
            Self::ProviderThrottled { retry_after, .. } => Some(*retry_after),
            _ => None,
        }
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }
}

impl From<HttpError> for QuoteError {
    fn from(error: HttpError) -> Self {
        Self::NetworkFailure {
            message: error.message().to_owned(),
            timed_out: error.timed_out(),
        }
    }
}

/// Whole seconds, rounded up so a countdown never shows zero while still blocked.
pub fn wait_seconds(wait: &Duration) -> u64 {
    let secs = wait.as_secs();
    if wait.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}

/// Configuration loading errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("environment variable {name} is not a valid {expected}: '{value}'")]
    InvalidEnv {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
    #[error("{field} must not be blank")]
    Blank { field: &'static str },
}
