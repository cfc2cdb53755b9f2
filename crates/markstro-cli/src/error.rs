use markstro_core::{wait_seconds, ConfigError, QuoteError, ValidationError};
use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{}", user_message(.0))]
    Quote(#[from] QuoteError),

    #[error("usage error: {0}")]
    Usage(String),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) | Self::Usage(_) => 2,
            Self::Config(_) => 3,
            Self::Serialization(_) => 4,
            Self::Quote(error) => quote_exit_code(error),
            Self::Io(_) => 10,
        }
    }
}

/// One exit code per failure kind so scripts can react without parsing text.
pub const fn quote_exit_code(error: &QuoteError) -> u8 {
    match error {
        QuoteError::Validation(_) => 2,
        QuoteError::RateLimitExceeded { .. } => 20,
        QuoteError::ProviderThrottled { .. } => 21,
        QuoteError::InvalidSymbol { .. } => 22,
        QuoteError::NoData { .. } => 23,
        QuoteError::NoChartData { .. } => 24,
        QuoteError::NetworkFailure { .. } => 25,
        QuoteError::MalformedResponse { .. } => 26,
    }
}

/// Actionable wording for each failure kind.
pub fn user_message(error: &QuoteError) -> String {
    match error {
        QuoteError::RateLimitExceeded { wait } => {
            format!("rate limit reached, retry in {}s", wait_seconds(wait))
        }
        QuoteError::ProviderThrottled { retry_after, .. } => format!(
            "the data provider is throttling requests, retry in {}s",
            wait_seconds(retry_after)
        ),
        QuoteError::InvalidSymbol { symbol } => {
            format!("symbol '{symbol}' was not recognised, check the ticker and try again")
        }
        QuoteError::NoData { symbol } => format!("no quote data is available for '{symbol}'"),
        QuoteError::NoChartData { symbol } => {
            format!("no chart data is available for '{symbol}'")
        }
        QuoteError::NetworkFailure {
            timed_out: true, ..
        } => String::from("the data provider did not answer in time, retry shortly"),
        QuoteError::NetworkFailure { message, .. } => {
            format!("could not reach the data provider ({message}), check the connection and retry")
        }
        QuoteError::MalformedResponse { message } => {
            format!("the data provider sent an unexpected response: {message}")
        }
        QuoteError::Validation(error) => error.to_string(),
    }
}
