//! Deterministic stand-in data for demo mode.

use crate::{Quote, QuoteError, QuoteOrigin, Symbol, SymbolMatch};

const DEMO_PRICE: f64 = 150.25;
const DEMO_OPEN: f64 = 148.50;
const DEMO_HIGH: f64 = 152.80;
const DEMO_LOW: f64 = 147.20;
const DEMO_PREVIOUS_CLOSE: f64 = 147.75;
const DEMO_VOLUME: u64 = 12_500_000;
const DEMO_CHANGE: f64 = 2.5;
const DEMO_CHANGE_PERCENT: f64 = 1.7;

/// Whether demo mode may replace `error` with synthetic data.
///
/// Local rate limiting is never masked; the caller must see the countdown.
pub const fn is_substitutable(error: &QuoteError) -> bool {
    matches!(
        error,
        QuoteError::InvalidSymbol { .. }
            | QuoteError::ProviderThrottled { .. }
            | QuoteError::NoData { .. }
            | QuoteError::NetworkFailure { .. }
    )
}

/// Fixed quote tagged [`QuoteOrigin::Synthetic`].
pub fn synthetic_quote(symbol: &Symbol) -> Quote {
    Quote {
        symbol: symbol.clone(),
        price: DEMO_PRICE,
        open: DEMO_OPEN,
        high: DEMO_HIGH,
        low: DEMO_LOW,
        volume: DEMO_VOLUME,
        change: DEMO_CHANGE,
        change_percent: DEMO_CHANGE_PERCENT,
        previous_close: DEMO_PREVIOUS_CLOSE,
        latest_trading_day: None,
        origin: QuoteOrigin::Synthetic,
    }
}

pub fn synthetic_match(query: &str) -> SymbolMatch {
    let symbol = query.trim().to_ascii_uppercase();
    SymbolMatch {
        name: format!("{symbol} Inc."),
        symbol,
        match_type: String::from("Equity"),
        region: String::from("United States"),
        currency: Some(String::from("USD")),
    }
}
