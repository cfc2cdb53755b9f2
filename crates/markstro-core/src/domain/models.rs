use serde::{Deserialize, Serialize};

use crate::{Symbol, TradingDay, ValidationError};

/// Where a quote's numbers came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteOrigin {
    /// Parsed from a provider response.
    Live,
    /// Fabricated by demo mode; never cached, never a real price.
    Synthetic,
}

/// Snapshot of an instrument's latest session, in provider-native units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub symbol: Symbol,
    pub price: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub volume: u64,
    pub change: f64,
    pub change_percent: f64,
    pub previous_close: f64,
    pub latest_trading_day: Option<TradingDay>,
    pub origin: QuoteOrigin,
}

impl Quote {
    pub const fn is_live(&self) -> bool {
        matches!(self.origin, QuoteOrigin::Live)
    }
}

/// Builder-style constructor input for [`Quote`].
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteFields {
    pub price: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub volume: u64,
    pub change: f64,
    pub change_percent: f64,
    pub previous_close: f64,
    pub latest_trading_day: Option<TradingDay>,
}

impl Quote {
    pub fn new(
        symbol: Symbol,
        fields: QuoteFields,
        origin: QuoteOrigin,
    ) -> Result<Self, ValidationError> {
        validate_non_negative("price", fields.price)?;
        validate_non_negative("open", fields.open)?;
        validate_non_negative("high", fields.high)?;
        validate_non_negative("low", fields.low)?;
        validate_non_negative("previous_close", fields.previous_close)?;
        validate_finite("change", fields.change)?;
        validate_finite("change_percent", fields.change_percent)?;

        Ok(Self {
            symbol,
            price: fields.price,
            open: fields.open,
            high: fields.high,
            low: fields.low,
            volume: fields.volume,
            change: fields.change,
            change_percent: fields.change_percent,
            previous_close: fields.previous_close,
            latest_trading_day: fields.latest_trading_day,
            origin,
        })
    }
}

/// One daily OHLCV observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: TradingDay,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl DailyBar {
    pub fn new(
        date: TradingDay,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: u64,
    ) -> Result<Self, ValidationError> {
        validate_non_negative("open", open)?;
        validate_non_negative("high", high)?;
        validate_non_negative("low", low)?;
        validate_non_negative("close", close)?;

        Ok(Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        })
    }
}

/// Daily history for one symbol, ordered oldest to newest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub symbol: Symbol,
    pub bars: Vec<DailyBar>,
}

impl TimeSeries {
    /// Keeps the `days` most recent bars and orders them oldest-first,
    /// regardless of the order the provider listed them in.
    pub fn from_unordered(symbol: Symbol, mut bars: Vec<DailyBar>, days: usize) -> Self {
        bars.sort_by(|left, right| right.date.cmp(&left.date));
        bars.truncate(days);
        bars.reverse();
        Self { symbol, bars }
    }

    pub fn first(&self) -> Option<&DailyBar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&DailyBar> {
        self.bars.last()
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

/// One symbol-search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolMatch {
    pub symbol: String,
    pub name: String,
    #[serde(rename = "type")]
    pub match_type: String,
    pub region: String,
    pub currency: Option<String>,
}

fn validate_finite(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    Ok(())
}

fn validate_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    validate_finite(field, value)?;
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}
