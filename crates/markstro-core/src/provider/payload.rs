//! Alpha Vantage document parsing.
//!
//! The provider signals failures through top-level sentinel fields rather than
//! HTTP status, so every document is screened with [`detect_sentinel`] before
//! its payload is read. Numeric fields arrive as strings.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::{
    DailyBar, Quote, QuoteError, QuoteFields, QuoteOrigin, Symbol, SymbolMatch, TimeSeries,
    TradingDay, ValidationError,
};

const ERROR_FIELD: &str = "Error Message";
const THROTTLE_FIELDS: [&str; 2] = ["Note", "Information"];

/// Top-level provider signal that replaces the normal payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sentinel {
    /// `"Error Message"`: the request named something the provider rejects.
    Error(String),
    /// `"Note"` / `"Information"`: the provider's own call quota was hit.
    Throttle(String),
}

pub fn detect_sentinel(document: &Value) -> Option<Sentinel> {
    let object = document.as_object()?;

    if let Some(message) = object.get(ERROR_FIELD) {
        return Some(Sentinel::Error(text_of(message)));
    }

    THROTTLE_FIELDS
        .iter()
        .find_map(|field| object.get(*field))
        .map(|notice| Sentinel::Throttle(text_of(notice)))
}

fn text_of(value: &Value) -> String {
    value
        .as_str()
        .map_or_else(|| value.to_string(), str::to_owned)
}

#[derive(Debug, Default, Deserialize)]
struct GlobalQuoteEnvelope {
    #[serde(rename = "Global Quote", default)]
    quote: Option<GlobalQuotePayload>,
}

#[derive(Debug, Default, Deserialize)]
struct GlobalQuotePayload {
    #[serde(rename = "01. symbol", default)]
    symbol: Option<String>,
    #[serde(rename = "02. open", default)]
    open: Option<String>,
    #[serde(rename = "03. high", default)]
    high: Option<String>,
    #[serde(rename = "04. low", default)]
    low: Option<String>,
    #[serde(rename = "05. price", default)]
    price: Option<String>,
    #[serde(rename = "06. volume", default)]
    volume: Option<String>,
    #[serde(rename = "07. latest trading day", default)]
    latest_trading_day: Option<String>,
    #[serde(rename = "08. previous close", default)]
    previous_close: Option<String>,
    #[serde(rename = "09. change", default)]
    change: Option<String>,
    #[serde(rename = "10. change percent", default)]
    change_percent: Option<String>,
}

impl GlobalQuotePayload {
    fn is_empty(&self) -> bool {
        [
            &self.symbol,
            &self.open,
            &self.high,
            &self.low,
            &self.price,
            &self.volume,
            &self.latest_trading_day,
            &self.previous_close,
            &self.change,
            &self.change_percent,
        ]
        .iter()
        .all(|field| field.is_none())
    }

    fn into_fields(self) -> Result<QuoteFields, ValidationError> {
        let latest_trading_day = match self.latest_trading_day.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(day) => Some(TradingDay::parse(day)?),
        };

        Ok(QuoteFields {
            price: number("05. price", self.price.as_deref())?,
            open: number("02. open", self.open.as_deref())?,
            high: number("03. high", self.high.as_deref())?,
            low: number("04. low", self.low.as_deref())?,
            volume: count("06. volume", self.volume.as_deref())?,
            change: number("09. change", self.change.as_deref())?,
            change_percent: number("10. change percent", self.change_percent.as_deref())?,
            previous_close: number("08. previous close", self.previous_close.as_deref())?,
            latest_trading_day,
        })
    }
}

/// Parses a `GLOBAL_QUOTE` payload whose sentinels were already screened.
pub fn parse_global_quote(document: Value, symbol: &Symbol) -> Result<Quote, QuoteError> {
    let envelope: GlobalQuoteEnvelope = serde_json::from_value(document)
        .map_err(|e| QuoteError::malformed(format!("unexpected quote shape: {e}")))?;

    let payload = match envelope.quote {
        Some(payload) if !payload.is_empty() => payload,
        _ => {
            return Err(QuoteError::NoData {
                symbol: symbol.clone(),
            })
        }
    };

    let fields = payload
        .into_fields()
        .map_err(|e| QuoteError::malformed(e.to_string()))?;
    Quote::new(symbol.clone(), fields, QuoteOrigin::Live)
        .map_err(|e| QuoteError::malformed(e.to_string()))
}

/// Bars stay untyped until each one is checked on its own.
#[derive(Debug, Default, Deserialize)]
struct DailySeriesEnvelope {
    #[serde(rename = "Time Series (Daily)", default)]
    series: Option<BTreeMap<String, Value>>,
}

#[derive(Debug, Default, Deserialize)]
struct DailyBarPayload {
    #[serde(rename = "1. open", default)]
    open: Option<Value>,
    #[serde(rename = "2. high", default)]
    high: Option<Value>,
    #[serde(rename = "3. low", default)]
    low: Option<Value>,
    #[serde(rename = "4. close", default)]
    close: Option<Value>,
    #[serde(rename = "5. volume", default)]
    volume: Option<Value>,
}

impl DailyBarPayload {
    fn into_bar(self, date: &str) -> Result<DailyBar, ValidationError> {
        DailyBar::new(
            TradingDay::parse(date)?,
            price("1. open", self.open.as_ref())?,
            price("2. high", self.high.as_ref())?,
            price("3. low", self.low.as_ref())?,
            price("4. close", self.close.as_ref())?,
            count("5. volume", scalar(self.volume.as_ref()).as_deref())?,
        )
    }
}

fn daily_bar(date: &str, entry: Value) -> Result<DailyBar, ValidationError> {
    let payload: DailyBarPayload =
        serde_json::from_value(entry).map_err(|_| ValidationError::MissingField { field: "bar" })?;
    payload.into_bar(date)
}

/// Bar prices are required; the provider sends them as strings but plain
/// JSON numbers are accepted too.
fn price(field: &'static str, raw: Option<&Value>) -> Result<f64, ValidationError> {
    let text = scalar(raw)
        .filter(|text| !text.trim().is_empty())
        .ok_or(ValidationError::MissingField { field })?;
    number(field, Some(text.as_str()))
}

fn scalar(raw: Option<&Value>) -> Option<String> {
    match raw? {
        Value::String(text) => Some(text.clone()),
        Value::Number(value) => Some(value.to_string()),
        _ => None,
    }
}

/// Parses a `TIME_SERIES_DAILY` payload, keeping the `days` most recent bars
/// ordered oldest-first. Entries that fail validation are skipped.
pub fn parse_daily_series(
    document: Value,
    symbol: &Symbol,
    days: usize,
) -> Result<TimeSeries, QuoteError> {
    let envelope: DailySeriesEnvelope = serde_json::from_value(document)
        .map_err(|e| QuoteError::malformed(format!("unexpected series shape: {e}")))?;

    let no_chart_data = || QuoteError::NoChartData {
        symbol: symbol.clone(),
    };
    let series = envelope.series.ok_or_else(no_chart_data)?;

    let mut bars = Vec::with_capacity(series.len());
    for (date, entry) in series {
        match daily_bar(&date, entry) {
            Ok(bar) => bars.push(bar),
            Err(error) => {
                tracing::debug!(symbol = %symbol, date = %date, %error, "skipping invalid daily bar");
            }
        }
    }

    if bars.is_empty() {
        return Err(no_chart_data());
    }

    Ok(TimeSeries::from_unordered(symbol.clone(), bars, days))
}

#[derive(Debug, Default, Deserialize)]
struct SearchEnvelope {
    #[serde(rename = "bestMatches", default)]
    best_matches: Vec<SearchMatchPayload>,
}

#[derive(Debug, Deserialize)]
struct SearchMatchPayload {
    #[serde(rename = "1. symbol", default)]
    symbol: String,
    #[serde(rename = "2. name", default)]
    name: String,
    #[serde(rename = "3. type", default)]
    match_type: String,
    #[serde(rename = "4. region", default)]
    region: String,
    #[serde(rename = "8. currency", default)]
    currency: Option<String>,
}

/// Parses a `SYMBOL_SEARCH` payload, preserving provider ranking.
pub fn parse_symbol_search(document: Value) -> Result<Vec<SymbolMatch>, QuoteError> {
    let envelope: SearchEnvelope = serde_json::from_value(document)
        .map_err(|e| QuoteError::malformed(format!("unexpected search shape: {e}")))?;

    Ok(envelope
        .best_matches
        .into_iter()
        .filter(|entry| !entry.symbol.trim().is_empty())
        .map(|entry| SymbolMatch {
            symbol: entry.symbol,
            name: entry.name,
            match_type: entry.match_type,
            region: entry.region,
            currency: entry.currency.filter(|currency| !currency.trim().is_empty()),
        })
        .collect())
}

/// Missing or blank numbers read as zero; anything else must parse.
fn number(field: &'static str, raw: Option<&str>) -> Result<f64, ValidationError> {
    let Some(text) = raw.map(str::trim).filter(|text| !text.is_empty()) else {
        return Ok(0.0);
    };
    let text = text.strip_suffix('%').unwrap_or(text).trim();
    let value = text
        .parse::<f64>()
        .map_err(|_| ValidationError::NotANumber {
            field,
            value: text.to_owned(),
        })?;
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    Ok(value)
}

fn count(field: &'static str, raw: Option<&str>) -> Result<u64, ValidationError> {
    let Some(text) = raw.map(str::trim).filter(|text| !text.is_empty()) else {
        return Ok(0);
    };
    text.parse::<u64>().map_err(|_| ValidationError::NotANumber {
        field,
        value: text.to_owned(),
    })
}
