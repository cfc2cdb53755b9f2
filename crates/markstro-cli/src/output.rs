//! Rendering of command results.
//!
//! Prices are converted with a fixed multiplier when a display currency is
//! configured. Conversion happens here only; cached values stay in provider
//! units.

use std::io::Write;

use markstro_core::{DailyBar, Quote, QuoteOrigin, SymbolMatch, TimeSeries};
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::commands::{CommandOutput, QuoteFailure};
use crate::error::{user_message, CliError};

/// Presentation-only currency conversion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayCurrency {
    pub code: String,
    pub rate: f64,
}

impl DisplayCurrency {
    pub fn new(code: &str, rate: f64) -> Result<Self, CliError> {
        let code = code.trim().to_ascii_uppercase();
        if code.is_empty() {
            return Err(CliError::Usage(String::from(
                "--display-currency must not be empty",
            )));
        }
        if !rate.is_finite() || rate <= 0.0 {
            return Err(CliError::Usage(format!(
                "--fx-rate must be a positive number, got {rate}"
            )));
        }
        Ok(Self { code, rate })
    }

    fn quote(&self, quote: &Quote) -> Quote {
        Quote {
            price: quote.price * self.rate,
            open: quote.open * self.rate,
            high: quote.high * self.rate,
            low: quote.low * self.rate,
            change: quote.change * self.rate,
            previous_close: quote.previous_close * self.rate,
            ..quote.clone()
        }
    }

    fn bar(&self, bar: &DailyBar) -> DailyBar {
        DailyBar {
            open: bar.open * self.rate,
            high: bar.high * self.rate,
            low: bar.low * self.rate,
            close: bar.close * self.rate,
            ..bar.clone()
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QuotesDocument<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    display_currency: Option<&'a DisplayCurrency>,
    quotes: Vec<Quote>,
    errors: Vec<ErrorDocument>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorDocument {
    symbol: String,
    code: &'static str,
    message: String,
    retryable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry_after_secs: Option<u64>,
}

impl From<&QuoteFailure> for ErrorDocument {
    fn from(failure: &QuoteFailure) -> Self {
        Self {
            symbol: failure.symbol.to_string(),
            code: failure.error.code(),
            message: user_message(&failure.error),
            retryable: failure.error.retryable(),
            retry_after_secs: failure
                .error
                .retry_after()
                .map(|wait| markstro_core::wait_seconds(&wait)),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SeriesDocument<'a> {
    symbol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    display_currency: Option<&'a DisplayCurrency>,
    bars: Vec<DailyBar>,
}

#[derive(Debug, Serialize)]
struct SearchDocument<'a> {
    query: &'a str,
    matches: &'a [SymbolMatch],
}

pub fn render<W: Write>(
    out: &mut W,
    output: &CommandOutput,
    format: OutputFormat,
    pretty: bool,
    display: Option<&DisplayCurrency>,
) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => {
            let document = to_json(output, display)?;
            let payload = if pretty {
                serde_json::to_string_pretty(&document)?
            } else {
                serde_json::to_string(&document)?
            };
            writeln!(out, "{payload}")?;
        }
        OutputFormat::Table => render_table(out, output, display)?,
    }

    Ok(())
}

fn to_json(
    output: &CommandOutput,
    display: Option<&DisplayCurrency>,
) -> Result<serde_json::Value, CliError> {
    let value = match output {
        CommandOutput::Quotes { quotes, failures } => serde_json::to_value(QuotesDocument {
            display_currency: display,
            quotes: quotes.iter().map(|quote| convert_quote(quote, display)).collect(),
            errors: failures.iter().map(ErrorDocument::from).collect(),
        })?,
        CommandOutput::Series(series) => serde_json::to_value(SeriesDocument {
            symbol: series.symbol.to_string(),
            display_currency: display,
            bars: convert_bars(series, display),
        })?,
        CommandOutput::Search { query, matches } => {
            serde_json::to_value(SearchDocument { query, matches })?
        }
    };
    Ok(value)
}

fn convert_quote(quote: &Quote, display: Option<&DisplayCurrency>) -> Quote {
    display.map_or_else(|| quote.clone(), |currency| currency.quote(quote))
}

fn convert_bars(series: &TimeSeries, display: Option<&DisplayCurrency>) -> Vec<DailyBar> {
    series
        .bars
        .iter()
        .map(|bar| display.map_or_else(|| bar.clone(), |currency| currency.bar(bar)))
        .collect()
}

fn currency_label(display: Option<&DisplayCurrency>) -> String {
    display.map_or_else(String::new, |currency| format!(" ({})", currency.code))
}

fn render_table<W: Write>(
    out: &mut W,
    output: &CommandOutput,
    display: Option<&DisplayCurrency>,
) -> Result<(), CliError> {
    match output {
        CommandOutput::Quotes { quotes, failures } => {
            writeln!(
                out,
                "{:<12} {:>14} {:>10} {:>9} {:>12}  {:<10} {}",
                "SYMBOL",
                format!("PRICE{}", currency_label(display)),
                "CHANGE",
                "CHANGE%",
                "VOLUME",
                "DAY",
                "ORIGIN"
            )?;
            for quote in quotes {
                let shown = convert_quote(quote, display);
                let day = shown
                    .latest_trading_day
                    .map_or_else(|| String::from("-"), |day| day.to_string());
                let origin = match shown.origin {
                    QuoteOrigin::Live => "live",
                    QuoteOrigin::Synthetic => "SYNTHETIC",
                };
                writeln!(
                    out,
                    "{:<12} {:>14.2} {:>+10.2} {:>+8.2}% {:>12}  {:<10} {}",
                    shown.symbol.as_str(),
                    shown.price,
                    shown.change,
                    shown.change_percent,
                    shown.volume,
                    day,
                    origin
                )?;
            }

            if !failures.is_empty() {
                writeln!(out, "errors:")?;
                for failure in failures {
                    writeln!(
                        out,
                        "  - {}: {}",
                        failure.symbol,
                        user_message(&failure.error)
                    )?;
                }
            }
        }
        CommandOutput::Series(series) => {
            let span = match (series.first(), series.last()) {
                (Some(first), Some(last)) => format!(", {} to {}", first.date, last.date),
                _ => String::new(),
            };
            writeln!(
                out,
                "{} daily bars{}{}",
                series.symbol,
                span,
                currency_label(display)
            )?;
            writeln!(
                out,
                "{:<10} {:>12} {:>12} {:>12} {:>12} {:>12}",
                "DATE", "OPEN", "HIGH", "LOW", "CLOSE", "VOLUME"
            )?;
            for bar in convert_bars(series, display) {
                writeln!(
                    out,
                    "{:<10} {:>12.2} {:>12.2} {:>12.2} {:>12.2} {:>12}",
                    bar.date.to_string(),
                    bar.open,
                    bar.high,
                    bar.low,
                    bar.close,
                    bar.volume
                )?;
            }
        }
        CommandOutput::Search { query, matches } => {
            if matches.is_empty() {
                writeln!(out, "no matches for '{query}'")?;
                return Ok(());
            }
            writeln!(
                out,
                "{:<12} {:<40} {:<12} {:<20} {}",
                "SYMBOL", "NAME", "TYPE", "REGION", "CURRENCY"
            )?;
            for hit in matches.iter() {
                writeln!(
                    out,
                    "{:<12} {:<40} {:<12} {:<20} {}",
                    hit.symbol,
                    hit.name,
                    hit.match_type,
                    hit.region,
                    hit.currency.as_deref().unwrap_or("-")
                )?;
            }
        }
    }

    Ok(())
}
