//! # Domain Models
//!
//! Canonical types produced by `QuoteClient` and consumed by the dashboard.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Symbol`] | Validated ticker, including `^` index tickers |
//! | [`Quote`] | Latest-session snapshot, tagged live or synthetic |
//! | [`TimeSeries`] | Daily bars ordered oldest to newest |
//! | [`SymbolMatch`] | Symbol search hit |
//! | [`TradingDay`] | `YYYY-MM-DD` session date |
//!
//! Values are stored in provider-native units. Currency conversion for display
//! is a presentation concern and never touches these types.

mod models;
mod symbol;
mod trading_day;

pub use models::{DailyBar, Quote, QuoteFields, QuoteOrigin, SymbolMatch, TimeSeries};
pub use symbol::Symbol;
pub use trading_day::TradingDay;
