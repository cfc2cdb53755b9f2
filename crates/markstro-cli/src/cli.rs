//! CLI argument definitions for markstro.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `quote` | Fetch latest quotes for symbols |
//! | `series` | Fetch daily price history |
//! | `search` | Search for symbols by name or ticker |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `table` | Output format (json, table) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--demo` | `false` | Substitute synthetic quotes when the provider fails |
//! | `--proxy-url` | unset | Route calls through a backend proxy |
//! | `--token` | unset | Bearer credential for the proxy |
//! | `--ttl-ms` | `300000` | Cache lifetime in ms |
//! | `--max-calls` | `5` | Provider calls per window |
//! | `--cooldown-ms` | `60000` | Rate-limit window in ms |
//! | `--timeout-ms` | `10000` | Request timeout in ms |
//! | `--display-currency` | unset | Currency code shown in output |
//! | `--fx-rate` | unset | Fixed multiplier applied for display |
//!
//! Flags override `MARKSTRO_*` environment variables, which in turn may come
//! from a `.env` file.
//!
//! # Examples
//!
//! ```bash
//! markstro quote AAPL MSFT
//! markstro quote ^NSEI --display-currency INR --fx-rate 83
//! markstro series IBM --limit 10 --format json --pretty
//! markstro search "tesla motors"
//! ```

use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use markstro_core::{ClientConfig, FallbackMode, ProviderEndpoint};

use crate::error::CliError;

/// markstro - stock dashboard data from the terminal
///
/// Quotes, daily history and symbol search from Alpha Vantage, with a local
/// response cache and the provider's call budget enforced client-side.
#[derive(Debug, Parser)]
#[command(name = "markstro", author, version, about = "Stock dashboard data from the terminal")]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Serve clearly-marked synthetic quotes when the provider cannot answer.
    #[arg(long, global = true, default_value_t = false)]
    pub demo: bool,

    /// Backend proxy base URL; requests go to `<URL>/query`.
    #[arg(long, global = true)]
    pub proxy_url: Option<String>,

    /// Bearer token presented to the proxy.
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Cache lifetime in milliseconds (0 disables caching).
    #[arg(long, global = true)]
    pub ttl_ms: Option<u64>,

    /// Provider calls admitted per window.
    #[arg(long, global = true)]
    pub max_calls: Option<u32>,

    /// Rate-limit window length in milliseconds.
    #[arg(long, global = true)]
    pub cooldown_ms: Option<u64>,

    /// Request timeout in milliseconds.
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Currency code for displayed prices (e.g. INR).
    #[arg(long, global = true, requires = "fx_rate")]
    pub display_currency: Option<String>,

    /// Fixed multiplier from provider currency to the display currency.
    #[arg(long, global = true, requires = "display_currency")]
    pub fx_rate: Option<f64>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned columns for terminal display.
    Table,
    /// Single JSON document.
    Json,
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch the latest quote for one or more symbols.
    ///
    /// # Examples
    ///
    ///   markstro quote AAPL
    ///   markstro quote AAPL MSFT ^BSESN
    Quote(QuoteArgs),

    /// Fetch up to 60 trading days of daily bars, oldest first.
    ///
    /// # Examples
    ///
    ///   markstro series IBM
    ///   markstro series IBM --limit 5
    Series(SeriesArgs),

    /// Search for symbols by ticker or company name.
    ///
    /// # Examples
    ///
    ///   markstro search tesla
    Search(SearchArgs),
}

/// Arguments for the `quote` command.
#[derive(Debug, Args)]
pub struct QuoteArgs {
    /// One or more market symbols (e.g., AAPL, ^NSEI).
    #[arg(required = true, num_args = 1..)]
    pub symbols: Vec<String>,
}

/// Arguments for the `series` command.
#[derive(Debug, Args)]
pub struct SeriesArgs {
    /// Market symbol to fetch history for.
    pub symbol: String,

    /// Show only the most recent N days.
    #[arg(long)]
    pub limit: Option<usize>,
}

/// Arguments for the `search` command.
#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Search keywords; multiple words are joined with spaces.
    #[arg(required = true, num_args = 1..)]
    pub query: Vec<String>,
}

impl Cli {
    /// Applies command-line overrides on top of environment configuration.
    pub fn apply_overrides(&self, config: &mut ClientConfig) -> Result<(), CliError> {
        if let Some(ms) = self.ttl_ms {
            config.cache.ttl = Duration::from_millis(ms);
        }
        if let Some(calls) = self.max_calls {
            config.rate_limit.max_calls = calls;
        }
        if let Some(ms) = self.cooldown_ms {
            config.rate_limit.cooldown = Duration::from_millis(ms);
        }
        if let Some(ms) = self.timeout_ms {
            config.provider.timeout = Duration::from_millis(ms);
        }
        if self.demo {
            config.fallback = FallbackMode::Demo;
        }

        let current_proxy = match &config.provider.endpoint {
            ProviderEndpoint::Proxy { base_url, token } => Some((base_url.clone(), token.clone())),
            ProviderEndpoint::Direct { .. } => None,
        };
        match (&self.proxy_url, &self.token, current_proxy) {
            (Some(url), token, current) => {
                let token = token
                    .clone()
                    .or_else(|| current.map(|(_, token)| token))
                    .unwrap_or_default();
                config.provider.endpoint =
                    ProviderEndpoint::proxy(url.trim().trim_end_matches('/'), token);
            }
            (None, Some(token), Some((base_url, _))) => {
                config.provider.endpoint = ProviderEndpoint::proxy(base_url, token.clone());
            }
            (None, Some(_), None) => {
                return Err(CliError::Usage(String::from(
                    "--token requires --proxy-url or MARKSTRO_PROXY_URL",
                )));
            }
            (None, None, _) => {}
        }

        config.validate()?;
        Ok(())
    }
}
