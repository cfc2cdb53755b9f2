use markstro_core::{QuoteClient, Symbol};

use crate::cli::QuoteArgs;
use crate::error::CliError;

use super::{CommandOutput, QuoteFailure};

/// Fetches each symbol in turn. Per-symbol failures are collected; the run
/// fails outright only when no quote was produced.
pub async fn run(args: &QuoteArgs, client: &QuoteClient) -> Result<CommandOutput, CliError> {
    let symbols = args
        .symbols
        .iter()
        .map(|raw| Symbol::parse(raw))
        .collect::<Result<Vec<_>, _>>()?;

    let mut quotes = Vec::with_capacity(symbols.len());
    let mut failures = Vec::new();
    for symbol in symbols {
        match client.fetch_quote(&symbol).await {
            Ok(quote) => quotes.push(quote),
            Err(error) => {
                tracing::debug!(%symbol, code = error.code(), "quote failed");
                failures.push(QuoteFailure { symbol, error });
            }
        }
    }

    if quotes.is_empty() && !failures.is_empty() {
        return Err(failures.swap_remove(0).error.into());
    }

    Ok(CommandOutput::Quotes { quotes, failures })
}
