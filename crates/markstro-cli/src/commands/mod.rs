mod quote;
mod search;
mod series;

use markstro_core::{Quote, QuoteClient, QuoteError, Symbol, SymbolMatch, TimeSeries};

use crate::cli::{Cli, Command};
use crate::error::CliError;

/// Result of one command, ready for rendering.
#[derive(Debug)]
pub enum CommandOutput {
    Quotes {
        quotes: Vec<Quote>,
        failures: Vec<QuoteFailure>,
    },
    Series(TimeSeries),
    Search {
        query: String,
        matches: Vec<SymbolMatch>,
    },
}

/// A symbol whose quote could not be produced in a multi-symbol request.
#[derive(Debug)]
pub struct QuoteFailure {
    pub symbol: Symbol,
    pub error: QuoteError,
}

impl CommandOutput {
    /// The failure that decides the exit code of a partly successful run.
    pub fn first_failure(&self) -> Option<&QuoteFailure> {
        match self {
            Self::Quotes { failures, .. } => failures.first(),
            Self::Series(_) | Self::Search { .. } => None,
        }
    }
}

pub async fn run(cli: &Cli, client: &QuoteClient) -> Result<CommandOutput, CliError> {
    match &cli.command {
        Command::Quote(args) => quote::run(args, client).await,
        Command::Series(args) => series::run(args, client).await,
        Command::Search(args) => search::run(args, client).await,
    }
}
