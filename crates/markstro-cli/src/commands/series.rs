use markstro_core::{QuoteClient, Symbol, TimeSeries};

use crate::cli::SeriesArgs;
use crate::error::CliError;

use super::CommandOutput;

pub async fn run(args: &SeriesArgs, client: &QuoteClient) -> Result<CommandOutput, CliError> {
    if args.limit == Some(0) {
        return Err(CliError::Usage(String::from(
            "--limit must be greater than zero",
        )));
    }

    let symbol = Symbol::parse(&args.symbol)?;
    let series = client.fetch_time_series(&symbol).await?;

    Ok(CommandOutput::Series(most_recent(series, args.limit)))
}

/// Keeps the newest `limit` bars, still oldest first.
fn most_recent(mut series: TimeSeries, limit: Option<usize>) -> TimeSeries {
    if let Some(limit) = limit {
        let skip = series.bars.len().saturating_sub(limit);
        series.bars.drain(..skip);
    }
    series
}
