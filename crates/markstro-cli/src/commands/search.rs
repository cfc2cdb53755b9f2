use markstro_core::{QuoteClient, SEARCH_DISPLAY_LIMIT};

use crate::cli::SearchArgs;
use crate::error::CliError;

use super::CommandOutput;

pub async fn run(args: &SearchArgs, client: &QuoteClient) -> Result<CommandOutput, CliError> {
    let query = args.query.join(" ");
    let mut matches = client.search_symbols(&query).await?;
    matches.truncate(SEARCH_DISPLAY_LIMIT);

    Ok(CommandOutput::Search {
        query: query.trim().to_owned(),
        matches,
    })
}
