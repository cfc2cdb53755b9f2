mod cli;
mod commands;
mod error;
mod output;
mod telemetry;

use clap::Parser;
use std::io::{self, Write};
use std::process::ExitCode;

use markstro_core::{ClientConfig, QuoteClient};

use crate::cli::Cli;
use crate::error::{quote_exit_code, CliError};
use crate::output::DisplayCurrency;

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is normal.
    let _ = dotenvy::dotenv();
    telemetry::init();

    match run().await {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(error.exit_code())
        }
    }
}

async fn run() -> Result<ExitCode, CliError> {
    let cli = Cli::parse();

    let display = match (&cli.display_currency, cli.fx_rate) {
        (Some(code), Some(rate)) => Some(DisplayCurrency::new(code, rate)?),
        _ => None,
    };

    let mut config = ClientConfig::from_env()?;
    cli.apply_overrides(&mut config)?;
    tracing::debug!(?config, "client configuration");

    let client = QuoteClient::from_config(&config)?;
    let result = commands::run(&cli, &client).await?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    output::render(&mut out, &result, cli.format, cli.pretty, display.as_ref())?;
    out.flush()?;

    if let Some(failure) = result.first_failure() {
        return Ok(ExitCode::from(quote_exit_code(&failure.error)));
    }

    Ok(ExitCode::SUCCESS)
}
