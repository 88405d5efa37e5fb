use std::process::ExitCode;

use clap::Parser;
use tracing::debug;

use taxlator_cli::app;
use taxlator_cli::cli::Cli;
use taxlator_cli::config::AppConfig;
use taxlator_cli::logging;

async fn run_cli(cli: Cli) -> anyhow::Result<()> {
    let config = AppConfig::load(&cli.global)?;
    logging::init_logging(&config.logging, cli.global.log_level.as_deref())?;
    debug!(?config, "effective configuration");

    let output = app::run(&cli, config).await?;
    print!("{output}");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run_cli(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(app::exit_status(&err))
        }
    }
}
