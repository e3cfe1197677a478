//! sqlstep - Command-line interface for SQL migrations.

use clap::Parser;
use miette::Diagnostic;

use sqlstep_cli::cli::{Cli, Command};
use sqlstep_cli::commands;
use sqlstep_cli::config::Settings;
use sqlstep_cli::error::{CliError, CliResult};
use sqlstep_cli::{logging, output};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        output::blank();
        output::failure(&e.to_string());
        if let Some(help) = e.help() {
            output::help(&help.to_string());
        }
        std::process::exit(1);
    }
}

async fn run() -> CliResult<()> {
    let cli = Cli::parse();

    if let Command::Version = cli.command {
        return commands::version::run().await;
    }

    let cwd = std::env::current_dir().map_err(CliError::Io)?;
    let settings = Settings::load(&cli.global, &cwd)?;
    logging::init(&settings)?;

    match cli.command {
        Command::Migrate => commands::migrate::run(&settings).await,
        Command::Plan => commands::plan::run(&settings).await,
        Command::Status => commands::status::run(&settings).await,
        Command::Version => commands::version::run().await,
    }
}
