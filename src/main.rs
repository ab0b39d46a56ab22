use anyhow::Result;
use clap::{CommandFactory, Parser};
use std::path::Path;

use code_reset::cli::{Cli, Command};
use code_reset::commands;
use code_reset::config::Config;
use code_reset::logging;

/// Exit code for an invalid configuration file.
const EXIT_BAD_CONFIG: i32 = 2;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let load = || setup(cli.config.as_deref(), cli.log_file.as_deref(), cli.verbose, cli.quiet);

    // Dispatch to subcommand
    match cli.command {
        Command::Reset(args) => {
            let config = load();
            tracing::info!(?args, "Starting reset");
            commands::reset::run(args, config, cli.quiet)?;
        }
        Command::Paths(args) => {
            let config = load();
            tracing::info!(?args, "Listing paths");
            commands::paths::run(args, config)?;
        }
        Command::Residuals(args) => {
            let config = load();
            tracing::info!(?args, "Cleaning residuals");
            commands::residuals::run(args, config, cli.quiet)?;
        }
        Command::Completions(args) => {
            let mut cmd = Cli::command();
            clap_complete::generate(args.shell, &mut cmd, "code-reset", &mut std::io::stdout());
        }
        Command::Man => {
            clap_mangen::Man::new(Cli::command()).render(&mut std::io::stdout())?;
        }
    }

    Ok(())
}

/// Load configuration and start logging.
fn setup(config_path: Option<&Path>, log_file: Option<&Path>, verbosity: u8, quiet: bool) -> Config {
    let config = match Config::load(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(EXIT_BAD_CONFIG);
        }
    };

    let log_file = log_file.unwrap_or(config.log_file.as_path());
    logging::init(verbosity, quiet, Some(log_file));

    tracing::debug!(?config, "Loaded configuration");
    config
}
