//! Residuals command implementation.

use anyhow::Result;

use super::reset::{print_report, progress_bar};
use super::{confirm, EXIT_PARTIAL_FAILURE};
use crate::cli::ResidualsArgs;
use crate::config::Config;
use crate::platform;
use crate::reset::ResetOrchestrator;

/// Run the residuals command.
pub fn run(args: ResidualsArgs, mut config: Config, quiet: bool) -> Result<()> {
    if let Some(keyword) = args.keyword {
        config.residual.keyword = keyword;
    }
    if config.residual.keyword.trim().is_empty() {
        anyhow::bail!("residual keyword must not be empty");
    }

    let platform = platform::current();
    let mut orchestrator = ResetOrchestrator::new(&config, platform.as_ref());

    let found = orchestrator.residual_scanner().scan();
    if found.is_empty() {
        println!("No files matching '{}' found.", config.residual.keyword);
        return Ok(());
    }

    println!("Found {} path(s) matching '{}':", found.len(), config.residual.keyword);
    for path in found.paths().take(5) {
        println!("  {}", path.display());
    }
    if found.len() > 5 {
        println!("  ... and {} more", found.len() - 5);
    }

    if !args.force && !confirm("\nDelete them?")? {
        println!("Aborted.");
        return Ok(());
    }

    if !quiet {
        orchestrator = orchestrator.with_progress(progress_bar());
    }
    let report = orchestrator.clean_residuals();
    print_report(&report, false)?;

    if !report.success {
        std::process::exit(EXIT_PARTIAL_FAILURE);
    }
    Ok(())
}
