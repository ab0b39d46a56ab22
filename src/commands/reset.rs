//! Reset command implementation.

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};

use super::{confirm, EXIT_PARTIAL_FAILURE};
use crate::cli::ResetArgs;
use crate::config::Config;
use crate::platform;
use crate::reset::{ResetOrchestrator, RunReport};

/// Run the reset command.
pub fn run(args: ResetArgs, mut config: Config, quiet: bool) -> Result<()> {
    if args.no_residuals {
        config.residual.enabled = false;
    }

    if !args.force {
        println!("Warning: this terminates the editor and deletes all of its settings,");
        println!("extensions, caches and logs.");
        if config.residual.enabled {
            println!(
                "Files matching '{}' outside the editor's folders are deleted too.",
                config.residual.keyword
            );
        }
        if !confirm("\nProceed with reset?")? {
            println!("Aborted.");
            return Ok(());
        }
    }

    let platform = platform::current();
    let mut orchestrator = ResetOrchestrator::new(&config, platform.as_ref());
    if !quiet && !args.json {
        orchestrator = orchestrator.with_progress(progress_bar());
    }

    let report = orchestrator.run_full_reset();
    print_report(&report, args.json)?;

    if !report.success {
        std::process::exit(EXIT_PARTIAL_FAILURE);
    }
    Ok(())
}

pub(crate) fn progress_bar() -> ProgressBar {
    let bar = ProgressBar::new(0);
    if let Ok(style) =
        ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} ({percent}%) {elapsed}")
    {
        bar.set_style(style.progress_chars("=> "));
    }
    bar
}

pub(crate) fn print_report(report: &RunReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print!("\n{}", report.summary());
    }
    Ok(())
}
