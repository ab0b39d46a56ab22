//! Paths command implementation.

use anyhow::Result;
use humansize::{format_size, BINARY};

use crate::cli::PathsArgs;
use crate::config::Config;
use crate::platform;
use crate::reset::{PathBatch, PathKind, ResetOrchestrator};

/// Run the paths command.
pub fn run(args: PathsArgs, config: Config) -> Result<()> {
    let platform = platform::current();
    let orchestrator = ResetOrchestrator::new(&config, platform.as_ref());

    let collector = orchestrator.collector()?;
    let mut batch = collector.collect();
    if args.residuals {
        batch.merge(orchestrator.residual_scanner().scan());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&batch)?);
        return Ok(());
    }

    println!("Storage roots:");
    for root in collector.roots() {
        println!("  {}", root.display());
    }

    if batch.is_empty() {
        println!("\nNothing found, the editor looks clean already.");
        return Ok(());
    }

    print_batch(&batch);
    Ok(())
}

fn print_batch(batch: &PathBatch) {
    println!();
    let width = batch.len().to_string().len();
    for (i, target) in batch.iter().enumerate() {
        let marker = match target.kind {
            PathKind::Directory => "d",
            PathKind::File => "f",
        };
        println!("{:>width$}. {} {}", i + 1, marker, target.path.display(), width = width);
    }

    println!(
        "\nTotal: {} paths, {}",
        batch.len(),
        format_size(batch.total_size(), BINARY)
    );
}
