use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Code Reset - Wipe an editor's on-disk state for a fresh start
#[derive(Parser, Debug)]
#[command(name = "code-reset")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Append-only log file (overrides the configured one)
    #[arg(long, global = true, value_name = "PATH", env = "CODE_RESET_LOG")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Terminate the editor and delete all of its stored state
    Reset(ResetArgs),

    /// List the paths a reset would delete
    Paths(PathsArgs),

    /// Delete leftover files matching the residual keyword
    Residuals(ResidualsArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),

    /// Print a man page
    Man,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

#[derive(Args, Debug)]
pub struct ResetArgs {
    /// Skip confirmation prompt
    #[arg(short, long)]
    pub force: bool,

    /// Leave residual keyword matches alone
    #[arg(long)]
    pub no_residuals: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct PathsArgs {
    /// Include residual keyword matches
    #[arg(short, long)]
    pub residuals: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ResidualsArgs {
    /// Skip confirmation prompt
    #[arg(short, long)]
    pub force: bool,

    /// Override the configured keyword
    #[arg(short, long, value_name = "WORD")]
    pub keyword: Option<String>,
}
