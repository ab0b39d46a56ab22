//! Code Reset - Wipe an editor's on-disk state for a fresh start
//!
//! This crate provides functionality for:
//! - Terminating the editor's processes before touching its files
//! - Collecting its configuration, cache and extension directories
//! - Deleting them deepest-first with retries and forced fallbacks
//! - Hunting down residual files of extensions by keyword

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod platform;
pub mod reset;

// Re-export commonly used types
pub use config::Config;
pub use error::{ConfigError, ResetError, Result};
pub use reset::{PathBatch, ResetOrchestrator, RunReport};
