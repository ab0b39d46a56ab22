//! Removal of an application's on-disk state.
//!
//! This module provides:
//! - Termination of processes holding the target's files
//! - Discovery of the target's storage roots and residual artifacts
//! - Deep-first deletion with retries and forced fallbacks
//! - Orchestration and reporting of a full reset

mod collector;
mod engine;
mod orchestrator;
mod report;
mod residual;
mod target;
mod terminator;

pub use collector::{default_roots, PathCollector};
pub use engine::{AttemptOutcome, DeletionAttempt, DeletionEngine, EngineOptions, RemovalRecord};
pub use orchestrator::ResetOrchestrator;
pub use report::{ResetState, RunReport, REMAINING_PREVIEW};
pub use residual::{default_search_roots, ResidualScanner};
pub use target::{path_exists, PathBatch, PathKind, TargetPath};
pub use terminator::{KillOutcome, ProcessSpec, ProcessTerminator, TerminationSummary};
