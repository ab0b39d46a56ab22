//! Sequencing of a full reset.

use indicatif::ProgressBar;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::thread;

use super::collector::{default_roots, PathCollector};
use super::engine::{DeletionAttempt, DeletionEngine, EngineOptions};
use super::report::{ResetState, RunReport};
use super::residual::{default_search_roots, ResidualScanner};
use super::target::PathBatch;
use super::terminator::ProcessTerminator;
use crate::config::Config;
use crate::error::Result;
use crate::platform::Platform;

/// Number of batch entries listed before deletion starts.
const PREVIEW_LEN: usize = 10;

/// Drives a reset through its stages:
/// `Idle → ProcessesTerminated → PathsCollected → Deleting → Verifying → Reported`.
///
/// Errors and panics inside any stage are turned into a failed [`RunReport`]
/// instead of propagating.
pub struct ResetOrchestrator<'a> {
    config: &'a Config,
    platform: &'a dyn Platform,
    state: ResetState,
    progress: Option<ProgressBar>,
}

impl<'a> ResetOrchestrator<'a> {
    pub fn new(config: &'a Config, platform: &'a dyn Platform) -> Self {
        Self {
            config,
            platform,
            state: ResetState::Idle,
            progress: None,
        }
    }

    /// Mirror deletion progress on `bar`.
    pub fn with_progress(mut self, bar: ProgressBar) -> Self {
        self.progress = Some(bar);
        self
    }

    pub fn state(&self) -> ResetState {
        self.state
    }

    /// Collector over the configured roots, or the platform defaults.
    pub fn collector(&self) -> Result<PathCollector> {
        let roots = if self.config.target.roots.is_empty() {
            default_roots()?
        } else {
            self.config.target.roots.clone()
        };
        Ok(PathCollector::new(roots))
    }

    /// Scanner for the configured keyword, or the platform default roots.
    pub fn residual_scanner(&self) -> ResidualScanner {
        let roots = if self.config.residual.search_roots.is_empty() {
            default_search_roots()
        } else {
            self.config.residual.search_roots.clone()
        };
        ResidualScanner::new(roots, &self.config.residual.keyword)
    }

    /// Every existing entry under the primary storage roots, deepest first.
    pub fn collect_paths(&self) -> Result<PathBatch> {
        Ok(self.collector()?.collect())
    }

    /// Terminate processes, delete the target's state and verify the result.
    pub fn run_full_reset(&mut self) -> RunReport {
        self.guarded(Self::reset_stages)
    }

    /// Delete residual matches only, without touching processes.
    pub fn clean_residuals(&mut self) -> RunReport {
        self.guarded(Self::residual_stages)
    }

    fn guarded(&mut self, stages: fn(&mut Self) -> Result<RunReport>) -> RunReport {
        self.state = ResetState::Idle;
        tracing::info!(
            platform = self.platform.name(),
            elevated = self.platform.is_elevated(),
            "Starting"
        );

        match panic::catch_unwind(AssertUnwindSafe(|| stages(self))) {
            Ok(Ok(report)) => report,
            Ok(Err(e)) => {
                tracing::error!(state = %self.state, error = %e, "Reset aborted");
                RunReport::aborted(self.state, e.to_string())
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!(state = %self.state, %message, "Reset crashed");
                RunReport::aborted(self.state, message)
            }
        }
    }

    fn reset_stages(&mut self) -> Result<RunReport> {
        self.terminate_processes();
        self.advance(ResetState::ProcessesTerminated);

        let collector = self.collector()?;
        let scanner = self
            .config
            .residual
            .enabled
            .then(|| self.residual_scanner());

        let batch = Self::gather(&collector, scanner.as_ref());
        self.advance(ResetState::PathsCollected);
        tracing::info!(count = batch.len(), "Found paths to delete");

        let (removed, failures) = self.delete_batch(&batch);

        self.advance(ResetState::Verifying);
        let remaining = Self::gather(&collector, scanner.as_ref());

        Ok(self.finish(batch.len(), removed, remaining, failures))
    }

    fn residual_stages(&mut self) -> Result<RunReport> {
        let scanner = self.residual_scanner();
        let batch = scanner.scan();
        self.advance(ResetState::PathsCollected);

        let (removed, failures) = self.delete_batch(&batch);

        self.advance(ResetState::Verifying);
        let remaining = scanner.scan();

        Ok(self.finish(batch.len(), removed, remaining, failures))
    }

    fn gather(collector: &PathCollector, scanner: Option<&ResidualScanner>) -> PathBatch {
        let mut batch = collector.collect();
        if let Some(scanner) = scanner {
            batch.merge(scanner.scan());
        }
        batch
    }

    fn terminate_processes(&self) {
        let specs = &self.config.target.processes;
        if specs.is_empty() {
            return;
        }

        let run = &self.config.run;
        let terminator = ProcessTerminator::new(self.platform, self.config.deletion.command_timeout());
        for round in 1..=run.kill_rounds {
            tracing::info!(round, rounds = run.kill_rounds, "Terminating processes");
            let summary = terminator.terminate_all(specs);
            tracing::debug!(
                terminated = summary.terminated(),
                failed = summary.failed(),
                "Termination round finished"
            );
            thread::sleep(run.settle());
        }

        tracing::info!("Waiting for processes to release their files");
        thread::sleep(run.final_settle());
    }

    fn delete_batch(&mut self, batch: &PathBatch) -> (usize, Vec<DeletionAttempt>) {
        self.advance(ResetState::Deleting);
        log_preview(batch);

        let platform = self.platform;
        let engine = DeletionEngine::new(platform, EngineOptions::from(&self.config.deletion));
        let total = batch.len();
        let interval = self.config.run.progress_interval.max(1);

        if let Some(bar) = &self.progress {
            bar.set_length(total as u64);
        }

        let mut removed = 0;
        let mut failures = Vec::new();
        for (i, target) in batch.iter().enumerate() {
            let record = engine.remove(&target.path);
            if record.removed {
                removed += 1;
            } else if let Some(last) = record.last() {
                failures.push(last.clone());
            }

            let done = i + 1;
            if done % interval == 0 || done == total {
                let log = || {
                    tracing::info!(
                        done,
                        total,
                        "Progress: {}/{} ({:.1}%)",
                        done,
                        total,
                        done as f64 / total as f64 * 100.0
                    )
                };
                // Keep the console line from tearing through the bar
                match &self.progress {
                    Some(bar) => bar.suspend(log),
                    None => log(),
                }
            }
            if let Some(bar) = &self.progress {
                bar.inc(1);
            }
        }

        if let Some(bar) = &self.progress {
            bar.finish_and_clear();
        }
        (removed, failures)
    }

    fn finish(
        &mut self,
        total: usize,
        removed: usize,
        remaining: PathBatch,
        failures: Vec<DeletionAttempt>,
    ) -> RunReport {
        let remaining: Vec<PathBuf> = remaining.paths().map(Path::to_path_buf).collect();
        let report = RunReport::evaluate(
            total,
            removed,
            remaining,
            failures,
            self.config.run.success_threshold,
        );
        self.advance(ResetState::Reported);

        if report.success {
            tracing::info!(
                removed,
                total,
                remaining = report.remaining.len(),
                "Reset finished ({:.1}% removed)",
                report.success_ratio * 100.0
            );
        } else {
            tracing::warn!(
                removed,
                total,
                remaining = report.remaining.len(),
                "Reset below threshold ({:.1}% removed)",
                report.success_ratio * 100.0
            );
        }
        report
    }

    fn advance(&mut self, next: ResetState) {
        tracing::debug!(from = %self.state, to = %next, "State transition");
        self.state = next;
    }
}

fn log_preview(batch: &PathBatch) {
    for (i, path) in batch.paths().take(PREVIEW_LEN).enumerate() {
        tracing::info!("  {}. {}", i + 1, path.display());
    }
    if batch.len() > PREVIEW_LEN {
        tracing::info!("  ... and {} more", batch.len() - PREVIEW_LEN);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
