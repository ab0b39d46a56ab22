//! Final outcome of a reset run.

use serde::Serialize;
use std::fmt::{self, Write as _};
use std::path::PathBuf;

use super::engine::DeletionAttempt;

/// Number of remaining paths shown in the human-readable summary.
pub const REMAINING_PREVIEW: usize = 5;

/// Stages of a reset, in the order they are entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetState {
    Idle,
    ProcessesTerminated,
    PathsCollected,
    Deleting,
    Verifying,
    Reported,
}

impl fmt::Display for ResetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResetState::Idle => "idle",
            ResetState::ProcessesTerminated => "processes terminated",
            ResetState::PathsCollected => "paths collected",
            ResetState::Deleting => "deleting",
            ResetState::Verifying => "verifying",
            ResetState::Reported => "reported",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Paths in the deletion batch.
    pub total: usize,
    /// Paths the engine reported as removed.
    pub removed: usize,
    /// Paths still present after verification.
    pub remaining: Vec<PathBuf>,
    /// `removed / total`, 1.0 for an empty batch.
    pub success_ratio: f64,
    pub success: bool,
    /// Last state reached.
    pub final_state: ResetState,
    /// Set when the run was aborted.
    pub error: Option<String>,
    /// Deciding attempt of every path that could not be removed.
    pub failures: Vec<DeletionAttempt>,
}

impl RunReport {
    /// Evaluate a completed run against `threshold`.
    ///
    /// The run succeeds when nothing remains, or when the removed share of the
    /// batch reaches the threshold.
    pub fn evaluate(
        total: usize,
        removed: usize,
        remaining: Vec<PathBuf>,
        failures: Vec<DeletionAttempt>,
        threshold: f64,
    ) -> Self {
        let success_ratio = if total == 0 {
            1.0
        } else {
            removed as f64 / total as f64
        };
        let success = remaining.is_empty() || success_ratio >= threshold;

        Self {
            total,
            removed,
            remaining,
            success_ratio,
            success,
            final_state: ResetState::Reported,
            error: None,
            failures,
        }
    }

    /// Report for a run aborted in `state`.
    pub fn aborted(state: ResetState, error: String) -> Self {
        Self {
            total: 0,
            removed: 0,
            remaining: vec![],
            success_ratio: 0.0,
            success: false,
            final_state: state,
            error: Some(error),
            failures: vec![],
        }
    }

    /// Human-readable summary, listing at most [`REMAINING_PREVIEW`]
    /// remaining paths.
    pub fn summary(&self) -> String {
        let mut out = String::new();

        if let Some(error) = &self.error {
            let _ = writeln!(out, "Reset aborted while {}: {}", self.final_state, error);
            return out;
        }

        let _ = writeln!(
            out,
            "Removed {}/{} paths ({:.1}%)",
            self.removed,
            self.total,
            self.success_ratio * 100.0
        );

        if !self.remaining.is_empty() {
            let _ = writeln!(out, "{} path(s) could not be removed:", self.remaining.len());
            for path in self.remaining.iter().take(REMAINING_PREVIEW) {
                let _ = writeln!(out, "  - {}", path.display());
            }
            if self.remaining.len() > REMAINING_PREVIEW {
                let _ = writeln!(out, "  ... and {} more", self.remaining.len() - REMAINING_PREVIEW);
            }
        }

        let verdict = match (self.success, self.remaining.is_empty()) {
            (true, true) => "Reset complete",
            (true, false) => "Reset mostly complete",
            (false, _) => "Reset failed",
        };
        let _ = writeln!(out, "{}", verdict);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remaining(n: usize) -> Vec<PathBuf> {
        (0..n).map(|i| PathBuf::from(format!("/cfg/Code/{}", i))).collect()
    }

    #[test]
    fn nothing_remaining_is_success_regardless_of_ratio() {
        let report = RunReport::evaluate(10, 2, vec![], vec![], 0.8);
        assert!(report.success);
        assert!((report.success_ratio - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn threshold_is_inclusive() {
        assert!(RunReport::evaluate(10, 8, remaining(2), vec![], 0.8).success);
        assert!(!RunReport::evaluate(10, 7, remaining(3), vec![], 0.8).success);
    }

    #[test]
    fn empty_batch_is_full_success() {
        let report = RunReport::evaluate(0, 0, vec![], vec![], 0.8);
        assert!(report.success);
        assert_eq!(report.success_ratio, 1.0);
    }

    #[test]
    fn aborted_report_is_failure() {
        let report = RunReport::aborted(ResetState::PathsCollected, "no home".into());
        assert!(!report.success);
        assert_eq!(report.final_state, ResetState::PathsCollected);
        assert!(report.summary().contains("paths collected"));
    }

    #[test]
    fn summary_caps_remaining_list() {
        let report = RunReport::evaluate(20, 13, remaining(7), vec![], 0.8);
        let summary = report.summary();

        assert!(summary.contains("7 path(s)"));
        assert!(summary.contains("/cfg/Code/4"));
        assert!(!summary.contains("/cfg/Code/5"));
        assert!(summary.contains("... and 2 more"));
        assert!(summary.contains("Reset failed"));
    }

    #[test]
    fn summary_snapshot() {
        let report = RunReport::evaluate(10, 9, remaining(1), vec![], 0.8);
        insta::assert_snapshot!(report.summary(), @r"
        Removed 9/10 paths (90.0%)
        1 path(s) could not be removed:
          - /cfg/Code/0
        Reset mostly complete
        ");
    }

    #[test]
    fn states_are_ordered() {
        assert!(ResetState::Idle < ResetState::ProcessesTerminated);
        assert!(ResetState::Verifying < ResetState::Reported);
    }
}
