//! Stopping processes that may hold the target's files open.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::platform::{Platform, ProcessTable};

/// A process to terminate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessSpec {
    /// Exact executable name.
    Name(String),
    /// Substring of the full command line.
    Pattern(String),
}

impl fmt::Display for ProcessSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessSpec::Name(name) => write!(f, "{}", name),
            ProcessSpec::Pattern(pattern) => write!(f, "*{}*", pattern),
        }
    }
}

/// Result of terminating one [`ProcessSpec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KillOutcome {
    Terminated,
    NotRunning,
    Failed(String),
}

/// Per-spec outcomes of a termination round.
#[derive(Debug, Default)]
pub struct TerminationSummary {
    pub outcomes: Vec<(ProcessSpec, KillOutcome)>,
}

impl TerminationSummary {
    pub fn terminated(&self) -> usize {
        self.count(|o| matches!(o, KillOutcome::Terminated))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, KillOutcome::Failed(_)))
    }

    fn count(&self, pred: impl Fn(&KillOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| pred(o)).count()
    }
}

/// Best-effort process killer.
pub struct ProcessTerminator<'a> {
    platform: &'a dyn Platform,
    timeout: Duration,
}

impl<'a> ProcessTerminator<'a> {
    pub fn new(platform: &'a dyn Platform, timeout: Duration) -> Self {
        Self { platform, timeout }
    }

    /// Terminate every process matching any of `specs`.
    ///
    /// The process table is captured once per call. This process and its
    /// ancestors are never matched. Each spec is handled on its own; a
    /// failure is logged and the next spec is still attempted. Termination is
    /// asynchronous, so callers should wait before touching files the
    /// processes held.
    pub fn terminate_all(&self, specs: &[ProcessSpec]) -> TerminationSummary {
        let mut summary = TerminationSummary::default();
        let table = self.platform.processes();
        tracing::debug!(processes = table.len(), "Captured process table");

        for spec in specs {
            let outcome = self.terminate(spec, &table);
            match &outcome {
                KillOutcome::Terminated => tracing::info!(process = %spec, "Terminated process"),
                KillOutcome::NotRunning => tracing::debug!(process = %spec, "Process not running"),
                KillOutcome::Failed(reason) => {
                    tracing::warn!(process = %spec, %reason, "Failed to terminate process")
                }
            }
            summary.outcomes.push((spec.clone(), outcome));
        }

        summary
    }

    fn terminate(&self, spec: &ProcessSpec, table: &ProcessTable) -> KillOutcome {
        let pids = table.matching(spec);
        if pids.is_empty() {
            return KillOutcome::NotRunning;
        }

        let mut errors = Vec::new();
        for pid in pids {
            match self.platform.kill(pid, self.timeout) {
                Ok(()) => tracing::debug!(process = %spec, pid, "Sent termination request"),
                Err(e) => errors.push(format!("pid {}: {}", pid, e)),
            }
        }

        if errors.is_empty() {
            KillOutcome::Terminated
        } else {
            KillOutcome::Failed(errors.join("; "))
        }
    }
}
