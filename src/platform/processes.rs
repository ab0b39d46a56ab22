//! Snapshot of the running processes, used to resolve [`ProcessSpec`]s
//! into PIDs before anything is killed.

use std::collections::{HashMap, HashSet};

use sysinfo::System;

use crate::reset::ProcessSpec;

/// One running process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEntry {
    pub pid: u32,
    pub parent: Option<u32>,
    /// Executable name as reported by the OS.
    pub name: String,
    /// Full command line, space separated.
    pub cmdline: String,
}

/// Processes running when the snapshot was taken.
///
/// This process and every ancestor of it are protected: a spec never
/// matches them, however broad its pattern.
#[derive(Debug, Clone, Default)]
pub struct ProcessTable {
    entries: Vec<ProcessEntry>,
    protected: HashSet<u32>,
}

impl ProcessTable {
    /// Capture the process table of the host.
    pub fn capture() -> Self {
        let mut system = System::new();
        system.refresh_processes();

        let entries = system
            .processes()
            .values()
            .map(|p| ProcessEntry {
                pid: p.pid().as_u32(),
                parent: p.parent().map(|pid| pid.as_u32()),
                name: p.name().to_string(),
                cmdline: p.cmd().join(" "),
            })
            .collect();

        match sysinfo::get_current_pid() {
            Ok(pid) => Self::new(entries, pid.as_u32()),
            Err(e) => {
                // Without our own PID nothing can be protected, so match nothing
                tracing::warn!(error = e, "Could not determine own PID, skipping termination");
                Self::default()
            }
        }
    }

    /// Build a table from `entries`, protecting `current` and its ancestors.
    pub fn new(entries: Vec<ProcessEntry>, current: u32) -> Self {
        let parents: HashMap<u32, Option<u32>> =
            entries.iter().map(|e| (e.pid, e.parent)).collect();

        let mut protected = HashSet::new();
        let mut next = Some(current);
        while let Some(pid) = next {
            if !protected.insert(pid) {
                break;
            }
            next = parents.get(&pid).copied().flatten();
        }

        Self { entries, protected }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_protected(&self, pid: u32) -> bool {
        self.protected.contains(&pid)
    }

    /// PIDs of unprotected processes matching `spec`.
    ///
    /// Names compare case-insensitively against the executable name;
    /// patterns are case-insensitive substrings of the name or command line.
    pub fn matching(&self, spec: &ProcessSpec) -> Vec<u32> {
        self.entries
            .iter()
            .filter(|e| !self.protected.contains(&e.pid))
            .filter(|e| match spec {
                ProcessSpec::Name(name) => e.name.eq_ignore_ascii_case(name),
                ProcessSpec::Pattern(pattern) => {
                    let needle = pattern.to_lowercase();
                    !needle.is_empty()
                        && (e.name.to_lowercase().contains(&needle)
                            || e.cmdline.to_lowercase().contains(&needle))
                }
            })
            .map(|e| e.pid)
            .collect()
    }
}
