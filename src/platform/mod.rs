//! Per-OS capabilities used by the deletion engine and process terminator.
//!
//! The engine itself only talks to [`Platform`]; everything that differs
//! between operating systems (how protection flags are cleared, which shell
//! command force-deletes a path, how processes are killed) lives behind it.

mod command;
mod processes;
#[cfg(unix)]
mod unix;
mod windows;

use std::io;
use std::path::Path;
use std::process::Command;
use std::time::Duration;

use crate::error::DeleteError;
use crate::reset::PathKind;

pub use command::{run_checked, run_with_timeout, succeeds_within};
pub use processes::{ProcessEntry, ProcessTable};
#[cfg(unix)]
pub use unix::UnixPlatform;
pub use windows::WindowsPlatform;

/// Capabilities a target operating system must provide.
pub trait Platform: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Remove read-only or similar protection from `path` so it can be deleted.
    fn clear_protection(&self, path: &Path) -> io::Result<()>;

    /// Shell command that removes `path` regardless of locks where possible.
    fn force_remove_command(&self, path: &Path, kind: PathKind) -> Command;

    /// Shell command that terminates the process `pid`.
    fn kill_command(&self, pid: u32) -> Command;

    /// Whether the current process runs with administrator rights.
    fn is_elevated(&self) -> bool;

    /// Last-resort removal of `path`.
    fn force_remove(&self, path: &Path, kind: PathKind, timeout: Duration) -> Result<(), DeleteError> {
        run_checked(&mut self.force_remove_command(path, kind), timeout)
    }

    /// Running processes, with this process and its ancestors protected.
    fn processes(&self) -> ProcessTable {
        ProcessTable::capture()
    }

    /// Terminate the process `pid`.
    fn kill(&self, pid: u32, timeout: Duration) -> Result<(), DeleteError> {
        run_checked(&mut self.kill_command(pid), timeout)
    }
}

/// Platform implementation for the OS this binary was built for.
pub fn current() -> Box<dyn Platform> {
    #[cfg(unix)]
    {
        Box::new(UnixPlatform)
    }
    #[cfg(not(unix))]
    {
        Box::new(WindowsPlatform)
    }
}
