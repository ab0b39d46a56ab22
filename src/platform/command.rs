//! Running external commands with a bounded wait.

use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::DeleteError;

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Run `cmd` to completion, killing it once `timeout` elapses.
///
/// Output is discarded; only the exit status matters to callers.
pub fn run_with_timeout(cmd: &mut Command, timeout: Duration) -> Result<ExitStatus, DeleteError> {
    let program = cmd.get_program().to_string_lossy().into_owned();

    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|source| DeleteError::Spawn {
            program: program.clone(),
            source,
        })?;

    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) if Instant::now() >= deadline => {
                let _ = child.kill();
                let _ = child.wait();
                tracing::warn!(%program, ?timeout, "Command timed out");
                return Err(DeleteError::Timeout {
                    program,
                    after: timeout,
                });
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(source) => {
                return Err(DeleteError::Spawn { program, source });
            }
        }
    }
}

/// Run `cmd` and require a zero exit status.
pub fn run_checked(cmd: &mut Command, timeout: Duration) -> Result<(), DeleteError> {
    let status = run_with_timeout(cmd, timeout)?;
    if status.success() {
        Ok(())
    } else {
        Err(DeleteError::Command {
            program: cmd.get_program().to_string_lossy().into_owned(),
            code: status.code(),
        })
    }
}

/// Whether `cmd` exits with status zero before `timeout`.
///
/// Spawn failures and timeouts count as `false`.
pub fn succeeds_within(cmd: &mut Command, timeout: Duration) -> bool {
    run_with_timeout(cmd, timeout)
        .map(|status| status.success())
        .unwrap_or(false)
}
