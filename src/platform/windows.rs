use std::fs;
use std::io;
use std::path::Path;
use std::process::Command;
use std::time::Duration;

use super::{succeeds_within, Platform};
use crate::reset::PathKind;

/// Upper bound for the elevation check.
const ELEVATION_TIMEOUT: Duration = Duration::from_secs(5);

/// Windows, driven through `cmd` and `taskkill`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsPlatform;

impl Platform for WindowsPlatform {
    fn name(&self) -> &'static str {
        "windows"
    }

    fn clear_protection(&self, path: &Path) -> io::Result<()> {
        let mut perms = fs::symlink_metadata(path)?.permissions();
        if perms.readonly() {
            #[allow(clippy::permissions_set_readonly_false)]
            perms.set_readonly(false);
            fs::set_permissions(path, perms)?;
        }
        Ok(())
    }

    fn force_remove_command(&self, path: &Path, kind: PathKind) -> Command {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C");
        match kind {
            PathKind::File => cmd.args(["del", "/F", "/Q"]),
            PathKind::Directory => cmd.args(["rmdir", "/S", "/Q"]),
        };
        cmd.arg(path);
        cmd
    }

    fn kill_command(&self, pid: u32) -> Command {
        let mut cmd = Command::new("taskkill");
        cmd.args(["/F", "/PID"]).arg(pid.to_string());
        cmd
    }

    fn is_elevated(&self) -> bool {
        // `net session` only succeeds from an elevated prompt
        succeeds_within(Command::new("net").arg("session"), ELEVATION_TIMEOUT)
    }
}
