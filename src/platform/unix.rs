use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::process::Command;

use nix::unistd::Uid;

use super::Platform;
use crate::reset::PathKind;

/// Linux, macOS and other Unix-likes.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnixPlatform;

/// Add `bits` to the permission mode of `path` without following symlinks.
fn add_mode(path: &Path, bits: u32) -> io::Result<()> {
    let meta = fs::symlink_metadata(path)?;
    if meta.file_type().is_symlink() {
        return Ok(());
    }
    let mut perms = meta.permissions();
    let mode = perms.mode();
    if mode & bits != bits {
        perms.set_mode(mode | bits);
        fs::set_permissions(path, perms)?;
    }
    Ok(())
}

impl Platform for UnixPlatform {
    fn name(&self) -> &'static str {
        "unix"
    }

    /// Unlinking needs write access to the parent, so the parent is
    /// unlocked as well as the entry itself.
    fn clear_protection(&self, path: &Path) -> io::Result<()> {
        let bits = if path.is_dir() && !path.is_symlink() {
            0o700
        } else {
            0o600
        };
        add_mode(path, bits)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            add_mode(parent, 0o700)?;
        }
        Ok(())
    }

    fn force_remove_command(&self, path: &Path, kind: PathKind) -> Command {
        let mut cmd = Command::new("rm");
        match kind {
            PathKind::File => cmd.arg("-f"),
            PathKind::Directory => cmd.arg("-rf"),
        };
        cmd.arg("--").arg(path);
        cmd
    }

    fn kill_command(&self, pid: u32) -> Command {
        let mut cmd = Command::new("kill");
        cmd.arg("-TERM").arg(pid.to_string());
        cmd
    }

    fn is_elevated(&self) -> bool {
        Uid::effective().is_root()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn args(cmd: &Command) -> Vec<String> {
        cmd.get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn force_remove_uses_rm() {
        let platform = UnixPlatform;
        let file = platform.force_remove_command(Path::new("/tmp/x"), PathKind::File);
        let dir = platform.force_remove_command(Path::new("/tmp/d"), PathKind::Directory);

        assert_eq!(file.get_program(), "rm");
        assert_eq!(args(&file), vec!["-f", "--", "/tmp/x"]);
        assert_eq!(args(&dir), vec!["-rf", "--", "/tmp/d"]);
    }

    #[test]
    fn kill_command_sends_sigterm_to_one_pid() {
        let cmd = UnixPlatform.kill_command(4242);
        assert_eq!(cmd.get_program(), "kill");
        assert_eq!(args(&cmd), vec!["-TERM", "4242"]);
    }

    #[test]
    fn clear_protection_makes_file_and_parent_writable() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("locked");
        fs::create_dir(&dir).unwrap();
        let file = dir.join("settings.json");
        fs::write(&file, "{}").unwrap();
        fs::set_permissions(&file, fs::Permissions::from_mode(0o444)).unwrap();
        fs::set_permissions(&dir, fs::Permissions::from_mode(0o555)).unwrap();

        UnixPlatform.clear_protection(&file).unwrap();

        let file_mode = fs::metadata(&file).unwrap().permissions().mode();
        let dir_mode = fs::metadata(&dir).unwrap().permissions().mode();
        assert_eq!(file_mode & 0o600, 0o600);
        assert_eq!(dir_mode & 0o700, 0o700);
    }
}
