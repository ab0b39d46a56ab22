//! End-to-end tests of the reset flow against temporary directory trees.

use code_reset::config::Config;
use code_reset::platform::{self, Platform};
use code_reset::reset::{DeletionEngine, EngineOptions, ResetOrchestrator, ResetState, TargetPath};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

/// Config that touches nothing outside `roots` and never waits.
fn test_config(roots: Vec<PathBuf>) -> Config {
    let mut config = Config::default();
    config.target.roots = roots;
    config.target.processes = vec![];
    config.residual.enabled = false;
    config.deletion.initial_backoff_ms = 1;
    config.run.settle_ms = 0;
    config.run.final_settle_ms = 0;
    config
}

/// Root with three nested directories holding one file each.
fn nested_root(base: &Path) -> PathBuf {
    let root = base.join("Code");
    let mut dir = root.clone();
    for level in 1..=3 {
        dir = dir.join(format!("level{}", level));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(format!("file{}.json", level)), "{}").unwrap();
    }
    root
}

#[test]
fn nested_root_is_removed_completely() {
    let tmp = TempDir::new().unwrap();
    let root = nested_root(tmp.path());
    let config = test_config(vec![root.clone()]);
    let platform = platform::current();

    let report = ResetOrchestrator::new(&config, platform.as_ref()).run_full_reset();

    assert!(!root.exists());
    assert_eq!(report.total, 7);
    assert_eq!(report.removed, 7);
    assert!(report.remaining.is_empty());
    assert_eq!(report.success_ratio, 1.0);
    assert!(report.success);
    assert_eq!(report.final_state, ResetState::Reported);
}

#[test]
fn two_roots_with_one_file_each() {
    let tmp = TempDir::new().unwrap();
    let first = tmp.path().join("config");
    let second = tmp.path().join("cache");
    fs::create_dir_all(&first).unwrap();
    fs::create_dir_all(&second).unwrap();
    fs::write(first.join("settings.json"), "{}").unwrap();
    fs::write(second.join("blob.bin"), "x").unwrap();

    let config = test_config(vec![first.clone(), second.clone(), first.clone()]);
    let platform = platform::current();
    let batch = ResetOrchestrator::new(&config, platform.as_ref())
        .collect_paths()
        .unwrap();

    assert_eq!(batch.len(), 4);
    assert!(batch.contains(&first));
    assert!(batch.contains(&second.join("blob.bin")));
}

#[test]
fn collected_descendants_precede_ancestors() {
    let tmp = TempDir::new().unwrap();
    let short = tmp.path().join("a");
    let long = tmp.path().join("a-much-longer-root-name");
    fs::create_dir_all(short.join("x/y/z")).unwrap();
    fs::write(short.join("x/y/z/f"), "x").unwrap();
    fs::create_dir_all(long.join("q")).unwrap();

    let config = test_config(vec![long, short]);
    let platform = platform::current();
    let batch = ResetOrchestrator::new(&config, platform.as_ref())
        .collect_paths()
        .unwrap();
    let order: Vec<&Path> = batch.paths().collect();

    for (i, ancestor) in order.iter().enumerate() {
        for descendant in &order[i + 1..] {
            assert!(
                !(descendant.starts_with(ancestor) && descendant != ancestor),
                "{} listed after its ancestor {}",
                descendant.display(),
                ancestor.display()
            );
        }
    }
}

#[test]
fn remove_path_is_idempotent() {
    let tmp = TempDir::new().unwrap();
    let root = nested_root(tmp.path());
    let platform = platform::current();
    let options = EngineOptions {
        max_attempts: 3,
        initial_backoff: Duration::from_millis(1),
        command_timeout: Duration::from_secs(5),
    };
    let engine = DeletionEngine::new(platform.as_ref(), options);
    let target = TargetPath::probe(&root);

    assert!(engine.remove_path(&target));
    assert!(engine.remove_path(&target));
    assert!(!root.exists());
}

#[test]
fn empty_roots_are_already_clean() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(vec![tmp.path().join("never-installed")]);
    let platform = platform::current();

    let report = ResetOrchestrator::new(&config, platform.as_ref()).run_full_reset();

    assert!(report.success);
    assert_eq!(report.total, 0);
}

#[test]
fn residual_matches_are_removed_with_the_roots() {
    let tmp = TempDir::new().unwrap();
    let root = nested_root(tmp.path());
    let local = tmp.path().join("Local");
    fs::create_dir_all(local.join("augment-vip/bin")).unwrap();
    fs::write(local.join("augment-vip/bin/tool"), "x").unwrap();
    fs::write(local.join("Augment.log"), "x").unwrap();
    fs::write(local.join("other.log"), "x").unwrap();

    let mut config = test_config(vec![root.clone()]);
    config.residual.enabled = true;
    config.residual.search_roots = vec![local.clone()];
    let platform = platform::current();

    let report = ResetOrchestrator::new(&config, platform.as_ref()).run_full_reset();

    assert!(report.success);
    assert_eq!(report.total, 9);
    assert!(!root.exists());
    assert!(!local.join("augment-vip").exists());
    assert!(!local.join("Augment.log").exists());
    assert!(local.join("other.log").exists());
}

#[cfg(unix)]
mod locked {
    use super::*;
    use code_reset::error::DeleteError;
    use code_reset::reset::PathKind;
    use nix::unistd::Uid;
    use std::io;
    use std::os::unix::fs::PermissionsExt;
    use std::process::Command;

    /// Never clears protection and never manages to force a delete,
    /// like a file held open by another process.
    struct LockedPlatform;

    impl Platform for LockedPlatform {
        fn name(&self) -> &'static str {
            "locked"
        }

        fn clear_protection(&self, _path: &Path) -> io::Result<()> {
            Ok(())
        }

        fn force_remove_command(&self, _path: &Path, _kind: PathKind) -> Command {
            Command::new("false")
        }

        fn kill_command(&self, _pid: u32) -> Command {
            Command::new("false")
        }

        fn is_elevated(&self) -> bool {
            false
        }

        fn force_remove(&self, path: &Path, _kind: PathKind, _timeout: Duration) -> Result<(), DeleteError> {
            Err(DeleteError::StillPresent(path.to_path_buf()))
        }
    }

    struct Fixture {
        _tmp: TempDir,
        locked_dir: PathBuf,
        held: PathBuf,
        free_root: PathBuf,
        config: Config,
    }

    impl Drop for Fixture {
        fn drop(&mut self) {
            let _ = fs::set_permissions(&self.locked_dir, fs::Permissions::from_mode(0o755));
        }
    }

    /// One root with a file that cannot be deleted, one with `free` files.
    fn fixture(free: usize) -> Fixture {
        let tmp = TempDir::new().unwrap();
        let locked_root = tmp.path().join("config");
        let locked_dir = locked_root.join("locked");
        fs::create_dir_all(&locked_dir).unwrap();
        let held = locked_dir.join("held.lock");
        fs::write(&held, "x").unwrap();
        fs::set_permissions(&locked_dir, fs::Permissions::from_mode(0o555)).unwrap();

        let free_root = tmp.path().join("cache");
        fs::create_dir_all(&free_root).unwrap();
        for i in 0..free {
            fs::write(free_root.join(format!("free{}.bin", i)), "x").unwrap();
        }

        let config = test_config(vec![locked_root, free_root.clone()]);
        Fixture {
            _tmp: tmp,
            locked_dir,
            held,
            free_root,
            config,
        }
    }

    #[test]
    fn locked_file_fails_without_stopping_the_batch() {
        if Uid::effective().is_root() {
            return;
        }
        let fx = fixture(1);
        let mut orchestrator = ResetOrchestrator::new(&fx.config, &LockedPlatform);
        let before = orchestrator.collect_paths().unwrap();

        let report = orchestrator.run_full_reset();

        // held, locked, config root fail; free file and cache root succeed
        assert_eq!(report.total, 5);
        assert_eq!(report.removed, 2);
        assert!(!report.success);
        assert!(report.remaining.contains(&fx.held));
        assert!(!fx.free_root.exists());
        assert_eq!(report.failures.len(), 3);

        for path in before.paths() {
            assert!(
                !path.exists() || report.remaining.iter().any(|r| r == path),
                "{} neither removed nor reported",
                path.display()
            );
        }
    }

    #[test]
    fn few_locked_files_still_pass_the_threshold() {
        if Uid::effective().is_root() {
            return;
        }
        let fx = fixture(12);
        let report = ResetOrchestrator::new(&fx.config, &LockedPlatform).run_full_reset();

        // 13 of 16 removed
        assert_eq!(report.total, 16);
        assert_eq!(report.removed, 13);
        assert!(!report.remaining.is_empty());
        assert!(report.success_ratio >= 0.8);
        assert!(report.success);
    }
}
