//! Enumeration of everything stored under the target's storage roots.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::target::PathBatch;
use crate::error::{ResetError, Result};

/// Storage roots of Visual Studio Code on the current platform.
pub fn default_roots() -> Result<Vec<PathBuf>> {
    let home = dirs::home_dir().ok_or(ResetError::NoHomeDir)?;
    let config = dirs::config_dir().unwrap_or_else(|| home.join(".config"));

    let roots = if cfg!(target_os = "macos") {
        vec![
            config.join("Code"),
            home.join("Library").join("Logs").join("Code"),
            dirs::cache_dir()
                .unwrap_or_else(|| home.join("Library").join("Caches"))
                .join("com.microsoft.VSCode"),
            home.join(".vscode"),
        ]
    } else if cfg!(windows) {
        let mut roots = vec![config.join("Code")];
        if let Some(local) = dirs::data_local_dir() {
            roots.push(local.join("Code"));
        }
        roots.push(home.join(".vscode"));
        roots
    } else {
        vec![
            config.join("Code"),
            dirs::cache_dir()
                .unwrap_or_else(|| home.join(".cache"))
                .join("vscode"),
            home.join(".vscode"),
        ]
    };

    Ok(roots)
}

/// Collects every file and directory below a fixed set of roots.
#[derive(Debug, Clone)]
pub struct PathCollector {
    roots: Vec<PathBuf>,
}

impl PathCollector {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Walk all roots and return the existing entries, deepest first.
    ///
    /// Symlinks are reported but never followed. A root resolving to a
    /// directory that was already walked through another root is skipped.
    pub fn collect(&self) -> PathBatch {
        let mut paths = Vec::new();
        let mut visited: HashSet<PathBuf> = HashSet::new();

        for root in &self.roots {
            let meta = match fs::symlink_metadata(root) {
                Ok(m) => m,
                Err(_) => {
                    tracing::debug!(root = %root.display(), "Storage root does not exist");
                    continue;
                }
            };

            if !meta.is_dir() {
                paths.push(root.clone());
                continue;
            }

            let real = root.canonicalize().unwrap_or_else(|_| root.clone());
            if !visited.insert(real) {
                tracing::debug!(root = %root.display(), "Storage root already collected");
                continue;
            }

            walk_into(root, &mut paths);
        }

        let batch = PathBatch::from_paths(paths);
        tracing::debug!(count = batch.len(), "Collected paths");
        batch
    }
}

/// Push every entry below `root`, then `root` itself.
fn walk_into(root: &Path, paths: &mut Vec<PathBuf>) {
    let walker = WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .into_iter();

    for result in walker {
        match result {
            Ok(entry) => paths.push(entry.into_path()),
            Err(err) => {
                tracing::debug!(root = %root.display(), error = %err, "Skipping unreadable entry");
            }
        }
    }

    paths.push(root.to_path_buf());
}
