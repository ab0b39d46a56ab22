//! Keyword search for leftovers outside the primary storage roots.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::target::PathBatch;

/// Directories searched for residuals when none are configured.
pub fn default_search_roots() -> Vec<PathBuf> {
    let mut roots: Vec<PathBuf> = Vec::new();
    for dir in [dirs::config_dir(), dirs::data_local_dir(), dirs::cache_dir()]
        .into_iter()
        .flatten()
    {
        if !roots.contains(&dir) {
            roots.push(dir);
        }
    }
    roots
}

/// Finds entries whose name contains a keyword, case-insensitively.
#[derive(Debug, Clone)]
pub struct ResidualScanner {
    search_roots: Vec<PathBuf>,
    keyword: String,
}

impl ResidualScanner {
    pub fn new(search_roots: Vec<PathBuf>, keyword: &str) -> Self {
        Self {
            search_roots,
            keyword: keyword.to_lowercase(),
        }
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// Scan every search root at any depth. The roots themselves never match.
    ///
    /// An empty keyword matches nothing.
    pub fn scan(&self) -> PathBatch {
        if self.keyword.is_empty() {
            return PathBatch::default();
        }

        let mut matches = Vec::new();
        for root in &self.search_roots {
            self.scan_root(root, &mut matches);
        }

        let batch = PathBatch::from_paths(matches);
        if batch.is_empty() {
            tracing::info!(keyword = %self.keyword, "No residual files found");
        } else {
            tracing::info!(keyword = %self.keyword, count = batch.len(), "Found residual paths");
        }
        batch
    }

    fn scan_root(&self, root: &Path, matches: &mut Vec<PathBuf>) {
        if !root.is_dir() {
            tracing::debug!(root = %root.display(), "Residual search root is not a directory");
            return;
        }

        let walker = WalkDir::new(root).min_depth(1).follow_links(false);
        for result in walker {
            let entry = match result {
                Ok(e) => e,
                Err(err) => {
                    tracing::debug!(root = %root.display(), error = %err, "Skipping unreadable entry");
                    continue;
                }
            };

            if self.is_match(&entry.file_name().to_string_lossy()) {
                matches.push(entry.into_path());
            }
        }
    }

    fn is_match(&self, name: &str) -> bool {
        name.to_lowercase().contains(&self.keyword)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn tree() -> TempDir {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("Roaming/Augment.vscode-augment/state")).unwrap();
        fs::write(root.join("Roaming/Augment.vscode-augment/state/db"), "x").unwrap();
        fs::create_dir_all(root.join("Local/tools/deep/nested")).unwrap();
        fs::write(root.join("Local/tools/deep/nested/AUGMENT-cache.bin"), "x").unwrap();
        fs::write(root.join("Local/unrelated.txt"), "x").unwrap();
        tmp
    }

    #[test]
    fn matches_case_insensitively_at_any_depth() {
        let tmp = tree();
        let scanner = ResidualScanner::new(vec![tmp.path().to_path_buf()], "Augment");

        let batch = scanner.scan();

        assert_eq!(batch.len(), 2);
        assert!(batch.contains(&tmp.path().join("Roaming/Augment.vscode-augment")));
        assert!(batch.contains(&tmp.path().join("Local/tools/deep/nested/AUGMENT-cache.bin")));
    }

    #[test]
    fn no_match_is_empty_success() {
        let tmp = tree();
        let scanner = ResidualScanner::new(vec![tmp.path().to_path_buf()], "copilot");
        assert!(scanner.scan().is_empty());
    }

    #[test]
    fn empty_keyword_matches_nothing() {
        let tmp = tree();
        let scanner = ResidualScanner::new(vec![tmp.path().to_path_buf()], "");
        assert!(scanner.scan().is_empty());
    }

    #[test]
    fn search_root_itself_never_matches() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("augment-root");
        fs::create_dir(&root).unwrap();

        let scanner = ResidualScanner::new(vec![root.clone()], "augment");
        assert!(scanner.scan().is_empty());
    }

    #[test]
    fn missing_search_root_is_ignored() {
        let tmp = TempDir::new().unwrap();
        let scanner = ResidualScanner::new(vec![tmp.path().join("nope")], "augment");
        assert!(scanner.scan().is_empty());
    }

    #[test]
    fn default_search_roots_are_unique() {
        let roots = default_search_roots();
        let mut deduped = roots.clone();
        deduped.dedup();
        assert_eq!(roots.len(), deduped.len());
    }
}
