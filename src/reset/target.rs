//! Paths targeted by a reset and the ordered batch they are deleted in.

use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Kind of a filesystem entry as seen without following symlinks.
///
/// Symlinks count as files: deleting one removes the link, never its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PathKind {
    File,
    Directory,
}

/// A single path considered for deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetPath {
    /// Absolute path.
    pub path: PathBuf,
    /// Kind at the time the path was probed.
    pub kind: PathKind,
    /// Whether the path existed when probed.
    pub exists: bool,
}

impl TargetPath {
    /// Probe `path` on disk.
    pub fn probe(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match fs::symlink_metadata(&path) {
            Ok(meta) => Self {
                kind: if meta.is_dir() {
                    PathKind::Directory
                } else {
                    PathKind::File
                },
                path,
                exists: true,
            },
            Err(_) => Self {
                path,
                kind: PathKind::File,
                exists: false,
            },
        }
    }

    /// Number of path components, used to put children before parents.
    pub fn depth(&self) -> usize {
        self.path.components().count()
    }
}

/// Whether anything (including a dangling symlink) exists at `path`.
pub fn path_exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Deduplicated set of targets, deepest first.
///
/// Every entry nested below another entry of the batch comes before it, so
/// deleting in order never hits a non-empty directory that could have been
/// emptied first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PathBatch {
    entries: Vec<TargetPath>,
}

impl PathBatch {
    /// Build a batch from raw paths, dropping duplicates and entries that no
    /// longer exist.
    pub fn from_paths<I>(paths: I) -> Self
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let mut seen = HashSet::new();
        let entries = paths
            .into_iter()
            .filter(|p| seen.insert(p.clone()))
            .map(TargetPath::probe)
            .filter(|t| t.exists)
            .collect();

        let mut batch = Self { entries };
        batch.sort();
        batch
    }

    /// Merge another batch into this one, keeping the ordering invariant.
    pub fn merge(&mut self, other: PathBatch) {
        let known: HashSet<PathBuf> = self.entries.iter().map(|t| t.path.clone()).collect();
        self.entries
            .extend(other.entries.into_iter().filter(|t| !known.contains(&t.path)));
        self.sort();
    }

    fn sort(&mut self) {
        self.entries
            .sort_by(|a, b| b.depth().cmp(&a.depth()).then_with(|| a.path.cmp(&b.path)));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TargetPath> {
        self.entries.iter()
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.entries.iter().map(|t| t.path.as_path())
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.iter().any(|t| t.path == path)
    }

    /// Total apparent size of the files in the batch.
    pub fn total_size(&self) -> u64 {
        self.entries
            .iter()
            .filter(|t| t.kind == PathKind::File)
            .filter_map(|t| fs::symlink_metadata(&t.path).ok())
            .map(|m| m.len())
            .sum()
    }
}

impl IntoIterator for PathBatch {
    type Item = TargetPath;
    type IntoIter = std::vec::IntoIter<TargetPath>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a PathBatch {
    type Item = &'a TargetPath;
    type IntoIter = std::slice::Iter<'a, TargetPath>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn layout() -> TempDir {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("a/b/c")).unwrap();
        fs::write(tmp.path().join("a/b/c/deep.txt"), "x").unwrap();
        fs::write(tmp.path().join("a/top.txt"), "xy").unwrap();
        tmp
    }

    #[test]
    fn probe_detects_kind() {
        let tmp = layout();
        let dir = TargetPath::probe(tmp.path().join("a"));
        let file = TargetPath::probe(tmp.path().join("a/top.txt"));
        let missing = TargetPath::probe(tmp.path().join("nope"));

        assert_eq!(dir.kind, PathKind::Directory);
        assert_eq!(file.kind, PathKind::File);
        assert!(dir.exists && file.exists);
        assert!(!missing.exists);
    }

    #[test]
    fn batch_drops_duplicates_and_missing() {
        let tmp = layout();
        let a = tmp.path().join("a");
        let batch = PathBatch::from_paths(vec![a.clone(), a.clone(), tmp.path().join("ghost")]);

        assert_eq!(batch.len(), 1);
        assert!(batch.contains(&a));
    }

    #[test]
    fn batch_orders_children_before_parents() {
        let tmp = layout();
        let root = tmp.path();
        let batch = PathBatch::from_paths(vec![
            root.join("a"),
            root.join("a/top.txt"),
            root.join("a/b"),
            root.join("a/b/c/deep.txt"),
            root.join("a/b/c"),
        ]);

        let order: Vec<&Path> = batch.paths().collect();
        for (i, earlier) in order.iter().enumerate() {
            for later in &order[i + 1..] {
                assert!(
                    !later.starts_with(earlier) || later == earlier,
                    "{} must come before {}",
                    later.display(),
                    earlier.display()
                );
            }
        }
        assert_eq!(order.last().copied(), Some(root.join("a").as_path()));
    }

    #[test]
    fn depth_beats_string_length() {
        let tmp = TempDir::new().unwrap();
        let long_shallow = tmp.path().join("a-very-long-directory-name-at-depth-one");
        let short_deep = tmp.path().join("x/y/z");
        fs::create_dir_all(&long_shallow).unwrap();
        fs::create_dir_all(&short_deep).unwrap();

        let batch = PathBatch::from_paths(vec![long_shallow.clone(), short_deep.clone()]);
        let order: Vec<&Path> = batch.paths().collect();
        assert_eq!(order, vec![short_deep.as_path(), long_shallow.as_path()]);
    }

    #[test]
    fn merge_keeps_invariants() {
        let tmp = layout();
        let root = tmp.path();
        let mut batch = PathBatch::from_paths(vec![root.join("a"), root.join("a/b")]);
        batch.merge(PathBatch::from_paths(vec![
            root.join("a/b"),
            root.join("a/b/c/deep.txt"),
        ]));

        assert_eq!(batch.len(), 3);
        assert_eq!(batch.paths().next(), Some(root.join("a/b/c/deep.txt").as_path()));
    }

    #[test]
    fn total_size_counts_files_only() {
        let tmp = layout();
        let root = tmp.path();
        let batch = PathBatch::from_paths(vec![
            root.join("a"),
            root.join("a/top.txt"),
            root.join("a/b/c/deep.txt"),
        ]);
        assert_eq!(batch.total_size(), 3);
    }
}
