//! Repository filesystem capability shared by every backend.

use repolist_core::{ListError, RepoMetadata, repo_path};

/// One directory visited by a walk: its path and its direct children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkStep {
    /// Repository-relative directory path (`""` for the root).
    pub dir: String,
    /// Names of child directories, sorted.
    pub dirs: Vec<String>,
    /// Names of child files (and opaque leaves), sorted.
    pub files: Vec<String>,
}

impl WalkStep {
    /// Create an empty step for a directory.
    pub fn new(dir: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            dirs: Vec::new(),
            files: Vec::new(),
        }
    }
}

/// Options for a single backend walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkOptions {
    /// Visit every directory below the starting point, not just the first.
    pub recursive: bool,
    /// Report output declaration files (`*.dvc`) among the files.
    pub include_declarations: bool,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            recursive: true,
            include_declarations: true,
        }
    }
}

/// Read-only view over one repository backend.
///
/// All paths are repository-relative and `/`-separated; `""` is the root.
/// Implementations are interchangeable: working copy, historical snapshot,
/// or an in-memory tree.
pub trait RepoFs {
    /// Human readable location of this repository, used in diagnostics.
    fn location(&self) -> String;

    /// Walk the tree below `path`, top-down.
    ///
    /// Returns `Err(ListError::NotADirectory)` when `path` is a file or an
    /// opaque leaf, and an empty sequence when `path` does not exist.
    fn walk(&self, path: &str, options: WalkOptions) -> Result<Vec<WalkStep>, ListError>;

    /// Metadata for a path that is known to exist.
    fn metadata(&self, path: &str) -> Result<RepoMetadata, ListError>;

    /// Size of a path in bytes, if it can be determined.
    ///
    /// Directories report the sum of their descendant file sizes.
    fn size(&self, path: &str) -> Result<Option<u64>, ListError>;

    /// Check if a path exists in this repository.
    fn exists(&self, path: &str) -> bool;
}

impl<T: RepoFs + ?Sized> RepoFs for Box<T> {
    fn location(&self) -> String {
        (**self).location()
    }

    fn walk(&self, path: &str, options: WalkOptions) -> Result<Vec<WalkStep>, ListError> {
        (**self).walk(path, options)
    }

    fn metadata(&self, path: &str) -> Result<RepoMetadata, ListError> {
        (**self).metadata(path)
    }

    fn size(&self, path: &str) -> Result<Option<u64>, ListError> {
        (**self).size(path)
    }

    fn exists(&self, path: &str) -> bool {
        (**self).exists(path)
    }
}

/// Visit `start` and, when `recursive`, every directory below it in
/// pre-order, asking `list` for the children of each directory.
pub(crate) fn walk_top_down<F>(start: &str, recursive: bool, mut list: F) -> Result<Vec<WalkStep>, ListError>
where
    F: FnMut(&str) -> Result<WalkStep, ListError>,
{
    let mut steps = Vec::new();
    let mut pending = vec![start.to_string()];

    while let Some(dir) = pending.pop() {
        let step = list(&dir)?;
        if recursive {
            pending.extend(step.dirs.iter().rev().map(|name| repo_path::join(&dir, name)));
        }
        steps.push(step);
        if !recursive {
            break;
        }
    }

    Ok(steps)
}
