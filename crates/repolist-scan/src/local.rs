//! Working copy backend.

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use jwalk::{Parallelism, WalkDir};
use tracing::{debug, warn};

use repolist_core::{ListError, RepoMetadata, repo_path};

use crate::fs::{RepoFs, WalkOptions, WalkStep};
use crate::outputs::OutputIndex;

/// Directories holding repository bookkeeping rather than content.
const CONTROL_DIRS: [&str; 2] = [".git", ".dvc"];

/// Working copy of a repository on local disk.
///
/// Outputs are discovered from the `*.dvc` declaration files present in
/// the tree when the repository is opened.
#[derive(Debug)]
pub struct LocalRepo {
    root: PathBuf,
    outputs: OutputIndex,
}

impl LocalRepo {
    /// Open the working copy rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, ListError> {
        let given = root.as_ref();
        let root = given
            .canonicalize()
            .map_err(|e| ListError::open(given.display().to_string(), e))?;
        if !root.is_dir() {
            return Err(ListError::open(
                given.display().to_string(),
                "not a directory",
            ));
        }

        let mut repo = Self {
            root,
            outputs: OutputIndex::new(),
        };
        repo.outputs = repo.index_outputs();
        debug!(root = %repo.root.display(), outputs = repo.outputs.len(), "opened working copy");
        Ok(repo)
    }

    /// Declared outputs of this working copy.
    pub fn outputs(&self) -> &OutputIndex {
        &self.outputs
    }

    fn index_outputs(&self) -> OutputIndex {
        let mut index = OutputIndex::new();
        for entry in self.walker(&self.root, usize::MAX).into_iter().flatten() {
            let name = entry.file_name().to_string_lossy();
            if !entry.file_type().is_file() || !OutputIndex::is_declaration(&name) {
                continue;
            }
            let decl_path = self.relative(&entry.path());
            let loaded = std::fs::read_to_string(entry.path())
                .map_err(|e| ListError::io(decl_path.clone(), e))
                .and_then(|contents| index.load_declaration(&decl_path, &contents));
            if let Err(err) = loaded {
                warn!("skipping output declaration: {err}");
            }
        }
        index
    }

    fn walker(&self, start: &Path, max_depth: usize) -> WalkDir {
        WalkDir::new(start)
            .parallelism(Parallelism::Serial)
            .sort(true)
            .skip_hidden(false)
            .follow_links(false)
            .min_depth(1)
            .max_depth(max_depth)
            .process_read_dir(|_depth, _path, _state, children| {
                children.retain(|child| {
                    child
                        .as_ref()
                        .map_or(true, |e| !is_control_dir(e.file_name(), e.file_type().is_dir()))
                });
            })
    }

    fn absolute(&self, path: &str) -> PathBuf {
        repo_path::components(path).fold(self.root.clone(), |acc, c| acc.join(c))
    }

    /// Metadata of the path itself; symbolic links are not followed.
    fn link_metadata(&self, path: &str) -> std::io::Result<std::fs::Metadata> {
        std::fs::symlink_metadata(self.absolute(path))
    }

    fn on_disk(&self, path: &str) -> bool {
        self.link_metadata(path).is_ok()
    }

    fn relative(&self, abs: &Path) -> String {
        abs.strip_prefix(&self.root)
            .unwrap_or(abs)
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/")
    }
}

fn is_control_dir(name: &OsStr, is_dir: bool) -> bool {
    is_dir && CONTROL_DIRS.iter().any(|control| name == OsStr::new(control))
}

#[cfg(unix)]
fn is_executable(metadata: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &std::fs::Metadata) -> bool {
    false
}

impl RepoFs for LocalRepo {
    fn location(&self) -> String {
        self.root.display().to_string()
    }

    fn walk(&self, path: &str, options: WalkOptions) -> Result<Vec<WalkStep>, ListError> {
        let path = repo_path::normalize(path);
        let abs = self.absolute(&path);

        let mut steps: BTreeMap<String, WalkStep> = BTreeMap::new();
        match std::fs::symlink_metadata(&abs) {
            Ok(metadata) if metadata.is_dir() => {
                steps.insert(path.clone(), WalkStep::new(path.clone()));
                let max_depth = if options.recursive { usize::MAX } else { 1 };
                for entry in self.walker(&abs, max_depth) {
                    let entry = entry.map_err(|err| ListError::Io {
                        path: path.clone(),
                        source: std::io::Error::other(err.to_string()),
                    })?;
                    let relative = self.relative(&entry.path());
                    let parent = repo_path::parent(&relative).to_string();
                    let name = repo_path::file_name(&relative).to_string();

                    let is_dir = entry.file_type().is_dir();
                    if is_dir && options.recursive {
                        steps
                            .entry(relative.clone())
                            .or_insert_with(|| WalkStep::new(relative.clone()));
                    }

                    let step = steps
                        .entry(parent.clone())
                        .or_insert_with(|| WalkStep::new(parent));
                    if is_dir {
                        step.dirs.push(name);
                    } else {
                        step.files.push(name);
                    }
                }
            }
            Ok(_) => return Err(ListError::NotADirectory { path }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                if self.outputs.is_output(&path) {
                    return Err(ListError::NotADirectory { path });
                }
                if !self.outputs.is_implied_dir(&path) {
                    return Ok(Vec::new());
                }
                steps.insert(path.clone(), WalkStep::new(path.clone()));
            }
            Err(err) => return Err(ListError::io(path, err)),
        }

        // Directories implied by declared outputs have no physical step yet.
        let mut pending: Vec<String> = steps.keys().rev().cloned().collect();
        let mut completed: BTreeMap<String, WalkStep> = BTreeMap::new();
        while let Some(dir) = pending.pop() {
            let mut step = steps
                .remove(&dir)
                .unwrap_or_else(|| WalkStep::new(dir.clone()));
            self.outputs
                .complete_step(&mut step, options.include_declarations);
            if options.recursive {
                for name in step.dirs.iter().rev() {
                    let child = repo_path::join(&dir, name);
                    if !steps.contains_key(&child) && !completed.contains_key(&child) {
                        pending.push(child);
                    }
                }
            }
            completed.insert(dir, step);
        }

        Ok(completed.into_values().collect())
    }

    fn metadata(&self, path: &str) -> Result<RepoMetadata, ListError> {
        let path = repo_path::normalize(path);
        let (is_dir, is_exec) = match self.link_metadata(&path) {
            Ok(metadata) => (metadata.is_dir(), metadata.is_file() && is_executable(&metadata)),
            Err(err) => match self.outputs.get(&path) {
                Some(decl) => (decl.is_dir, false),
                None if self.outputs.is_implied_dir(&path) => (true, false),
                None => return Err(ListError::io(path, err)),
            },
        };

        Ok(RepoMetadata {
            output_exists: self.outputs.output_exists(&path),
            is_output: self.outputs.is_output(&path),
            is_dir,
            is_exec,
        })
    }

    fn size(&self, path: &str) -> Result<Option<u64>, ListError> {
        let path = repo_path::normalize(path);
        let virtual_outputs = || {
            self.outputs
                .declared_size_under(&path, |p| !self.on_disk(p))
        };

        let metadata = match self.link_metadata(&path) {
            Ok(metadata) => metadata,
            Err(_) if self.outputs.is_implied_dir(&path) => return Ok(Some(virtual_outputs())),
            Err(_) => return Ok(self.outputs.get(&path).and_then(|decl| decl.size)),
        };
        if !metadata.is_dir() {
            return Ok(Some(metadata.len()));
        }

        let files = self
            .walker(&self.absolute(&path), usize::MAX)
            .into_iter()
            .flatten()
            .filter(|entry| !entry.file_type().is_dir())
            .filter_map(|entry| std::fs::symlink_metadata(entry.path()).ok())
            .map(|metadata| metadata.len())
            .fold(0u64, u64::saturating_add);

        Ok(Some(files.saturating_add(virtual_outputs())))
    }

    fn exists(&self, path: &str) -> bool {
        let path = repo_path::normalize(path);
        self.on_disk(&path) || self.outputs.is_output(&path) || self.outputs.is_implied_dir(&path)
    }
}
