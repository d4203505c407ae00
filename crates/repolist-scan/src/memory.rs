//! In-memory repository backend.
//!
//! Used for tests and for listing trees that were assembled programmatically.

use std::collections::BTreeMap;

use repolist_core::{ListError, RepoMetadata, repo_path};

use crate::fs::{RepoFs, WalkOptions, WalkStep, walk_top_down};
use crate::outputs::{OutputDecl, OutputIndex};

#[derive(Debug, Clone)]
enum Node {
    File { size: Option<u64>, executable: bool },
    Directory,
}

/// In-memory repository.
///
/// Parent directories are created implicitly. Outputs may be declared
/// without a backing node, in which case they behave as virtual leaves.
#[derive(Debug, Clone)]
pub struct MemoryRepo {
    name: String,
    nodes: BTreeMap<String, Node>,
    outputs: OutputIndex,
}

impl Default for MemoryRepo {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRepo {
    /// Create an empty repository containing only the root directory.
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(String::new(), Node::Directory);
        Self {
            name: "memory".to_string(),
            nodes,
            outputs: OutputIndex::new(),
        }
    }

    /// Set the name reported as this repository's location.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Add a regular file of the given size.
    pub fn file(self, path: &str, size: u64) -> Self {
        self.insert(path, Node::File {
            size: Some(size),
            executable: false,
        })
    }

    /// Add an executable file of the given size.
    pub fn executable(self, path: &str, size: u64) -> Self {
        self.insert(path, Node::File {
            size: Some(size),
            executable: true,
        })
    }

    /// Add a file whose size cannot be determined.
    pub fn sizeless_file(self, path: &str) -> Self {
        self.insert(path, Node::File {
            size: None,
            executable: false,
        })
    }

    /// Add an (empty) directory.
    pub fn dir(self, path: &str) -> Self {
        self.insert(path, Node::Directory)
    }

    /// Declare an output at `path`.
    pub fn output(mut self, path: &str, decl: OutputDecl) -> Self {
        self.outputs.insert(path, decl);
        let parent = repo_path::parent(&repo_path::normalize(path)).to_string();
        self.ensure_dirs(&parent);
        self
    }

    fn insert(mut self, path: &str, node: Node) -> Self {
        let path = repo_path::normalize(path);
        self.ensure_dirs(repo_path::parent(&path));
        self.nodes.insert(path, node);
        self
    }

    fn ensure_dirs(&mut self, dir: &str) {
        let mut current = String::new();
        for component in repo_path::components(dir) {
            current = repo_path::join(&current, component);
            self.nodes.entry(current.clone()).or_insert(Node::Directory);
        }
    }

    fn list_dir(&self, dir: &str, include_declarations: bool) -> WalkStep {
        let mut step = WalkStep::new(dir);
        for (path, node) in &self.nodes {
            if path.is_empty() || repo_path::parent(path) != dir {
                continue;
            }
            let name = repo_path::file_name(path).to_string();
            match node {
                Node::Directory => step.dirs.push(name),
                Node::File { .. } => step.files.push(name),
            }
        }
        self.outputs.complete_step(&mut step, include_declarations);
        step
    }

    fn not_found(path: &str) -> ListError {
        ListError::io(path, std::io::Error::from(std::io::ErrorKind::NotFound))
    }
}

impl RepoFs for MemoryRepo {
    fn location(&self) -> String {
        self.name.clone()
    }

    fn walk(&self, path: &str, options: WalkOptions) -> Result<Vec<WalkStep>, ListError> {
        let path = repo_path::normalize(path);
        match self.nodes.get(&path) {
            Some(Node::Directory) => walk_top_down(&path, options.recursive, |dir| {
                Ok(self.list_dir(dir, options.include_declarations))
            }),
            Some(Node::File { .. }) => Err(ListError::NotADirectory { path }),
            None if self.outputs.is_output(&path) => Err(ListError::NotADirectory { path }),
            None => Ok(Vec::new()),
        }
    }

    fn metadata(&self, path: &str) -> Result<RepoMetadata, ListError> {
        let path = repo_path::normalize(path);
        let (is_dir, is_exec) = match self.nodes.get(&path) {
            Some(Node::Directory) => (true, false),
            Some(Node::File { executable, .. }) => (false, *executable),
            None => match self.outputs.get(&path) {
                Some(decl) => (decl.is_dir, false),
                None => return Err(Self::not_found(&path)),
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
        match self.nodes.get(&path) {
            Some(Node::File { size, .. }) => Ok(*size),
            Some(Node::Directory) => {
                let files = self
                    .nodes
                    .iter()
                    .filter(|(p, _)| repo_path::is_within(p, &path))
                    .filter_map(|(_, node)| match node {
                        Node::File { size, .. } => Some(size.unwrap_or(0)),
                        Node::Directory => None,
                    })
                    .fold(0u64, u64::saturating_add);
                let virtual_outputs = self
                    .outputs
                    .declared_size_under(&path, |p| !self.nodes.contains_key(p));
                Ok(Some(files.saturating_add(virtual_outputs)))
            }
            None => Ok(self.outputs.get(&path).and_then(|decl| decl.size)),
        }
    }

    fn exists(&self, path: &str) -> bool {
        let path = repo_path::normalize(path);
        self.nodes.contains_key(&path) || self.outputs.is_output(&path)
    }
}
