//! Index of versioned outputs declared by `*.dvc` files.
//!
//! A declaration file is YAML with an `outs` list. Each output path is
//! relative to the directory holding the declaration:
//!
//! ```yaml
//! outs:
//! - md5: 3863d0e317dee0a55c4e59d2ec0eef33.dir
//!   size: 34
//!   nfiles: 2
//!   path: experiment-a
//! ```

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;

use repolist_core::{ListError, repo_path};

use crate::fs::WalkStep;

/// Extension of output declaration files.
pub const DECLARATION_SUFFIX: &str = ".dvc";

/// What a declaration says about one output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputDecl {
    /// Recorded size in bytes, if any.
    pub size: Option<u64>,
    /// The output is a directory.
    pub is_dir: bool,
}

#[derive(Debug, Deserialize)]
struct DeclarationFile {
    #[serde(default)]
    outs: Vec<DeclaredOut>,
}

#[derive(Debug, Deserialize)]
struct DeclaredOut {
    path: String,
    #[serde(default)]
    size: Option<u64>,
    #[serde(default)]
    nfiles: Option<u64>,
    #[serde(default)]
    md5: Option<String>,
}

/// Repository-relative outputs keyed by path.
#[derive(Debug, Clone, Default)]
pub struct OutputIndex {
    outputs: BTreeMap<String, OutputDecl>,
}

impl OutputIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a file name denotes an output declaration.
    pub fn is_declaration(name: &str) -> bool {
        name.len() > DECLARATION_SUFFIX.len() && name.ends_with(DECLARATION_SUFFIX)
    }

    /// Register an output directly.
    pub fn insert(&mut self, path: &str, decl: OutputDecl) {
        let path = repo_path::normalize(path);
        if !path.is_empty() {
            self.outputs.insert(path, decl);
        }
    }

    /// Parse a declaration file and register its outputs.
    ///
    /// Returns the number of outputs added.
    pub fn load_declaration(&mut self, decl_path: &str, contents: &str) -> Result<usize, ListError> {
        let file: DeclarationFile =
            serde_yaml::from_str(contents).map_err(|e| ListError::InvalidOutputFile {
                path: decl_path.to_string(),
                reason: e.to_string(),
            })?;

        let base = repo_path::parent(decl_path);
        let mut added = 0;
        for out in file.outs {
            let is_dir = out.nfiles.is_some()
                || out.md5.as_deref().is_some_and(|md5| md5.ends_with(".dir"));
            let path = repo_path::normalize(&repo_path::join(base, &out.path));
            if path.is_empty() {
                continue;
            }
            self.outputs.insert(
                path,
                OutputDecl {
                    size: out.size,
                    is_dir,
                },
            );
            added += 1;
        }
        Ok(added)
    }

    /// Declaration for exactly this path.
    pub fn get(&self, path: &str) -> Option<&OutputDecl> {
        self.outputs.get(path)
    }

    /// Check if the path itself is a declared output.
    pub fn is_output(&self, path: &str) -> bool {
        self.outputs.contains_key(path)
    }

    /// Check if the path is an output or lies inside one.
    pub fn is_in_output(&self, path: &str) -> bool {
        let mut current = path;
        while !current.is_empty() {
            if self.outputs.contains_key(current) {
                return true;
            }
            current = repo_path::parent(current);
        }
        false
    }

    /// Check if the path has at least one output beneath it.
    pub fn contains_outputs(&self, path: &str) -> bool {
        if path.is_empty() {
            return !self.outputs.is_empty();
        }
        let prefix = format!("{path}/");
        self.outputs
            .range(prefix.clone()..)
            .next()
            .is_some_and(|(key, _)| key.starts_with(&prefix))
    }

    /// Check if the path is, contains, or lies inside an output.
    pub fn output_exists(&self, path: &str) -> bool {
        self.is_in_output(path) || self.contains_outputs(path)
    }

    /// Outputs declared as direct children of `dir`.
    pub fn children_of<'a>(&'a self, dir: &'a str) -> impl Iterator<Item = (&'a str, &'a OutputDecl)> {
        self.outputs
            .iter()
            .filter(move |(path, _)| repo_path::parent(path) == dir)
            .map(|(path, decl)| (repo_path::file_name(path), decl))
    }

    /// Names of directories directly below `dir` that only exist because
    /// an output is declared somewhere beneath them.
    pub fn subdirs_of<'a>(&'a self, dir: &'a str) -> impl Iterator<Item = &'a str> {
        self.outputs
            .keys()
            .filter(move |path| path.as_str() != dir && repo_path::is_within(path, dir))
            .filter_map(move |path| {
                let rest = if dir.is_empty() { path.as_str() } else { &path[dir.len() + 1..] };
                rest.split_once('/').map(|(first, _)| first)
            })
    }

    /// Check if the path is a directory implied by outputs declared below it.
    pub fn is_implied_dir(&self, path: &str) -> bool {
        !self.is_output(path) && self.contains_outputs(path)
    }

    /// Sum of recorded sizes of outputs under `dir` accepted by `filter`.
    pub fn declared_size_under(&self, dir: &str, filter: impl Fn(&str) -> bool) -> u64 {
        self.outputs
            .iter()
            .filter(|(path, _)| path.as_str() != dir && repo_path::is_within(path, dir))
            .filter(|(path, _)| filter(path))
            .map(|(_, decl)| decl.size.unwrap_or(0))
            .fold(0u64, u64::saturating_add)
    }

    /// Finish a walk step: surface unmaterialized outputs declared in the
    /// step's directory as leaves, add directories that are missing but
    /// hold declared outputs, and drop declaration files if unwanted.
    pub fn complete_step(&self, step: &mut WalkStep, include_declarations: bool) {
        let missing: Vec<String> = self
            .children_of(&step.dir)
            .filter(|(name, _)| !step.dirs.iter().chain(step.files.iter()).any(|n| n == name))
            .map(|(name, _)| name.to_string())
            .collect();
        step.files.extend(missing);

        let implied: BTreeSet<String> = self
            .subdirs_of(&step.dir)
            .filter(|name| !step.dirs.iter().chain(step.files.iter()).any(|n| n == name))
            .map(str::to_string)
            .collect();
        step.dirs.extend(implied);

        if !include_declarations {
            step.files.retain(|name| !Self::is_declaration(name));
        }
        step.dirs.sort();
        step.files.sort();
    }

    /// Number of declared outputs.
    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    /// Check if no outputs are declared.
    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}
