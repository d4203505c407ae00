//! Flat, relativized listing of a repository tree.

use std::collections::BTreeMap;

use compact_str::CompactString;
use tracing::debug;

use repolist_core::{Entry, ListError, Listing, WalkConfig, WalkWarning, repo_path};

use crate::fs::{RepoFs, WalkOptions};

/// Produces sorted, deduplicated entries from any [`RepoFs`] backend.
pub struct TreeWalker<'a, F: RepoFs + ?Sized> {
    fs: &'a F,
}

impl<'a, F: RepoFs + ?Sized> TreeWalker<'a, F> {
    /// Create a walker over a repository backend.
    pub fn new(fs: &'a F) -> Self {
        Self { fs }
    }

    /// List `path` (the repository root when `None`).
    ///
    /// Non-recursive walks report the immediate children of the query
    /// point; recursive walks report every leaf below it. Paths are made
    /// relative to the query point. A query point that is itself a file
    /// yields a single entry named after it.
    pub fn walk(&self, path: Option<&str>, config: &WalkConfig) -> Result<Listing, ListError> {
        let query = repo_path::normalize(path.unwrap_or(""));
        let candidates = self.collect_candidates(&query, config.recursive)?;
        debug!(query = %query, candidates = candidates.len(), "walked repository");

        let mut entries: BTreeMap<CompactString, Entry> = BTreeMap::new();
        let mut warnings = Vec::new();

        for candidate in candidates {
            let metadata = self.fs.metadata(&candidate)?;
            if config.dvc_only && !metadata.output_exists {
                continue;
            }

            let relative = CompactString::from(repo_path::relativize(&query, &candidate));
            let mut entry = Entry::from_metadata(relative.clone(), &metadata);

            if config.with_size {
                let size = match self.fs.size(&candidate)? {
                    Some(size) => size,
                    None => {
                        debug!(path = %candidate, "None size detected");
                        warnings.push(WalkWarning::missing_size(&candidate));
                        0
                    }
                };
                entry.size = Some(size);
            }

            entries.insert(relative, entry);
        }

        if entries.is_empty() && !query.is_empty() && !self.query_exists(&query, config.dvc_only)? {
            return Err(ListError::PathNotFound {
                path: path.unwrap_or_default().to_string(),
                repo: self.fs.location(),
                dvc_only: config.dvc_only,
            });
        }

        Ok(Listing::new(entries.into_values().collect(), warnings))
    }

    /// Repository-relative paths of every candidate below the query point.
    fn collect_candidates(&self, query: &str, recursive: bool) -> Result<Vec<String>, ListError> {
        let options = WalkOptions {
            recursive,
            include_declarations: true,
        };

        let steps = match self.fs.walk(query, options) {
            Ok(steps) => steps,
            Err(err) if err.is_not_a_directory() => return Ok(vec![query.to_string()]),
            Err(err) => return Err(err),
        };

        let mut candidates = Vec::new();
        for step in steps {
            let names: Box<dyn Iterator<Item = &String>> = if recursive {
                Box::new(step.files.iter())
            } else {
                Box::new(step.files.iter().chain(step.dirs.iter()))
            };
            candidates.extend(names.map(|name| repo_path::join(&step.dir, name)));
            if !recursive {
                break;
            }
        }
        Ok(candidates)
    }

    fn query_exists(&self, query: &str, dvc_only: bool) -> Result<bool, ListError> {
        if !self.fs.exists(query) {
            return Ok(false);
        }
        if dvc_only {
            return Ok(self.fs.metadata(query)?.output_exists);
        }
        Ok(true)
    }
}
