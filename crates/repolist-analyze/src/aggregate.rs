//! Per-directory rollups of a flat leaf listing.
//!
//! Folding works on a fresh mapping from directory key to accumulated
//! size; the input entries are never modified.

use std::collections::BTreeMap;

use compact_str::CompactString;
use tracing::debug;

use repolist_core::{Entry, repo_path};

/// Collapses leaf entries into one row per directory at a fixed depth.
///
/// With the default depth of one, every top-level directory becomes a
/// single row whose size is the sum of everything beneath it, while
/// root-level files are kept as they are.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectoryAggregator {
    depth: usize,
}

impl Default for DirectoryAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl DirectoryAggregator {
    /// Aggregate to the first path component.
    pub fn new() -> Self {
        Self { depth: 1 }
    }

    /// Aggregate to the first `depth` path components (at least one).
    pub fn with_depth(depth: usize) -> Self {
        Self {
            depth: depth.max(1),
        }
    }

    /// Depth this aggregator folds to.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Fold `entries` into directory rows, sorted ascending by path.
    ///
    /// Files within the depth limit pass through unchanged. Every other
    /// entry contributes its size to a synthesized directory row keyed by
    /// its leading path components.
    pub fn aggregate(&self, entries: &[Entry]) -> Vec<Entry> {
        let (mut rows, totals) = entries.iter().fold(
            (BTreeMap::<CompactString, Entry>::new(), BTreeMap::<String, u64>::new()),
            |(mut rows, mut totals), entry| {
                let path = repo_path::normalize(&entry.path);
                if repo_path::depth(&path) <= self.depth && !entry.is_dir {
                    let path = CompactString::from(path);
                    rows.insert(path.clone(), Entry {
                        path,
                        ..entry.clone()
                    });
                    return (rows, totals);
                }

                if entry.size.is_none() {
                    debug!(path = %entry.path, "aggregating entry without size as 0");
                }
                let total = totals
                    .entry(repo_path::prefix(&path, self.depth))
                    .or_insert(0);
                *total = total.saturating_add(entry.size_or_zero());
                (rows, totals)
            },
        );

        for (key, size) in totals {
            let key = CompactString::from(key);
            rows.insert(key.clone(), Entry::directory(key, size));
        }

        rows.into_values().collect()
    }
}

/// Fold a leaf listing into one row per top-level directory.
pub fn aggregate(entries: &[Entry]) -> Vec<Entry> {
    DirectoryAggregator::new().aggregate(entries)
}

/// Fold a leaf listing into one row per directory `depth` levels down.
pub fn collapse_to_depth(entries: &[Entry], depth: usize) -> Vec<Entry> {
    DirectoryAggregator::with_depth(depth).aggregate(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaves() -> Vec<Entry> {
        vec![
            Entry::file("README.md", 9),
            Entry::file("data/data-a.json", 17),
            Entry::file("data/data-b.json", 22),
            Entry::file("experiments/experiment-a/datafile-1.csv", 14),
            Entry::file("experiments/experiment-a/datafile-2.csv", 20),
        ]
    }

    fn rows(entries: &[Entry]) -> Vec<(&str, u64, bool)> {
        entries
            .iter()
            .map(|e| (e.path.as_str(), e.size_or_zero(), e.is_dir))
            .collect()
    }

    #[test]
    fn test_aggregate_top_level() {
        let aggregated = aggregate(&leaves());
        assert_eq!(
            rows(&aggregated),
            vec![
                ("README.md", 9, false),
                ("data", 39, true),
                ("experiments", 34, true),
            ]
        );
    }

    #[test]
    fn test_synthesized_rows_are_plain_directories() {
        let mut input = leaves();
        input[1].is_output = true;
        input[1].is_exec = true;

        let aggregated = aggregate(&input);
        let data = aggregated.iter().find(|e| e.path == "data").unwrap();
        assert!(data.is_dir);
        assert!(!data.is_exec);
        assert!(!data.is_output);
    }

    #[test]
    fn test_root_level_file_passes_through_unchanged() {
        let mut input = leaves();
        input[0].is_exec = true;
        input[0].is_output = true;

        let aggregated = aggregate(&input);
        assert_eq!(aggregated[0], input[0]);
    }

    #[test]
    fn test_single_component_directory_is_folded() {
        let input = vec![Entry {
            is_output: true,
            ..Entry::directory("models", 512)
        }];
        let aggregated = aggregate(&input);
        assert_eq!(aggregated, vec![Entry::directory("models", 512)]);
    }

    #[test]
    fn test_collapse_to_depth_two() {
        let aggregated = collapse_to_depth(&leaves(), 2);
        assert_eq!(
            rows(&aggregated),
            vec![
                ("README.md", 9, false),
                ("data/data-a.json", 17, false),
                ("data/data-b.json", 22, false),
                ("experiments/experiment-a", 34, true),
            ]
        );
    }

    #[test]
    fn test_aggregate_is_deterministic() {
        let mut shuffled = leaves();
        shuffled.reverse();
        assert_eq!(aggregate(&leaves()), aggregate(&shuffled));
        assert_eq!(aggregate(&leaves()), aggregate(&leaves()));
    }

    #[test]
    fn test_aggregate_empty() {
        assert!(aggregate(&[]).is_empty());
    }

    #[test]
    fn test_zero_depth_is_clamped() {
        assert_eq!(DirectoryAggregator::with_depth(0).depth(), 1);
    }
}
