//! Listing entry and repository metadata types.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Metadata reported by a repository backend for a single path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoMetadata {
    /// The path is an output, lies inside one, or contains one.
    pub output_exists: bool,
    /// The path itself is a declared output.
    pub is_output: bool,
    /// The path is a directory (physical or declared).
    pub is_dir: bool,
    /// The path is an executable file.
    pub is_exec: bool,
}

/// A single row of a listing.
///
/// Paths are relative to the query point and always `/`-separated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Path relative to the query point.
    pub path: CompactString,

    /// Whether this entry is a directory.
    #[serde(rename = "isdir")]
    pub is_dir: bool,

    /// Whether this entry is executable. Meaningless for directories.
    #[serde(rename = "isexec")]
    pub is_exec: bool,

    /// Whether this entry is a versioned output.
    #[serde(rename = "isout")]
    pub is_output: bool,

    /// Size in bytes, present only when sizes were requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl Entry {
    /// Create an entry from backend metadata.
    pub fn from_metadata(path: impl Into<CompactString>, metadata: &RepoMetadata) -> Self {
        Self {
            path: path.into(),
            is_dir: metadata.is_dir,
            is_exec: metadata.is_exec,
            is_output: metadata.is_output,
            size: None,
        }
    }

    /// Create a plain file entry.
    pub fn file(path: impl Into<CompactString>, size: u64) -> Self {
        Self {
            path: path.into(),
            is_dir: false,
            is_exec: false,
            is_output: false,
            size: Some(size),
        }
    }

    /// Create a synthesized directory entry carrying an aggregated size.
    pub fn directory(path: impl Into<CompactString>, size: u64) -> Self {
        Self {
            path: path.into(),
            is_dir: true,
            is_exec: false,
            is_output: false,
            size: Some(size),
        }
    }

    /// Attach a size to this entry.
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// Size in bytes, treating an absent size as zero.
    pub fn size_or_zero(&self) -> u64 {
        self.size.unwrap_or(0)
    }
}
