//! Core types and configuration for repolist.
//!
//! This crate provides the data model shared by every repolist crate:
//! listing entries, display and walk configuration, repository-relative
//! path handling, and the error taxonomy.

mod config;
mod entry;
mod error;
mod listing;
pub mod repo_path;

pub use config::{DisplayOptions, DisplayOptionsBuilder, WalkConfig, WalkConfigBuilder};
pub use entry::{Entry, RepoMetadata};
pub use error::{ListError, WalkWarning, WarningKind};
pub use listing::Listing;
