//! Repository walking engine for repolist.
//!
//! This crate turns a repository backend into flat, sorted listings.
//!
//! # Overview
//!
//! `repolist-scan` is responsible for traversing repositories and building
//! the entry set consumed by aggregation and rendering. Key pieces:
//!
//! - **[`RepoFs`]**, the capability every backend implements (`walk`,
//!   `metadata`, `size`)
//! - **Backends**: the working copy ([`LocalRepo`]), a git revision
//!   ([`GitSnapshot`], feature `git`), and an in-memory tree ([`MemoryRepo`])
//! - **[`OutputIndex`]**, versioned outputs declared by `*.dvc` files,
//!   surfaced as virtual leaves when they are not materialized
//! - **[`TreeWalker`]**, which relativizes, filters and sizes entries
//!
//! # Example
//!
//! ```rust,no_run
//! use repolist_scan::{TreeWalker, WalkConfig, open_repository};
//!
//! let repo = open_repository("/path/to/repo", None).unwrap();
//! let config = WalkConfig::builder().recursive(true).with_size(true).build().unwrap();
//! let listing = TreeWalker::new(&*repo).walk(Some("data"), &config).unwrap();
//!
//! for entry in &listing.entries {
//!     println!("{} {}", entry.size_or_zero(), entry.path);
//! }
//! ```

mod fs;
#[cfg(feature = "git")]
mod git;
mod local;
mod memory;
mod open;
mod outputs;
mod walker;

pub use fs::{RepoFs, WalkOptions, WalkStep};
#[cfg(feature = "git")]
pub use git::GitSnapshot;
pub use local::LocalRepo;
pub use memory::MemoryRepo;
pub use open::{is_remote, open_repository};
pub use outputs::{DECLARATION_SUFFIX, OutputDecl, OutputIndex};
pub use walker::TreeWalker;

// Re-export core types for convenience
pub use repolist_core::{Entry, ListError, Listing, RepoMetadata, WalkConfig, WalkWarning};
