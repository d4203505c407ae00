//! Aggregation over repository listings.
//!
//! This crate folds flat leaf listings produced by `repolist-scan`:
//!
//! - **Directory rollups** - One row per top-level (or depth-limited)
//!   directory carrying the total size beneath it
//! - **Usage totals** - A single overflow-safe sum over every leaf
//!
//! Both operate on the recursive leaf listing; directory rows reported by
//! a raw walk are never double counted.
//!
//! ```rust,ignore
//! use repolist_analyze::{aggregate, total_size};
//! use repolist_scan::{MemoryRepo, TreeWalker, WalkConfig};
//!
//! let repo = MemoryRepo::new().file("data/a.csv", 10).file("b.txt", 2);
//! let config = WalkConfig::builder().recursive(true).with_size(true).build().unwrap();
//! let listing = TreeWalker::new(&repo).walk(None, &config).unwrap();
//!
//! for row in aggregate(&listing.entries) {
//!     println!("{}\t{}", row.size_or_zero(), row.path);
//! }
//! println!("total: {}", total_size(&listing.entries));
//! ```

mod aggregate;
mod usage;

pub use aggregate::{DirectoryAggregator, aggregate, collapse_to_depth};
pub use usage::total_size;

// Re-export core types
pub use repolist_core::Entry;
