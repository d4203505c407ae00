//! Listing container.

use serde::{Deserialize, Serialize};

use crate::entry::Entry;
use crate::error::WalkWarning;

/// Ordered, deduplicated entries produced by one walk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    /// Entries sorted ascending by path.
    pub entries: Vec<Entry>,

    /// Warnings encountered during the walk.
    pub warnings: Vec<WalkWarning>,
}

impl Listing {
    /// Create a listing from already ordered entries.
    pub fn new(entries: Vec<Entry>, warnings: Vec<WalkWarning>) -> Self {
        Self { entries, warnings }
    }

    /// Check if the listing has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there were any warnings during the walk.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_default_is_empty() {
        let listing = Listing::default();
        assert!(listing.is_empty());
        assert_eq!(listing.len(), 0);
        assert!(!listing.has_warnings());
    }

    #[test]
    fn test_listing_with_warning() {
        let listing = Listing::new(
            vec![Entry::file("a.txt", 0)],
            vec![WalkWarning::missing_size("a.txt")],
        );
        assert_eq!(listing.len(), 1);
        assert!(listing.has_warnings());
    }
}
