//! Single-total reduction of a listing.

use repolist_core::Entry;

/// Sum the sizes of `entries`, counting missing sizes as zero.
///
/// Accumulates in 64 bits, saturating on overflow.
pub fn total_size(entries: &[Entry]) -> u64 {
    entries
        .iter()
        .map(Entry::size_or_zero)
        .fold(0u64, u64::saturating_add)
}
