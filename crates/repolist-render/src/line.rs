//! Table rows for human-facing output.

use itertools::Itertools;

use repolist_core::{DisplayOptions, Entry};

use crate::bytes::format_bytes;
use crate::color::ColorTable;

/// Width the size column is padded to.
pub const SIZE_COLUMN_WIDTH: usize = 8;

/// Renders entries as display lines.
#[derive(Debug, Clone, Default)]
pub struct EntryFormatter {
    colors: ColorTable,
}

impl EntryFormatter {
    /// Create a formatter that colors paths with `colors`.
    pub fn new(colors: ColorTable) -> Self {
        Self { colors }
    }

    /// Render the size column text for an entry.
    pub fn size_text(entry: &Entry, human_readable: bool) -> String {
        let size = entry.size_or_zero();
        if human_readable {
            format_bytes(size)
        } else {
            size.to_string()
        }
    }

    /// Render one entry: an optional padded size column, a tab, then the
    /// (optionally colored) path.
    pub fn format_line(&self, entry: &Entry, options: &DisplayOptions) -> String {
        let name = if options.colorized {
            self.colors.colorize(entry)
        } else {
            entry.path.to_string()
        };

        if !options.with_size {
            return name;
        }
        let size = Self::size_text(entry, options.human_readable);
        format!("{size:<width$}\t{name}", width = SIZE_COLUMN_WIDTH)
    }

    /// Render every entry, one per line. An empty slice yields an empty
    /// string.
    pub fn format_all(&self, entries: &[Entry], options: &DisplayOptions) -> String {
        entries
            .iter()
            .map(|entry| self.format_line(entry, options))
            .join("\n")
    }
}
