//! Display formatting for repolist.
//!
//! - [`format_bytes`] renders byte counts with binary unit suffixes
//! - [`ColorTable`] parses `LS_COLORS`-style tables and styles entries
//! - [`EntryFormatter`] composes both into table rows

mod bytes;
mod color;
mod line;

pub use bytes::format_bytes;
pub use color::{ColorCode, ColorTable, DEFAULT_COLORS, extension_of};
pub use line::{EntryFormatter, SIZE_COLUMN_WIDTH};
