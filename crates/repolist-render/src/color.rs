//! `LS_COLORS`-style color tables and entry styling.

use std::collections::BTreeMap;

use strum::{AsRefStr, Display, EnumString};

use repolist_core::{Entry, repo_path};

/// Table used when neither an explicit nor an environment table is given.
pub const DEFAULT_COLORS: &str = "rs=0:di=01;34:ex=01;32";

/// Reset attribute used when the table has no `rs` code.
const DEFAULT_RESET: &str = "0";

/// Type codes the resolver consults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display, EnumString)]
pub enum ColorCode {
    #[strum(serialize = "rs")]
    Reset,
    #[strum(serialize = "di")]
    Directory,
    #[strum(serialize = "ex")]
    Executable,
    #[strum(serialize = "out")]
    Output,
}

/// Mapping from type codes and file extensions to ANSI attributes.
///
/// Codes the resolver does not know about (`ln`, `fi`, ...) are kept so
/// that a full `LS_COLORS` value round-trips, but they never style
/// anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColorTable {
    codes: BTreeMap<String, String>,
    extensions: BTreeMap<String, String>,
}

impl ColorTable {
    /// Parse a colon-separated `code=attr` list.
    ///
    /// Segments without `=` are skipped. Patterns of the form `*.ext` are
    /// keyed by `.ext`.
    pub fn parse(spec: &str) -> Self {
        let mut table = Self::default();
        for (code, attr) in spec.split(':').filter_map(|item| item.split_once('=')) {
            match code.strip_prefix('*') {
                Some(ext) if ext.starts_with('.') => {
                    table.extensions.insert(ext.to_string(), attr.to_string());
                }
                _ => {
                    table.codes.insert(code.to_string(), attr.to_string());
                }
            }
        }
        table
    }

    /// Build the table from the first non-empty source.
    ///
    /// `explicit` wins over `env` (normally the `LS_COLORS` value), and
    /// [`DEFAULT_COLORS`] is used when both are absent or empty.
    pub fn from_sources(explicit: Option<&str>, env: Option<&str>) -> Self {
        let spec = explicit
            .filter(|s| !s.is_empty())
            .or_else(|| env.filter(|s| !s.is_empty()))
            .unwrap_or(DEFAULT_COLORS);
        Self::parse(spec)
    }

    /// Attribute mapped to a type code.
    pub fn code(&self, code: ColorCode) -> Option<&str> {
        self.codes.get(code.as_ref()).map(String::as_str)
    }

    /// Attribute mapped to an extension such as `.xml`.
    pub fn extension(&self, ext: &str) -> Option<&str> {
        self.extensions.get(ext).map(String::as_str)
    }

    /// Attribute that closes a styled span.
    pub fn reset(&self) -> &str {
        self.code(ColorCode::Reset).unwrap_or(DEFAULT_RESET)
    }

    /// Pick the styling for an entry.
    ///
    /// Versioned outputs use `out` when the table maps it. Otherwise the
    /// first matching flag decides: directories use `di`, executables use
    /// `ex`, and other files are styled by extension. An unmapped code
    /// leaves the entry unstyled.
    pub fn resolve(&self, entry: &Entry) -> Option<&str> {
        let attr = if let Some(out) = self.code(ColorCode::Output).filter(|_| entry.is_output) {
            Some(out)
        } else if entry.is_dir {
            self.code(ColorCode::Directory)
        } else if entry.is_exec {
            self.code(ColorCode::Executable)
        } else {
            extension_of(&entry.path).and_then(|ext| self.extension(ext))
        };
        attr.filter(|attr| !attr.is_empty())
    }

    /// Render the entry's path, wrapped in escape codes when it is styled.
    pub fn colorize(&self, entry: &Entry) -> String {
        match self.resolve(entry) {
            Some(attr) => format!("\x1b[{attr}m{}\x1b[{}m", entry.path, self.reset()),
            None => entry.path.to_string(),
        }
    }
}

/// Extension of the last path component, including the leading dot.
///
/// Leading dots of the name do not start an extension, so `.gitignore`
/// has none while `structure.xml.dvc` has `.dvc`.
pub fn extension_of(path: &str) -> Option<&str> {
    let name = repo_path::file_name(path);
    let stem_start = name.len() - name.trim_start_matches('.').len();
    name[stem_start..]
        .rfind('.')
        .map(|dot| &name[stem_start + dot..])
}
