//! Display and walk configuration types.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// How a listing should be produced and rendered.
///
/// Built once per invocation and threaded through read-only.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct DisplayOptions {
    /// List every leaf instead of the immediate children.
    #[builder(default = "false")]
    #[serde(default)]
    pub recursive: bool,

    /// Keep only entries that are, contain, or live inside versioned outputs.
    #[builder(default = "false")]
    #[serde(default)]
    pub dvc_only: bool,

    /// Fetch sizes and render them beside each entry.
    #[builder(default = "false")]
    #[serde(default)]
    pub with_size: bool,

    /// Render sizes with binary unit suffixes.
    #[builder(default = "false")]
    #[serde(default)]
    pub human_readable: bool,

    /// Reduce the listing to a single total.
    #[builder(default = "false")]
    #[serde(default)]
    pub summarize: bool,

    /// Style paths with ANSI colors.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub colorized: bool,

    /// Emit JSON instead of a table.
    #[builder(default = "false")]
    #[serde(default)]
    pub json_output: bool,

    /// Fold sized listings to this many path components (None = top level).
    #[builder(default)]
    #[serde(default)]
    pub max_depth: Option<u32>,
}

fn default_true() -> bool {
    true
}

impl DisplayOptionsBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(Some(0)) = self.max_depth {
            return Err("max depth must be at least 1".to_string());
        }
        if let (Some(Some(_)), Some(true)) = (self.max_depth, self.recursive) {
            return Err("max depth cannot be combined with a recursive listing".to_string());
        }
        Ok(())
    }
}

impl DisplayOptions {
    /// Create a new display options builder.
    pub fn builder() -> DisplayOptionsBuilder {
        DisplayOptionsBuilder::default()
    }

    /// Whether sizes are needed at all, either for rows or for a total.
    pub fn needs_sizes(&self) -> bool {
        self.with_size || self.summarize
    }

    /// Depth at which a sized listing is folded into directory rows.
    ///
    /// Returns `None` when the raw walk output is rendered as is: in
    /// recursive mode, in summarize mode, and for unsized listings.
    pub fn rollup_depth(&self) -> Option<usize> {
        if self.summarize || self.recursive || !self.with_size {
            return None;
        }
        Some(self.max_depth.unwrap_or(1) as usize)
    }

    /// Walk configuration implied by these options.
    ///
    /// Summarize and rollup modes always descend fully, whatever the
    /// caller passed as `recursive`.
    pub fn walk_config(&self) -> WalkConfig {
        WalkConfig {
            recursive: self.recursive || self.summarize || self.rollup_depth().is_some(),
            dvc_only: self.dvc_only,
            with_size: self.needs_sizes(),
        }
    }
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            recursive: false,
            dvc_only: false,
            with_size: false,
            human_readable: false,
            summarize: false,
            colorized: true,
            json_output: false,
            max_depth: None,
        }
    }
}

/// Configuration for a single tree walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(setter(into))]
pub struct WalkConfig {
    /// Descend fully instead of listing one level.
    #[builder(default = "false")]
    #[serde(default)]
    pub recursive: bool,

    /// Discard entries unrelated to versioned outputs.
    #[builder(default = "false")]
    #[serde(default)]
    pub dvc_only: bool,

    /// Fetch a size for every surviving entry.
    #[builder(default = "false")]
    #[serde(default)]
    pub with_size: bool,
}

impl WalkConfig {
    /// Create a new walk config builder.
    pub fn builder() -> WalkConfigBuilder {
        WalkConfigBuilder::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_options_builder() {
        let options = DisplayOptions::builder()
            .with_size(true)
            .human_readable(true)
            .build()
            .unwrap();

        assert!(options.with_size);
        assert!(options.human_readable);
        assert!(options.colorized);
        assert!(!options.recursive);
        assert_eq!(options.max_depth, None);
    }

    #[test]
    fn test_display_options_rejects_zero_depth() {
        let result = DisplayOptions::builder().max_depth(Some(0u32)).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_display_options_rejects_depth_with_recursive() {
        let result = DisplayOptions::builder()
            .recursive(true)
            .max_depth(Some(2u32))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_summarize_forces_recursion() {
        let options = DisplayOptions::builder()
            .with_size(true)
            .summarize(true)
            .build()
            .unwrap();

        let walk = options.walk_config();
        assert!(walk.recursive);
        assert!(walk.with_size);
        assert_eq!(options.rollup_depth(), None);
    }

    #[test]
    fn test_sized_non_recursive_rolls_up() {
        let options = DisplayOptions::builder().with_size(true).build().unwrap();
        assert_eq!(options.rollup_depth(), Some(1));
        assert!(options.walk_config().recursive);

        let deeper = DisplayOptions::builder()
            .with_size(true)
            .max_depth(Some(3u32))
            .build()
            .unwrap();
        assert_eq!(deeper.rollup_depth(), Some(3));
    }

    #[test]
    fn test_recursive_never_rolls_up() {
        let options = DisplayOptions::builder()
            .with_size(true)
            .recursive(true)
            .build()
            .unwrap();
        assert_eq!(options.rollup_depth(), None);
    }

    #[test]
    fn test_plain_listing_walks_one_level() {
        let options = DisplayOptions::default();
        let walk = options.walk_config();
        assert!(!walk.recursive);
        assert!(!walk.with_size);
        assert_eq!(options.rollup_depth(), None);
    }
}
