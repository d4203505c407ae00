//! Human-readable byte counts.

/// Unit ladder, each step a factor of 1024.
const UNITS: [&str; 6] = ["", "K", "M", "G", "T", "P"];
const STEP: f64 = 1024.0;

/// Format a byte count with a binary unit suffix, rounded to an integer.
///
/// Values below 1024 are returned exactly with no suffix. Values beyond
/// the petabyte range keep the `P` suffix with an oversized number.
///
/// ```
/// use repolist_render::format_bytes;
///
/// assert_eq!(format_bytes(1023), "1023");
/// assert_eq!(format_bytes(32345678), "31M");
/// ```
pub fn format_bytes(bytes: u64) -> String {
    let mut value = bytes as f64;
    for unit in UNITS {
        if value < STEP {
            return format!("{value:.0}{unit}");
        }
        value /= STEP;
    }
    format!("{:.0}{}", value * STEP, UNITS[UNITS.len() - 1])
}
