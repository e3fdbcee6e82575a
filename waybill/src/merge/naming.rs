//! Bundle file names.
//!
//! A bundle is named after the keys it contains, collapsed into runs of
//! consecutive integers:
//!
//! ```text
//! [1, 2, 3, 5, 6, 8]  ->  "Railway 1-3;5-6;8 6 pcs.pdf"
//! ```

use crate::key::Key;

/// Collapse sorted keys into `;`-joined runs of consecutive integers.
///
/// A run of one key is written as `k`, longer runs as `start-end`. A key
/// equal to its predecessor is not consecutive and starts a new run.
///
/// ```
/// use waybill::merge::naming::format_key_ranges;
///
/// assert_eq!(format_key_ranges(&[1, 2, 3, 5, 6, 8]), "1-3;5-6;8");
/// assert_eq!(format_key_ranges(&[3, 3, 4]), "3;3-4");
/// ```
pub fn format_key_ranges(keys: &[Key]) -> String {
    let mut runs: Vec<(Key, Key)> = Vec::new();
    for &key in keys {
        match runs.last_mut() {
            Some((_, end)) if end.checked_add(1) == Some(key) => *end = key,
            _ => runs.push((key, key)),
        }
    }

    runs.iter()
        .map(|&(start, end)| {
            if start == end {
                start.to_string()
            } else {
                format!("{start}-{end}")
            }
        })
        .collect::<Vec<_>>()
        .join(";")
}

/// File name for a bundle of documents with `keys` (sorted).
///
/// `legacy_suffix` reproduces the doubled dot (`pcs..pdf`) of bundles made
/// by earlier versions, so existing archives sort and match the same way.
pub fn bundle_file_name(keys: &[Key], legacy_suffix: bool) -> String {
    let suffix = if legacy_suffix { "pcs..pdf" } else { "pcs.pdf" };
    format!(
        "Railway {} {} {suffix}",
        format_key_ranges(keys),
        keys.len()
    )
}
