//! Numeric keys embedded in waybill file names.
//!
//! The same extraction drives stamp matching, ready-set ordering and merge
//! grouping, so every caller goes through [`extract_key`].

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// Integer identifier of a waybill.
pub type Key = u64;

// `\d` is Unicode-aware: any character of general category Nd.
static DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("digit-run pattern compiles"));

static DIGIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d$").expect("digit pattern compiles"));

/// Extract the key from a document name.
///
/// The key is the first maximal run of decimal digits anywhere in `name`,
/// the extension included. Digits from any script count, so `"١٢.pdf"` has
/// key 12. Returns `None` when the name has no digits or the run does not
/// fit in a [`Key`].
///
/// # Examples
///
/// ```
/// use waybill::key::extract_key;
///
/// assert_eq!(extract_key("Railway123_v2.pdf"), Some(123));
/// assert_eq!(extract_key("no-digits.pdf"), None);
/// ```
pub fn extract_key(name: &str) -> Option<Key> {
    let run = DIGIT_RUN.find(name)?;
    run.as_str().chars().try_fold(0 as Key, |key, c| {
        key.checked_mul(10)?.checked_add(Key::from(digit_value(c)?))
    })
}

fn is_decimal_digit(c: char) -> bool {
    let mut buf = [0u8; 4];
    DIGIT.is_match(c.encode_utf8(&mut buf))
}

/// Numeric value of a decimal digit of any script.
///
/// Unicode allocates every Nd digit set as ten consecutive code points from
/// zero to nine, and sets that touch are each complete. The value is the
/// position within the run of consecutive digits ending at `c`, modulo ten.
fn digit_value(c: char) -> Option<u32> {
    if let Some(value) = c.to_digit(10) {
        return Some(value);
    }
    if !is_decimal_digit(c) {
        return None;
    }

    let mut run = 0u32;
    let mut code = c as u32;
    while let Some(prev) = char::from_u32(code)
        && is_decimal_digit(prev)
    {
        run += 1;
        match code.checked_sub(1) {
            Some(next) => code = next,
            None => break,
        }
    }
    Some((run - 1) % 10)
}

/// Extract the key from the file name component of `path`.
///
/// Directory components never contribute digits.
pub fn key_of_path(path: &Path) -> Option<Key> {
    path.file_name()
        .and_then(|name| name.to_str())
        .and_then(extract_key)
}
