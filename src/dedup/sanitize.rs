//! Key Sanitization
//!
//! Masks identifying substrings in request keys before they reach logs or
//! introspection output. Lookups always use the raw key.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Longest key rendered by introspection output before truncation
pub const DISPLAY_KEY_MAX_CHARS: usize = 50;

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}")
        .expect("EMAIL_REGEX should compile - this is a bug")
});

static UUID_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}")
        .expect("UUID_REGEX should compile - this is a bug")
});

// Candidate national identity numbers; only runs of exactly 11 digits are
// masked, whatever characters surround them
static DIGIT_RUN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9]+").expect("DIGIT_RUN_REGEX should compile - this is a bug"));

const NATIONAL_ID_DIGITS: usize = 11;

/// Returns `key` with emails, UUIDs and national ID numbers masked.
///
/// Emails are masked first so digits inside an address are not reported as
/// an ID.
pub fn sanitize_key(key: &str) -> String {
    let masked = EMAIL_REGEX.replace_all(key, "[EMAIL]");
    let masked = UUID_REGEX.replace_all(&masked, "[UUID]");
    DIGIT_RUN_REGEX
        .replace_all(&masked, |caps: &Captures| {
            let run = &caps[0];
            if run.len() == NATIONAL_ID_DIGITS {
                "[ID]".to_string()
            } else {
                run.to_string()
            }
        })
        .into_owned()
}

/// Sanitizes `key` and cuts it to `DISPLAY_KEY_MAX_CHARS` characters.
pub fn display_key(key: &str) -> String {
    let sanitized = sanitize_key(key);
    if sanitized.chars().count() <= DISPLAY_KEY_MAX_CHARS {
        return sanitized;
    }
    let mut truncated: String = sanitized.chars().take(DISPLAY_KEY_MAX_CHARS).collect();
    truncated.push_str("...");
    truncated
}
