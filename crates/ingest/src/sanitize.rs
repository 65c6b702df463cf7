//! Filename sanitizing for display names.

use crate::FilenameSanitizer;

/// Longest allowed name, in bytes.
pub const MAX_FILENAME_BYTES: usize = 255;

const ILLEGAL_CHARS: &[char] = &['/', '?', '<', '>', '\\', ':', '*', '|', '"'];

const WINDOWS_RESERVED: &[&str] = &[
    "con", "prn", "aux", "nul", "com0", "com1", "com2", "com3", "com4", "com5", "com6", "com7", "com8", "com9",
    "lpt0", "lpt1", "lpt2", "lpt3", "lpt4", "lpt5", "lpt6", "lpt7", "lpt8", "lpt9",
];

/// Strips characters and names that are unsafe on common filesystems.
///
/// Illegal characters and control characters are removed, names consisting
/// only of dots and Windows device names (with or without an extension)
/// become empty, trailing dots and spaces are dropped and the result is
/// truncated to [`MAX_FILENAME_BYTES`] on a character boundary.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSanitizer;

impl FilenameSanitizer for DefaultSanitizer {
    fn sanitize(&self, name: &str) -> String {
        let cleaned: String = name
            .chars()
            .filter(|c| !ILLEGAL_CHARS.contains(c) && !c.is_control())
            .collect();

        if is_reserved(&cleaned) {
            return String::new();
        }

        let trimmed = cleaned.trim_end_matches(['.', ' ']);
        truncate_bytes(trimmed, MAX_FILENAME_BYTES).to_string()
    }
}

fn is_reserved(name: &str) -> bool {
    if !name.is_empty() && name.chars().all(|c| c == '.') {
        return true;
    }
    let stem = name.split('.').next().unwrap_or(name).to_ascii_lowercase();
    WINDOWS_RESERVED.contains(&stem.as_str())
}

fn truncate_bytes(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
