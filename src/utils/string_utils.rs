//! UTF-8-safe string helpers for previews and titles
//!
//! Post text and listing titles come straight out of the DOM and routinely
//! contain emoji and other multi-byte characters, so every cap here counts
//! characters, never bytes.

/// Safely truncate a string to a maximum number of CHARACTERS (not bytes).
///
/// Never panics, even with multi-byte characters.
///
/// # Examples
/// ```
/// # use kodegen_tools_socialscrape::utils::string_utils::safe_truncate_chars;
/// assert_eq!(safe_truncate_chars("Hello, World!", 5), "Hello");
/// assert_eq!(safe_truncate_chars("🏡🌳🚜", 2), "🏡🌳");
/// assert_eq!(safe_truncate_chars("Hi", 100), "Hi");
/// ```
#[inline]
pub fn safe_truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        None => s,
        Some((byte_idx, _)) => &s[..byte_idx],
    }
}

/// Trim and fold line breaks into single spaces
///
/// Listing cards render price, title and location on separate lines; the
/// export wants them on one.
#[must_use]
pub fn normalize_whitespace(s: &str) -> String {
    s.trim().replace("\r\n", " ").replace(['\n', '\r'], " ")
}
