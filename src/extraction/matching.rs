//! Keyword matching

use crate::jobs::Keywords;

/// Keywords contained in `text`, case-insensitively, in keyword order
///
/// Keywords are already lower-cased by [`Keywords::new`].
#[must_use]
pub fn matching_keywords(text: &str, keywords: &Keywords) -> Vec<String> {
    let haystack = text.to_lowercase();
    keywords
        .iter()
        .filter(|kw| haystack.contains(kw.as_str()))
        .cloned()
        .collect()
}
