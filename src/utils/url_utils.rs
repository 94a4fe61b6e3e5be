//! URL helpers for link resolution and target validation

use url::Url;

/// Check if a URL is an absolute http(s) URL
#[must_use]
pub fn is_valid_url(url: &str) -> bool {
    if url.is_empty() {
        return false;
    }

    if url.starts_with("data:") || url.starts_with("javascript:") || url.starts_with("mailto:") {
        return false;
    }

    match Url::parse(url) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

/// Resolve an `href` as rendered in the DOM into an absolute URL
///
/// Absolute links are returned unchanged; relative ones (`/marketplace/item/1/`)
/// are joined onto `base`. Returns `None` when the href cannot be resolved.
#[must_use]
pub fn resolve_link(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with("javascript:") || href == "#" {
        return None;
    }

    if let Ok(absolute) = Url::parse(href) {
        return matches!(absolute.scheme(), "http" | "https").then(|| absolute.to_string());
    }

    base.join(href).ok().map(|u| u.to_string())
}
