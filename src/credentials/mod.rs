//! Credential loading
//!
//! The login itself happens out-of-band: someone signs in by hand in a real
//! browser and exports the cookie jar. A job receives that export, stored as a
//! per-job [`CredentialArtifact`], and [`load`] turns it into cookies ready for
//! injection into the job's browser session.

mod artifact;

pub use artifact::CredentialArtifact;

use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

use crate::error::{ScrapeError, ScrapeResult};

/// `SameSite` attribute of a cookie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    /// Accepts both automation-tool spelling (`Lax`) and browser-extension
    /// spelling (`lax`, `no_restriction`). `unspecified` means absent.
    fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "strict" => Some(Self::Strict),
            "lax" => Some(Self::Lax),
            "none" | "no_restriction" => Some(Self::None),
            _ => None,
        }
    }
}

fn deserialize_same_site<'de, D>(deserializer: D) -> Result<Option<SameSite>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(SameSite::parse))
}

fn deserialize_expires<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    // -1 (and anything non-positive) marks a session cookie
    let raw: Option<f64> = Option::deserialize(deserializer)?;
    Ok(raw.filter(|e| *e > 0.0))
}

fn default_path() -> String {
    "/".to_string()
}

/// One cookie from a captured session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    #[serde(default = "default_path")]
    pub path: String,
    /// Unix seconds; `None` for session cookies
    #[serde(
        default,
        alias = "expirationDate",
        deserialize_with = "deserialize_expires"
    )]
    pub expires: Option<f64>,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default)]
    pub secure: bool,
    #[serde(default, deserialize_with = "deserialize_same_site")]
    pub same_site: Option<SameSite>,
}

/// Cookies ready for injection into a browser session
pub type SessionCookies = Vec<SessionCookie>;

/// Parse a serialized cookie set
///
/// # Errors
/// `ScrapeError::Credential` when the bytes are not a JSON array of cookies,
/// the array is empty, or a cookie lacks a name or domain.
pub fn parse_cookie_artifact(bytes: &[u8]) -> ScrapeResult<SessionCookies> {
    let cookies: SessionCookies = serde_json::from_slice(bytes)
        .map_err(|e| ScrapeError::credential(format!("cookie artifact is not valid JSON: {e}")))?;

    if cookies.is_empty() {
        return Err(ScrapeError::credential("cookie artifact contains no cookies"));
    }

    if let Some((idx, _)) = cookies
        .iter()
        .enumerate()
        .find(|(_, c)| c.name.trim().is_empty() || c.domain.trim().is_empty())
    {
        return Err(ScrapeError::credential(format!(
            "cookie #{} is missing a name or domain",
            idx + 1
        )));
    }

    Ok(cookies)
}

/// Load the cookie set stored at `path`
pub async fn load_from_path(path: &Path) -> ScrapeResult<SessionCookies> {
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        ScrapeError::credential(format!(
            "credential artifact {} is unreadable: {e}",
            path.display()
        ))
    })?;
    parse_cookie_artifact(&bytes)
}

/// Load a job's credential artifact
///
/// A job submitted without cookies still runs its task; it fails here, before
/// any browser is launched.
pub async fn load(artifact: Option<&CredentialArtifact>) -> ScrapeResult<SessionCookies> {
    let artifact = artifact
        .ok_or_else(|| ScrapeError::credential("no credential artifact was supplied"))?;
    load_from_path(artifact.path()).await
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAYWRIGHT_EXPORT: &str = r#"[
        {"name": "c_user", "value": "1000", "domain": ".facebook.com", "path": "/",
         "expires": 1767225600.5, "httpOnly": false, "secure": true, "sameSite": "None"},
        {"name": "xs", "value": "abc", "domain": ".facebook.com", "path": "/",
         "expires": -1, "httpOnly": true, "secure": true, "sameSite": "Lax"}
    ]"#;

    #[test]
    fn parses_automation_export() {
        let cookies = parse_cookie_artifact(PLAYWRIGHT_EXPORT.as_bytes()).unwrap();
        assert_eq!(cookies.len(), 2);
        assert_eq!(cookies[0].expires, Some(1767225600.5));
        assert_eq!(cookies[0].same_site, Some(SameSite::None));
        assert_eq!(cookies[1].expires, None);
        assert!(cookies[1].http_only);
    }

    #[test]
    fn parses_extension_export() {
        let raw = r#"[{"name": "datr", "value": "z", "domain": ".facebook.com",
                       "expirationDate": 1790000000, "sameSite": "no_restriction",
                       "hostOnly": false}]"#;
        let cookies = parse_cookie_artifact(raw.as_bytes()).unwrap();
        assert_eq!(cookies[0].path, "/");
        assert_eq!(cookies[0].expires, Some(1790000000.0));
        assert_eq!(cookies[0].same_site, Some(SameSite::None));
    }

    #[test]
    fn rejects_malformed_and_empty_artifacts() {
        assert!(matches!(
            parse_cookie_artifact(b"not json"),
            Err(ScrapeError::Credential(_))
        ));
        assert!(matches!(
            parse_cookie_artifact(b"[]"),
            Err(ScrapeError::Credential(_))
        ));
        assert!(matches!(
            parse_cookie_artifact(br#"[{"name": "", "value": "v", "domain": ".x.com"}]"#),
            Err(ScrapeError::Credential(_))
        ));
    }

    #[tokio::test]
    async fn missing_artifact_is_a_credential_error() {
        let err = load(None).await.unwrap_err();
        assert!(matches!(err, ScrapeError::Credential(_)));

        let err = load_from_path(Path::new("/nonexistent/cookies_x.json"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("unreadable"));
    }
}
