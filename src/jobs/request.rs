//! Submission parsing
//!
//! A submission arrives as loosely structured text: a keyword file, a group
//! list that is either a JSON array or a CSV, and a JSON array of ZIP codes.
//! Everything here runs before a job exists, so any failure is a
//! `ScrapeError::Validation` and nothing is registered.

use serde_json::Value;

use super::types::{JobKind, JobSpec, JobTargets, Keywords};
use crate::error::{ScrapeError, ScrapeResult};
use crate::utils::is_valid_url;

/// Raw job submission
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub kind: JobKind,
    /// Newline-delimited keywords
    pub keywords: String,
    /// Group list (JSON array or CSV) or ZIP code JSON array, per `kind`
    pub targets: String,
    /// Serialized cookie export, stored unparsed
    pub credentials: Option<Vec<u8>>,
}

impl JobRequest {
    /// Validate the textual fields into a [`JobSpec`]
    pub fn to_spec(&self) -> ScrapeResult<JobSpec> {
        let keywords = parse_keywords(&self.keywords)?;
        let targets = match self.kind {
            JobKind::GroupSearch => JobTargets::GroupSearch {
                group_urls: parse_group_targets(&self.targets)?,
            },
            JobKind::MarketplaceSearch => JobTargets::MarketplaceSearch {
                zip_codes: parse_zip_codes(&self.targets)?,
            },
        };

        if targets.is_empty() {
            return Err(ScrapeError::validation(format!(
                "{} job has no targets",
                self.kind
            )));
        }

        Ok(JobSpec { keywords, targets })
    }
}

/// One keyword per line; trimmed, lower-cased, blanks dropped
pub fn parse_keywords(raw: &str) -> ScrapeResult<Keywords> {
    Keywords::new(raw.lines())
}

/// Group URLs from a JSON array of strings or a CSV (first column)
pub fn parse_group_targets(raw: &str) -> ScrapeResult<Vec<String>> {
    let raw = raw.trim().trim_start_matches('\u{feff}');

    let entries: Vec<String> = if raw.starts_with('[') {
        serde_json::from_str::<Vec<String>>(raw).map_err(|e| {
            ScrapeError::validation(format!("groups is not a JSON array of strings: {e}"))
        })?
    } else {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(raw.as_bytes());

        let mut entries = Vec::new();
        for row in reader.records() {
            let row = row.map_err(|e| ScrapeError::validation(format!("groups CSV: {e}")))?;
            if let Some(first) = row.get(0) {
                entries.push(first.to_string());
            }
        }
        entries
    };

    let mut urls: Vec<String> = Vec::with_capacity(entries.len());
    for entry in entries {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        if !is_valid_url(entry) {
            return Err(ScrapeError::validation(format!(
                "group target '{entry}' is not an absolute http(s) URL"
            )));
        }
        if !urls.iter().any(|u| u == entry) {
            urls.push(entry.to_string());
        }
    }
    Ok(urls)
}

/// ZIP codes from a JSON array of strings or integers
pub fn parse_zip_codes(raw: &str) -> ScrapeResult<Vec<String>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Vec::new());
    }

    let values: Vec<Value> = serde_json::from_str(raw)
        .map_err(|e| ScrapeError::validation(format!("zip_codes is not a JSON array: {e}")))?;

    let mut zips: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        let zip = match value {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) if n.is_u64() => n.to_string(),
            other => {
                return Err(ScrapeError::validation(format!(
                    "zip code {other} must be a string or a non-negative integer"
                )));
            }
        };
        if zip.is_empty() {
            return Err(ScrapeError::validation("zip_codes contains a blank entry"));
        }
        if !zips.contains(&zip) {
            zips.push(zip);
        }
    }
    Ok(zips)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_targets_accept_csv_first_column() {
        let csv = "https://www.facebook.com/groups/1,Land lovers\n\n  \nhttps://www.facebook.com/groups/2\n";
        assert_eq!(
            parse_group_targets(csv).unwrap(),
            [
                "https://www.facebook.com/groups/1",
                "https://www.facebook.com/groups/2"
            ]
        );
    }

    #[test]
    fn group_targets_accept_json_array() {
        let json = r#" ["https://www.facebook.com/groups/1", "https://www.facebook.com/groups/1"] "#;
        assert_eq!(
            parse_group_targets(json).unwrap(),
            ["https://www.facebook.com/groups/1"]
        );
    }

    #[test]
    fn group_targets_reject_non_urls() {
        assert!(parse_group_targets("not a url").is_err());
        assert!(parse_group_targets("[1, 2]").is_err());
    }

    #[test]
    fn zip_codes_accept_strings_and_integers() {
        assert_eq!(
            parse_zip_codes(r#"["75147", 75148, " 75149 "]"#).unwrap(),
            ["75147", "75148", "75149"]
        );
    }

    #[test]
    fn zip_codes_reject_bad_entries() {
        assert!(parse_zip_codes("75147").is_err());
        assert!(parse_zip_codes(r#"[""]"#).is_err());
        assert!(parse_zip_codes(r#"[{"zip": 1}]"#).is_err());
    }

    #[test]
    fn spec_requires_targets() {
        let request = JobRequest {
            kind: JobKind::MarketplaceSearch,
            keywords: "lot\n".into(),
            targets: "[]".into(),
            credentials: None,
        };
        assert!(matches!(
            request.to_spec(),
            Err(ScrapeError::Validation(_))
        ));
    }
}
