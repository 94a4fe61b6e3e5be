//! Export row shapes
//!
//! Field order is column order; serde preserves it for both CSV and JSON.

use serde::Serialize;

use crate::extraction::{GroupPostRecord, MarketplaceListingRecord};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const GROUP_COLUMNS: &[&str] = &[
    "Group URL",
    "Post Text Preview",
    "Matched Keyword(s)",
    "Post Link",
    "Scraped At",
];

pub const MARKETPLACE_COLUMNS: &[&str] = &["ZIP Code", "Keyword", "Title", "URL", "Scraped At"];

#[derive(Debug, Serialize)]
pub struct GroupPostRow<'a> {
    #[serde(rename = "Group URL")]
    pub group_url: &'a str,
    #[serde(rename = "Post Text Preview")]
    pub text_preview: &'a str,
    #[serde(rename = "Matched Keyword(s)")]
    pub matched_keywords: String,
    #[serde(rename = "Post Link")]
    pub post_link: &'a str,
    #[serde(rename = "Scraped At")]
    pub scraped_at: String,
}

impl<'a> From<&'a GroupPostRecord> for GroupPostRow<'a> {
    fn from(record: &'a GroupPostRecord) -> Self {
        Self {
            group_url: &record.group_url,
            text_preview: &record.text_preview,
            matched_keywords: record.matched_keywords_joined(),
            post_link: &record.post_link,
            scraped_at: record.scraped_at.format(TIMESTAMP_FORMAT).to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MarketplaceListingRow<'a> {
    #[serde(rename = "ZIP Code")]
    pub zip_code: &'a str,
    #[serde(rename = "Keyword")]
    pub keyword: &'a str,
    #[serde(rename = "Title")]
    pub title: &'a str,
    #[serde(rename = "URL")]
    pub url: &'a str,
    #[serde(rename = "Scraped At")]
    pub scraped_at: String,
}

impl<'a> From<&'a MarketplaceListingRecord> for MarketplaceListingRow<'a> {
    fn from(record: &'a MarketplaceListingRecord) -> Self {
        Self {
            zip_code: &record.zip_code,
            keyword: &record.keyword,
            title: &record.title,
            url: &record.url,
            scraped_at: record.scraped_at.format(TIMESTAMP_FORMAT).to_string(),
        }
    }
}
