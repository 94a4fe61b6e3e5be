//! Records emitted by the extraction strategies

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A group post that matched at least one keyword
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupPostRecord {
    pub group_url: String,
    /// First 200 characters of the post text
    pub text_preview: String,
    /// Every job keyword found in the preview, in job order
    pub matched_keywords: Vec<String>,
    /// Absolute permalink, empty when the post exposes none
    pub post_link: String,
    pub scraped_at: DateTime<Utc>,
}

impl GroupPostRecord {
    /// Keywords as shown in exports: `"land, lot"`
    #[must_use]
    pub fn matched_keywords_joined(&self) -> String {
        self.matched_keywords.join(", ")
    }
}

/// A marketplace listing found by a ZIP × keyword search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketplaceListingRecord {
    pub zip_code: String,
    /// The search keyword that surfaced the listing
    pub keyword: String,
    /// Card text on one line, at most 100 characters
    pub title: String,
    pub url: String,
    pub scraped_at: DateTime<Utc>,
}
