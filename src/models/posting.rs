//! Job posting data structure.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A job posting discovered on a source page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Posting {
    /// Job title as shown on the page
    pub title: String,

    /// Absolute URL to the posting
    pub url: String,

    /// Name of the source the posting was found on
    pub company: String,

    /// When the posting was extracted
    pub discovered_at: DateTime<Utc>,

    /// Short description snippet, if one sits next to the link
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Posting {
    /// Create a posting discovered now.
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        company: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            company: company.into(),
            discovered_at: Utc::now(),
            description: None,
        }
    }

    /// Attach a description snippet.
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description.filter(|d| !d.trim().is_empty());
        self
    }

    /// Stable identifier derived from the URL and title.
    pub fn id(&self) -> String {
        posting_id(&self.url, &self.title)
    }

    /// Discovery time in local time, minute precision.
    pub fn discovered_label(&self) -> String {
        self.discovered_at
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
            .to_string()
    }
}

/// Hash `lowercase(url + title)` into a hex identifier.
///
/// SHA-256 keeps the value identical across runs, builds and platforms.
pub fn posting_id(url: &str, title: &str) -> String {
    let normalized = format!("{url}{title}").to_lowercase();
    hex::encode(Sha256::digest(normalized.as_bytes()))
}
