use serde::{Deserialize, Serialize};

/// Placeholder strings written in place of fields the page did not carry.
///
/// They exist only at the handoff-file boundary; inside the crate a missing
/// field is `None`.
pub const CONTENT_NOT_FOUND: &str = "Content not found";
pub const TITLE_NOT_FOUND: &str = "Title not found";
pub const HEADLINE_NOT_FOUND: &str = "Headline not found";
pub const DATE_NOT_FOUND: &str = "Date not found";

/// Title given to records whose fetch or extraction failed.
pub const FAILURE_TITLE: &str = "Error";

/// Structured fields pulled from one article page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub url: String,
    pub title: Option<String>,
    pub content: Option<String>,
    pub headline: Option<String>,
    /// Free text as printed on the page; parsed when loaded.
    pub date: Option<String>,
    pub tags: Option<Vec<String>>,
    pub image: Option<String>,
}

impl ArticleRecord {
    /// Record standing in for a link that could not be fetched or parsed.
    ///
    /// Content is always absent, so the loader never persists it.
    pub fn failed(url: impl Into<String>, marker: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: Some(marker.into()),
            ..Self::default()
        }
    }

    pub fn tags(&self) -> &[String] {
        self.tags.as_deref().unwrap_or_default()
    }

    pub fn has_content(&self) -> bool {
        self.content.is_some()
    }
}
