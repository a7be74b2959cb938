use reqwest::StatusCode;
use url::Url;

/// A successfully fetched page, already decoded to UTF-8.
#[derive(Debug, Clone)]
pub struct RawPage {
    /// URL that was requested; the article's unique key.
    pub url: Url,
    pub status: StatusCode,
    pub body: String,
    pub encoding: &'static str,
}
