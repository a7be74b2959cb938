use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

/// Every `href` on the page, in document order, without repeats.
pub fn scan_links(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();

    document
        .select(&ANCHOR)
        .filter_map(|a| a.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .filter(|href| seen.insert(href.to_string()))
        .map(str::to_string)
        .collect()
}

/// Resolve a discovered link against the site origin.
///
/// Root-relative links get the origin prefixed; absolute links are kept.
pub fn absolutize(base: &Url, link: &str) -> Option<Url> {
    base.join(link.trim()).ok()
}
