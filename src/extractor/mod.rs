//! Field extraction from article pages.
//!
//! Every field except the image is optional: when its anchor element is
//! missing the field is left empty instead of failing the page.

pub mod model;

#[cfg(test)]
mod tests;

pub use model::ArticleRecord;

use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use thiserror::Error;

use crate::fetcher::RawPage;

static CONTENT_CONTAINER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#article-content").unwrap());
static PARAGRAPH: LazyLock<Selector> = LazyLock::new(|| Selector::parse("p").unwrap());
static TITLE: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(
        r#"[class="mt-2.5 mb-6 font-semibold font-serif text-7xl leading-none max-[767px]:text-left max-[767px]:text-black max-[960px]:text-[42px] min-[768px]:mt-11 print:text-4xl"]"#,
    )
    .unwrap()
});
static HEADLINE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"[class="sc-d0d42ecb-4 bXNXzL"]"#).unwrap());
static DATE_CONTAINER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"[class="sc-2f963901-17 kSvvwV"]"#).unwrap());
static DIV: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div").unwrap());
static TAG_LIST: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"[class="sc-2f963901-13 ezPZgh"]"#).unwrap());
static LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());
static IMAGE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img").unwrap());

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("page has no image with a src attribute")]
    MissingImage,
}

/// Extract an [`ArticleRecord`] from a fetched page.
pub fn extract(page: &RawPage) -> Result<ArticleRecord, ExtractError> {
    extract_html(page.url.as_str(), &page.body)
}

/// Extract an [`ArticleRecord`] from raw HTML. `url` is copied into the record.
pub fn extract_html(url: &str, html: &str) -> Result<ArticleRecord, ExtractError> {
    let document = Html::parse_document(html);

    Ok(ArticleRecord {
        url: url.to_string(),
        title: first_text(&document, &TITLE),
        content: content(&document),
        headline: first_text(&document, &HEADLINE),
        date: date(&document),
        tags: tags(&document),
        image: Some(image(&document)?),
    })
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>()
}

fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .map(|el| text_of(el).trim().to_string())
}

/// Paragraph text of the article body, joined without a separator.
fn content(document: &Html) -> Option<String> {
    let container = document.select(&CONTENT_CONTAINER).next()?;
    Some(container.select(&PARAGRAPH).map(text_of).collect())
}

/// The publish date is the second `div` inside its container.
fn date(document: &Html) -> Option<String> {
    let container = document.select(&DATE_CONTAINER).next()?;
    container
        .select(&DIV)
        .nth(1)
        .map(|el| text_of(el).trim().to_string())
}

fn tags(document: &Html) -> Option<Vec<String>> {
    let container = document.select(&TAG_LIST).next()?;
    Some(
        container
            .select(&LINK)
            .map(|a| text_of(a).trim().to_string())
            .collect(),
    )
}

fn image(document: &Html) -> Result<String, ExtractError> {
    document
        .select(&IMAGE)
        .next()
        .and_then(|img| img.value().attr("src"))
        .map(str::to_string)
        .ok_or(ExtractError::MissingImage)
}
