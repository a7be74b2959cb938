use std::fs;

use crate::extractor::{ExtractError, extract_html};

const URL: &str = "https://aeon.co/essays/the-quiet-mind";

fn fixture() -> String {
    fs::read_to_string("src/extractor/tests/fixtures/essay.html")
        .expect("Failed to read test fixture")
}

#[test]
fn test_extract_full_essay() {
    let record = extract_html(URL, &fixture()).unwrap();

    assert_eq!(record.url, URL);
    assert_eq!(record.title.as_deref(), Some("The quiet mind"));
    assert_eq!(
        record.headline.as_deref(),
        Some("What stillness can teach us about attention")
    );
    assert_eq!(record.date.as_deref(), Some("12 March 2024"));
    assert_eq!(record.tags(), ["Philosophy", "Mind"]);
    // First image in document order, not the one inside the body
    assert_eq!(
        record.image.as_deref(),
        Some("https://images.aeonmedia.co/logo.png")
    );
}

#[test]
fn test_content_joins_paragraphs_without_separator() {
    let record = extract_html(URL, &fixture()).unwrap();
    assert_eq!(
        record.content.as_deref(),
        Some("Attention is a scarce resource.We spend it carelessly.")
    );
}

#[test]
fn test_missing_tag_list_yields_empty_tags() {
    let html = fixture().replace("sc-2f963901-13 ezPZgh", "unrelated");
    let record = extract_html(URL, &html).unwrap();

    assert!(record.tags.is_none());
    assert!(record.tags().is_empty());
    assert!(record.title.is_some());
    assert!(record.content.is_some());
    assert!(record.headline.is_some());
    assert!(record.date.is_some());
    assert!(record.image.is_some());
}

#[test]
fn test_missing_anchors_leave_fields_empty() {
    let html = r#"<html><body><img src="/hero.jpg"><p>Loose text</p></body></html>"#;
    let record = extract_html(URL, html).unwrap();

    assert!(record.title.is_none());
    assert!(record.content.is_none());
    assert!(record.headline.is_none());
    assert!(record.date.is_none());
    assert!(record.tags.is_none());
    assert_eq!(record.image.as_deref(), Some("/hero.jpg"));
}

#[test]
fn test_date_container_with_single_div() {
    let html = r#"<html><body><img src="a.jpg">
        <div class="sc-2f963901-17 kSvvwV"><div>by Someone</div></div></body></html>"#;
    let record = extract_html(URL, html).unwrap();
    assert!(record.date.is_none());
}

#[test]
fn test_empty_article_body_is_empty_not_missing() {
    let html = r#"<html><body><img src="a.jpg"><div id="article-content"></div></body></html>"#;
    let record = extract_html(URL, html).unwrap();
    assert_eq!(record.content.as_deref(), Some(""));
}

#[test]
fn test_missing_image_is_an_error() {
    let html = fixture().replace("<img", "<span");
    assert_eq!(extract_html(URL, &html), Err(ExtractError::MissingImage));
}

#[test]
fn test_malformed_html() {
    let html = "<html><body><img src=x.png><div id=article-content><p>Unclosed <p>tags";
    let record = extract_html(URL, html).unwrap();
    let content = record.content.unwrap();
    assert!(content.contains("Unclosed"));
    assert!(content.contains("tags"));
}

#[cfg(feature = "fuzz")]
mod fuzz {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_extract_never_panics(html in ".*") {
            let _ = extract_html(URL, &html);
        }

        #[test]
        fn test_image_present_means_success(body in "[a-zA-Z ]{0,200}") {
            let html = format!(r#"<html><body><img src="i.png"><div id="article-content"><p>{body}</p></div></body></html>"#);
            let record = extract_html(URL, &html).unwrap();
            prop_assert_eq!(record.content.as_deref(), Some(body.as_str()));
        }
    }
}
