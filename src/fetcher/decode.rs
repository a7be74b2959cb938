use encoding_rs::{Encoding, UTF_8};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

static HEADER_CHARSET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)charset\s*=\s*["']?([^"'\s;]+)"#).unwrap());

// Matches both <meta charset=..> and the http-equiv content-type form.
static META_CHARSET_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta\s+[^>]*?charset\s*=\s*["']?([^"'\s;/>]+)"#).unwrap()
});

const SNIFF_WINDOW: usize = 4096;

/// Decode a response body to UTF-8, replacing undecodable sequences.
///
/// The encoding is taken from the `Content-Type` header, then from a `<meta>`
/// declaration in the first 4KB, then guessed with `chardetng`.
pub fn decode_body(content_type: &str, body: &[u8]) -> (String, &'static Encoding) {
    let encoding = sniff_encoding(content_type, body);
    let (decoded, _, had_errors) = encoding.decode(body);
    if had_errors {
        debug!(encoding = encoding.name(), "body contained undecodable bytes");
    }
    (decoded.into_owned(), encoding)
}

fn sniff_encoding(content_type: &str, body: &[u8]) -> &'static Encoding {
    if let Some(encoding) = label_from(&HEADER_CHARSET_REGEX, content_type) {
        return encoding;
    }

    let window = &body[..body.len().min(SNIFF_WINDOW)];
    let head = String::from_utf8_lossy(window);
    if let Some(encoding) = label_from(&META_CHARSET_REGEX, &head) {
        return encoding;
    }

    if std::str::from_utf8(body).is_ok() {
        return UTF_8;
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(window, false);
    detector.guess(None, true)
}

fn label_from(regex: &Regex, haystack: &str) -> Option<&'static Encoding> {
    let label = regex.captures(haystack)?.get(1)?.as_str().to_lowercase();
    Encoding::for_label(label.as_bytes())
}
