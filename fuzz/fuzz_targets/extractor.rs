#![no_main]

use libfuzzer_sys::fuzz_target;

use harvest::discovery::scan_links;
use harvest::extractor::extract_html;

fuzz_target!(|data: &[u8]| {
    let html = String::from_utf8_lossy(data);

    // Neither the article extractor nor the link scanner may panic
    let _ = extract_html("https://aeon.co/essays/fuzz", &html);
    let _ = scan_links(&html);
});
