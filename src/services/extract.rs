// src/services/extract.rs

//! Same-origin link extraction from fetched pages.
//!
//! Scans anchor, image, video, and audio elements for `href`/`src`
//! attributes, resolves each candidate against the page URL, and keeps only
//! links that stay on the page's origin.

use scraper::{Html, Selector};
use url::Url;

/// Extract same-origin links from a page body.
///
/// Candidates are resolved against `source_url` with standard relative-URL
/// resolution, then filtered by a *string prefix* match against the page's
/// `scheme://host[:port]` origin. The prefix test is deliberately loose: a
/// link to `https://example.com.evil.com` passes against base
/// `https://example.com`. Callers must not assume strict host isolation.
///
/// Returns kept links in document order; duplicates within a page are kept.
/// Unparseable source URLs and malformed markup degrade to an empty list.
pub fn extract_links(body: &str, source_url: &str) -> Vec<String> {
    let Ok(source) = Url::parse(source_url) else {
        return Vec::new();
    };
    let Some(base_origin) = origin_prefix(&source) else {
        return Vec::new();
    };

    let document = Html::parse_document(body);
    // Static selector, known valid.
    let selector = Selector::parse("a, img, video, audio").unwrap();

    let mut links = Vec::new();
    for element in document.select(&selector) {
        let candidate = element
            .value()
            .attr("href")
            .or_else(|| element.value().attr("src"));
        let Some(candidate) = candidate else { continue };

        if let Ok(resolved) = source.join(candidate) {
            let resolved = resolved.to_string();
            if resolved.starts_with(&base_origin) {
                log::debug!("Link found: {resolved}");
                links.push(resolved);
            }
        }
    }
    links
}

/// Extract the page title, if any.
pub fn page_title(body: &str) -> Option<String> {
    let document = Html::parse_document(body);
    // Static selector, known valid.
    let selector = Selector::parse("title").unwrap();
    let title: String = document.select(&selector).next()?.text().collect();
    let title = title.trim();
    if title.is_empty() {
        None
    } else {
        Some(title.to_string())
    }
}

/// Compute the `scheme://host[:port]` prefix of a URL.
fn origin_prefix(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    match url.port() {
        Some(port) => Some(format!("{}://{}:{}", url.scheme(), host, port)),
        None => Some(format!("{}://{}", url.scheme(), host)),
    }
}
