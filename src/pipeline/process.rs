// src/pipeline/process.rs

//! Shared fetch → extract → publish pipeline for a single URL.
//!
//! Both roles run this exact path: the worker per consumed message, the
//! submitter once for the seed URL.

use crate::error::Result;
use crate::services::{FetchAgent, LinkSink, extract_links, page_title};

/// Process one URL end-to-end and return the number of links published.
///
/// A fetch failure is terminal for this URL: it is logged and yields zero
/// links, never an error. Links are extracted against the original
/// (pre-redirect) URL and published in discovery order as independent
/// messages; a publish failure is logged and the remaining links are still
/// attempted — already-published links are not rolled back.
pub async fn process_url(fetcher: &FetchAgent, sink: &dyn LinkSink, url: &str) -> Result<usize> {
    let page = match fetcher.fetch(url).await {
        Ok(page) => page,
        Err(e) => {
            log::warn!("Error fetching {url}: {e}");
            return Ok(0);
        }
    };

    let title = page_title(&page.body).unwrap_or_else(|| "Untitled".to_string());
    log::info!("Processing \"{title}\" ({url})");

    let links = extract_links(&page.body, url);
    if links.is_empty() {
        log::info!("No links found on {url}");
        return Ok(0);
    }

    let mut published = 0;
    for link in &links {
        match sink.publish_link(link).await {
            Ok(()) => {
                log::info!("Sent: {link}");
                published += 1;
            }
            Err(e) => {
                log::error!("Failed to publish {link}: {e}");
            }
        }
    }

    Ok(published)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FetchConfig;
    use crate::error::AppError;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Captures published links in memory.
    #[derive(Default)]
    struct VecSink {
        links: Mutex<Vec<String>>,
    }

    impl VecSink {
        fn links(&self) -> Vec<String> {
            self.links.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LinkSink for VecSink {
        async fn publish_link(&self, link: &str) -> Result<()> {
            self.links.lock().unwrap().push(link.to_string());
            Ok(())
        }
    }

    /// Fails the first publish, accepts the rest.
    #[derive(Default)]
    struct FlakySink {
        failed_once: AtomicBool,
        inner: VecSink,
    }

    #[async_trait]
    impl LinkSink for FlakySink {
        async fn publish_link(&self, link: &str) -> Result<()> {
            if !self.failed_once.swap(true, Ordering::SeqCst) {
                return Err(AppError::queue("broker rejected publish"));
            }
            self.inner.publish_link(link).await
        }
    }

    fn fetcher() -> FetchAgent {
        FetchAgent::new(&FetchConfig::default()).unwrap()
    }

    async fn serve_page(server: &MockServer, route: &str, body: String) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_string(body),
            )
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_links_published_in_discovery_order() {
        let server = MockServer::start().await;
        serve_page(
            &server,
            "/",
            r#"<a href="/first">1</a><img src="/second.png"><a href="/third">3</a>"#.to_string(),
        )
        .await;

        let sink = VecSink::default();
        let count = process_url(&fetcher(), &sink, &format!("{}/", server.uri()))
            .await
            .unwrap();

        assert_eq!(count, 3);
        assert_eq!(
            sink.links(),
            vec![
                format!("{}/first", server.uri()),
                format!("{}/second.png", server.uri()),
                format!("{}/third", server.uri()),
            ]
        );
    }

    #[tokio::test]
    async fn test_published_payload_is_the_exact_link_string() {
        let server = MockServer::start().await;
        serve_page(
            &server,
            "/",
            r#"<a href="/page2?x=1&y=2">p</a>"#.to_string(),
        )
        .await;

        let sink = VecSink::default();
        process_url(&fetcher(), &sink, &format!("{}/", server.uri()))
            .await
            .unwrap();

        let expected = format!("{}/page2?x=1&y=2", server.uri());
        assert_eq!(sink.links(), vec![expected.clone()]);
        // Wire payload is the raw UTF-8 bytes of the link, no framing.
        assert_eq!(sink.links()[0].as_bytes(), expected.as_bytes());
    }

    #[tokio::test]
    async fn test_fetch_failure_completes_with_zero_links() {
        let sink = VecSink::default();
        let count = process_url(&fetcher(), &sink, "http://127.0.0.1:1/down")
            .await
            .unwrap();
        assert_eq!(count, 0);
        assert!(sink.links().is_empty());
    }

    #[tokio::test]
    async fn test_non_success_status_completes_with_zero_links() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let sink = VecSink::default();
        let count = process_url(&fetcher(), &sink, &format!("{}/gone", server.uri()))
            .await
            .unwrap();
        assert_eq!(count, 0);
        assert!(sink.links().is_empty());
    }

    #[tokio::test]
    async fn test_page_without_links_completes_with_zero_links() {
        let server = MockServer::start().await;
        serve_page(&server, "/", "<html><body>leaf page</body></html>".to_string()).await;

        let sink = VecSink::default();
        let count = process_url(&fetcher(), &sink, &format!("{}/", server.uri()))
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    // At-least-once redelivery means reprocessing a URL repeats all of its
    // side effects. That duplication is the contract, not a bug.
    #[tokio::test]
    async fn test_reprocessing_a_url_duplicates_side_effects() {
        let server = MockServer::start().await;
        serve_page(&server, "/", r#"<a href="/page2">p</a>"#.to_string()).await;

        let sink = VecSink::default();
        let url = format!("{}/", server.uri());
        process_url(&fetcher(), &sink, &url).await.unwrap();
        process_url(&fetcher(), &sink, &url).await.unwrap();

        let link = format!("{}/page2", server.uri());
        assert_eq!(sink.links(), vec![link.clone(), link]);
    }

    // A publish failure mid-batch is not rolled back; later links in the
    // same page are still attempted.
    #[tokio::test]
    async fn test_publish_failure_skips_link_and_continues() {
        let server = MockServer::start().await;
        serve_page(
            &server,
            "/",
            r#"<a href="/a">a</a><a href="/b">b</a>"#.to_string(),
        )
        .await;

        let sink = FlakySink::default();
        let count = process_url(&fetcher(), &sink, &format!("{}/", server.uri()))
            .await
            .unwrap();

        assert_eq!(count, 1);
        assert_eq!(sink.inner.links(), vec![format!("{}/b", server.uri())]);
    }

    // The end-to-end seed scenario, observed at the sink seam: a seed page
    // with one same-origin anchor produces exactly one queued message.
    #[tokio::test]
    async fn test_seed_page_with_single_anchor_queues_one_message() {
        let server = MockServer::start().await;
        serve_page(
            &server,
            "/",
            r#"<html><head><title>seed</title></head>
               <body><a href="/page2">next</a></body></html>"#
                .to_string(),
        )
        .await;
        serve_page(&server, "/page2", "<html><body>leaf</body></html>".to_string()).await;

        let sink = VecSink::default();
        let seeded = process_url(&fetcher(), &sink, &format!("{}/", server.uri()))
            .await
            .unwrap();
        assert_eq!(seeded, 1);
        assert_eq!(sink.links(), vec![format!("{}/page2", server.uri())]);

        // The worker's turn: the discovered page has no links, so nothing
        // further is published.
        let followup = process_url(&fetcher(), &sink, &sink.links()[0]).await.unwrap();
        assert_eq!(followup, 0);
        assert_eq!(sink.links().len(), 1);
    }
}
