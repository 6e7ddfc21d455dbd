//! Link-preview text enricher.
//!
//! Scans a question for URLs, fetches each page, and appends its title and
//! meta description so the panel can answer questions about linked content.
//! Enrichment is best effort: a failed fetch leaves the text unchanged for
//! that link.

use async_trait::async_trait;
use council_application::{LinkMeta, TextEnricher};
use futures::future::join_all;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::debug;

/// Maximum number of links fetched per question
const MAX_LINKS: usize = 5;

/// Maximum response body size (2 MB)
const MAX_BODY_SIZE: usize = 2 * 1024 * 1024;

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?://[^\s<>"')\]]+"#).unwrap()
});

pub struct LinkPreviewEnricher {
    client: reqwest::Client,
}

impl LinkPreviewEnricher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    async fn fetch_preview(&self, url: &str) -> LinkMeta {
        match self.try_fetch(url).await {
            Ok((title, description)) => LinkMeta {
                url: url.to_string(),
                success: true,
                title,
                description,
            },
            Err(reason) => {
                debug!(url, reason, "Link preview fetch failed");
                LinkMeta {
                    url: url.to_string(),
                    success: false,
                    title: None,
                    description: None,
                }
            }
        }
    }

    async fn try_fetch(&self, url: &str) -> Result<(Option<String>, Option<String>), String> {
        let response = self
            .client
            .get(url)
            .header("User-Agent", "LlmCouncil/0.3 (Link Preview)")
            .timeout(FETCH_TIMEOUT)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("HTTP {}", status.as_u16()));
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if !content_type.contains("text/html") && !content_type.contains("application/xhtml") {
            return Err(format!("not HTML: {content_type}"));
        }

        // Reject declared-oversized responses before downloading them
        if body_size_exceeded(response.content_length()) {
            return Err(format!(
                "body too large: {} bytes declared",
                response.content_length().unwrap_or(0)
            ));
        }

        let body = response.bytes().await.map_err(|e| e.to_string())?;
        if body.len() > MAX_BODY_SIZE {
            return Err(format!("body too large: {} bytes", body.len()));
        }

        Ok(extract_metadata(&String::from_utf8_lossy(&body)))
    }
}

impl Default for LinkPreviewEnricher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextEnricher for LinkPreviewEnricher {
    async fn enrich(&self, text: &str) -> (String, Vec<LinkMeta>) {
        let urls = extract_urls(text);
        if urls.is_empty() {
            return (text.to_string(), Vec::new());
        }

        let fetches = urls.iter().map(|url| self.fetch_preview(url));
        let links = join_all(fetches).await;

        let mut enriched = text.to_string();
        for link in links.iter().filter(|l| l.success) {
            enriched.push_str("\n\n");
            enriched.push_str(&format_link_block(link));
        }
        (enriched, links)
    }
}

/// True when the declared Content-Length exceeds [`MAX_BODY_SIZE`].
///
/// Servers that omit the header pass the pre-check; the post-read size
/// check still applies to them.
fn body_size_exceeded(declared: Option<u64>) -> bool {
    declared.is_some_and(|len| len > MAX_BODY_SIZE as u64)
}

/// Extract up to [`MAX_LINKS`] distinct URLs in order of first appearance
fn extract_urls(text: &str) -> Vec<String> {
    let mut urls = Vec::new();
    for m in URL_PATTERN.find_iter(text) {
        // Trailing punctuation belongs to the sentence, not the URL
        let url = m.as_str().trim_end_matches(['.', ',', ';', ':', '!', '?']);
        if url.is_empty() || urls.iter().any(|u| u == url) {
            continue;
        }
        urls.push(url.to_string());
        if urls.len() == MAX_LINKS {
            break;
        }
    }
    urls
}

/// Pull `<title>` and the meta description out of an HTML document
fn extract_metadata(html: &str) -> (Option<String>, Option<String>) {
    let document = Html::parse_document(html);

    let title_selector = Selector::parse("title").unwrap();
    let title = document
        .select(&title_selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty());

    let description_selector =
        Selector::parse(r#"meta[name="description"], meta[property="og:description"]"#).unwrap();
    let description = document
        .select(&description_selector)
        .find_map(|el| el.value().attr("content"))
        .map(|c| c.trim().to_string())
        .filter(|d| !d.is_empty());

    (title, description)
}

fn format_link_block(link: &LinkMeta) -> String {
    let mut block = format!("<link_content url=\"{}\">", link.url);
    if let Some(title) = &link.title {
        block.push_str(&format!("\nTitle: {title}"));
    }
    if let Some(description) = &link.description {
        block.push_str(&format!("\nDescription: {description}"));
    }
    block.push_str("\n</link_content>");
    block
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_urls() {
        let text = "See https://example.com/docs and http://other.org/page?q=1.";
        assert_eq!(
            extract_urls(text),
            vec!["https://example.com/docs", "http://other.org/page?q=1"]
        );
    }

    #[test]
    fn test_extract_urls_dedupes_and_caps() {
        let text = (0..10)
            .map(|i| format!("https://site{i}.example https://site0.example"))
            .collect::<Vec<_>>()
            .join(" ");
        let urls = extract_urls(&text);
        assert_eq!(urls.len(), MAX_LINKS);
        assert_eq!(urls[0], "https://site0.example");
    }

    #[test]
    fn test_extract_urls_none() {
        assert!(extract_urls("no links here").is_empty());
    }

    #[test]
    fn test_body_size_pre_check_uses_declared_length() {
        assert!(body_size_exceeded(Some(MAX_BODY_SIZE as u64 + 1)));
        assert!(!body_size_exceeded(Some(MAX_BODY_SIZE as u64)));
        assert!(!body_size_exceeded(Some(512)));
        assert!(!body_size_exceeded(None));
    }

    #[test]
    fn test_extract_metadata() {
        let html = r#"
        <html><head>
            <title> Example Page </title>
            <meta name="description" content="A page about examples.">
        </head><body><p>hi</p></body></html>
        "#;
        let (title, description) = extract_metadata(html);
        assert_eq!(title.as_deref(), Some("Example Page"));
        assert_eq!(description.as_deref(), Some("A page about examples."));
    }

    #[test]
    fn test_extract_metadata_og_description_fallback() {
        let html = r#"
        <html><head>
            <meta property="og:description" content="Social summary">
        </head></html>
        "#;
        let (title, description) = extract_metadata(html);
        assert!(title.is_none());
        assert_eq!(description.as_deref(), Some("Social summary"));
    }

    #[test]
    fn test_format_link_block() {
        let link = LinkMeta {
            url: "https://example.com".to_string(),
            success: true,
            title: Some("Example".to_string()),
            description: None,
        };
        assert_eq!(
            format_link_block(&link),
            "<link_content url=\"https://example.com\">\nTitle: Example\n</link_content>"
        );
    }

    #[tokio::test]
    async fn test_enrich_without_links_is_identity() {
        let enricher = LinkPreviewEnricher::new();
        let (text, links) = enricher.enrich("plain question").await;
        assert_eq!(text, "plain question");
        assert!(links.is_empty());
    }
}
