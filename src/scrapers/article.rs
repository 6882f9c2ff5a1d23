//! Article page retrieval and main-text extraction.
//!
//! Pages are fetched one at a time. The main content of a page is taken to
//! be its longest run of consecutive sibling `<p>` elements; paragraphs
//! inside navigation, headers, footers, sidebars and forms are ignored.
//!
//! Failures never abort the batch: the article keeps an empty `content`
//! and the reason is stored in `scrape_error`.

use crate::config::{DelayRange, PipelineConfig};
use crate::error::FetchError;
use crate::models::Article;
use crate::utils::{collapse_whitespace, truncate_chars};
use once_cell::sync::Lazy;
use rand::{Rng, rng};
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use scraper::{ElementRef, Html, Node, Selector};
use std::time::Duration as StdDuration;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};
use url::Url;

static PARAGRAPH_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p").expect("static selector"));

/// Containers whose paragraphs are never article text.
const BOILERPLATE_TAGS: &[&str] = &["nav", "header", "footer", "aside", "form"];

/// Outcome counters of one [`ContentRetriever::enrich`] pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScrapeStats {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
}

#[derive(Debug)]
pub struct ContentRetriever {
    http: reqwest::Client,
    max_chars: usize,
    delay: DelayRange,
}

impl ContentRetriever {
    pub fn new(config: &PipelineConfig) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml"),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("en-US,en;q=0.9,de;q=0.8"),
        );
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .timeout(StdDuration::from_secs(config.scrape_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            max_chars: config.max_content_chars,
            delay: config.scrape_delay_ms,
        })
    }

    /// Fetch one page and extract its main text.
    #[instrument(level = "info", skip_all, fields(%url))]
    pub async fn fetch_content(&self, url: &str) -> Result<String, FetchError> {
        let parsed = Url::parse(url).map_err(|_| FetchError::UnsupportedUrl(url.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::UnsupportedUrl(url.to_string()));
        }

        let resp = self.http.get(parsed).send().await?;
        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            return Err(FetchError::Status(status));
        }
        let body = resp.text().await?;

        let text = extract_main_text(&body).ok_or(FetchError::NoContent)?;
        let text = truncate_chars(&text, self.max_chars);
        info!(chars = text.chars().count(), "Extracted article content");
        Ok(text)
    }

    /// Retrieve content for the first `max` articles (all when `None`), in order.
    ///
    /// The collection length never changes; failed articles get `scrape_error`.
    #[instrument(level = "info", skip_all, fields(total = articles.len(), ?max))]
    pub async fn enrich(&self, articles: &mut [Article], max: Option<usize>) -> ScrapeStats {
        let limit = max.unwrap_or(articles.len()).min(articles.len());
        let mut stats = ScrapeStats::default();

        for (i, article) in articles.iter_mut().take(limit).enumerate() {
            if i > 0 {
                self.pause().await;
            }
            stats.attempted += 1;
            debug!(index = i, url = %article.url, "Retrieving article content");

            match self.fetch_content(&article.url).await {
                Ok(text) => {
                    article.content = Some(text);
                    article.scrape_error = None;
                    stats.succeeded += 1;
                }
                Err(e) => {
                    warn!(index = i, url = %article.url, error = %e, "Content retrieval failed; keeping article without content");
                    article.content = None;
                    article.scrape_error = Some(e.to_string());
                    stats.failed += 1;
                }
            }
        }

        info!(
            attempted = stats.attempted,
            succeeded = stats.succeeded,
            failed = stats.failed,
            "Content retrieval finished"
        );
        stats
    }

    async fn pause(&self) {
        if self.delay.max == 0 {
            return;
        }
        let ms = rng().random_range(self.delay.min..=self.delay.max);
        sleep(StdDuration::from_millis(ms)).await;
    }
}

fn element_name(node: &Node) -> Option<&str> {
    node.as_element().map(|e| e.name())
}

fn is_skippable(node: &Node) -> bool {
    match node {
        Node::Text(t) => t.trim().is_empty(),
        Node::Comment(_) => true,
        _ => false,
    }
}

/// A paragraph starts a run unless its nearest meaningful previous sibling
/// is also a paragraph.
fn starts_run(p: &ElementRef<'_>) -> bool {
    p.prev_siblings()
        .find(|n| !is_skippable(n.value()))
        .is_none_or(|n| element_name(n.value()) != Some("p"))
}

fn in_boilerplate(p: &ElementRef<'_>) -> bool {
    p.ancestors()
        .filter_map(|n| element_name(n.value()))
        .any(|name| BOILERPLATE_TAGS.contains(&name))
}

fn paragraph_text(p: ElementRef<'_>) -> String {
    collapse_whitespace(&p.text().collect::<String>())
}

/// Extract the longest contiguous block of paragraph text from an HTML page.
///
/// Paragraphs in one block are separated by a blank line. Returns `None` when
/// the page has no non-empty paragraph outside boilerplate containers.
pub fn extract_main_text(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let mut best: Option<(usize, String)> = None;

    for p in document.select(&PARAGRAPH_SELECTOR) {
        if !starts_run(&p) || in_boilerplate(&p) {
            continue;
        }

        let mut paragraphs = vec![paragraph_text(p)];
        for sibling in p.next_siblings() {
            if is_skippable(sibling.value()) {
                continue;
            }
            match ElementRef::wrap(sibling) {
                Some(el) if el.value().name() == "p" => paragraphs.push(paragraph_text(el)),
                _ => break,
            }
        }

        let block = paragraphs
            .into_iter()
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");
        let len = block.chars().count();
        if len > 0 && best.as_ref().is_none_or(|(best_len, _)| len > *best_len) {
            best = Some((len, block));
        }
    }

    best.map(|(_, text)| text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawArticle;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAGE: &str = r#"<html><head><title>T</title><script>var x = "<p>no</p>";</script></head>
<body>
  <header><p>Abo abschließen und weiterlesen, jetzt mit Rabatt für alle neuen Leser!</p></header>
  <nav><p>Startseite</p><p>Politik</p><p>Wirtschaft</p><p>Sport</p><p>Kultur und Medien</p></nav>
  <div class="teaser"><p>Kurzer Teaser.</p></div>
  <article>
    <h1>Ransomware legt Klinik lahm</h1>
    <p>Ein Angriff hat die IT des Spitals lahmgelegt.</p>
    <!-- ad slot -->
    <p>Die Täter fordern   ein Lösegeld.</p>
    <p>Die Polizei ermittelt.</p>
    <div class="ad">Anzeige</div>
    <p>Nach der Anzeige.</p>
  </article>
  <footer><p>Impressum Datenschutz Kontakt Karriere Werbung Nutzungsbedingungen Cookies</p></footer>
</body></html>"#;

    fn test_config() -> PipelineConfig {
        PipelineConfig {
            scrape_delay_ms: DelayRange { min: 0, max: 0 },
            scrape_timeout_secs: 5,
            ..PipelineConfig::default()
        }
    }

    fn article(url: &str) -> Article {
        Article::from_raw(
            RawArticle {
                title: Some(format!("Article at {url}")),
                url: Some(url.to_string()),
                description: Some("desc".to_string()),
                ..Default::default()
            },
            "everything",
        )
    }

    #[test]
    fn test_extract_longest_paragraph_run() {
        let text = extract_main_text(PAGE).unwrap();
        assert_eq!(
            text,
            "Ein Angriff hat die IT des Spitals lahmgelegt.\n\nDie Täter fordern ein Lösegeld.\n\nDie Polizei ermittelt."
        );
    }

    #[test]
    fn test_extract_no_paragraphs() {
        assert_eq!(extract_main_text("<html><body><div>Only divs</div></body></html>"), None);
        assert_eq!(extract_main_text("<nav><p>Menu</p></nav><p>   </p>"), None);
    }

    #[test]
    fn test_extract_single_long_paragraph_beats_short_run() {
        let html = format!(
            "<div><p>a</p><p>b</p></div><section><p>{}</p></section>",
            "lang ".repeat(20)
        );
        assert_eq!(extract_main_text(&html).unwrap(), "lang ".repeat(20).trim());
    }

    #[tokio::test]
    async fn test_fetch_content_truncates() {
        let server = MockServer::start().await;
        let html = format!("<p>{}</p>", "x".repeat(100));
        Mock::given(method("GET"))
            .and(path("/long"))
            .respond_with(ResponseTemplate::new(200).set_body_string(html))
            .mount(&server)
            .await;

        let config = PipelineConfig {
            max_content_chars: 10,
            ..test_config()
        };
        let retriever = ContentRetriever::new(&config).unwrap();
        let text = retriever
            .fetch_content(&format!("{}/long", server.uri()))
            .await
            .unwrap();
        assert_eq!(text, format!("{}...", "x".repeat(10)));
    }

    #[tokio::test]
    async fn test_fetch_content_rejects_non_http() {
        let retriever = ContentRetriever::new(&test_config()).unwrap();
        assert!(matches!(
            retriever.fetch_content("ftp://example.com/a").await,
            Err(FetchError::UnsupportedUrl(_))
        ));
        assert!(matches!(
            retriever.fetch_content("").await,
            Err(FetchError::UnsupportedUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_enrich_isolates_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/empty"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<div>nothing</div>"))
            .mount(&server)
            .await;

        let mut articles = vec![
            // nothing listens on port 1
            article("http://127.0.0.1:1/unreachable"),
            article(&format!("{}/missing", server.uri())),
            article(&format!("{}/ok", server.uri())),
            article(&format!("{}/empty", server.uri())),
        ];
        let before = articles.clone();

        let retriever = ContentRetriever::new(&test_config()).unwrap();
        let stats = retriever.enrich(&mut articles, None).await;

        assert_eq!(
            stats,
            ScrapeStats {
                attempted: 4,
                succeeded: 1,
                failed: 3
            }
        );
        assert_eq!(articles.len(), 4);
        assert!(articles[0].scrape_error.is_some());
        assert!(articles[1].scrape_error.as_deref().unwrap().contains("404"));
        assert!(articles[2].content.as_deref().unwrap().starts_with("Ein Angriff"));
        assert_eq!(articles[2].scrape_error, None);
        assert_eq!(articles[3].scrape_error.as_deref(), Some("no paragraph content found"));
        for (after, before) in articles.iter().zip(&before) {
            assert_eq!(after.title, before.title);
            assert_eq!(after.url, before.url);
        }
    }

    #[tokio::test]
    async fn test_enrich_respects_max() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
            .expect(2)
            .mount(&server)
            .await;

        let mut articles: Vec<Article> = (0..4)
            .map(|i| article(&format!("{}/a{i}", server.uri())))
            .collect();
        let retriever = ContentRetriever::new(&test_config()).unwrap();
        let stats = retriever.enrich(&mut articles, Some(2)).await;

        assert_eq!(stats.attempted, 2);
        assert_eq!(articles.len(), 4);
        assert!(articles[0].content.is_some());
        assert!(articles[1].content.is_some());
        assert!(articles[2].content.is_none());
        assert!(articles[3].scrape_error.is_none());
    }
}
