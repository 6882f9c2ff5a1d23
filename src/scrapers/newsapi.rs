//! NewsAPI search client.
//!
//! Articles are discovered through [NewsAPI](https://newsapi.org) with several
//! query variants to maximize recall:
//!
//! - one `top-headlines` request per DACH country (category `technology`)
//! - one `everything` request restricted to DACH news domains and the
//!   lookback window
//!
//! A failing variant is logged and skipped. Only when every variant fails
//! does [`NewsApiClient::fetch_all`] return [`PipelineError::FetchExhausted`].

use crate::config::PipelineConfig;
use crate::error::{FetchError, PipelineError};
use crate::models::{Article, NewsApiResponse};
use crate::utils::truncate_for_log;
use chrono::{Days, NaiveDate};
use futures::stream::{self, StreamExt};
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::time::Duration as StdDuration;
use tracing::{debug, error, info, instrument, warn};

const PAGE_SIZE: &str = "100";

/// One search request against NewsAPI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchQuery {
    TopHeadlines { country: String },
    Everything { from: NaiveDate, to: NaiveDate },
}

impl SearchQuery {
    /// Label stored in [`Article::origin`].
    pub fn label(&self) -> String {
        match self {
            SearchQuery::TopHeadlines { country } => format!("top-headlines:{country}"),
            SearchQuery::Everything { .. } => "everything".to_string(),
        }
    }

    fn endpoint(&self) -> &'static str {
        match self {
            SearchQuery::TopHeadlines { .. } => "top-headlines",
            SearchQuery::Everything { .. } => "everything",
        }
    }

    fn params(&self, q: &str, config: &PipelineConfig) -> Vec<(&'static str, String)> {
        let mut params = vec![("q", q.to_string()), ("pageSize", PAGE_SIZE.to_string())];
        match self {
            SearchQuery::TopHeadlines { country } => {
                params.push(("country", country.clone()));
                params.push(("category", "technology".to_string()));
            }
            SearchQuery::Everything { from, to } => {
                params.push(("domains", config.domains.join(",")));
                params.push(("from", from.format("%Y-%m-%d").to_string()));
                params.push(("to", to.format("%Y-%m-%d").to_string()));
                params.push(("language", config.language.clone()));
                params.push(("sortBy", "relevancy".to_string()));
            }
        }
        params
    }
}

/// Quote each keyword and join with `OR`: `"kw1" OR "kw2"`.
pub fn query_string(keywords: &[String]) -> String {
    keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .map(|k| format!("\"{k}\""))
        .collect::<Vec<_>>()
        .join(" OR ")
}

/// All query variants for a run: headlines per country, then everything.
///
/// Fails when the lookback reaches before the earliest representable date.
pub fn build_queries(
    config: &PipelineConfig,
    days_back: u32,
    today: NaiveDate,
) -> Result<Vec<SearchQuery>, PipelineError> {
    let from = today
        .checked_sub_days(Days::new(u64::from(days_back)))
        .ok_or_else(|| PipelineError::Config(format!("lookback of {days_back} days is out of range")))?;
    let mut queries: Vec<SearchQuery> = config
        .countries
        .iter()
        .map(|c| SearchQuery::TopHeadlines { country: c.clone() })
        .collect();
    queries.push(SearchQuery::Everything { from, to: today });
    Ok(queries)
}

pub struct NewsApiClient {
    http: reqwest::Client,
    api_key: SecretString,
    base_url: String,
}

impl fmt::Debug for NewsApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewsApiClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl NewsApiClient {
    pub fn new(api_key: SecretString, base_url: &str) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(StdDuration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Run one query variant and convert its records into articles.
    #[instrument(level = "info", skip_all, fields(query = %query.label()))]
    pub async fn search(
        &self,
        query: &SearchQuery,
        q: &str,
        config: &PipelineConfig,
    ) -> Result<Vec<Article>, FetchError> {
        let url = format!("{}/{}", self.base_url, query.endpoint());
        let resp = self
            .http
            .get(&url)
            .header("X-Api-Key", self.api_key.expose_secret())
            .query(&query.params(q, config))
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        let parsed = serde_json::from_str::<NewsApiResponse>(&body);

        if !status.is_success() {
            return Err(match parsed {
                Ok(NewsApiResponse {
                    code: Some(code),
                    message,
                    ..
                }) => FetchError::Api {
                    code,
                    message: message.unwrap_or_default(),
                },
                _ => FetchError::Status(status),
            });
        }

        let parsed = parsed.map_err(|e| {
            debug!(body = %truncate_for_log(&body, 300), "Unparseable search response");
            FetchError::Malformed(e.to_string())
        })?;

        if parsed.status.as_deref() != Some("ok") {
            return Err(FetchError::Api {
                code: parsed.code.unwrap_or_else(|| "unknown".to_string()),
                message: parsed.message.unwrap_or_default(),
            });
        }

        let label = query.label();
        let articles: Vec<Article> = parsed
            .articles
            .into_iter()
            .map(|raw| Article::from_raw(raw, &label))
            .collect();
        info!(
            count = articles.len(),
            total_results = parsed.total_results,
            "Search query returned articles"
        );
        Ok(articles)
    }

    /// Run every query variant and merge the results in query order.
    #[instrument(level = "info", skip_all, fields(days_back = days_back))]
    pub async fn fetch_all(
        &self,
        config: &PipelineConfig,
        days_back: u32,
        today: NaiveDate,
    ) -> Result<Vec<Article>, PipelineError> {
        let queries = build_queries(config, days_back, today)?;
        let q = query_string(&config.search_keywords);
        debug!(%q, variants = queries.len(), "Built search queries");

        let results: Vec<Result<Vec<Article>, FetchError>> = stream::iter(queries.iter())
            .then(|query| self.search(query, &q, config))
            .collect()
            .await;

        let attempted = results.len();
        let mut failed = 0usize;
        let mut articles = Vec::new();
        for (query, result) in queries.iter().zip(results) {
            match result {
                Ok(found) => articles.extend(found),
                Err(e) => {
                    failed += 1;
                    error!(query = %query.label(), error = %e, "Search query failed; skipping");
                }
            }
        }

        if failed == attempted {
            return Err(PipelineError::FetchExhausted { attempted });
        }
        if failed > 0 {
            warn!(failed, attempted, "Some search queries failed");
        }
        info!(count = articles.len(), "Fetched articles from all queries");
        Ok(articles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 10).unwrap()
    }

    fn ok_body(titles: &[(&str, &str)]) -> serde_json::Value {
        let articles: Vec<_> = titles
            .iter()
            .map(|(title, url)| {
                serde_json::json!({
                    "source": {"id": null, "name": "heise online"},
                    "title": title,
                    "url": url,
                    "description": "Beschreibung",
                    "publishedAt": "2025-05-09T08:00:00Z"
                })
            })
            .collect();
        serde_json::json!({"status": "ok", "totalResults": articles.len(), "articles": articles})
    }

    fn client(server: &MockServer) -> NewsApiClient {
        NewsApiClient::new(SecretString::from("news-key".to_string()), &server.uri()).unwrap()
    }

    #[test]
    fn test_query_string() {
        let kw = vec!["ransomware".to_string(), " data breach ".to_string(), "".to_string()];
        assert_eq!(query_string(&kw), "\"ransomware\" OR \"data breach\"");
    }

    #[test]
    fn test_build_queries() {
        let config = PipelineConfig::default();
        let queries = build_queries(&config, 7, today()).unwrap();
        assert_eq!(queries.len(), 4);
        assert_eq!(queries[0].label(), "top-headlines:de");
        assert_eq!(queries[2].label(), "top-headlines:ch");
        assert_eq!(
            queries[3],
            SearchQuery::Everything {
                from: NaiveDate::from_ymd_opt(2025, 5, 3).unwrap(),
                to: today(),
            }
        );
    }

    #[test]
    fn test_build_queries_rejects_unrepresentable_lookback() {
        let err = build_queries(&PipelineConfig::default(), u32::MAX, today()).unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[test]
    fn test_everything_params() {
        let config = PipelineConfig::default();
        let query = SearchQuery::Everything {
            from: NaiveDate::from_ymd_opt(2025, 5, 3).unwrap(),
            to: today(),
        };
        let params = query.params("\"hack\"", &config);
        assert!(params.contains(&("from", "2025-05-03".to_string())));
        assert!(params.contains(&("to", "2025-05-10".to_string())));
        assert!(params.contains(&("language", "de".to_string())));
        assert!(params.iter().any(|(k, v)| *k == "domains" && v.contains("heise.de")));
    }

    #[tokio::test]
    async fn test_fetch_all_skips_failed_queries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/top-headlines"))
            .and(query_param("country", "de"))
            .and(header("X-Api-Key", "news-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body(&[
                ("Hackerangriff auf Stadtwerke", "https://heise.de/1"),
                ("Ransomware in Klinik", "https://heise.de/2"),
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/top-headlines"))
            .and(query_param("country", "at"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/top-headlines"))
            .and(query_param("country", "ch"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "status": "error", "code": "rateLimited", "message": "Too many requests"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/everything"))
            .and(query_param("sortBy", "relevancy"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(ok_body(&[("Datenleck bei Versicherer", "https://nzz.ch/3")])),
            )
            .mount(&server)
            .await;

        let articles = client(&server)
            .fetch_all(&PipelineConfig::default(), 7, today())
            .await
            .unwrap();

        let got: Vec<(&str, &str)> = articles
            .iter()
            .map(|a| (a.title.as_str(), a.origin.as_str()))
            .collect();
        assert_eq!(
            got,
            vec![
                ("Hackerangriff auf Stadtwerke", "top-headlines:de"),
                ("Ransomware in Klinik", "top-headlines:de"),
                ("Datenleck bei Versicherer", "everything"),
            ]
        );
        assert_eq!(articles[0].source, "heise online");
    }

    #[tokio::test]
    async fn test_fetch_all_exhausted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = client(&server)
            .fetch_all(&PipelineConfig::default(), 7, today())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::FetchExhausted { attempted: 4 }));
    }

    #[tokio::test]
    async fn test_search_error_status_in_ok_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "error", "code": "apiKeyInvalid", "message": "bad key"
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .search(
                &SearchQuery::TopHeadlines { country: "de".to_string() },
                "\"hack\"",
                &PipelineConfig::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Api { ref code, .. } if code == "apiKeyInvalid"));
    }
}
