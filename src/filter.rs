//! Deduplication and keyword filtering of fetched articles.
//!
//! Both steps only ever remove articles: the output is the input with some
//! elements dropped, order and field values untouched.

use crate::models::Article;
use itertools::Itertools;
use serde::Deserialize;
use tracing::{debug, info, instrument};

/// Title NewsAPI substitutes for articles that were taken down.
const REMOVED_PLACEHOLDER: &str = "[Removed]";

/// Which article field identifies duplicates, and which one is the fallback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupStrategy {
    /// URL, falling back to the normalized title when the URL is empty.
    #[default]
    UrlThenTitle,
    /// Normalized title, falling back to the URL when the title is empty.
    TitleThenUrl,
}

/// Lowercase, keep alphanumerics, collapse everything else to single spaces.
pub fn normalize_title(title: &str) -> String {
    title
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .join(" ")
}

/// Identity key of an article under `strategy`, or `None` if it has neither
/// URL nor title.
pub fn identity(article: &Article, strategy: DedupStrategy) -> Option<String> {
    let url = article.url.trim();
    let title = normalize_title(&article.title);
    let by_url = (!url.is_empty()).then(|| format!("url:{url}"));
    let by_title = (!title.is_empty()).then(|| format!("title:{title}"));

    match strategy {
        DedupStrategy::UrlThenTitle => by_url.or(by_title),
        DedupStrategy::TitleThenUrl => by_title.or(by_url),
    }
}

/// Remove duplicates; the first occurrence of each identity wins.
///
/// Articles without any identity cannot be compared and are dropped.
pub fn dedup(articles: Vec<Article>, strategy: DedupStrategy) -> Vec<Article> {
    articles
        .into_iter()
        .filter_map(|a| identity(&a, strategy).map(|id| (id, a)))
        .unique_by(|(id, _)| id.clone())
        .map(|(_, a)| a)
        .collect()
}

/// True if title or description contains one of the (lowercased) keywords.
pub fn matches_keywords(article: &Article, keywords: &[String]) -> bool {
    let haystack = format!("{} {}", article.title, article.description).to_lowercase();
    keywords.iter().any(|k| haystack.contains(k.as_str()))
}

/// Keep only the articles matching at least one keyword.
pub fn keyword_filter(articles: Vec<Article>, keywords: &[String]) -> Vec<Article> {
    articles
        .into_iter()
        .filter(|a| {
            let keep = matches_keywords(a, keywords);
            if !keep {
                debug!(title = %a.title, "Dropping article without topic keyword");
            }
            keep
        })
        .collect()
}

/// Full curation step: drop takedown placeholders, dedup, keyword filter.
#[instrument(level = "info", skip_all, fields(input = articles.len()))]
pub fn curate(
    articles: Vec<Article>,
    strategy: DedupStrategy,
    keywords: &[String],
) -> Vec<Article> {
    let input = articles.len();
    let live: Vec<Article> = articles
        .into_iter()
        .filter(|a| a.title != REMOVED_PLACEHOLDER)
        .collect();
    let placeholders = input - live.len();

    let unique = dedup(live, strategy);
    let after_dedup = unique.len();

    let kept = keyword_filter(unique, keywords);
    info!(
        input,
        placeholders,
        duplicates = input - placeholders - after_dedup,
        off_topic = after_dedup - kept.len(),
        kept = kept.len(),
        "Curated article collection"
    );
    kept
}
