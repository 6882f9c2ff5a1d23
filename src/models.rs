//! Data models for news articles, relevance verdicts and reports.
//!
//! This module defines the core data structures used throughout the application:
//! - [`RawArticle`] / [`NewsApiResponse`]: the NewsAPI wire schema, every field optional
//! - [`Article`]: one curated news item, enriched in place by later stages
//! - [`Relevance`]: the classifier's verdict
//! - [`Report`]: the synthesized Markdown document
//!
//! Serialized field names use camelCase to match the NewsAPI vocabulary
//! (`publishedAt`, `totalResults`) in both the wire schema and our JSON exports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Top-level NewsAPI response envelope.
///
/// A successful body carries `status: "ok"` and an `articles` array. An error
/// body carries `status: "error"` together with `code` and `message`
/// (for example `rateLimited` or `apiKeyInvalid`).
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsApiResponse {
    pub status: Option<String>,
    pub total_results: Option<u64>,
    #[serde(default)]
    pub articles: Vec<RawArticle>,
    pub code: Option<String>,
    pub message: Option<String>,
}

/// The `source` object attached to each NewsAPI record. Only the name is kept.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RawSource {
    pub name: Option<String>,
}

/// A single article record as returned by NewsAPI.
///
/// `urlToImage` and the truncated `content` teaser are not read and are
/// skipped during deserialization.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawArticle {
    pub source: Option<RawSource>,
    pub author: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub published_at: Option<String>,
}

/// Relevance verdict produced by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relevance {
    Relevant,
    NotRelevant,
    /// The model's answer could not be obtained or parsed.
    Unknown,
}

impl Relevance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Relevance::Relevant => "relevant",
            Relevance::NotRelevant => "not_relevant",
            Relevance::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Relevance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A curated news article.
///
/// Created from a [`RawArticle`] by the fetcher, then enriched in place by the
/// content retriever (`content`, `scrape_error`) and the classifier
/// (`relevance`, `rationale`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub title: String,
    /// Name of the publishing outlet, e.g. "heise online".
    pub source: String,
    pub url: String,
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// The query variant that produced this article, e.g. `top-headlines:de`.
    #[serde(default)]
    pub origin: String,
    /// Main text extracted from the article page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Why the page could not be retrieved, if retrieval was attempted and failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scrape_error: Option<String>,
    #[serde(default)]
    pub relevance: Option<Relevance>,
    #[serde(default)]
    pub rationale: Option<String>,
}

impl Article {
    /// Build an article from a NewsAPI record.
    ///
    /// Missing string fields become empty strings. A `publishedAt` value that
    /// is not valid RFC 3339 becomes `None` instead of rejecting the record.
    pub fn from_raw(raw: RawArticle, origin: &str) -> Self {
        let published_at = raw
            .published_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        Self {
            title: raw.title.unwrap_or_default().trim().to_string(),
            source: raw.source.and_then(|s| s.name).unwrap_or_default(),
            url: raw.url.unwrap_or_default().trim().to_string(),
            published_at,
            description: raw.description.unwrap_or_default(),
            author: raw.author.filter(|a| !a.trim().is_empty()),
            origin: origin.to_string(),
            content: None,
            scrape_error: None,
            relevance: None,
            rationale: None,
        }
    }

    /// Text handed to the classifier: full content if present, else the description.
    pub fn classification_text(&self) -> &str {
        match self.content.as_deref() {
            Some(c) if !c.trim().is_empty() => c,
            _ => &self.description,
        }
    }

    pub fn is_relevant(&self) -> bool {
        self.relevance == Some(Relevance::Relevant)
    }

    /// Publication time formatted for humans, `Unknown date` when absent.
    pub fn published_display(&self) -> String {
        self.published_at
            .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "Unknown date".to_string())
    }
}

/// A synthesized report.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    /// Model identifier used for synthesis, or `none` for the placeholder.
    pub model: String,
    /// Markdown body.
    pub body: String,
}
