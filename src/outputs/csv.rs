//! CSV export of the article collection.
//!
//! Columns: `title,source,url,publishedAt,description,relevance,rationale`.
//! Unset optional values are written as empty cells.

use crate::error::PipelineError;
use crate::models::Article;
use chrono::SecondsFormat;
use serde::Serialize;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

#[derive(Serialize)]
struct CsvRow<'a> {
    title: &'a str,
    source: &'a str,
    url: &'a str,
    #[serde(rename = "publishedAt")]
    published_at: String,
    description: &'a str,
    relevance: &'a str,
    rationale: &'a str,
}

impl<'a> From<&'a Article> for CsvRow<'a> {
    fn from(a: &'a Article) -> Self {
        Self {
            title: &a.title,
            source: &a.source,
            url: &a.url,
            published_at: a
                .published_at
                .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
                .unwrap_or_default(),
            description: &a.description,
            relevance: a.relevance.map(|r| r.as_str()).unwrap_or(""),
            rationale: a.rationale.as_deref().unwrap_or(""),
        }
    }
}

/// Render the collection as CSV bytes, header row included.
pub fn to_csv_bytes(articles: &[Article]) -> Result<Vec<u8>, PipelineError> {
    let mut writer = ::csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(Vec::new());
    for article in articles {
        writer.serialize(CsvRow::from(article))?;
    }
    writer
        .into_inner()
        .map_err(|e| PipelineError::Io(e.into_error()))
}

#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_articles(articles: &[Article], path: &Path) -> Result<(), PipelineError> {
    let bytes = if articles.is_empty() {
        // serialize() never ran, so no header was emitted
        b"title,source,url,publishedAt,description,relevance,rationale\n".to_vec()
    } else {
        to_csv_bytes(articles)?
    };
    fs::write(path, bytes).await?;
    info!(rows = articles.len(), "Wrote CSV");
    Ok(())
}
