//! JSON export and re-import of article collections.
//!
//! Files hold a pretty-printed array of [`Article`] objects. The same format
//! is read back by `--report-only` runs, so a previous run's output can be
//! used to regenerate a report without fetching again.

use crate::error::PipelineError;
use crate::models::Article;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;
use tracing::{debug, info, instrument};

/// Write `articles` as a JSON array.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_articles(articles: &[Article], path: &Path) -> Result<(), PipelineError> {
    let json = serde_json::to_string_pretty(articles)?;
    fs::write(path, json).await?;
    info!(count = articles.len(), "Wrote JSON");
    Ok(())
}

/// Read an article array written by [`write_articles`].
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn load_articles(path: &Path) -> Result<Vec<Article>, PipelineError> {
    let raw = fs::read_to_string(path).await?;
    let articles: Vec<Article> = serde_json::from_str(&raw)?;
    info!(count = articles.len(), "Loaded articles");
    Ok(articles)
}

/// The most recently modified `*.json` file in `dir`.
#[instrument(level = "info", skip_all, fields(dir = %dir.display()))]
pub async fn latest_json_file(dir: &Path) -> Result<PathBuf, PipelineError> {
    let mut entries = fs::read_dir(dir).await?;
    let mut newest: Option<(SystemTime, PathBuf)> = None;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let meta = entry.metadata().await?;
        if !meta.is_file() {
            continue;
        }
        let modified = meta.modified()?;
        debug!(path = %path.display(), ?modified, "Candidate input file");
        if newest.as_ref().is_none_or(|(t, _)| modified > *t) {
            newest = Some((modified, path));
        }
    }

    newest
        .map(|(_, path)| path)
        .ok_or_else(|| PipelineError::NoInputFile(dir.display().to_string()))
}
