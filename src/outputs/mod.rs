//! Output generation for CSV, JSON, Markdown, HTML, PDF and the console.
//!
//! # Submodules
//!
//! - [`csv`]: Writes the article collection as a flat CSV table
//! - [`json`]: Writes (and reads back) article collections as JSON arrays
//! - [`markdown`]: Writes the synthesized report
//! - [`html`]: Renders the report as a styled standalone page
//! - [`pdf`]: Prints the HTML page to PDF with an external tool, when one is installed
//! - [`console`]: Prints short summaries of a run to stdout
//!
//! # Output Structure
//!
//! Every file of a run carries the same `YYYYmmdd_HHMMSS` stamp:
//!
//! ```text
//! data/
//! ├── cybersecurity_news_20250506_143000.csv
//! ├── cybersecurity_news_20250506_143000.json
//! └── cybersecurity_relevant_articles_20250506_143000.json
//!
//! reports/
//! ├── cybersecurity_report_20250506_143000.md
//! ├── cybersecurity_report_20250506_143000.html
//! └── cybersecurity_report_20250506_143000.pdf
//! ```

pub mod console;
pub mod csv;
pub mod html;
pub mod json;
pub mod markdown;
pub mod pdf;

use crate::error::PipelineError;
use crate::models::{Article, Report};
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

pub const NEWS_FILE_PREFIX: &str = "cybersecurity_news";
pub const RELEVANT_FILE_PREFIX: &str = "cybersecurity_relevant_articles";
pub const REPORT_FILE_PREFIX: &str = "cybersecurity_report";

/// Paths of the article files written by [`export_articles`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPaths {
    pub csv: PathBuf,
    pub json: PathBuf,
    pub relevant_json: Option<PathBuf>,
}

/// Write the full collection to CSV and JSON, and the relevant subset to a
/// separate JSON file when `include_relevant` is set.
#[instrument(level = "info", skip_all, fields(dir = %dir.display(), %stamp, count = articles.len()))]
pub async fn export_articles(
    articles: &[Article],
    dir: &Path,
    stamp: &str,
    include_relevant: bool,
) -> Result<ExportPaths, PipelineError> {
    let csv_path = dir.join(format!("{NEWS_FILE_PREFIX}_{stamp}.csv"));
    csv::write_articles(articles, &csv_path).await?;

    let json_path = dir.join(format!("{NEWS_FILE_PREFIX}_{stamp}.json"));
    json::write_articles(articles, &json_path).await?;

    let relevant_json = if include_relevant {
        let relevant: Vec<Article> = articles.iter().filter(|a| a.is_relevant()).cloned().collect();
        let path = dir.join(format!("{RELEVANT_FILE_PREFIX}_{stamp}.json"));
        json::write_articles(&relevant, &path).await?;
        info!(count = relevant.len(), path = %path.display(), "Wrote relevant articles");
        Some(path)
    } else {
        None
    };

    Ok(ExportPaths {
        csv: csv_path,
        json: json_path,
        relevant_json,
    })
}

/// Paths of the report files written by [`write_report_files`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub markdown: PathBuf,
    pub html: PathBuf,
    /// `None` when PDF output was disabled or no PDF tool was available.
    pub pdf: Option<PathBuf>,
}

/// Write the report as Markdown and HTML, then try PDF when `with_pdf` is set.
///
/// Markdown and HTML write failures are fatal; PDF problems are not.
#[instrument(level = "info", skip_all, fields(dir = %dir.display(), %stamp, with_pdf = with_pdf))]
pub async fn write_report_files(
    report: &Report,
    dir: &Path,
    stamp: &str,
    with_pdf: bool,
) -> Result<ReportPaths, PipelineError> {
    let markdown = markdown::write_report(report, dir, stamp).await?;
    let html = html::write_report(report, dir, stamp).await?;
    let pdf = if with_pdf {
        pdf::render_pdf(&html, pdf::PDF_TOOLS).await
    } else {
        None
    };
    Ok(ReportPaths {
        markdown,
        html,
        pdf,
    })
}
