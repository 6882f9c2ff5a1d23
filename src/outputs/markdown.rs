//! Markdown output of the synthesized report.

use crate::error::PipelineError;
use crate::models::Report;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

use super::REPORT_FILE_PREFIX;

/// Prefix the report body with its generation metadata.
pub fn report_to_markdown(report: &Report) -> String {
    format!(
        "> Generated: {}\n> Model: {}\n\n{}\n",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        report.model,
        report.body.trim_end()
    )
}

/// Write the report to `{dir}/cybersecurity_report_{stamp}.md`.
#[instrument(level = "info", skip_all, fields(dir = %dir.display(), %stamp))]
pub async fn write_report(
    report: &Report,
    dir: &Path,
    stamp: &str,
) -> Result<PathBuf, PipelineError> {
    let path = dir.join(format!("{REPORT_FILE_PREFIX}_{stamp}.md"));
    fs::write(&path, report_to_markdown(report)).await?;
    info!(path = %path.display(), "Wrote Markdown report");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn report() -> Report {
        Report {
            generated_at: Utc.with_ymd_and_hms(2025, 5, 6, 14, 30, 0).unwrap(),
            model: "gpt-4o-mini".to_string(),
            body: "# Report\n\n## Executive Summary\nRuhig.\n\n".to_string(),
        }
    }

    #[test]
    fn test_report_to_markdown() {
        assert_eq!(
            report_to_markdown(&report()),
            "> Generated: 2025-05-06 14:30:00 UTC\n> Model: gpt-4o-mini\n\n# Report\n\n## Executive Summary\nRuhig.\n"
        );
    }

    #[tokio::test]
    async fn test_write_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_report(&report(), dir.path(), "20250506_143000").await.unwrap();
        assert_eq!(
            path.file_name().unwrap(),
            "cybersecurity_report_20250506_143000.md"
        );
        assert!(std::fs::read_to_string(&path).unwrap().contains("## Executive Summary"));
    }
}
