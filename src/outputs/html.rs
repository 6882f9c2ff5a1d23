//! Styled HTML rendering of the synthesized report.
//!
//! The Markdown body is converted with `pulldown-cmark` and placed in a
//! standalone page with a title header, the generation date and a footer.
//! The same page is the input of the PDF step.

use crate::error::PipelineError;
use crate::models::Report;
use pulldown_cmark::{Options, Parser, html};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

use super::REPORT_FILE_PREFIX;

pub const REPORT_TITLE: &str = "Cybersecurity Report";

const STYLE: &str = r#"
        body {
            font-family: Arial, sans-serif;
            line-height: 1.6;
            max-width: 900px;
            margin: 0 auto;
            padding: 20px;
        }
        h1 { color: #1a66c2; border-bottom: 1px solid #ddd; padding-bottom: 10px; }
        h2 { color: #1a66c2; margin-top: 30px; }
        h3 { color: #333; margin-top: 25px; }
        .header { text-align: center; margin-bottom: 40px; }
        .title { font-size: 28px; font-weight: bold; }
        .subtitle { font-size: 20px; color: #666; margin-top: 10px; }
        .date { font-size: 14px; color: #666; margin-top: 20px; }
        .content { margin-top: 30px; }
        .footer {
            text-align: center;
            margin-top: 50px;
            color: #666;
            font-size: 12px;
            border-top: 1px solid #ddd;
            padding-top: 10px;
        }
        pre { background-color: #f5f5f5; padding: 10px; border-radius: 5px; overflow-x: auto; }
        code { background-color: #f5f5f5; padding: 2px 4px; border-radius: 3px; }
        blockquote { border-left: 4px solid #1a66c2; padding-left: 15px; margin-left: 0; color: #555; }
        table { border-collapse: collapse; width: 100%; margin: 20px 0; }
        th, td { border: 1px solid #ddd; padding: 8px; text-align: left; }
        th { background-color: #f2f2f2; }
"#;

/// Convert a Markdown fragment to HTML. Tables and strikethrough are enabled.
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(markdown, options);

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// The complete HTML page for `report`.
pub fn render_document(report: &Report, title: &str) -> String {
    let title = escape_text(title);
    let date = report.generated_at.format("%B %d, %Y");
    let content = markdown_to_html(&report.body);

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <meta name="generator" content="{generator}">
    <title>{title}</title>
    <style>{STYLE}    </style>
</head>
<body>
    <div class="header">
        <div class="title">{title}</div>
        <div class="subtitle">Cybersecurity Intelligence Report</div>
        <div class="date">Generated on {date}</div>
    </div>

    <div class="content">
{content}    </div>

    <div class="footer">
        <p>Generated on {date} | Model: {model} | Confidential</p>
    </div>
</body>
</html>
"#,
        generator = concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION")),
        model = escape_text(&report.model),
    )
}

/// Write the page to `{dir}/cybersecurity_report_{stamp}.html`.
#[instrument(level = "info", skip_all, fields(dir = %dir.display(), %stamp))]
pub async fn write_report(
    report: &Report,
    dir: &Path,
    stamp: &str,
) -> Result<PathBuf, PipelineError> {
    let path = dir.join(format!("{REPORT_FILE_PREFIX}_{stamp}.html"));
    fs::write(&path, render_document(report, REPORT_TITLE)).await?;
    info!(path = %path.display(), "Wrote HTML report");
    Ok(path)
}
