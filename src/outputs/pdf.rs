//! Optional PDF rendering of the HTML report through an external tool.
//!
//! `wkhtmltopdf` is tried first, then headless Chrome or Chromium under its
//! usual binary names. A missing or failing tool is logged and the next one
//! is tried; when none succeeds the run continues with the HTML file only.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::utils::truncate_for_log;

const TOOL_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdfEngine {
    Wkhtmltopdf,
    Chrome,
}

/// One external program able to print HTML to PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PdfTool {
    pub program: &'static str,
    pub engine: PdfEngine,
}

/// Tools in the order they are tried.
pub const PDF_TOOLS: &[PdfTool] = &[
    PdfTool { program: "wkhtmltopdf", engine: PdfEngine::Wkhtmltopdf },
    PdfTool { program: "google-chrome", engine: PdfEngine::Chrome },
    PdfTool { program: "chrome", engine: PdfEngine::Chrome },
    PdfTool { program: "chromium", engine: PdfEngine::Chrome },
    PdfTool { program: "chromium-browser", engine: PdfEngine::Chrome },
];

impl PdfTool {
    /// Command line converting `html` (an absolute path) into `pdf`.
    pub fn command(&self, html: &Path, pdf: &Path) -> Command {
        let mut cmd = Command::new(self.program);
        match self.engine {
            PdfEngine::Wkhtmltopdf => {
                cmd.arg("--quiet").arg(html).arg(pdf);
            }
            PdfEngine::Chrome => {
                let page = Url::from_file_path(html)
                    .map(String::from)
                    .unwrap_or_else(|_| html.display().to_string());
                cmd.arg("--headless")
                    .arg("--disable-gpu")
                    .arg(format!("--print-to-pdf={}", pdf.display()))
                    .arg(page);
            }
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

/// Render `html` to a PDF next to it with the first tool that works.
///
/// Returns the PDF path, or `None` when no tool produced a file.
#[instrument(level = "info", skip_all, fields(html = %html.display()))]
pub async fn render_pdf(html: &Path, tools: &[PdfTool]) -> Option<PathBuf> {
    let html = match tokio::fs::canonicalize(html).await {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, "HTML report not found; skipping PDF");
            return None;
        }
    };
    let pdf = html.with_extension("pdf");

    for tool in tools {
        let mut cmd = tool.command(&html, &pdf);
        let output = match timeout(TOOL_TIMEOUT, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(program = tool.program, "PDF tool not installed");
                continue;
            }
            Ok(Err(e)) => {
                warn!(program = tool.program, error = %e, "Could not start PDF tool");
                continue;
            }
            Err(_) => {
                warn!(program = tool.program, timeout = ?TOOL_TIMEOUT, "PDF tool timed out");
                continue;
            }
        };

        let produced = tokio::fs::metadata(&pdf)
            .await
            .map(|m| m.len() > 0)
            .unwrap_or(false);
        if output.status.success() && produced {
            info!(program = tool.program, pdf = %pdf.display(), "Wrote PDF report");
            return Some(pdf);
        }
        warn!(
            program = tool.program,
            status = %output.status,
            stderr = %truncate_for_log(&String::from_utf8_lossy(&output.stderr), 300),
            "PDF tool did not produce a file"
        );
    }

    warn!("No PDF tool available (install wkhtmltopdf or Chrome); keeping the HTML report only");
    None
}
