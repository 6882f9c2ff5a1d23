//! Command-line interface definitions for DACH Cyber News.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! API keys and the two directory defaults can also come from environment
//! variables (or a `.env` file, loaded before parsing).

use clap::Parser;
use secrecy::SecretString;
use std::fmt;
use std::path::PathBuf;

/// Command-line arguments for the DACH Cyber News pipeline.
///
/// Without any stage flag the run fetches, curates and exports. Each flag
/// enables one more stage: `--scrape-content` retrieves article pages,
/// `--classify` asks the model about DACH relevance and `--report`
/// synthesizes a Markdown report (classifying first).
///
/// # Examples
///
/// ```sh
/// # Fetch the last week of news into ./data
/// dach_cyber_news
///
/// # Full pipeline over three days
/// dach_cyber_news --days 3 --scrape-content --report
///
/// # Regenerate a report from the newest JSON export
/// dach_cyber_news --report-only
/// ```
#[derive(Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// How many days back to search (1 to 3650)
    #[arg(
        short,
        long,
        env = "DAYS_BACK",
        default_value_t = 7,
        value_parser = clap::value_parser!(u32).range(1..=3650)
    )]
    pub days: u32,

    /// Directory for the CSV and JSON exports
    #[arg(short, long, env = "OUTPUT_DIR", default_value = "data")]
    pub output: PathBuf,

    /// How many articles to print in the console summary
    #[arg(short, long, default_value_t = 5)]
    pub limit: usize,

    /// Fetch each article page and extract its main text
    #[arg(long)]
    pub scrape_content: bool,

    /// Retrieve content for at most this many articles
    #[arg(long)]
    pub max_scrape: Option<usize>,

    /// Classify articles for DACH cybersecurity relevance
    #[arg(long)]
    pub classify: bool,

    /// Synthesize a Markdown report from the relevant articles (implies --classify)
    #[arg(long)]
    pub report: bool,

    /// Skip fetching and build a report from a previous JSON export
    #[arg(long)]
    pub report_only: bool,

    /// JSON export to read in --report-only mode (default: newest in --output)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Directory for the Markdown, HTML and PDF report
    #[arg(long, default_value = "reports")]
    pub report_output: PathBuf,

    /// Skip PDF rendering of the report
    #[arg(long)]
    pub no_pdf: bool,

    /// Chat model used for classification and reports
    #[arg(long, default_value = "gpt-4o-mini")]
    pub model: String,

    /// Optional path to config.yaml file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// NewsAPI key
    #[arg(long, env = "NEWS_API_KEY", hide_env_values = true)]
    pub news_api_key: Option<String>,

    /// OpenAI-compatible API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,
}

impl Cli {
    pub fn classify_enabled(&self) -> bool {
        self.classify || self.report
    }

    pub fn news_api_key(&self) -> Option<SecretString> {
        non_empty_secret(self.news_api_key.as_deref())
    }

    pub fn openai_api_key(&self) -> Option<SecretString> {
        non_empty_secret(self.openai_api_key.as_deref())
    }
}

fn non_empty_secret(raw: Option<&str>) -> Option<SecretString> {
    raw.map(str::trim)
        .filter(|k| !k.is_empty())
        .map(|k| SecretString::from(k.to_string()))
}

impl fmt::Debug for Cli {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |k: &Option<String>| k.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("Cli")
            .field("days", &self.days)
            .field("output", &self.output)
            .field("limit", &self.limit)
            .field("scrape_content", &self.scrape_content)
            .field("max_scrape", &self.max_scrape)
            .field("classify", &self.classify)
            .field("report", &self.report)
            .field("report_only", &self.report_only)
            .field("input", &self.input)
            .field("report_output", &self.report_output)
            .field("no_pdf", &self.no_pdf)
            .field("model", &self.model)
            .field("config", &self.config)
            .field("news_api_key", &redact(&self.news_api_key))
            .field("openai_api_key", &redact(&self.openai_api_key))
            .finish()
    }
}
