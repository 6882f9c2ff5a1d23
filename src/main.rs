//! # DACH Cyber News
//!
//! A news pipeline that collects cybersecurity articles about Germany,
//! Austria and Switzerland from NewsAPI, curates them, optionally enriches
//! them with full page text and an LLM relevance verdict, and exports the
//! collection as CSV and JSON together with an optional Markdown report.
//!
//! ## Usage
//!
//! ```sh
//! dach_cyber_news --days 7 --scrape-content --report
//! ```
//!
//! ## Architecture
//!
//! The run is a strictly linear pipeline:
//! 1. **Fetching**: Query NewsAPI (top headlines per country plus a domain-restricted search)
//! 2. **Curation**: Drop duplicates and articles without a topic keyword
//! 3. **Retrieval** (`--scrape-content`): Download each page and extract its main text
//! 4. **Classification** (`--classify`): Ask the model whether each article concerns the DACH region
//! 5. **Output**: Write CSV and JSON exports and print a console summary
//! 6. **Reporting** (`--report`): Synthesize a report from the relevant articles as Markdown, HTML and (unless `--no-pdf`) PDF

use chrono::Local;
use clap::Parser;
use secrecy::SecretString;
use std::error::Error;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod classifier;
mod cli;
mod config;
mod error;
mod filter;
mod models;
mod outputs;
mod report;
mod scrapers;
mod utils;

use api::{ChatClient, RetryAsk};
use classifier::Classifier;
use cli::Cli;
use config::PipelineConfig;
use error::PipelineError;
use models::{Article, Report};
use outputs::{console, export_articles, json, write_report_files};
use report::ReportSynthesizer;
use scrapers::article::ContentRetriever;
use scrapers::newsapi::NewsApiClient;
use utils::{ensure_writable_dir, file_timestamp};

const REPORT_PREVIEW_LINES: usize = 15;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // .env may carry RUST_LOG, so it is read before the subscriber is built
    let dotenv = dotenvy::dotenv();

    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = Instant::now();
    info!("dach_cyber_news starting up");
    match dotenv {
        Ok(path) => debug!(path = %path.display(), "Loaded .env"),
        Err(e) if e.not_found() => debug!("No .env file found"),
        Err(e) => warn!(error = %e, "Failed to read .env; continuing with process environment"),
    }

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let result = if args.report_only {
        run_report_only(&args).await
    } else {
        run(&args).await
    };

    let elapsed = start_time.elapsed();
    match result {
        Ok(()) => {
            info!(
                ?elapsed,
                secs = elapsed.as_secs(),
                millis = elapsed.subsec_millis(),
                "Execution complete"
            );
            Ok(())
        }
        Err(e) => {
            error!(error = %e, ?elapsed, "Run failed");
            Err(e.into())
        }
    }
}

fn require_key(key: Option<SecretString>, var: &'static str) -> Result<SecretString, PipelineError> {
    key.ok_or_else(|| {
        error!(var, "Required API key is not set");
        PipelineError::MissingApiKey(var)
    })
}

fn llm_client(
    key: SecretString,
    config: &PipelineConfig,
    model: &str,
) -> Result<RetryAsk<ChatClient>, PipelineError> {
    let client = ChatClient::new(key, &config.llm_base_url, model)?;
    debug!(?client, model = client.model(), "LLM client ready");
    Ok(RetryAsk::with_defaults(client))
}

async fn prepare_dir(path: &std::path::Path, what: &str) -> Result<(), PipelineError> {
    ensure_writable_dir(path).await.map_err(|e| {
        error!(
            path = %path.display(),
            error = %e,
            "{what} directory is not writable (fix perms or choose a different path)"
        );
        PipelineError::Io(e)
    })
}

/// Full pipeline: fetch, curate, optional stages, export.
#[instrument(level = "info", skip_all, fields(days = args.days))]
async fn run(args: &Cli) -> Result<(), PipelineError> {
    let config = PipelineConfig::load(args.config.as_deref())?;
    let stamp = file_timestamp(&Local::now());

    // Resolve every key an enabled stage needs before doing any network work
    let news_key = require_key(args.news_api_key(), "NEWS_API_KEY")?;
    let openai_key = if args.classify_enabled() {
        Some(require_key(args.openai_api_key(), "OPENAI_API_KEY")?)
    } else {
        None
    };

    prepare_dir(&args.output, "Output").await?;
    if args.report {
        prepare_dir(&args.report_output, "Report").await?;
    }

    // ---- Fetch ----
    let newsapi = NewsApiClient::new(news_key, &config.news_api_base_url)?;
    let raw = newsapi
        .fetch_all(&config, args.days, Local::now().date_naive())
        .await?;

    // ---- Curate ----
    let mut articles = filter::curate(raw, config.dedup, &config.effective_filter_keywords());
    if articles.is_empty() {
        warn!("No articles survived curation");
    }

    // ---- Content retrieval ----
    if args.scrape_content {
        let retriever = ContentRetriever::new(&config)?;
        retriever.enrich(&mut articles, args.max_scrape).await;
    }

    // ---- Classification ----
    let mut report_llm = None;
    if let Some(key) = openai_key {
        let classifier = Classifier::new(llm_client(key, &config, &args.model)?);
        classifier.classify_all(&mut articles).await;
        if args.report {
            // The classifier owns its client; the report gets a fresh one
            let key = require_key(args.openai_api_key(), "OPENAI_API_KEY")?;
            report_llm = Some(llm_client(key, &config, &args.model)?);
        }
    }

    // ---- Export ----
    let paths = export_articles(&articles, &args.output, &stamp, args.classify_enabled()).await?;
    info!(csv = %paths.csv.display(), json = %paths.json.display(), "Exported articles");

    console::print_top_articles(&articles, args.limit);
    if args.classify_enabled() {
        console::print_relevant_articles(&articles, args.limit);
    }

    // ---- Report ----
    if let Some(llm) = report_llm {
        let relevant: Vec<Article> = articles.iter().filter(|a| a.is_relevant()).cloned().collect();
        let synthesizer = ReportSynthesizer::new(llm, &args.model, config.report_max_articles);
        let report = synthesizer.generate(&relevant).await?;
        publish_report(&report, args, &stamp).await?;
    }

    Ok(())
}

/// Regenerate a report from a previous JSON export without fetching.
#[instrument(level = "info", skip_all)]
async fn run_report_only(args: &Cli) -> Result<(), PipelineError> {
    let config = PipelineConfig::load(args.config.as_deref())?;
    let stamp = file_timestamp(&Local::now());
    let key = require_key(args.openai_api_key(), "OPENAI_API_KEY")?;
    prepare_dir(&args.report_output, "Report").await?;

    let input = match &args.input {
        Some(path) => path.clone(),
        None => json::latest_json_file(&args.output).await?,
    };
    info!(input = %input.display(), "Generating report from saved articles");
    let loaded = json::load_articles(&input).await?;

    let selected = select_for_report(loaded);
    let synthesizer = ReportSynthesizer::new(
        llm_client(key, &config, &args.model)?,
        &args.model,
        config.report_max_articles,
    );
    let report = synthesizer.generate(&selected).await?;
    publish_report(&report, args, &stamp).await
}

/// Relevant articles of a loaded export, or all of them when the export
/// was never classified.
fn select_for_report(loaded: Vec<Article>) -> Vec<Article> {
    if loaded.iter().all(|a| a.relevance.is_none()) {
        info!(count = loaded.len(), "Input carries no verdicts; using all articles");
        return loaded;
    }
    let relevant: Vec<Article> = loaded.into_iter().filter(|a| a.is_relevant()).collect();
    info!(count = relevant.len(), "Using relevant articles from input");
    relevant
}

async fn publish_report(report: &Report, args: &Cli, stamp: &str) -> Result<(), PipelineError> {
    let paths = write_report_files(report, &args.report_output, stamp, !args.no_pdf).await?;
    println!("\nReport written to {}", paths.markdown.display());
    println!("HTML version: {}", paths.html.display());
    if let Some(pdf) = &paths.pdf {
        println!("PDF version: {}", pdf.display());
    }
    println!("\n{}", console::report_preview(&report.body, REPORT_PREVIEW_LINES));
    Ok(())
}
