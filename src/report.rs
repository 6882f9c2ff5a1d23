//! Report synthesis from relevant articles.
//!
//! One prompt carries a numbered digest of the relevant articles together
//! with the section layout of the report. The model's answer becomes the
//! report body verbatim.

use crate::api::{AskAsync, ChatPrompt};
use crate::error::PipelineError;
use crate::models::{Article, Report};
use crate::utils::truncate_chars;
use chrono::{DateTime, Utc};
use std::fmt::Write;
use tracing::{error, info, instrument};

const SYSTEM_PROMPT: &str = "You are a cybersecurity analyst writing intelligence reports about the DACH region (Germany, Austria, Switzerland).";

/// Characters of scraped content quoted per article in the digest.
const CONTENT_EXCERPT_CHARS: usize = 200;

pub const REPORT_SECTIONS: &[(&str, &str)] = &[
    ("Executive Summary", "A brief overview of the key findings and trends"),
    ("Major Incidents", "Detailed analysis of significant cybersecurity incidents"),
    ("Emerging Threats", "New and evolving cybersecurity threats in the region"),
    ("Industry Impact", "How these incidents affect different industries"),
    ("Recommendations", "Practical advice for organizations to protect themselves"),
];

pub const NO_RELEVANT_ARTICLES_BODY: &str = "# Cybersecurity Report: DACH Region\n\nNo relevant articles were found for this period, so no report was generated.\n";

/// Numbered digest of at most `max_articles` articles.
pub fn build_digest(articles: &[Article], max_articles: usize) -> String {
    let mut digest = String::new();
    for (i, article) in articles.iter().take(max_articles).enumerate() {
        let _ = writeln!(digest, "{}. {}", i + 1, article.title);
        let _ = writeln!(
            digest,
            "   Published: {} by {}",
            article.published_display(),
            article.source
        );
        if !article.description.trim().is_empty() {
            let _ = writeln!(digest, "   {}", article.description.trim());
        }
        if let Some(content) = article.content.as_deref().filter(|c| !c.trim().is_empty()) {
            let _ = writeln!(
                digest,
                "   Content: {}",
                truncate_chars(content, CONTENT_EXCERPT_CHARS)
            );
        }
        let _ = writeln!(digest, "   URL: {}", article.url);
        digest.push('\n');
    }
    digest
}

/// The synthesis prompt for a digest.
pub fn build_prompt(digest: &str) -> ChatPrompt {
    let mut user = String::from(
        "Below are recent news articles about cybersecurity from the DACH region:\n\n",
    );
    user.push_str(digest);
    user.push_str(
        "Based on these articles, create a comprehensive cybersecurity report in Markdown with the following sections:\n\n",
    );
    for (i, (title, purpose)) in REPORT_SECTIONS.iter().enumerate() {
        let _ = writeln!(user, "{}. {} - {}", i + 1, title, purpose);
    }
    user.push_str(
        "\nUse a professional, analytical tone and clear headings. Focus on extracting insights and patterns from the provided articles, and cite article titles where relevant.",
    );

    ChatPrompt {
        system: SYSTEM_PROMPT.to_string(),
        user,
        temperature: 0.3,
        max_tokens: 4000,
    }
}

/// Fixed report returned when there is nothing to synthesize.
pub fn placeholder_report(generated_at: DateTime<Utc>) -> Report {
    Report {
        generated_at,
        model: "none".to_string(),
        body: NO_RELEVANT_ARTICLES_BODY.to_string(),
    }
}

#[derive(Debug)]
pub struct ReportSynthesizer<C> {
    llm: C,
    model: String,
    max_articles: usize,
}

impl<C> ReportSynthesizer<C>
where
    C: AskAsync<Response = String>,
{
    pub fn new(llm: C, model: &str, max_articles: usize) -> Self {
        Self {
            llm,
            model: model.to_string(),
            max_articles,
        }
    }

    /// Synthesize a report from `relevant`.
    ///
    /// An empty input yields the placeholder without contacting the model.
    #[instrument(level = "info", skip_all, fields(articles = relevant.len(), model = %self.model))]
    pub async fn generate(&self, relevant: &[Article]) -> Result<Report, PipelineError> {
        let generated_at = Utc::now();
        if relevant.is_empty() {
            info!("No relevant articles; returning placeholder report");
            return Ok(placeholder_report(generated_at));
        }

        let digest = build_digest(relevant, self.max_articles);
        let prompt = build_prompt(&digest);
        let body = self.llm.ask(&prompt).await.map_err(|e| {
            error!(error = %e, "Report synthesis failed");
            PipelineError::ReportGenerationFailed(e)
        })?;

        info!(bytes = body.len(), "Report synthesized");
        Ok(Report {
            generated_at,
            model: self.model.clone(),
            body,
        })
    }
}
