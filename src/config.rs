//! Pipeline configuration loaded from an optional YAML file.
//!
//! Every key has a built-in default, so a config file only needs to name the
//! values it overrides:
//!
//! ```yaml
//! filter_keywords: ["ransomware", "datenleck"]
//! dedup: title_then_url
//! scrape_delay_ms: { min: 0, max: 0 }
//! ```

use crate::error::PipelineError;
use crate::filter::DedupStrategy;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info, instrument};

/// Terms used both as NewsAPI query terms and as the default keyword filter.
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "cybersecurity",
    "cyber security",
    "cyber-security",
    "hack",
    "hacking",
    "data breach",
    "ransomware",
    "malware",
    "phishing",
    "cyber attack",
    "cyber-attack",
    "cyberangriff",
    "datenschutz",
    "datenleck",
    "cyberkriminalität",
    "it-sicherheit",
    "datensicherheit",
    "hackerangriff",
];

pub const DEFAULT_COUNTRIES: &[&str] = &["de", "at", "ch"];

pub const DEFAULT_DOMAINS: &[&str] = &[
    "spiegel.de",
    "faz.net",
    "zeit.de",
    "nzz.ch",
    "derstandard.at",
    "heise.de",
    "golem.de",
    "welt.de",
    "sueddeutsche.de",
    "diepresse.com",
    "tagesanzeiger.ch",
];

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36";

/// Bounds, in milliseconds, of the random pause between two page fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DelayRange {
    pub min: u64,
    pub max: u64,
}

/// Tunables for every pipeline stage.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Terms OR-ed together into the NewsAPI query.
    pub search_keywords: Vec<String>,
    /// Terms of the coarse keyword filter applied after dedup.
    /// Falls back to `search_keywords` when empty.
    pub filter_keywords: Vec<String>,
    /// Countries queried on the `top-headlines` endpoint.
    pub countries: Vec<String>,
    /// Domains the `everything` endpoint is restricted to.
    pub domains: Vec<String>,
    pub language: String,
    pub dedup: DedupStrategy,
    pub news_api_base_url: String,
    pub llm_base_url: String,
    pub user_agent: String,
    pub scrape_timeout_secs: u64,
    pub scrape_delay_ms: DelayRange,
    pub max_content_chars: usize,
    /// How many articles the report digest includes at most.
    pub report_max_articles: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            search_keywords: DEFAULT_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            filter_keywords: Vec::new(),
            countries: DEFAULT_COUNTRIES.iter().map(|s| s.to_string()).collect(),
            domains: DEFAULT_DOMAINS.iter().map(|s| s.to_string()).collect(),
            language: "de".to_string(),
            dedup: DedupStrategy::default(),
            news_api_base_url: "https://newsapi.org/v2".to_string(),
            llm_base_url: "https://api.openai.com/v1".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            scrape_timeout_secs: 10,
            scrape_delay_ms: DelayRange { min: 1000, max: 3000 },
            max_content_chars: 15_000,
            report_max_articles: 30,
        }
    }
}

impl PipelineConfig {
    /// Load the configuration, or the defaults when no path is given.
    ///
    /// An empty file also yields the defaults.
    #[instrument(level = "info")]
    pub fn load(path: Option<&Path>) -> Result<Self, PipelineError> {
        let config = match path {
            None => {
                debug!("No config file given, using defaults");
                Self::default()
            }
            Some(p) => {
                let raw = std::fs::read_to_string(p)?;
                let config = Self::from_yaml(&raw)?;
                info!(path = %p.display(), "Loaded configuration");
                config
            }
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, PipelineError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Keyword filter terms, lowercased. Uses the search keywords when no
    /// explicit filter list is configured.
    pub fn effective_filter_keywords(&self) -> Vec<String> {
        let source = if self.filter_keywords.is_empty() {
            &self.search_keywords
        } else {
            &self.filter_keywords
        };
        source
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect()
    }

    fn validate(&self) -> Result<(), PipelineError> {
        if self.search_keywords.iter().all(|k| k.trim().is_empty()) {
            return Err(PipelineError::Config(
                "search_keywords must contain at least one term".to_string(),
            ));
        }
        // an explicit list of blank terms would filter out every article
        if !self.filter_keywords.is_empty()
            && self.filter_keywords.iter().all(|k| k.trim().is_empty())
        {
            return Err(PipelineError::Config(
                "filter_keywords must be empty or contain at least one term".to_string(),
            ));
        }
        if self.scrape_delay_ms.min > self.scrape_delay_ms.max {
            return Err(PipelineError::Config(format!(
                "scrape_delay_ms.min ({}) exceeds max ({})",
                self.scrape_delay_ms.min, self.scrape_delay_ms.max
            )));
        }
        if self.scrape_timeout_secs == 0 {
            return Err(PipelineError::Config(
                "scrape_timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
