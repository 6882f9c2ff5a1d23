//! Relevance classification of articles through the LLM.
//!
//! Each article is judged independently. The model is asked for a JSON
//! verdict `{"relevant": bool, "reason": "..."}`; the older line format
//! (`Classification: RELEVANT` / `Reason: ...`) is accepted as well. Anything
//! else marks the article [`Relevance::Unknown`] instead of failing the run.

use crate::api::{AskAsync, ChatPrompt};
use crate::models::{Article, Relevance};
use crate::utils::{truncate_chars, truncate_for_log};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

const SYSTEM_PROMPT: &str = "You are a cybersecurity analyst specializing in the DACH region.";

/// Characters of article text included in the prompt.
const EXCERPT_CHARS: usize = 4000;

static CLASSIFICATION_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^\s*\**classification\**\s*:\s*\**\s*\[?\s*(not[\s_-]+relevant|relevant)")
        .expect("static regex")
});

static REASON_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^\s*\**reason\**\s*:\s*\**\s*(.+)$").expect("static regex"));

/// Parsed answer of the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub relevance: Relevance,
    pub rationale: String,
}

impl Verdict {
    fn unknown(rationale: impl Into<String>) -> Self {
        Self {
            relevance: Relevance::Unknown,
            rationale: rationale.into(),
        }
    }
}

#[derive(Deserialize)]
struct JsonVerdict {
    relevant: Option<serde_json::Value>,
    reason: Option<String>,
}

/// Build the fixed classification prompt for one article.
pub fn build_prompt(article: &Article) -> ChatPrompt {
    let text = article.classification_text();
    let excerpt = if text.trim().is_empty() {
        "[No content available]".to_string()
    } else {
        truncate_chars(text, EXCERPT_CHARS)
    };

    let user = format!(
        r#"Analyze this news article to determine if it is relevant to cybersecurity incidents in the DACH region (Germany, Austria, Switzerland).

Title: {title}

Source: {source}

Content excerpt:
{excerpt}

Questions to answer:
1. Is this article about a cybersecurity incident, threat, or information security matter?
2. Does it concern the DACH region (Germany, Austria, Switzerland)?

The article is relevant only if both answers are yes.

Respond with a single JSON object and nothing else:
{{"relevant": true or false, "reason": "1-2 sentence explanation"}}"#,
        title = article.title,
        source = article.source,
    );

    ChatPrompt {
        system: SYSTEM_PROMPT.to_string(),
        user,
        temperature: 0.1,
        max_tokens: 150,
    }
}

fn relevance_from_json(value: &serde_json::Value) -> Option<Relevance> {
    let relevant = match value {
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "relevant" => true,
            "false" | "no" | "not relevant" | "not_relevant" => false,
            _ => return None,
        },
        _ => return None,
    };
    Some(if relevant {
        Relevance::Relevant
    } else {
        Relevance::NotRelevant
    })
}

fn parse_json_verdict(response: &str) -> Option<Verdict> {
    // tolerate code fences and surrounding prose
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    if end < start {
        return None;
    }
    let parsed: JsonVerdict = serde_json::from_str(&response[start..=end]).ok()?;
    let relevance = relevance_from_json(parsed.relevant.as_ref()?)?;
    Some(Verdict {
        relevance,
        rationale: parsed
            .reason
            .map(|r| r.trim().to_string())
            .unwrap_or_default(),
    })
}

fn parse_line_verdict(response: &str) -> Option<Verdict> {
    let label = CLASSIFICATION_LINE.captures(response)?.get(1)?.as_str().to_lowercase();
    let relevance = if label.starts_with("not") {
        Relevance::NotRelevant
    } else {
        Relevance::Relevant
    };
    let rationale = REASON_LINE
        .captures(response)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();
    Some(Verdict {
        relevance,
        rationale,
    })
}

/// Parse the model's answer; `None` when it matches neither accepted shape.
pub fn parse_verdict(response: &str) -> Option<Verdict> {
    parse_json_verdict(response).or_else(|| parse_line_verdict(response))
}

/// Counters of one [`Classifier::classify_all`] pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ClassifyStats {
    pub relevant: usize,
    pub not_relevant: usize,
    pub unknown: usize,
}

#[derive(Debug)]
pub struct Classifier<C> {
    llm: C,
}

impl<C> Classifier<C>
where
    C: AskAsync<Response = String>,
{
    pub fn new(llm: C) -> Self {
        Self { llm }
    }

    /// Classify one article. Never fails: problems yield an `Unknown` verdict.
    #[instrument(level = "info", skip_all, fields(title = %article.title))]
    pub async fn classify(&self, article: &Article) -> Verdict {
        let prompt = build_prompt(article);
        match self.llm.ask(&prompt).await {
            Ok(response) => match parse_verdict(&response) {
                Some(verdict) => verdict,
                None => {
                    warn!(
                        response_preview = %truncate_for_log(&response, 300),
                        "Model returned an unparseable verdict; marking unknown"
                    );
                    Verdict::unknown(format!(
                        "Unparseable model response: {}",
                        truncate_for_log(&response, 120)
                    ))
                }
            },
            Err(e) => {
                warn!(error = %e, "Classification request failed; marking unknown");
                Verdict::unknown(format!("Classification failed: {e}"))
            }
        }
    }

    /// Classify every article in place, one at a time.
    #[instrument(level = "info", skip_all, fields(total = articles.len()))]
    pub async fn classify_all(&self, articles: &mut [Article]) -> ClassifyStats {
        let mut stats = ClassifyStats::default();
        let total = articles.len();

        for (i, article) in articles.iter_mut().enumerate() {
            let verdict = self.classify(article).await;
            match verdict.relevance {
                Relevance::Relevant => stats.relevant += 1,
                Relevance::NotRelevant => stats.not_relevant += 1,
                Relevance::Unknown => stats.unknown += 1,
            }
            debug!(
                index = i,
                total,
                relevance = %verdict.relevance,
                reason = %verdict.rationale,
                "Classified article"
            );
            article.relevance = Some(verdict.relevance);
            article.rationale = Some(verdict.rationale);
        }

        info!(
            relevant = stats.relevant,
            not_relevant = stats.not_relevant,
            unknown = stats.unknown,
            "Classification complete"
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use crate::models::RawArticle;
    use pretty_assertions::assert_eq;
    use reqwest::StatusCode;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Replays queued responses and records the prompts it was sent.
    #[derive(Debug, Default)]
    struct Scripted {
        responses: RefCell<VecDeque<Result<String, LlmError>>>,
        prompts: RefCell<Vec<String>>,
    }

    impl Scripted {
        fn new(responses: Vec<Result<String, LlmError>>) -> Self {
            Self {
                responses: RefCell::new(responses.into()),
                prompts: RefCell::default(),
            }
        }
    }

    impl AskAsync for Scripted {
        type Response = String;

        async fn ask(&self, prompt: &ChatPrompt) -> Result<String, LlmError> {
            self.prompts.borrow_mut().push(prompt.user.clone());
            self.responses
                .borrow_mut()
                .pop_front()
                .unwrap_or(Err(LlmError::EmptyResponse))
        }
    }

    fn article(title: &str, description: &str) -> Article {
        Article::from_raw(
            RawArticle {
                title: Some(title.to_string()),
                description: Some(description.to_string()),
                url: Some(format!("https://example.de/{}", title.len())),
                ..Default::default()
            },
            "everything",
        )
    }

    #[test]
    fn test_parse_json_verdict() {
        let v = parse_verdict(r#"{"relevant": true, "reason": "Ransomware attack on a Swiss hospital."}"#)
            .unwrap();
        assert_eq!(v.relevance, Relevance::Relevant);
        assert_eq!(v.rationale, "Ransomware attack on a Swiss hospital.");
    }

    #[test]
    fn test_parse_fenced_json_verdict() {
        let response = "Here is my answer:\n```json\n{\"relevant\": false, \"reason\": \"Sports news.\"}\n```";
        let v = parse_verdict(response).unwrap();
        assert_eq!(v.relevance, Relevance::NotRelevant);
        assert_eq!(v.rationale, "Sports news.");
    }

    #[test]
    fn test_parse_string_boolean() {
        let v = parse_verdict(r#"{"relevant": "yes"}"#).unwrap();
        assert_eq!(v.relevance, Relevance::Relevant);
        assert_eq!(v.rationale, "");
    }

    #[test]
    fn test_parse_line_format() {
        let v = parse_verdict("Classification: NOT RELEVANT\nReason: About US elections.").unwrap();
        assert_eq!(v.relevance, Relevance::NotRelevant);
        assert_eq!(v.rationale, "About US elections.");

        let v = parse_verdict("**Classification:** RELEVANT\n**Reason:** Datenleck in Graz.").unwrap();
        assert_eq!(v.relevance, Relevance::Relevant);
        assert_eq!(v.rationale, "Datenleck in Graz.");
    }

    #[test]
    fn test_parse_bracketed_line_format() {
        let v = parse_verdict("Classification: [NOT RELEVANT]\nReason: [Nur USA betroffen.]").unwrap();
        assert_eq!(v.relevance, Relevance::NotRelevant);

        let v = parse_verdict("Classification: [RELEVANT]\nReason: Angriff auf Wiener Stadtwerke.").unwrap();
        assert_eq!(v.relevance, Relevance::Relevant);
        assert_eq!(v.rationale, "Angriff auf Wiener Stadtwerke.");
    }

    #[test]
    fn test_parse_rejects_other_shapes() {
        assert_eq!(parse_verdict("I think it might be relevant."), None);
        assert_eq!(parse_verdict(r#"{"reason": "no verdict field"}"#), None);
        assert_eq!(parse_verdict(r#"{"relevant": 3}"#), None);
        assert_eq!(parse_verdict("} {"), None);
    }

    #[test]
    fn test_prompt_uses_content_then_description() {
        let mut a = article("Hackerangriff", "Kurzbeschreibung");
        assert!(build_prompt(&a).user.contains("Kurzbeschreibung"));

        a.content = Some("Volltext des Artikels".to_string());
        let prompt = build_prompt(&a);
        assert!(prompt.user.contains("Volltext des Artikels"));
        assert!(!prompt.user.contains("Kurzbeschreibung"));
        assert!(prompt.user.contains("Title: Hackerangriff"));

        let empty = article("Leer", "");
        assert!(build_prompt(&empty).user.contains("[No content available]"));
    }

    #[tokio::test]
    async fn test_classify_relevant_response() {
        let llm = Scripted::new(vec![Ok(
            r#"{"relevant": true, "reason": "Cyberangriff auf Wiener Stadtwerke."}"#.to_string(),
        )]);
        let classifier = Classifier::new(llm);
        let mut articles = vec![article("Cyberangriff in Wien", "Stadtwerke betroffen")];

        let stats = classifier.classify_all(&mut articles).await;
        assert_eq!(stats.relevant, 1);
        assert_eq!(articles[0].relevance, Some(Relevance::Relevant));
        assert_eq!(
            articles[0].rationale.as_deref(),
            Some("Cyberangriff auf Wiener Stadtwerke.")
        );
    }

    #[tokio::test]
    async fn test_classify_unparseable_and_failed_responses() {
        let llm = Scripted::new(vec![
            Ok("Sorry, I cannot help with that.".to_string()),
            Err(LlmError::Status {
                status: StatusCode::TOO_MANY_REQUESTS,
                body: "quota exceeded".to_string(),
            }),
            Ok(r#"{"relevant": false, "reason": "Not about DACH."}"#.to_string()),
        ]);
        let classifier = Classifier::new(llm);
        let mut articles = vec![
            article("Eins", "a"),
            article("Zwei", "b"),
            article("Drei", "c"),
        ];

        let stats = classifier.classify_all(&mut articles).await;
        assert_eq!(
            stats,
            ClassifyStats {
                relevant: 0,
                not_relevant: 1,
                unknown: 2
            }
        );
        assert_eq!(articles[0].relevance, Some(Relevance::Unknown));
        assert!(articles[0].rationale.as_deref().unwrap().starts_with("Unparseable"));
        assert_eq!(articles[1].relevance, Some(Relevance::Unknown));
        assert!(articles[1].rationale.as_deref().unwrap().contains("quota exceeded"));
        assert_eq!(articles[2].relevance, Some(Relevance::NotRelevant));
        assert_eq!(classifier.llm.prompts.borrow().len(), 3);
    }
}
