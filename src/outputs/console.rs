//! Human-readable run summaries printed to stdout.
//!
//! Logging goes to the tracing subscriber; these functions are the part of
//! the output meant for the person running the tool.

use crate::models::Article;
use crate::utils::truncate_chars;
use std::cmp::Reverse;

const DESCRIPTION_PREVIEW_CHARS: usize = 100;

/// The `limit` newest articles, undated ones last.
pub fn newest_first(articles: &[Article], limit: usize) -> Vec<&Article> {
    let mut sorted: Vec<&Article> = articles.iter().collect();
    sorted.sort_by_key(|a| Reverse(a.published_at));
    sorted.into_iter().take(limit).collect()
}

pub fn print_top_articles(articles: &[Article], limit: usize) {
    if articles.is_empty() {
        println!("No articles to display.");
        return;
    }
    let top = newest_first(articles, limit);
    println!("\nTop {} recent cybersecurity news articles:", top.len());
    for (i, a) in top.iter().enumerate() {
        println!("\n{}. {}", i + 1, a.title);
        println!("   Published: {} by {}", a.published_display(), a.source);
        if !a.description.is_empty() {
            println!("   {}", truncate_chars(&a.description, DESCRIPTION_PREVIEW_CHARS));
        }
        println!("   {}", a.url);
    }
}

pub fn print_relevant_articles(articles: &[Article], limit: usize) {
    let relevant: Vec<&Article> = articles.iter().filter(|a| a.is_relevant()).collect();
    if relevant.is_empty() {
        println!("\nNo relevant cybersecurity articles found after classification.");
        return;
    }
    println!(
        "\nTop {} relevant cybersecurity articles:",
        relevant.len().min(limit)
    );
    for (i, a) in relevant.iter().take(limit).enumerate() {
        println!("\n{}. {}", i + 1, a.title);
        println!("   Published: {} by {}", a.published_display(), a.source);
        println!("   Relevance: {}", a.rationale.as_deref().unwrap_or(""));
        println!("   {}", a.url);
    }
}

/// First `lines` lines of the report, with `...` when there is more.
pub fn report_preview(body: &str, lines: usize) -> String {
    let mut preview = body.lines().take(lines).collect::<Vec<_>>().join("\n");
    if body.lines().count() > lines {
        preview.push_str("\n...");
    }
    preview
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawArticle;

    fn dated(title: &str, published: Option<&str>) -> Article {
        Article::from_raw(
            RawArticle {
                title: Some(title.to_string()),
                published_at: published.map(str::to_string),
                ..Default::default()
            },
            "everything",
        )
    }

    #[test]
    fn test_newest_first() {
        let articles = vec![
            dated("old", Some("2025-05-01T00:00:00Z")),
            dated("undated", None),
            dated("new", Some("2025-05-09T00:00:00Z")),
        ];
        let titles: Vec<&str> = newest_first(&articles, 5)
            .iter()
            .map(|a| a.title.as_str())
            .collect();
        assert_eq!(titles, vec!["new", "old", "undated"]);
        assert_eq!(newest_first(&articles, 1).len(), 1);
    }

    #[test]
    fn test_report_preview() {
        let body = "a\nb\nc\nd";
        assert_eq!(report_preview(body, 2), "a\nb\n...");
        assert_eq!(report_preview(body, 10), "a\nb\nc\nd");
    }
}
