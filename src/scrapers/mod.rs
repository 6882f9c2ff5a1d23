//! Article discovery and content retrieval.
//!
//! The pipeline gathers articles in two phases:
//!
//! 1. **Searching**: query NewsAPI with several variants and merge the records
//! 2. **Fetching**: optionally download each article page and extract its main text
//!
//! | Phase | Module | Method | Notes |
//! |-------|--------|--------|-------|
//! | Searching | [`newsapi`] | NewsAPI `top-headlines` + `everything` | Requires `NEWS_API_KEY` |
//! | Fetching | [`article`] | HTML scraping | Longest paragraph run heuristic |
//!
//! Both phases log and skip individual failures instead of failing the run.

pub mod article;
pub mod newsapi;
