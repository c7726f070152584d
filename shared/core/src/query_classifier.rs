//! Translates a free-text query into a `SourceSelection` via an LLM, with a
//! deterministic fallback on any failure. Never raises to its caller: every
//! error path — transport, malformed JSON, wrong shape — resolves locally to
//! `ArXiv{category: "cs.CV"}`.

use crate::llm::{strip_markdown_fences, TextCompletionClient};
use crate::models::SourceSelection;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use unicode_normalization::UnicodeNormalization;

const FILLER_WORDS: &[&str] = &[
    "current", "latest", "recent", "research", "study", "studies", "trend", "trends", "paper",
    "papers", "growing", "growth",
];

const STOP_WORDS: &[&str] = &["the", "and", "or", "in", "on", "at", "to", "for", "of", "with", "by"];

const FALLBACK_CATEGORY: &str = "cs.CV";
const FALLBACK_CONFIDENCE: f64 = 0.5;

#[derive(Debug, Deserialize)]
struct RawClassification {
    source: String,
    feed: String,
}

pub struct ClassificationOutcome {
    pub selection: SourceSelection,
    pub confidence: f64,
}

pub struct QueryClassifier<C: TextCompletionClient> {
    client: Arc<C>,
}

impl<C: TextCompletionClient> QueryClassifier<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }

    /// Unicode NFC, whitespace collapse, case-insensitive filler-word
    /// removal. Falls back to the original query if stripping fillers
    /// leaves nothing behind.
    pub fn normalize(query: &str) -> String {
        let nfc: String = query.nfc().collect();
        let collapsed = nfc.split_whitespace().collect::<Vec<_>>().join(" ");

        let filler: HashSet<&str> = FILLER_WORDS.iter().copied().collect();
        let stripped = collapsed
            .split_whitespace()
            .filter(|w| !filler.contains(w.to_lowercase().as_str()))
            .collect::<Vec<_>>()
            .join(" ");

        if stripped.trim().is_empty() {
            collapsed
        } else {
            stripped
        }
    }

    /// `Classify(query) -> SourceSelection`. Never fails: any error path
    /// degrades to the fallback selection.
    pub async fn classify(&self, query: &str) -> ClassificationOutcome {
        let normalized = Self::normalize(query);
        if normalized.trim().is_empty() {
            return Self::fallback();
        }

        let prompt = format!(
            "You are an assistant that decides which single feed to query. \
             Return ONLY a raw JSON object with keys 'source' and 'feed'. \
             - source: 'arxiv' or 'reddit'. \
             - feed: if arxiv, an arXiv category (e.g. cs.CV) or advanced query; \
               if reddit, the subreddit name only (e.g. computervision). \
             User query: {normalized}"
        );

        let raw = match self.client.complete(&prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!(error = %e, "classifier llm call failed, falling back to {FALLBACK_CATEGORY}");
                return Self::fallback();
            }
        };

        let cleaned = strip_markdown_fences(&raw);
        let parsed: RawClassification = match serde_json::from_str(cleaned) {
            Ok(p) => p,
            Err(e) => {
                tracing::error!(error = %e, response = %raw, "classifier got malformed json, falling back");
                return Self::fallback();
            }
        };

        match parsed.source.to_lowercase().as_str() {
            "arxiv" => {
                let feed = Self::normalize_feed(&parsed.feed);
                let selection = if crate::models::is_simple_category(&feed) {
                    SourceSelection::Arxiv {
                        category: feed,
                        advanced_query: None,
                    }
                } else {
                    SourceSelection::Arxiv {
                        category: FALLBACK_CATEGORY.to_string(),
                        advanced_query: Some(feed),
                    }
                };
                ClassificationOutcome {
                    selection,
                    confidence: 1.0,
                }
            }
            "reddit" => {
                let subreddit = parsed.feed.trim().trim_start_matches("r/").to_string();
                ClassificationOutcome {
                    selection: SourceSelection::Reddit { subreddit },
                    confidence: 1.0,
                }
            }
            _ => {
                tracing::error!(source = %parsed.source, "classifier returned unknown source, falling back");
                Self::fallback()
            }
        }
    }

    fn normalize_feed(feed: &str) -> String {
        match feed.trim().to_lowercase().as_str() {
            "cv" | "computer vision" => "cs.CV".to_string(),
            _ => feed.trim().to_string(),
        }
    }

    fn fallback() -> ClassificationOutcome {
        ClassificationOutcome {
            selection: SourceSelection::Arxiv {
                category: FALLBACK_CATEGORY.to_string(),
                advanced_query: None,
            },
            confidence: FALLBACK_CONFIDENCE,
        }
    }

    /// Extracts up to five meaningful tokens (lowercased, length >= 3,
    /// excluding the stop set) in encounter order.
    pub fn extract_search_terms(text: &str) -> Vec<String> {
        let stop: HashSet<&str> = STOP_WORDS.iter().copied().collect();
        let mut seen = HashSet::new();
        let mut terms = Vec::new();

        for word in text.split(|c: char| !c.is_ascii_alphabetic()) {
            if terms.len() >= 5 {
                break;
            }
            let lower = word.to_lowercase();
            if lower.len() < 3 || stop.contains(lower.as_str()) || !seen.insert(lower.clone()) {
                continue;
            }
            terms.push(lower);
        }
        terms
    }

    /// `all:"<terms>"+AND+cat:<category>`, or `cat:<category>` if no
    /// meaningful tokens remain.
    pub fn build_advanced_query(search_terms: &str, category: &str) -> String {
        let terms = Self::extract_search_terms(search_terms);
        if terms.is_empty() {
            format!("cat:{category}")
        } else {
            format!("all:\"{}\"+AND+cat:{category}", terms.join(" "))
        }
    }

    /// Static arXiv category taxonomy used by `GET /sources/{source}/categories`.
    pub fn category_suggestions() -> Vec<(&'static str, Vec<&'static str>)> {
        vec![
            (
                "Computer Science",
                vec!["cs.AI", "cs.CL", "cs.CV", "cs.LG", "cs.NE", "cs.RO", "cs.IR"],
            ),
            (
                "Mathematics",
                vec!["math.ST", "math.OC", "math.PR", "math.NA"],
            ),
            (
                "Physics",
                vec!["physics.comp-ph", "quant-ph", "astro-ph.IM"],
            ),
            ("Statistics", vec!["stat.ML", "stat.ME", "stat.AP"]),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmError;
    use async_trait::async_trait;

    struct StubClient(Result<String, LlmError>);

    #[async_trait]
    impl TextCompletionClient for StubClient {
        async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
            self.0.clone()
        }
    }

    #[tokio::test]
    async fn empty_query_never_contacts_llm() {
        let client = Arc::new(StubClient(Err(LlmError::Transport("should not be called".into()))));
        let classifier = QueryClassifier::new(client);
        let outcome = classifier.classify("   ").await;
        assert_eq!(
            outcome.selection,
            SourceSelection::Arxiv {
                category: "cs.CV".to_string(),
                advanced_query: None
            }
        );
    }

    #[tokio::test]
    async fn malformed_llm_response_falls_back() {
        let client = Arc::new(StubClient(Ok("not json".to_string())));
        let classifier = QueryClassifier::new(client);
        let outcome = classifier.classify("latest research on AI").await;
        assert_eq!(
            outcome.selection,
            SourceSelection::Arxiv {
                category: "cs.CV".to_string(),
                advanced_query: None
            }
        );
        assert_eq!(outcome.confidence, 0.5);
    }

    #[tokio::test]
    async fn happy_path_advanced_query() {
        let client = Arc::new(StubClient(Ok(
            "```json\n{\"source\":\"arxiv\",\"feed\":\"all:\\\"graph neural network\\\"+AND+cat:cs.CV\"}\n```"
                .to_string(),
        )));
        let classifier = QueryClassifier::new(client);
        let outcome = classifier
            .classify("graph neural networks in computer vision")
            .await;
        assert_eq!(
            outcome.selection,
            SourceSelection::Arxiv {
                category: "cs.CV".to_string(),
                advanced_query: Some("all:\"graph neural network\"+AND+cat:cs.CV".to_string())
            }
        );
    }

    #[test]
    fn advanced_query_builder_strips_stop_words_and_short_tokens() {
        let q = QueryClassifier::<crate::llm::GenAiClient>::build_advanced_query(
            "the latest trends in graph neural networks",
            "cs.LG",
        );
        assert_eq!(q, "all:\"latest trends graph neural networks\"+AND+cat:cs.LG");
    }

    #[test]
    fn advanced_query_builder_falls_back_to_category_only() {
        let q = QueryClassifier::<crate::llm::GenAiClient>::build_advanced_query("a an", "cs.LG");
        assert_eq!(q, "cat:cs.LG");
    }

    #[test]
    fn reddit_subreddit_trims_prefix() {
        assert_eq!("r/vision".trim_start_matches("r/"), "vision");
    }
}
