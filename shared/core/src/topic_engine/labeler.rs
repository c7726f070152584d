//! Per-cluster LLM labeling: one JSON-mode request per cluster asking for a
//! short label and description, with a degrade-gracefully parse fallback
//! and deterministic title cleanup.

use crate::llm::{strip_markdown_fences, TextCompletionClient};
use crate::models::Keyword;
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

#[derive(Debug, Deserialize)]
struct RawLabel {
    label: String,
    description: String,
}

pub struct ClusterLabel {
    pub title: String,
    pub description: String,
}

pub async fn label_cluster<C: TextCompletionClient>(
    client: &C,
    keywords: &[Keyword],
    representative_docs: &[String],
) -> ClusterLabel {
    let keyword_list = keywords
        .iter()
        .map(|(term, _)| term.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let docs = representative_docs
        .iter()
        .enumerate()
        .map(|(i, d)| format!("{}. {}", i + 1, d))
        .collect::<Vec<_>>()
        .join("\n");

    let prompt = format!(
        "Given these keywords: {keyword_list}\nand these representative documents:\n{docs}\n\
         Return ONLY a raw JSON object with keys 'label' (about 5 words) and 'description' \
         (about two sentences) summarizing this topic cluster."
    );

    let raw = match client.complete(&prompt).await {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(error = %e, "cluster labeling llm call failed, using degraded label");
            return degrade("");
        }
    };

    let cleaned = strip_markdown_fences(&raw);
    match serde_json::from_str::<RawLabel>(cleaned) {
        Ok(parsed) => ClusterLabel {
            title: clean_title(&parsed.label),
            description: parsed.description,
        },
        Err(_) => degrade(&raw),
    }
}

fn degrade(raw: &str) -> ClusterLabel {
    let label: String = raw.chars().take(50).collect();
    ClusterLabel {
        title: clean_title(&label),
        description: raw.to_string(),
    }
}

fn numeric_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+_").unwrap())
}

fn label_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(label|topic|name):\s*").unwrap())
}

/// Strips a leading `\d+_` numeric prefix, replaces underscores with
/// spaces, strips a leading `label:|topic:|name:` prefix, trims surrounding
/// quotes, and capitalizes the first letter.
pub fn clean_title(raw: &str) -> String {
    let without_numeric = numeric_prefix().replace(raw.trim(), "");
    let spaced = without_numeric.replace('_', " ");
    let without_label = label_prefix().replace(&spaced, "");
    let trimmed = without_label.trim().trim_matches(|c| c == '"' || c == '\'');

    let lowered = trimmed.to_lowercase();
    let mut chars = lowered.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => "Misc".to_string(),
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
    async fn happy_path_parses_json() {
        let client = StubClient(Ok(
            "{\"label\":\"Neural Vision Methods\",\"description\":\"S1. S2.\"}".to_string(),
        ));
        let label = label_cluster(&client, &[], &[]).await;
        assert_eq!(label.title, "Neural vision methods");
        assert_eq!(label.description, "S1. S2.");
    }

    #[tokio::test]
    async fn malformed_response_degrades() {
        let client = StubClient(Ok("this is not json at all".to_string()));
        let label = label_cluster(&client, &[], &[]).await;
        assert_eq!(label.title, "This is not json at all");
        assert_eq!(label.description, "this is not json at all");
    }

    #[test]
    fn title_cleanup_strips_prefixes_and_quotes() {
        assert_eq!(clean_title("3_graph_neural_networks"), "Graph neural networks");
        assert_eq!(clean_title("label: \"vision transformers\""), "Vision transformers");
        assert_eq!(clean_title("topic: reinforcement_learning"), "Reinforcement learning");
    }
}
