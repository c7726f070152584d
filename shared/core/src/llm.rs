//! LLM client abstraction.
//!
//! The provider internals are out of scope; components only depend on the
//! two narrow traits below so tests can substitute stub clients. The
//! concrete `GenAiClient` generalizes the teacher's single-purpose OpenAI
//! embedding wrapper into one client that also does text completion, since
//! the classifier and topic labeler both need a JSON-mode chat call.

use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
        CreateEmbeddingRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LlmError {
    #[error("llm transport error: {0}")]
    Transport(String),
    #[error("llm returned an empty response")]
    EmptyResponse,
}

#[async_trait]
pub trait TextCompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError>;
    fn dimension(&self) -> usize;
}

/// Default embedding dimension per known model, mirroring the embedding
/// service's own provider table.
static DEFAULT_EMBEDDING_DIMENSIONS: phf::Map<&'static str, usize> = phf::phf_map! {
    "text-embedding-3-small" => 1536,
    "text-embedding-3-large" => 3072,
    "text-embedding-ada-002" => 1536,
};

pub struct GenAiClient {
    client: Client<OpenAIConfig>,
    chat_model: String,
    embedding_model: String,
    embedding_dimension: usize,
}

impl GenAiClient {
    pub fn new(api_base: &str, api_key: &str, chat_model: &str, embedding_model: &str) -> Self {
        let config = OpenAIConfig::new()
            .with_api_base(api_base.to_string())
            .with_api_key(api_key.to_string());

        let embedding_dimension = DEFAULT_EMBEDDING_DIMENSIONS
            .get(embedding_model)
            .copied()
            .unwrap_or(1536);

        Self {
            client: Client::with_config(config),
            chat_model: chat_model.to_string(),
            embedding_model: embedding_model.to_string(),
            embedding_dimension,
        }
    }
}

#[async_trait]
impl TextCompletionClient for GenAiClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let message = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.chat_model)
            .messages(vec![message.into()])
            .build()
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|s| !s.trim().is_empty())
            .ok_or(LlmError::EmptyResponse)
    }
}

#[async_trait]
impl EmbeddingProvider for GenAiClient {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.embedding_model)
            .input(texts.to_vec())
            .build()
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        Ok(response.data.into_iter().map(|d| d.embedding).collect())
    }

    fn dimension(&self) -> usize {
        self.embedding_dimension
    }
}

/// Strips a leading/trailing markdown code fence (```` ``` ```` or
/// ` ```json `) from an LLM response before JSON parsing.
pub fn strip_markdown_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_json_fence() {
        let raw = "```json\n{\"a\":1}\n```";
        assert_eq!(strip_markdown_fences(raw), "{\"a\":1}");
    }

    #[test]
    fn strips_bare_fence() {
        let raw = "```\n{\"a\":1}\n```";
        assert_eq!(strip_markdown_fences(raw), "{\"a\":1}");
    }

    #[test]
    fn passes_through_plain_json() {
        assert_eq!(strip_markdown_fences("{\"a\":1}"), "{\"a\":1}");
    }
}
