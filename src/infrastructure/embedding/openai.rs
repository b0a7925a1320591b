//! OpenAI-compatible embedding client

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::domain::embedding::EmbeddingClient;
use crate::domain::DomainError;
use crate::infrastructure::http_client::HttpClientTrait;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Known OpenAI embedding models and their dimensions
const EMBEDDING_MODELS: &[(&str, usize)] = &[
    ("text-embedding-3-small", 1536),
    ("text-embedding-3-large", 3072),
    ("text-embedding-ada-002", 1536),
];

/// Dimension of a known model
pub fn model_dimensions(model: &str) -> Option<usize> {
    EMBEDDING_MODELS
        .iter()
        .find(|(name, _)| *name == model)
        .map(|(_, dims)| *dims)
}

/// Embedding client for `POST {base_url}/v1/embeddings`
#[derive(Debug)]
pub struct OpenAiEmbeddingClient<C: HttpClientTrait> {
    client: C,
    auth_header: String,
    base_url: String,
    model: String,
    dimensions: usize,
}

impl<C: HttpClientTrait> OpenAiEmbeddingClient<C> {
    /// Client for a model with the given output dimension
    pub fn new(
        client: C,
        api_key: impl Into<String>,
        model: impl Into<String>,
        dimensions: usize,
    ) -> Self {
        Self {
            client,
            auth_header: format!("Bearer {}", api_key.into()),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            model: model.into(),
            dimensions,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn embeddings_url(&self) -> String {
        format!("{}/v1/embeddings", self.base_url)
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("Authorization", self.auth_header.as_str()),
            ("Content-Type", "application/json"),
        ]
    }

    fn build_request(&self, texts: &[String]) -> serde_json::Value {
        let mut body = json!({
            "model": self.model,
            "input": texts,
        });

        // Only the v3 models accept a custom output size
        if model_dimensions(&self.model) != Some(self.dimensions) && self.model.contains("-3-") {
            body["dimensions"] = json!(self.dimensions);
        }

        body
    }

    fn parse_response(
        &self,
        json: serde_json::Value,
        expected: usize,
    ) -> Result<Vec<Vec<f32>>, DomainError> {
        let response: OpenAiEmbeddingResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::backend("openai", format!("Failed to parse embedding response: {}", e))
        })?;

        if response.data.len() != expected {
            return Err(DomainError::EmbeddingCountMismatch {
                expected,
                actual: response.data.len(),
            });
        }

        let mut data = response.data;
        data.sort_by_key(|d| d.index);

        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl<C: HttpClientTrait> EmbeddingClient for OpenAiEmbeddingClient<C> {
    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(model = %self.model, count = texts.len(), "Requesting embeddings");

        let body = self.build_request(texts);
        let response = self
            .client
            .post_json(&self.embeddings_url(), self.headers(), &body)
            .await?;

        self.parse_response(response, texts.len())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiEmbeddingResponse {
    data: Vec<OpenAiEmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct OpenAiEmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::http_client::mock::MockHttpClient;

    const TEST_URL: &str = "https://api.openai.com/v1/embeddings";

    fn create_mock_response(indexes: &[usize], dimensions: usize) -> serde_json::Value {
        let data: Vec<serde_json::Value> = indexes
            .iter()
            .map(|&i| {
                let embedding: Vec<f32> = (0..dimensions).map(|j| (i + j) as f32 * 0.001).collect();
                json!({
                    "index": i,
                    "embedding": embedding,
                    "object": "embedding"
                })
            })
            .collect();

        json!({
            "model": "text-embedding-3-small",
            "data": data,
            "usage": {"prompt_tokens": 10, "total_tokens": 10}
        })
    }

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_embed_single_text() {
        let http = MockHttpClient::new().with_response(TEST_URL, create_mock_response(&[0], 1536));
        let client = OpenAiEmbeddingClient::new(http, "test-api-key", DEFAULT_EMBEDDING_MODEL, 1536);

        let vector = client.embed("Hello world").await.unwrap();

        assert_eq!(vector.len(), 1536);
    }

    #[tokio::test]
    async fn test_embed_many_restores_input_order() {
        let http =
            MockHttpClient::new().with_response(TEST_URL, create_mock_response(&[2, 0, 1], 4));
        let client = OpenAiEmbeddingClient::new(http, "key", DEFAULT_EMBEDDING_MODEL, 4);

        let vectors = client.embed_many(&texts(&["a", "b", "c"])).await.unwrap();

        assert_eq!(vectors.len(), 3);
        assert_eq!(vectors[0][0], 0.0);
        assert!((vectors[1][0] - 0.001).abs() < 1e-6);
        assert!((vectors[2][0] - 0.002).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_request_body() {
        let http = MockHttpClient::new().with_response(TEST_URL, create_mock_response(&[0, 1], 4));
        let client = OpenAiEmbeddingClient::new(http, "key", DEFAULT_EMBEDDING_MODEL, 1536);

        let _ = client.embed_many(&texts(&["a", "b"])).await;

        let requests = client.client.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].0, TEST_URL);
        assert_eq!(
            requests[0].1,
            json!({"model": "text-embedding-3-small", "input": ["a", "b"]})
        );
    }

    #[tokio::test]
    async fn test_reduced_dimensions_are_requested() {
        let http = MockHttpClient::new().with_response(TEST_URL, create_mock_response(&[0], 256));
        let client = OpenAiEmbeddingClient::new(http, "key", DEFAULT_EMBEDDING_MODEL, 256);

        client.embed("a").await.unwrap();

        assert_eq!(client.client.requests()[0].1["dimensions"], json!(256));
    }

    #[tokio::test]
    async fn test_count_mismatch() {
        let http = MockHttpClient::new().with_response(TEST_URL, create_mock_response(&[0], 4));
        let client = OpenAiEmbeddingClient::new(http, "key", DEFAULT_EMBEDDING_MODEL, 4);

        let err = client.embed_many(&texts(&["a", "b"])).await.unwrap_err();

        assert!(matches!(
            err,
            DomainError::EmbeddingCountMismatch {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[tokio::test]
    async fn test_empty_batch_skips_request() {
        let client = OpenAiEmbeddingClient::new(MockHttpClient::new(), "key", "m", 4);

        assert!(client.embed_many(&[]).await.unwrap().is_empty());
        assert!(client.client.requests().is_empty());
    }

    #[tokio::test]
    async fn test_embed_error() {
        let http = MockHttpClient::new().with_error(TEST_URL, "Rate limit exceeded");
        let client = OpenAiEmbeddingClient::new(http, "key", DEFAULT_EMBEDDING_MODEL, 1536);

        let err = client.embed("Hello").await.unwrap_err();

        assert!(matches!(err, DomainError::BackendUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_custom_base_url() {
        let custom_url = "http://localhost:8080/v1/embeddings";
        let http = MockHttpClient::new().with_response(custom_url, create_mock_response(&[0], 8));
        let client = OpenAiEmbeddingClient::new(http, "key", DEFAULT_EMBEDDING_MODEL, 8)
            .with_base_url("http://localhost:8080/");

        assert_eq!(client.embed("Test").await.unwrap().len(), 8);
    }

    #[test]
    fn test_model_info() {
        let client = OpenAiEmbeddingClient::new(MockHttpClient::new(), "key", "text-embedding-3-large", 3072);

        assert_eq!(client.model(), "text-embedding-3-large");
        assert_eq!(client.dimensions(), 3072);
        assert_eq!(model_dimensions("text-embedding-3-small"), Some(1536));
        assert_eq!(model_dimensions("unknown-model"), None);
    }
}
