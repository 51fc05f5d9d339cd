use crate::{
    config::EmbeddingConfig,
    error::{ApiError, Result},
    ml::SentenceEncoder,
};
use async_trait::async_trait;
use log::info;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

const MAX_TEXT_PREVIEW_LENGTH: usize = 100;
const PROBE_TEXT: &str = "wireless noise cancelling headphones";

/// Sentence encoder backed by a hosted sentence-transformers feature-extraction endpoint.
#[derive(Clone)]
pub struct HuggingFaceEmbedder {
    client: Client,
    api_key: Option<String>,
    model_url: String,
    model_name: String,
    dimension: usize,
}

#[derive(Serialize)]
struct EncodeRequest<'a> {
    inputs: &'a str,
    options: Options,
}

#[derive(Serialize)]
struct Options {
    wait_for_model: bool,
    use_cache: bool,
}

impl HuggingFaceEmbedder {
    /// Build the client. Fails on unusable configuration; no network traffic.
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        if config.model.trim().is_empty() {
            return Err(ApiError::Configuration(
                "embedding.model cannot be empty".to_string(),
            ));
        }

        let api_key = config
            .api_key
            .as_ref()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(10)
            .tcp_keepalive(Some(Duration::from_secs(60)))
            .build()
            .map_err(|e| ApiError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        let model_url = format!(
            "{}/models/{}",
            config.base_url.trim_end_matches('/'),
            config.model
        );

        info!(
            "Initializing embedding client with model: {}, timeout: {}s",
            config.model, config.timeout_secs
        );

        Ok(Self {
            client,
            api_key,
            model_url,
            model_name: config.model.clone(),
            dimension: config.dimension,
        })
    }

    /// Encode a probe sentence so a broken model surfaces at startup rather than on the first request.
    pub async fn verify(&self) -> Result<()> {
        info!("Verifying embedding model {}...", self.model_name);
        self.encode(PROBE_TEXT).await.map_err(|e| {
            error!("Embedding model {} failed verification: {}", self.model_name, e);
            e
        })?;
        info!("Embedding model {} ready", self.model_name);
        Ok(())
    }

    async fn request(&self, input: &str) -> Result<reqwest::Response> {
        let body = EncodeRequest {
            inputs: input,
            options: Options {
                wait_for_model: true,
                use_cache: false,
            },
        };

        let mut request = self.client.post(&self.model_url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        request.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout(format!("embedding request to {} timed out", self.model_name))
            } else {
                ApiError::EmbeddingUnavailable(format!("request to model API failed: {}", e))
            }
        })
    }

    async fn parse_response(&self, response: reqwest::Response) -> Result<Vec<f32>> {
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ApiError::EmbeddingUnavailable(match status.as_u16() {
                404 => format!("model not found: {}", self.model_name),
                401 | 403 => "authentication with the model API failed".to_string(),
                429 => "model API rate limit exceeded".to_string(),
                _ => format!("model API returned {}: {}", status, text),
            }));
        }

        let json: serde_json::Value = response.json().await.map_err(|e| {
            ApiError::EmbeddingUnavailable(format!("unparseable model response: {}", e))
        })?;

        let embedding = extract_embedding(json).ok_or_else(|| {
            ApiError::EmbeddingUnavailable("no embedding found in model response".to_string())
        })?;

        if embedding.len() != self.dimension {
            return Err(ApiError::EmbeddingUnavailable(format!(
                "model returned {} dimensions, expected {}",
                embedding.len(),
                self.dimension
            )));
        }

        Ok(normalize_vector(&embedding))
    }
}

#[async_trait]
impl SentenceEncoder for HuggingFaceEmbedder {
    async fn encode(&self, text: &str) -> Result<Vec<f32>> {
        let preview: String = text.chars().take(MAX_TEXT_PREVIEW_LENGTH).collect();
        debug!("Encoding text (length: {}): {}", text.len(), preview);

        let response = self.request(text.trim()).await?;
        let embedding = self.parse_response(response).await?;

        debug!("Got embedding of size {}", embedding.len());
        Ok(embedding)
    }
}

/// Accepts `[f, ...]`, `[[f, ...]]`, `{"embedding": [...]}` and `{"embeddings": [[...]]}`.
fn extract_embedding(json: serde_json::Value) -> Option<Vec<f32>> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum EmbeddingResponse {
        Flat(Vec<f32>),
        Nested(Vec<Vec<f32>>),
        Single { embedding: Vec<f32> },
        Batch { embeddings: Vec<Vec<f32>> },
    }

    let embedding = match serde_json::from_value(json).ok()? {
        EmbeddingResponse::Flat(v) | EmbeddingResponse::Single { embedding: v } => v,
        EmbeddingResponse::Nested(v) | EmbeddingResponse::Batch { embeddings: v } => {
            v.into_iter().next()?
        }
    };

    (!embedding.is_empty()).then_some(embedding)
}

/// Normalize a vector to unit length
fn normalize_vector(vector: &[f32]) -> Vec<f32> {
    let magnitude = vector.iter().map(|&x| x * x).sum::<f32>().sqrt();

    if magnitude > 0.0 {
        vector.iter().map(|&x| x / magnitude).collect()
    } else {
        vec![0.0; vector.len()]
    }
}
