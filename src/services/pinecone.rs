use crate::{
    config::PineconeConfig,
    error::{ApiError, Result},
    models::SearchMatch,
    services::VectorSearch,
};
use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE},
    Client,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

const API_VERSION: &str = "2024-07";

#[derive(Debug, Clone)]
pub struct PineconeClient {
    client: Client,
    base_url: String,
    namespace: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<&'a str>,
    pub vector: &'a [f32],
    pub top_k: usize,
    pub include_values: bool,
    pub include_metadata: bool,
}

#[derive(Debug, Deserialize)]
pub struct QueryMatch {
    pub id: String,
    #[serde(default)]
    pub score: f32,
}

#[derive(Debug, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub matches: Vec<QueryMatch>,
    #[serde(default)]
    pub namespace: String,
}

impl PineconeClient {
    pub fn new(config: &PineconeConfig) -> Result<Self> {
        let api_key = HeaderValue::from_str(config.api_key.trim()).map_err(|_| {
            ApiError::Configuration("Pinecone API key is not a valid header value".to_string())
        })?;

        let mut headers = HeaderMap::new();
        headers.insert("Api-Key", api_key);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "X-Pinecone-API-Version",
            HeaderValue::from_static(API_VERSION),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ApiError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.index_host.trim_end_matches('/').to_string(),
            namespace: config.namespace.clone().filter(|ns| !ns.is_empty()),
        })
    }
}

#[async_trait]
impl VectorSearch for PineconeClient {
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<SearchMatch>> {
        let request = QueryRequest {
            namespace: self.namespace.as_deref(),
            vector,
            top_k,
            include_values: false,
            include_metadata: false,
        };

        let response = self
            .client
            .post(format!("{}/query", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ApiError::Timeout("Pinecone query timed out".to_string())
                } else {
                    ApiError::SearchUnavailable(format!("Pinecone unreachable: {}", e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("Pinecone query failed with {}: {}", status, error_text);
            return Err(ApiError::SearchUnavailable(format!(
                "Pinecone query failed with {}: {}",
                status, error_text
            )));
        }

        let query_response: QueryResponse = response.json().await.map_err(|e| {
            ApiError::SearchUnavailable(format!("Unparseable Pinecone response: {}", e))
        })?;

        debug!(
            "Pinecone returned {} matches from namespace '{}'",
            query_response.matches.len(),
            query_response.namespace
        );

        Ok(query_response
            .matches
            .into_iter()
            .map(|m| SearchMatch {
                id: m.id,
                score: m.score,
            })
            .collect())
    }
}
