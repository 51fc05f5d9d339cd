use serde::{Deserialize, Serialize};

pub use analytics::{AnalyticsSummary, BrandCount, CategoryCount};
pub use product::{is_null_cell, Product, RecommendedProduct};

mod analytics;
mod product;

/// Request body for `POST /recommend`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationRequest {
    /// Free-text description of what the shopper is looking for
    pub query: String,
    /// Number of products to return; the configured default applies when absent.
    /// Signed so that negative values reach validation instead of failing to parse.
    #[serde(default)]
    pub top_k: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecommendationResponse {
    pub products: Vec<RecommendedProduct>,
}

/// A single nearest-neighbour hit from the vector index.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchMatch {
    pub id: String,
    pub score: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetHealth {
    pub loaded: bool,
    pub products: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub dataset: DatasetHealth,
    pub timestamp: String,
}
