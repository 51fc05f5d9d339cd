use crate::{error::Result, models::SearchMatch};
use async_trait::async_trait;

/// Nearest-neighbour lookup against a vector index.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VectorSearch: Send + Sync {
    /// Return at most `top_k` matches, most relevant first, in the index's own order.
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<SearchMatch>>;
}
