use crate::error::Result;
use async_trait::async_trait;

/// Turns text into a fixed-length embedding vector.
///
/// Implementations must be deterministic for a given model and input and
/// always return vectors of the model's fixed dimension.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SentenceEncoder: Send + Sync {
    async fn encode(&self, text: &str) -> Result<Vec<f32>>;
}
