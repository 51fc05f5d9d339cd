use crate::{error::Result, models::Product};
use async_trait::async_trait;

/// Produces the `genai_description` attached to each recommended product.
#[async_trait]
pub trait DescriptionGenerator: Send + Sync {
    async fn describe(&self, product: &Product) -> Result<String>;
}

/// Deterministic placeholder text built from the product title.
#[derive(Debug, Clone, Default)]
pub struct TemplateDescriptionGenerator;

impl TemplateDescriptionGenerator {
    pub fn render(title: &str) -> String {
        format!(
            "This is a creative, AI-generated description for the product titled '{}'.",
            title
        )
    }
}

#[async_trait]
impl DescriptionGenerator for TemplateDescriptionGenerator {
    async fn describe(&self, product: &Product) -> Result<String> {
        Ok(Self::render(product.title.as_deref().unwrap_or("Untitled")))
    }
}
