pub mod analytics;
pub mod dataset;
pub mod description;
pub mod pinecone;
pub mod recommendation;
pub mod vector_search;

// Re-export public types
pub use analytics::AnalyticsService;
pub use dataset::{Catalog, Dataset};
pub use description::{DescriptionGenerator, TemplateDescriptionGenerator};
pub use pinecone::PineconeClient;
pub use recommendation::RecommendationService;
pub use vector_search::VectorSearch;
