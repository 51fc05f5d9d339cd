use crate::{
    config::RecommendationConfig,
    error::{ApiError, Result},
    ml::SentenceEncoder,
    models::RecommendedProduct,
    services::{dataset::Dataset, DescriptionGenerator, VectorSearch},
};
use std::{future::Future, sync::Arc};
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Query text → embedding → vector index → catalog join → response items.
pub struct RecommendationService {
    encoder: Arc<dyn SentenceEncoder>,
    search: Arc<dyn VectorSearch>,
    describer: Arc<dyn DescriptionGenerator>,
    dataset: Arc<Dataset>,
    limits: RecommendationConfig,
}

impl RecommendationService {
    pub fn new(
        encoder: Arc<dyn SentenceEncoder>,
        search: Arc<dyn VectorSearch>,
        describer: Arc<dyn DescriptionGenerator>,
        dataset: Arc<Dataset>,
        limits: RecommendationConfig,
    ) -> Self {
        Self {
            encoder,
            search,
            describer,
            dataset,
            limits,
        }
    }

    /// Apply the default and enforce `1..=max_top_k`.
    pub fn resolve_top_k(&self, requested: Option<i64>) -> Result<usize> {
        let max = self.limits.max_top_k;
        match requested {
            None => Ok(self.limits.default_top_k),
            Some(k) if k >= 1 && (k as u64) <= max as u64 => Ok(k as usize),
            Some(k) => Err(ApiError::InvalidInput(format!(
                "top_k must be between 1 and {}, got {}",
                max, k
            ))),
        }
    }

    pub async fn recommend(
        &self,
        query: &str,
        top_k: Option<i64>,
    ) -> Result<Vec<RecommendedProduct>> {
        let catalog = self.dataset.catalog()?;

        let query = query.trim();
        if query.is_empty() {
            return Err(ApiError::InvalidInput("Query cannot be empty".to_string()));
        }
        let top_k = self.resolve_top_k(top_k)?;

        // One budget covers both external calls.
        let deadline = Instant::now() + self.limits.request_timeout();

        debug!("Encoding query '{}' (top_k = {})", query, top_k);
        let embedding = self
            .with_deadline(deadline, "embedding", self.encoder.encode(query))
            .await?;

        let mut matches = self
            .with_deadline(
                deadline,
                "vector search",
                self.search.query(&embedding, top_k),
            )
            .await?;
        matches.truncate(top_k);
        debug!("Vector index returned {} matches", matches.len());

        let ids: Vec<String> = matches.into_iter().map(|m| m.id).collect();
        let products = catalog.lookup_many(&ids).map_err(|e| {
            warn!("Catalog and vector index disagree: {}", e);
            e
        })?;

        let mut recommendations = Vec::with_capacity(products.len());
        for product in products {
            recommendations.push(RecommendedProduct {
                genai_description: self.describer.describe(product).await?,
                product: product.clone(),
            });
        }

        info!(
            "Recommended {} products for query '{}'",
            recommendations.len(),
            query
        );
        Ok(recommendations)
    }

    async fn with_deadline<T>(
        &self,
        deadline: Instant,
        step: &str,
        call: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        let budget = self.limits.request_timeout();
        tokio::time::timeout_at(deadline, call).await.map_err(|_| {
            warn!("{} ran past the {:?} request budget", step, budget);
            ApiError::Timeout(format!(
                "{} did not complete within the {:?} request budget",
                step, budget
            ))
        })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ml::sentence_encoder::MockSentenceEncoder,
        models::SearchMatch,
        services::{
            dataset::tests::sample_catalog, vector_search::MockVectorSearch,
            TemplateDescriptionGenerator,
        },
    };
    use async_trait::async_trait;
    use std::time::Duration;

    fn limits() -> RecommendationConfig {
        RecommendationConfig {
            default_top_k: 5,
            max_top_k: 10,
            request_timeout_secs: 5,
        }
    }

    fn hit(id: &str, score: f32) -> SearchMatch {
        SearchMatch {
            id: id.to_string(),
            score,
        }
    }

    fn service(
        encoder: impl SentenceEncoder + 'static,
        search: impl VectorSearch + 'static,
        dataset: Dataset,
    ) -> RecommendationService {
        RecommendationService::new(
            Arc::new(encoder),
            Arc::new(search),
            Arc::new(TemplateDescriptionGenerator),
            Arc::new(dataset),
            limits(),
        )
    }

    fn encoder_returning(vector: Vec<f32>) -> MockSentenceEncoder {
        let mut encoder = MockSentenceEncoder::new();
        encoder
            .expect_encode()
            .times(1)
            .returning(move |_| Ok(vector.clone()));
        encoder
    }

    fn ids(products: &[RecommendedProduct]) -> Vec<&str> {
        products.iter().map(|p| p.product.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_recommend_keeps_match_order() {
        let mut search = MockVectorSearch::new();
        search.expect_query().times(1).returning(|vector, top_k| {
            assert_eq!(vector, &[0.6, 0.8]);
            assert_eq!(top_k, 3);
            Ok(vec![hit("c", 0.9), hit("a", 0.7), hit("b", 0.2)])
        });

        let service = service(
            encoder_returning(vec![0.6, 0.8]),
            search,
            Dataset::Ready(sample_catalog()),
        );
        let products = service.recommend("usb gadgets", Some(3)).await.unwrap();

        assert_eq!(ids(&products), vec!["c", "a", "b"]);
        assert_eq!(
            products[1].genai_description,
            "This is a creative, AI-generated description for the product titled 'Wireless Mouse'."
        );
    }

    #[tokio::test]
    async fn test_recommend_never_exceeds_top_k() {
        let mut search = MockVectorSearch::new();
        search
            .expect_query()
            .returning(|_, _| Ok(vec![hit("a", 0.9), hit("b", 0.8), hit("c", 0.7)]));

        let service = service(
            encoder_returning(vec![1.0]),
            search,
            Dataset::Ready(sample_catalog()),
        );
        let products = service.recommend("desk", Some(2)).await.unwrap();
        assert_eq!(ids(&products), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_default_top_k_applies() {
        let mut search = MockVectorSearch::new();
        search.expect_query().times(1).returning(|_, top_k| {
            assert_eq!(top_k, 5);
            Ok(vec![hit("a", 0.9)])
        });

        let service = service(
            encoder_returning(vec![1.0]),
            search,
            Dataset::Ready(sample_catalog()),
        );
        assert_eq!(service.recommend("mouse", None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_top_k_rejected_before_external_calls() {
        let service = service(
            MockSentenceEncoder::new(),
            MockVectorSearch::new(),
            Dataset::Ready(sample_catalog()),
        );

        for k in [0, -3, 11] {
            assert!(matches!(
                service.recommend("mouse", Some(k)).await,
                Err(ApiError::InvalidInput(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_blank_query_rejected() {
        let service = service(
            MockSentenceEncoder::new(),
            MockVectorSearch::new(),
            Dataset::Ready(sample_catalog()),
        );
        assert!(matches!(
            service.recommend("   ", None).await,
            Err(ApiError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_dataset_unavailable() {
        let service = service(
            MockSentenceEncoder::new(),
            MockVectorSearch::new(),
            Dataset::Unavailable("dataset file missing.csv not found".into()),
        );
        assert!(matches!(
            service.recommend("mouse", None).await,
            Err(ApiError::DatasetUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let mut search = MockVectorSearch::new();
        search
            .expect_query()
            .returning(|_, _| Ok(vec![hit("a", 0.9), hit("ghost", 0.8)]));

        let service = service(
            encoder_returning(vec![1.0]),
            search,
            Dataset::Ready(sample_catalog()),
        );
        match service.recommend("mouse", None).await {
            Err(ApiError::NotFound(msg)) => assert!(msg.contains("ghost")),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_search_failure_propagates() {
        let mut search = MockVectorSearch::new();
        search
            .expect_query()
            .returning(|_, _| Err(ApiError::SearchUnavailable("connection refused".into())));

        let service = service(
            encoder_returning(vec![1.0]),
            search,
            Dataset::Ready(sample_catalog()),
        );
        assert!(matches!(
            service.recommend("mouse", None).await,
            Err(ApiError::SearchUnavailable(_))
        ));
    }

    struct SlowEncoder(Duration);

    #[async_trait]
    impl SentenceEncoder for SlowEncoder {
        async fn encode(&self, _text: &str) -> Result<Vec<f32>> {
            tokio::time::sleep(self.0).await;
            Ok(vec![1.0])
        }
    }

    struct SlowSearch(Duration);

    #[async_trait]
    impl VectorSearch for SlowSearch {
        async fn query(&self, _vector: &[f32], _top_k: usize) -> Result<Vec<SearchMatch>> {
            tokio::time::sleep(self.0).await;
            Ok(vec![hit("a", 0.9)])
        }
    }

    #[tokio::test]
    async fn test_stalled_encoder_times_out() {
        let mut service = service(
            SlowEncoder(Duration::from_secs(60)),
            MockVectorSearch::new(),
            Dataset::Ready(sample_catalog()),
        );
        service.limits.request_timeout_secs = 0;

        assert!(matches!(
            service.recommend("mouse", None).await,
            Err(ApiError::Timeout(_))
        ));
    }

    #[tokio::test]
    async fn test_budget_is_shared_across_both_calls() {
        // Each call fits the budget alone; together they overrun it.
        let mut service = service(
            SlowEncoder(Duration::from_millis(700)),
            SlowSearch(Duration::from_millis(700)),
            Dataset::Ready(sample_catalog()),
        );
        service.limits.request_timeout_secs = 1;

        match service.recommend("mouse", None).await {
            Err(ApiError::Timeout(msg)) => assert!(msg.contains("vector search")),
            other => panic!("expected Timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_calls_within_budget_succeed() {
        let mut service = service(
            SlowEncoder(Duration::from_millis(50)),
            SlowSearch(Duration::from_millis(50)),
            Dataset::Ready(sample_catalog()),
        );
        service.limits.request_timeout_secs = 2;

        let products = service.recommend("mouse", None).await.unwrap();
        assert_eq!(ids(&products), vec!["a"]);
    }
}
