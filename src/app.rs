use crate::{
    config::Config,
    error::Result,
    ml::{HuggingFaceEmbedder, SentenceEncoder},
    routes::api_routes,
    services::{
        AnalyticsService, Dataset, DescriptionGenerator, PineconeClient, RecommendationService,
        TemplateDescriptionGenerator, VectorSearch,
    },
};
use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use log::info;
use std::{net::TcpListener, sync::Arc};

/// Everything the request handlers need, built once before serving.
pub struct AppContext {
    pub dataset: Arc<Dataset>,
    pub recommendation_service: web::Data<RecommendationService>,
    pub analytics_service: web::Data<AnalyticsService>,
}

impl AppContext {
    /// Initialize clients and load the catalog.
    ///
    /// A missing catalog does not abort startup; an unusable model or index configuration does.
    pub async fn initialize(config: &Config) -> Result<Self> {
        info!("Initializing embedding client...");
        let embedder = HuggingFaceEmbedder::new(&config.embedding)?;
        if config.embedding.verify_on_startup {
            embedder
                .verify()
                .await
                .context("Embedding model failed startup verification")?;
        }

        info!("Initializing Pinecone client for {}...", config.pinecone.index_host);
        let pinecone = PineconeClient::new(&config.pinecone)?;

        let dataset = Arc::new(Dataset::load(
            &config.dataset.path,
            &config.dataset.id_column,
        ));

        Ok(Self::with_components(
            config,
            Arc::new(embedder),
            Arc::new(pinecone),
            Arc::new(TemplateDescriptionGenerator),
            dataset,
        ))
    }

    pub fn with_components(
        config: &Config,
        encoder: Arc<dyn SentenceEncoder>,
        search: Arc<dyn VectorSearch>,
        describer: Arc<dyn DescriptionGenerator>,
        dataset: Arc<Dataset>,
    ) -> Self {
        let recommendation_service = web::Data::new(RecommendationService::new(
            encoder,
            search,
            describer,
            dataset.clone(),
            config.recommendation.clone(),
        ));
        let analytics_service = web::Data::new(AnalyticsService::new(dataset.clone()));

        Self {
            dataset,
            recommendation_service,
            analytics_service,
        }
    }
}

pub struct Application {
    config: Config,
}

impl Application {
    /// Create a new application instance
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Build and run the server
    pub async fn run(&self) -> Result<()> {
        let bind_address = format!("{}:{}", self.config.server.host, self.config.server.port);
        let listener = TcpListener::bind(&bind_address)?;
        info!("Starting server at http://{}", bind_address);

        self.run_with_listener(listener).await
    }

    /// Run the server with a specific TCP listener
    /// This is useful for testing where we want to use a random port
    pub async fn run_with_listener(&self, listener: TcpListener) -> Result<()> {
        let context = AppContext::initialize(&self.config).await?;
        self.serve(context, listener).await
    }

    pub async fn serve(&self, context: AppContext, listener: TcpListener) -> Result<()> {
        let dataset = web::Data::from(context.dataset);
        let recommendation_service = context.recommendation_service;
        let analytics_service = context.analytics_service;
        let origins = self.config.server.cors_origins.clone();

        HttpServer::new(move || {
            App::new()
                .wrap(cors(&origins))
                .wrap(Logger::default())
                .app_data(dataset.clone())
                .app_data(recommendation_service.clone())
                .app_data(analytics_service.clone())
                .configure(api_routes)
        })
        .listen(listener)?
        .run()
        .await?;

        Ok(())
    }
}

fn cors(origins: &[String]) -> Cors {
    origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allow_any_method()
        .allow_any_header()
        .supports_credentials()
}
