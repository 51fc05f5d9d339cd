use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Dataset not loaded: {0}")]
    DatasetUnavailable(String),

    #[error("Vector search unavailable: {0}")]
    SearchUnavailable(String),

    #[error("Embedding model unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Machine-readable kind reported alongside the message.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::DatasetUnavailable(_) => "dataset_unavailable",
            ApiError::SearchUnavailable(_) => "search_unavailable",
            ApiError::EmbeddingUnavailable(_) => "embedding_unavailable",
            ApiError::NotFound(_) => "not_found",
            ApiError::InvalidInput(_) => "validation_error",
            ApiError::Timeout(_) => "timeout",
            ApiError::Configuration(_) => "configuration_error",
            ApiError::Internal(_) => "internal_error",
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    kind: &'static str,
    status: u16,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::DatasetUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::SearchUnavailable(_) | ApiError::EmbeddingUnavailable(_) => {
                StatusCode::BAD_GATEWAY
            }
            ApiError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            // An id the index knows but the catalog doesn't is our data problem, not the caller's.
            ApiError::NotFound(_) | ApiError::Configuration(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        HttpResponse::build(status).json(ErrorResponse {
            error: self.to_string(),
            kind: self.kind(),
            status: status.as_u16(),
        })
    }
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::Configuration(err.to_string())
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(format!("{:#}", err))
    }
}
