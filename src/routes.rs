use actix_web::web;

use crate::error::ApiError;
use crate::handlers::{get_analytics, health_check, recommendations_config};

/// Configure all routes for the API
pub fn api_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| ApiError::InvalidInput(err.to_string()).into()),
    )
    .service(health_check)
    .service(get_analytics)
    .configure(recommendations_config);
}
