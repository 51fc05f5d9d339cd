use crate::{models::HealthResponse, services::Dataset};
use actix_web::{get, web, HttpResponse};

#[get("/health")]
pub async fn health_check(dataset: web::Data<Dataset>) -> HttpResponse {
    let dataset = dataset.health();
    let status = if dataset.loaded { "ok" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status,
        dataset,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
