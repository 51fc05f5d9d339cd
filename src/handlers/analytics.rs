use crate::{error::ApiError, services::AnalyticsService};
use actix_web::{get, web, HttpResponse};
use tracing::info_span;
use uuid::Uuid;

/// Top brands and popular categories across the catalog.
#[get("/analytics")]
pub async fn get_analytics(
    analytics_service: web::Data<AnalyticsService>,
) -> Result<HttpResponse, ApiError> {
    let summary = info_span!("analytics", request_id = %Uuid::new_v4())
        .in_scope(|| analytics_service.summarize())?;

    Ok(HttpResponse::Ok().json(summary))
}
