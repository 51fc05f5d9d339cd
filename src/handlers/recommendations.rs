use crate::{
    error::ApiError,
    models::{RecommendationRequest, RecommendationResponse},
    services::RecommendationService,
};
use actix_web::{
    web::{self, Json},
    HttpResponse,
};
use tracing::{info_span, Instrument};
use uuid::Uuid;

pub fn recommendations_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/recommend").route(web::post().to(get_recommendations)));
}

/// Recommend catalog products for a free-text query.
pub async fn get_recommendations(
    request: Json<RecommendationRequest>,
    recommendation_service: web::Data<RecommendationService>,
) -> Result<HttpResponse, ApiError> {
    let request = request.into_inner();
    let span = info_span!("recommend", request_id = %Uuid::new_v4(), top_k = ?request.top_k);

    let products = recommendation_service
        .recommend(&request.query, request.top_k)
        .instrument(span)
        .await?;

    Ok(HttpResponse::Ok().json(RecommendationResponse { products }))
}
