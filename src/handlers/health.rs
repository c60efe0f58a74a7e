use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;

use crate::error::ApiError;
use crate::models::HealthStatus;
use crate::state::AppState;

pub async fn index() -> impl Responder {
    HttpResponse::Ok().content_type("text/plain").body("API is running...")
}

pub async fn health(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(HealthStatus {
        status: "healthy".to_string(),
        environment: state.environment.clone(),
        timestamp: Utc::now(),
    })
}

/// JSON 404 for anything no route claims.
pub async fn not_found() -> Result<HttpResponse, ApiError> {
    Err(ApiError::NotFound("Route not found".to_string()))
}
