use actix_web::HttpResponse;

use crate::routes::StatusResponse;

pub async fn health_check() -> HttpResponse {
    tracing::debug!("Health check endpoint called");
    HttpResponse::Ok().json(StatusResponse::ok())
}
