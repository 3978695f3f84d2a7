use actix_web::{web, HttpResponse};
use serde::Serialize;
use time::OffsetDateTime;

use crate::db::ConnectionState;
use crate::error::AppError;
use crate::state::app_state::AppState;

pub const SERVICE_NAME: &str = "Astrotalk API";

#[derive(Debug, Serialize)]
struct RootResponse {
    status: &'static str,
    service: &'static str,
}

/// Liveness check. Never touches the database.
async fn root() -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(RootResponse {
        status: "ok",
        service: SERVICE_NAME,
    }))
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    app_version: &'static str,
    db: ConnectionState,
    db_attempts: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    db_retry_after_ms: Option<u64>,
    time: String,
}

/// Detailed health. Reports the guard state without waiting on it or
/// triggering a connection attempt.
async fn health(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let time = OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "unknown".to_string());

    let guard = &app_state.db;
    let response = HealthResponse {
        status: "ok",
        service: SERVICE_NAME,
        app_version: env!("CARGO_PKG_VERSION"),
        db: guard.state(),
        db_attempts: guard.attempts(),
        db_retry_after_ms: guard.retry_after().map(|d| d.as_millis() as u64),
        time,
    };

    Ok(HttpResponse::Ok().json(response))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(root))
        .route("/health", web::get().to(health));
}
