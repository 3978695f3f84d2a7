// apps/backend/src/middleware/cors.rs
use actix_cors::Cors;
use actix_web::http::header;

use crate::config::cors::AllowedOrigins;

/// Build CORS middleware for the configured allow-list:
/// - each allowed origin is echoed back with credentials permitted
/// - requests from other origins are still served, but without CORS
///   headers, so browsers refuse to expose the response
/// - request headers are reflected, as browsers ask for them in preflights
pub fn cors_middleware(origins: &AllowedOrigins) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "HEAD", "PUT", "PATCH", "POST", "DELETE"])
        .allow_any_header()
        .supports_credentials()
        // Headers the browser is allowed to read from responses
        .expose_headers(vec![
            header::HeaderName::from_static("x-request-id"),
            header::HeaderName::from_static("x-trace-id"),
            header::RETRY_AFTER,
        ])
        .block_on_origin_mismatch(false)
        .max_age(3600);

    for origin in origins.iter() {
        cors = cors.allowed_origin(origin);
    }

    cors
}
