use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::error::AppError;
use crate::extractors::Db;
use crate::middleware::RequireDb;
use crate::state::app_state::AppState;

pub mod ai;
pub mod astrologers;
pub mod auth;
pub mod bookings;
pub mod health;
pub mod payments;
pub mod uploads;

/// A route module mounted under a fixed prefix behind the database gate.
pub struct ApiModule {
    pub name: &'static str,
    pub prefix: &'static str,
    pub configure: fn(&mut web::ServiceConfig),
}

pub const API_MODULES: [ApiModule; 5] = [
    ApiModule {
        name: auth::NAME,
        prefix: "/api/auth",
        configure: auth::configure_routes,
    },
    ApiModule {
        name: astrologers::NAME,
        prefix: "/api/astrologers",
        configure: astrologers::configure_routes,
    },
    ApiModule {
        name: bookings::NAME,
        prefix: "/api/bookings",
        configure: bookings::configure_routes,
    },
    ApiModule {
        name: payments::NAME,
        prefix: "/api/payments",
        configure: payments::configure_routes,
    },
    ApiModule {
        name: ai::NAME,
        prefix: "/api/ai",
        configure: ai::configure_routes,
    },
];

/// Compose the whole application: shared state, JSON body limits, the
/// health check, static uploads and every API module.
///
/// Used by `main.rs` and by tests; callers add the outer middleware
/// (CORS, tracing, logging) themselves.
pub fn configure(cfg: &mut web::ServiceConfig, state: web::Data<AppState>) {
    let json_limit = state.server.json_limit;
    let uploads_dir = state.server.uploads_dir.clone();

    cfg.app_data(state).app_data(json_config(json_limit));

    // Health check routes: / and /health (never gated)
    cfg.configure(health::configure_routes);

    // Static uploads: /uploads/**
    cfg.service(uploads::service(&uploads_dir));

    // API modules: /api/<module>/**
    for module in &API_MODULES {
        cfg.service(
            web::scope(module.prefix)
                .wrap(RequireDb)
                .configure(module.configure),
        );
    }

    cfg.default_service(web::to(not_found));
}

fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err, _req| AppError::bad_request(format!("Invalid JSON body: {err}")).into())
}

async fn not_found() -> Result<HttpResponse, AppError> {
    Err(AppError::not_found("No route matches this request".to_string()))
}

#[derive(Debug, Serialize)]
struct ModuleStatus<'a> {
    module: &'a str,
    database: &'a str,
}

/// Mount-point response shared by the API modules.
pub(crate) fn module_status(module: &str, db: &Db) -> HttpResponse {
    HttpResponse::Ok().json(ModuleStatus {
        module,
        database: db.name(),
    })
}
