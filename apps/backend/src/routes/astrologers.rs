//! Mount point for `/api/astrologers`.

use actix_web::{web, HttpResponse};

use crate::error::AppError;
use crate::extractors::Db;

pub const NAME: &str = "astrologers";

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    // Both `/api/<module>` and `/api/<module>/`
    cfg.route("", web::get().to(index))
        .route("/", web::get().to(index));
}

async fn index(db: Db) -> Result<HttpResponse, AppError> {
    Ok(super::module_status(NAME, &db))
}
