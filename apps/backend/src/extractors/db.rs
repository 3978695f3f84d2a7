use std::future::{ready, Ready};
use std::ops::Deref;

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpMessage, HttpRequest};
use mongodb::Database;

use crate::error::AppError;

/// Database handle for the current request.
///
/// Placed in request extensions by the `RequireDb` gate, so it is only
/// available to handlers mounted inside a gated scope. Using it elsewhere is
/// a wiring bug and yields a 500.
#[derive(Debug, Clone)]
pub struct Db(Database);

impl Db {
    pub fn new(database: Database) -> Self {
        Self(database)
    }

    pub fn into_inner(self) -> Database {
        self.0
    }
}

impl Deref for Db {
    type Target = Database;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequest for Db {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(req.extensions().get::<Db>().cloned().ok_or_else(|| {
            AppError::internal("Db extractor used outside a RequireDb scope".to_string())
        }))
    }
}
