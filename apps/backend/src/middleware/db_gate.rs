//! Database gate for route scopes that touch the database.
//!
//! Waits for the connection guard (bounded by `ServerConfig::db_gate_timeout`)
//! before the wrapped scope runs. On success the handle is placed in request
//! extensions for the [`Db`](crate::extractors::Db) extractor. Otherwise the
//! request is answered with a `503` problem response and a `Retry-After`
//! header; a slow attempt keeps running in the background.

use std::rc::Rc;
use std::time::Duration;

use actix_web::body::EitherBody;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{web, Error, HttpMessage};
use futures_util::future::{ready, LocalBoxFuture, Ready};
use tracing::{debug, warn};

use crate::db::ConnectError;
use crate::error::AppError;
use crate::extractors::Db;
use crate::state::app_state::AppState;

/// `Retry-After` hint while an attempt is still in flight.
const CONNECTING_RETRY_AFTER: Duration = Duration::from_secs(1);

pub struct RequireDb;

impl<S, B> Transform<S, ServiceRequest> for RequireDb
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireDbMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireDbMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct RequireDbMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequireDbMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let app_state = req.app_data::<web::Data<AppState>>().cloned();

        Box::pin(async move {
            let Some(app_state) = app_state else {
                let err = AppError::internal("AppState not available".to_string());
                return Ok(req.error_response(err).map_into_right_body());
            };

            match wait_for_db(&app_state).await {
                Ok(db) => {
                    req.extensions_mut().insert(db);
                    let res = service.call(req).await?;
                    Ok(res.map_into_left_body())
                }
                Err(err) => Ok(req.error_response(err).map_into_right_body()),
            }
        })
    }
}

async fn wait_for_db(app_state: &AppState) -> Result<Db, AppError> {
    let guard = &app_state.db;
    let limit = app_state.server.db_gate_timeout;

    match tokio::time::timeout(limit, guard.ensure_connected()).await {
        Ok(Ok(database)) => Ok(Db::new(database)),
        Ok(Err(e)) => {
            debug!(db_state = %guard.state(), error = %e, "db gate rejected request");
            let detail = match e {
                ConnectError::Unavailable { detail, .. } => detail,
                other => other.to_string(),
            };
            let retry_after = guard.retry_after().unwrap_or(CONNECTING_RETRY_AFTER);
            Err(AppError::db_unavailable(detail, retry_after))
        }
        Err(_) => {
            warn!(
                db_state = %guard.state(),
                waited_ms = limit.as_millis() as u64,
                "db gate timed out waiting for connection"
            );
            Err(match guard.retry_after() {
                Some(retry_after) => {
                    AppError::db_unavailable("database connection failed".to_string(), retry_after)
                }
                None => AppError::db_connecting(CONNECTING_RETRY_AFTER),
            })
        }
    }
}
