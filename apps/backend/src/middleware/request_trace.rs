//! Request identity for the gateway.
//!
//! Outermost middleware. Each request gets a fresh [`TraceId`] that is
//! stored in request extensions for `TraceSpan` and `StructuredLogger`,
//! exposed to problem responses through [`trace_ctx`], and echoed to the
//! client as `x-request-id`.

use std::fmt;

use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{HeaderName, HeaderValue};
use actix_web::{Error, HttpMessage};
use futures_util::future::{ready, LocalBoxFuture, Ready};
use uuid::Uuid;

use crate::trace_ctx;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Id of the request being served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceId(String);

impl TraceId {
    fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub struct RequestTrace;

impl<S, B> Transform<S, ServiceRequest> for RequestTrace
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestTraceMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestTraceMiddleware { service }))
    }
}

pub struct RequestTraceMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for RequestTraceMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let trace_id = TraceId::generate();
        req.extensions_mut().insert(trace_id.clone());

        // A v4 uuid is always a valid header value.
        let header_value = HeaderValue::from_str(trace_id.as_str()).ok();
        let fut = self.service.call(req);

        Box::pin(trace_ctx::scope(trace_id.0, async move {
            let mut res = fut.await?;
            if let Some(value) = header_value {
                res.headers_mut()
                    .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
            }
            Ok(res)
        }))
    }
}

#[cfg(test)]
mod tests {
    use actix_web::{test, web, App, HttpResponse};

    use super::*;

    #[actix_web::test]
    async fn test_header_matches_trace_ctx_and_extension() {
        let app = test::init_service(App::new().wrap(RequestTrace).route(
            "/whoami",
            web::get().to(|req: actix_web::HttpRequest| async move {
                let from_ext = req
                    .extensions()
                    .get::<TraceId>()
                    .map(|id| id.to_string())
                    .unwrap_or_default();
                HttpResponse::Ok().body(format!("{from_ext} {}", trace_ctx::trace_id()))
            }),
        ))
        .await;

        let req = test::TestRequest::get().uri("/whoami").to_request();
        let resp = test::call_service(&app, req).await;

        let header = resp
            .headers()
            .get(REQUEST_ID_HEADER)
            .expect("request id header")
            .to_str()
            .unwrap()
            .to_string();
        let body = test::read_body(resp).await;
        assert_eq!(body, format!("{header} {header}"));
    }

    #[actix_web::test]
    async fn test_each_request_gets_a_new_id() {
        let app = test::init_service(
            App::new()
                .wrap(RequestTrace)
                .route("/", web::get().to(|| async { HttpResponse::Ok().finish() })),
        )
        .await;

        let mut ids = Vec::new();
        for _ in 0..2 {
            let req = test::TestRequest::get().uri("/").to_request();
            let resp = test::call_service(&app, req).await;
            ids.push(resp.headers().get(REQUEST_ID_HEADER).cloned());
        }
        assert!(ids[0].is_some());
        assert_ne!(ids[0], ids[1]);
    }
}
