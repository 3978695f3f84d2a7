//! Initialized Actix test service with the production route table and
//! middleware stack.

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{test, web, App, Error};

use crate::middleware::{cors_middleware, RequestTrace, StructuredLogger, TraceSpan};
use crate::routes;
use crate::state::app_state::AppState;

/// Wire `state` exactly as `main.rs` does, minus the socket.
pub async fn create_test_app(
    state: AppState,
) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = Error> {
    let origins = state.origins.clone();
    let data = web::Data::new(state);

    test::init_service(
        App::new()
            .wrap(cors_middleware(&origins))
            .wrap(StructuredLogger)
            .wrap(TraceSpan)
            .wrap(RequestTrace)
            .configure(|cfg| routes::configure(cfg, data)),
    )
    .await
}
