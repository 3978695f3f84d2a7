use actix_web::{web, App, HttpServer};
use astrotalk_backend::infra::state::StateBuilder;
use astrotalk_backend::middleware::{
    cors_middleware, RequestTrace, StructuredLogger, TraceSpan,
};
use astrotalk_backend::{routes, telemetry};
use tracing::{error, info};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // A local .env never overrides variables set by the runtime environment.
    dotenvy::dotenv().ok();
    telemetry::init_tracing();

    let app_state = match StateBuilder::from_env().and_then(StateBuilder::build) {
        Ok(state) => state,
        Err(e) => {
            error!(error = %e, "startup configuration invalid");
            eprintln!("❌ {e}");
            std::process::exit(1);
        }
    };

    let host = app_state.server.host.clone();
    let port = app_state.server.port;
    let origins = app_state.origins.clone();

    info!(
        host = %host,
        port,
        origins = ?origins.iter().collect::<Vec<_>>(),
        db = ?app_state.db.config(),
        "starting Astrotalk API"
    );

    // Connect as early as possible without holding up boot; requests that
    // need the database wait on this same attempt.
    app_state.db.connect_in_background();

    let data = web::Data::new(app_state);

    HttpServer::new(move || {
        let data = data.clone();
        App::new()
            .wrap(cors_middleware(&origins))
            .wrap(StructuredLogger)
            .wrap(TraceSpan)
            .wrap(RequestTrace)
            .configure(|cfg| routes::configure(cfg, data))
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
