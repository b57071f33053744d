use axum::{routing::get, routing::post, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::job::BatchJob;
use crate::track::JsonFileSink;

use super::api::job as job_handlers;
use super::api::passes as pass_handlers;
use super::api::satellites as satellite_handlers;
use super::api::views as view_handlers;
use super::api_doc::ApiDoc;
use super::auth::AppState;
use super::config::Config;

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/satellites", get(satellite_handlers::list_satellites))
        .route("/api/passes", get(pass_handlers::list_passes))
        .route("/api/views", post(view_handlers::render))
        // Batch job
        .route("/api/job/start", post(job_handlers::start))
        .route("/api/job/stop", post(job_handlers::stop))
        .route("/api/job/status", get(job_handlers::status))
        // OpenAPI / Swagger
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(config: Config) -> std::io::Result<()> {
    let bind_addr = config.web.bind.clone();
    let sink = JsonFileSink::new(config.render.output_dir.clone());
    log::info!("Writing views to {}", sink.output_dir().display());

    let state = AppState {
        config: Arc::new(config),
        job: BatchJob::new(),
        sink: Arc::new(sink),
    };

    let app = router(state);

    log::info!("Starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await
}
