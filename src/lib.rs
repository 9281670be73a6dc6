pub mod api;
pub mod config;
pub mod services;
pub mod utils;

use crate::config::AppConfig;
use crate::services::convert::ConversionService;
use axum::{
    Router,
    middleware::from_fn,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::health::root,
        api::handlers::health::health_check,
        api::handlers::convert::docx_to_pdf,
        api::handlers::convert::pdf_to_docx,
        api::handlers::convert::batch_docx_to_pdf,
    ),
    components(
        schemas(
            api::handlers::health::RootResponse,
            api::handlers::health::HealthResponse,
            api::handlers::convert::ConvertUpload,
            api::handlers::convert::BatchResponse,
            services::convert::BatchItemResult,
        )
    ),
    tags(
        (name = "system", description = "Liveness and tool availability"),
        (name = "convert", description = "Document conversion endpoints")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub converter: Arc<ConversionService>,
    pub config: AppConfig,
}

pub fn create_app(state: AppState) -> Router {
    // Permissive CORS for frontend integration; tighten per deployment
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/", get(api::handlers::health::root))
        .route("/health", get(api::handlers::health::health_check))
        .route(
            "/convert/docx-to-pdf",
            post(api::handlers::convert::docx_to_pdf),
        )
        .route(
            "/convert/pdf-to-docx",
            post(api::handlers::convert::pdf_to_docx),
        )
        .route(
            "/convert/batch-docx-to-pdf",
            post(api::handlers::convert::batch_docx_to_pdf),
        )
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .layer(cors)
        .with_state(state)
}
