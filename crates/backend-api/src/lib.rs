mod docs;
mod error;
mod extract;
mod middleware;
mod state;

pub mod routes;

pub use docs::ApiDoc;
pub use error::{ApiError, ErrorResponse};
pub use extract::ApiJson;
pub use state::AppState;

use axum::{
    http::{header::CONTENT_TYPE, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/api/openapi.json", get(docs::openapi_json))
        // Document routes
        .route(
            "/api/documents/options",
            get(routes::documents::document_options),
        )
        .route(
            "/api/documents/generate",
            post(routes::documents::generate_document),
        )
        .route(
            "/api/documents/refine",
            post(routes::documents::refine_document),
        )
        .route(
            "/api/documents/export",
            post(routes::documents::export_document),
        )
        .with_state(state)
        .layer(axum::middleware::from_fn(middleware::logging_middleware))
        .layer(cors_layer())
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
}
