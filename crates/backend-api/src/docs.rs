use axum::Json;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health::health_check,
        crate::routes::documents::document_options,
        crate::routes::documents::generate_document,
        crate::routes::documents::refine_document,
        crate::routes::documents::export_document
    ),
    components(
        schemas(
            crate::error::ErrorResponse,
            crate::routes::health::HealthResponse,
            crate::routes::documents::GenerateDocumentRequest,
            crate::routes::documents::GeneratedDocument,
            crate::routes::documents::HistoryTurn,
            crate::routes::documents::RefineDocumentRequest,
            crate::routes::documents::RefinementEvent,
            crate::routes::documents::RefinementEventMetadata,
            crate::routes::documents::ExportDocumentRequest,
            crate::routes::documents::DocumentOptions
        )
    ),
    tags(
        (name = "Health", description = "Service health endpoints"),
        (name = "Documents", description = "Document generation, refinement and export")
    ),
    info(title = "Letterpress API", description = "Templated university email drafting")
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
