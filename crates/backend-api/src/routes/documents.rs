use std::collections::BTreeMap;

use axum::{
    extract::State,
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{
        sse::{Event, Sse},
        IntoResponse, Response,
    },
    Json,
};
use futures_util::{Stream, StreamExt};
use letterpress_export::ExportFormat;
use letterpress_orchestrator::{
    DocumentRequest, DocumentResponse, DocumentType, RefinementChunk, RefinementRequest, Tone,
    SUPPORTED_LANGUAGES,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use utoipa::ToSchema;

use crate::{ApiError, ApiJson, AppState, ErrorResponse};

#[derive(Debug, Deserialize, ToSchema)]
pub struct GenerateDocumentRequest {
    #[schema(example = "Extend the registration deadline by one week")]
    pub prompt: String,
    #[schema(value_type = String, example = "Announcement")]
    pub doc_type: DocumentType,
    #[schema(value_type = String, example = "Formal")]
    pub tone: Tone,
    #[serde(default)]
    pub additional_context: Option<String>,
    #[serde(default)]
    pub sender_name: Option<String>,
    #[serde(default)]
    pub sender_profession: Option<String>,
    #[serde(default)]
    #[schema(example = "English")]
    pub language: Option<String>,
}

impl From<GenerateDocumentRequest> for DocumentRequest {
    fn from(body: GenerateDocumentRequest) -> Self {
        Self {
            prompt: body.prompt,
            doc_type: body.doc_type,
            tone: body.tone,
            additional_context: body.additional_context,
            sender_name: body.sender_name,
            sender_profession: body.sender_profession,
            language: body.language,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HistoryTurn {
    pub user: String,
    pub assistant: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GeneratedDocument {
    pub document: String,
    pub metadata: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<HistoryTurn>>,
}

impl From<DocumentResponse> for GeneratedDocument {
    fn from(response: DocumentResponse) -> Self {
        Self {
            document: response.document,
            metadata: response.metadata,
            history: response.history.map(|turns| {
                turns
                    .into_iter()
                    .map(|turn| HistoryTurn {
                        user: turn.user,
                        assistant: turn.assistant,
                    })
                    .collect()
            }),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RefineDocumentRequest {
    #[schema(example = "Change the deadline to March 30")]
    pub refinement_prompt: String,
    pub current_document: String,
    #[schema(value_type = String, example = "Announcement")]
    pub doc_type: DocumentType,
    #[schema(value_type = String, example = "Formal")]
    pub tone: Tone,
    /// Earlier versions of the document, oldest first.
    #[serde(default)]
    pub history: Option<Vec<String>>,
}

impl From<RefineDocumentRequest> for RefinementRequest {
    fn from(body: RefineDocumentRequest) -> Self {
        Self {
            refinement_prompt: body.refinement_prompt,
            current_document: body.current_document,
            doc_type: body.doc_type,
            tone: body.tone,
            history: body.history,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RefinementEventMetadata {
    pub doc_type: String,
    pub tone: String,
    pub generated_with: String,
    pub is_refinement: bool,
    pub is_streaming: bool,
    pub is_complete: bool,
    pub chunk_index: usize,
    pub chunk_count: usize,
}

/// Payload of one `data:` line on the refinement stream.
#[derive(Debug, Serialize, ToSchema)]
pub struct RefinementEvent {
    pub document: String,
    pub metadata: RefinementEventMetadata,
}

impl From<RefinementChunk> for RefinementEvent {
    fn from(chunk: RefinementChunk) -> Self {
        let meta = chunk.metadata;
        Self {
            document: chunk.document,
            metadata: RefinementEventMetadata {
                doc_type: meta.doc_type.label().to_string(),
                tone: meta.tone.label().to_string(),
                generated_with: meta.generated_with,
                is_refinement: meta.is_refinement,
                is_streaming: meta.is_streaming,
                is_complete: meta.is_complete,
                chunk_index: meta.chunk_index,
                chunk_count: meta.chunk_count,
            },
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ExportDocumentRequest {
    #[schema(example = "pdf")]
    pub format: String,
    pub document_content: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DocumentOptions {
    pub doc_types: Vec<String>,
    pub tones: Vec<String>,
    pub formats: Vec<String>,
    pub languages: Vec<String>,
}

#[utoipa::path(
    get,
    path = "/api/documents/options",
    tag = "Documents",
    responses(
        (status = 200, description = "Selectable document settings", body = DocumentOptions)
    )
)]
pub async fn document_options() -> Json<DocumentOptions> {
    Json(DocumentOptions {
        doc_types: DocumentType::ALL
            .iter()
            .map(|doc_type| doc_type.label().to_string())
            .collect(),
        tones: Tone::ALL.iter().map(|tone| tone.label().to_string()).collect(),
        formats: ExportFormat::ALL
            .iter()
            .map(|format| format.extension().to_string())
            .collect(),
        languages: SUPPORTED_LANGUAGES.iter().map(|lang| lang.to_string()).collect(),
    })
}

#[utoipa::path(
    post,
    path = "/api/documents/generate",
    tag = "Documents",
    request_body = GenerateDocumentRequest,
    responses(
        (status = 200, description = "Generated document", body = GeneratedDocument),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Upstream generation failed", body = ErrorResponse)
    )
)]
pub async fn generate_document(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<GenerateDocumentRequest>,
) -> Result<Json<GeneratedDocument>, ApiError> {
    let request = DocumentRequest::from(body);
    let response = state.orchestrator().generate(&request).await?;
    Ok(Json(response.into()))
}

#[utoipa::path(
    post,
    path = "/api/documents/refine",
    tag = "Documents",
    request_body = RefineDocumentRequest,
    responses(
        (status = 200, description = "Server-sent events, one refinement chunk per event",
            content_type = "text/event-stream", body = RefinementEvent),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Upstream generation failed", body = ErrorResponse)
    )
)]
pub async fn refine_document(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RefineDocumentRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, ApiError> {
    let request = RefinementRequest::from(body);
    let chunks = state.orchestrator().refine(&request).await?;

    let events = chunks.map(|chunk| Event::default().json_data(RefinementEvent::from(chunk)));
    Ok(Sse::new(events))
}

#[utoipa::path(
    post,
    path = "/api/documents/export",
    tag = "Documents",
    request_body = ExportDocumentRequest,
    responses(
        (status = 200, description = "Exported file as an attachment"),
        (status = 400, description = "Unsupported format or invalid request", body = ErrorResponse),
        (status = 500, description = "Export failed", body = ErrorResponse)
    )
)]
pub async fn export_document(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ExportDocumentRequest>,
) -> Result<Response, ApiError> {
    let doc_type = body.metadata.get("doc_type").cloned().unwrap_or_default();
    let tone = body.metadata.get("tone").cloned().unwrap_or_default();
    let format = body.format.clone();

    let exporter = state.exporter();
    let file = tokio::task::spawn_blocking(move || {
        exporter.export(&body.document_content, &body.metadata, &body.format)
    })
    .await
    .map_err(|error| {
        warn!(?error, "export task did not complete");
        ApiError::internal_server_error("document export failed")
    })?
    .inspect_err(|error| {
        warn!(%doc_type, %tone, %format, %error, "document export failed");
    })?;

    if let Err(error) = tokio::fs::remove_file(&file.path).await {
        warn!(?error, path = %file.path.display(), "failed to remove transient export file");
    } else {
        debug!(path = %file.path.display(), "removed transient export file");
    }

    let disposition = format!("attachment; filename=\"{}\"", file.file_name);
    Ok((
        [
            (CONTENT_TYPE, file.media_type.to_string()),
            (CONTENT_DISPOSITION, disposition),
        ],
        file.bytes,
    )
        .into_response())
}
