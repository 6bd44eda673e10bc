use std::{path::PathBuf, sync::Arc, time::Duration};

use chrono::Utc;
use denkwerk::LLMError;
use futures_util::stream::BoxStream;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use letterpress_config::{GeneratorMode, OrchestratorConfig};

pub mod chunking;
pub mod templates;
pub mod tone;
pub mod types;
pub mod upstream;

pub use templates::TemplateStore;
pub use types::{
    ChunkMetadata, DocumentRequest, DocumentResponse, DocumentType, HistoryEntry, Metadata,
    RefinementChunk, RefinementRequest, Tone, DEFAULT_LANGUAGE, SUPPORTED_LANGUAGES,
};
pub use upstream::{OpenRouterGenerator, StubGenerator, TextGenerator, UpstreamError};

/// Lazily produced refinement chunks. Finite and not restartable.
pub type RefinementStream = BoxStream<'static, RefinementChunk>;

const NO_ADDITIONAL_CONTEXT: &str = "None provided";
const DEFAULT_CHUNK_SIZE: usize = 50;
const DEFAULT_CHUNK_DELAY: Duration = Duration::from_millis(100);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("{0}")]
    Validation(String),
    #[error("document generation failed")]
    Upstream(#[source] UpstreamError),
    #[error("no template registered for {0}")]
    TemplateMissing(DocumentType),
    #[error("failed to read template {path:?}: {source}")]
    TemplateLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid template {path:?}: {reason}")]
    TemplateInvalid { path: PathBuf, reason: String },
    #[error("missing OpenRouter API key")]
    ApiKeyMissing,
    #[error("failed to initialise OpenRouter provider: {source}")]
    ProviderInit {
        #[source]
        source: LLMError,
    },
}

impl OrchestratorError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Whether the caller, not the service, is at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Fills instruction templates, calls the text generator and shapes the
/// result for clients.
pub struct DocumentOrchestrator {
    generator: Arc<dyn TextGenerator>,
    templates: TemplateStore,
    chunk_size: usize,
    chunk_delay: Duration,
    request_timeout: Duration,
}

impl DocumentOrchestrator {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            templates: TemplateStore::builtin(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_delay: DEFAULT_CHUNK_DELAY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_templates(mut self, templates: TemplateStore) -> Self {
        self.templates = templates;
        self
    }

    pub fn with_chunking(mut self, chunk_size: usize, chunk_delay: Duration) -> Self {
        self.chunk_size = chunk_size.max(1);
        self.chunk_delay = chunk_delay;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Picks the generator named by `config.mode` and loads template overrides.
    pub fn from_config(config: &OrchestratorConfig) -> Result<Self, OrchestratorError> {
        let generator: Arc<dyn TextGenerator> = match config.mode {
            GeneratorMode::Live => Arc::new(OpenRouterGenerator::from_config(
                &config.openrouter,
                config.default_model.clone(),
            )?),
            GeneratorMode::Stub => Arc::new(StubGenerator::new(config.stub_response.clone())),
        };

        let templates = match config.template_dir.as_deref().map(str::trim) {
            Some(dir) if !dir.is_empty() => TemplateStore::with_overrides(&PathBuf::from(dir))?,
            _ => TemplateStore::builtin(),
        };

        info!(
            mode = config.mode.as_str(),
            generated_with = generator.source_tag(),
            "document orchestrator ready"
        );

        Ok(Self::new(generator)
            .with_templates(templates)
            .with_chunking(
                config.streaming.chunk_size,
                Duration::from_millis(config.streaming.chunk_delay_ms),
            )
            .with_request_timeout(Duration::from_secs(
                config.openrouter.request_timeout_seconds,
            )))
    }

    pub fn source_tag(&self) -> &str {
        self.generator.source_tag()
    }

    pub fn render_generation_prompt(
        &self,
        request: &DocumentRequest,
    ) -> Result<String, OrchestratorError> {
        request.validate()?;
        let template = self.templates.template_for(request.doc_type)?;

        let additional_context = request
            .additional_context
            .as_deref()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or(NO_ADDITIONAL_CONTEXT);

        Ok(templates::render(
            template,
            &[
                ("prompt", request.prompt.as_str()),
                ("tone", tone::instructions_for(request.tone)),
                ("sender_name", request.sender_name.as_deref().unwrap_or("")),
                (
                    "sender_profession",
                    request.sender_profession.as_deref().unwrap_or(""),
                ),
                ("language", request.language()),
                ("additional_context", additional_context),
            ],
        ))
    }

    pub async fn generate(
        &self,
        request: &DocumentRequest,
    ) -> Result<DocumentResponse, OrchestratorError> {
        info!(doc_type = %request.doc_type, tone = %request.tone, "generating document");

        let instruction = self.render_generation_prompt(request).inspect_err(|err| {
            warn!(
                doc_type = %request.doc_type,
                tone = %request.tone,
                error = %err,
                "rejected generation request"
            )
        })?;
        let document = self
            .call_upstream(&instruction)
            .await
            .inspect_err(|err| {
                error!(
                    doc_type = %request.doc_type,
                    tone = %request.tone,
                    error = ?err,
                    "document generation failed"
                )
            })?;

        let mut metadata = Metadata::new();
        metadata.insert("doc_type".into(), request.doc_type.label().into());
        metadata.insert("tone".into(), request.tone.label().into());
        metadata.insert("language".into(), request.language().into());
        metadata.insert("generated_with".into(), self.source_tag().into());
        metadata.insert("created_at".into(), Utc::now().to_rfc3339());

        let history = vec![HistoryEntry {
            user: request.prompt.clone(),
            assistant: document.clone(),
        }];

        Ok(DocumentResponse {
            document,
            metadata,
            history: Some(history),
        })
    }

    pub fn render_refinement_prompt(
        &self,
        request: &RefinementRequest,
    ) -> Result<String, OrchestratorError> {
        request.validate()?;

        let history = templates::history_section(request.history.as_deref().unwrap_or(&[]));

        Ok(templates::render(
            templates::REFINEMENT_TEMPLATE,
            &[
                ("doc_type", request.doc_type.label()),
                ("tone", tone::instructions_for(request.tone)),
                ("history_section", history.as_str()),
                ("current_document", request.current_document.as_str()),
                ("refinement_prompt", request.refinement_prompt.as_str()),
            ],
        ))
    }

    /// Refines a document and returns the result as paced chunks.
    ///
    /// The upstream call completes before this returns, so any failure is
    /// reported here and never mid-stream. The pacing only simulates
    /// streaming; the full text is already known.
    pub async fn refine(
        &self,
        request: &RefinementRequest,
    ) -> Result<RefinementStream, OrchestratorError> {
        info!(doc_type = %request.doc_type, tone = %request.tone, "refining document");

        let instruction = self.render_refinement_prompt(request).inspect_err(|err| {
            warn!(
                doc_type = %request.doc_type,
                tone = %request.tone,
                error = %err,
                "rejected refinement request"
            )
        })?;
        let refined = self
            .call_upstream(&instruction)
            .await
            .inspect_err(|err| {
                error!(
                    doc_type = %request.doc_type,
                    tone = %request.tone,
                    error = ?err,
                    "document refinement failed"
                )
            })?;

        let pieces = chunking::split_into_chunks(&refined, self.chunk_size);
        let chunk_count = pieces.len();
        debug!(chunk_count, chunk_size = self.chunk_size, "streaming refined document");

        let doc_type = request.doc_type;
        let tone = request.tone;
        let generated_with = self.source_tag().to_string();

        let chunks: Vec<RefinementChunk> = pieces
            .into_iter()
            .enumerate()
            .map(|(chunk_index, document)| RefinementChunk {
                document,
                metadata: ChunkMetadata {
                    doc_type,
                    tone,
                    generated_with: generated_with.clone(),
                    is_refinement: true,
                    is_streaming: true,
                    is_complete: chunk_index + 1 == chunk_count,
                    chunk_index,
                    chunk_count,
                },
            })
            .collect();

        Ok(chunking::paced(chunks, self.chunk_delay))
    }

    async fn call_upstream(&self, instruction: &str) -> Result<String, OrchestratorError> {
        let text = tokio::time::timeout(
            self.request_timeout,
            self.generator.generate_text(instruction),
        )
        .await
        .map_err(|_| UpstreamError::Timeout(self.request_timeout))
        .and_then(|result| result)
        .map_err(OrchestratorError::Upstream)?;

        if text.trim().is_empty() {
            return Err(OrchestratorError::Upstream(UpstreamError::EmptyResponse));
        }
        Ok(text)
    }
}
