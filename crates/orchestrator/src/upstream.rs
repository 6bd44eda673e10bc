//! Text generators the orchestrator can sit on top of.

use std::time::Duration;

use async_trait::async_trait;
use denkwerk::{
    providers::{
        openrouter::{
            OpenRouter as DenkwerkOpenRouter, OpenRouterConfig as DenkwerkOpenRouterConfig,
        },
        LLMProvider,
    },
    ChatMessage, CompletionRequest, LLMError,
};
use thiserror::Error;
use tracing::debug;

use letterpress_config::OpenRouterProviderConfig;

use crate::OrchestratorError;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("provider request failed: {0}")]
    Provider(#[source] LLMError),
    #[error("provider returned an empty response")]
    EmptyResponse,
    #[error("provider did not answer within {0:?}")]
    Timeout(Duration),
}

/// Turns a fully rendered instruction into text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate_text(&self, instruction: &str) -> Result<String, UpstreamError>;

    /// Value reported as `generated_with` in response metadata.
    fn source_tag(&self) -> &str;
}

pub struct OpenRouterGenerator {
    provider: DenkwerkOpenRouter,
    model: String,
}

impl OpenRouterGenerator {
    /// Builds the live generator. The key comes from configuration first and
    /// `OPENROUTER_API_KEY` second.
    pub fn from_config(
        config: &OpenRouterProviderConfig,
        model: impl Into<String>,
    ) -> Result<Self, OrchestratorError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| {
                std::env::var("OPENROUTER_API_KEY")
                    .ok()
                    .filter(|key| !key.trim().is_empty())
            })
            .ok_or(OrchestratorError::ApiKeyMissing)?;

        let api_key_source = if config.api_key.is_some() {
            "config"
        } else {
            "env"
        };

        let mut provider_config = DenkwerkOpenRouterConfig::new(api_key);
        provider_config.base_url = config.base_url.clone();
        provider_config.request_timeout = Duration::from_secs(config.request_timeout_seconds);
        provider_config.referer = config.referer.clone();
        provider_config.title = config.title.clone();

        debug!(source = api_key_source, "initialising OpenRouter generator");

        let provider = DenkwerkOpenRouter::from_config(provider_config)
            .map_err(|source| OrchestratorError::ProviderInit { source })?;

        Ok(Self {
            provider,
            model: model.into(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TextGenerator for OpenRouterGenerator {
    async fn generate_text(&self, instruction: &str) -> Result<String, UpstreamError> {
        let request =
            CompletionRequest::new(self.model.clone(), vec![ChatMessage::user(instruction)]);

        let completion = self
            .provider
            .complete(request)
            .await
            .map_err(UpstreamError::Provider)?;

        completion_text(completion.message.text())
    }

    fn source_tag(&self) -> &str {
        &self.model
    }
}

/// Provider text, returned verbatim unless it has no visible content.
fn completion_text(text: Option<&str>) -> Result<String, UpstreamError> {
    match text {
        Some(text) if !text.trim().is_empty() => Ok(text.to_string()),
        _ => Err(UpstreamError::EmptyResponse),
    }
}

pub const STUB_SOURCE_TAG: &str = "stub";

const DEFAULT_STUB_DOCUMENT: &str = "Announcement: Update from Campus Heilbronn

Dear Students,

We would like to inform all students about the following announcement.

This is a placeholder document produced without contacting a language model.

Thank you for your attention.

Kind regards,
Campus Office
Technical University of Munich Campus Heilbronn";

/// Offline generator that always returns the same document.
#[derive(Debug, Clone)]
pub struct StubGenerator {
    response: String,
}

impl StubGenerator {
    pub fn new(response: Option<String>) -> Self {
        let response = response
            .filter(|text| !text.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_STUB_DOCUMENT.to_string());
        Self { response }
    }
}

impl Default for StubGenerator {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl TextGenerator for StubGenerator {
    async fn generate_text(&self, _instruction: &str) -> Result<String, UpstreamError> {
        Ok(self.response.clone())
    }

    fn source_tag(&self) -> &str {
        STUB_SOURCE_TAG
    }
}
