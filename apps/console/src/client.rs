use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    pin::pin,
};

use anyhow::{anyhow, Context, Result};
use eventsource_stream::Eventsource;
use futures_util::{Stream, StreamExt};
use letterpress_orchestrator::{
    DocumentRequest, DocumentResponse, RefinementChunk, RefinementRequest,
};
use reqwest::{header::CONTENT_DISPOSITION, header::CONTENT_TYPE, Client, Response};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct DocumentOptions {
    pub doc_types: Vec<String>,
    pub tones: Vec<String>,
    pub formats: Vec<String>,
    pub languages: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
struct ExportBody<'a> {
    format: &'a str,
    document_content: &'a str,
    metadata: &'a BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug)]
pub struct SavedExport {
    pub file_name: String,
    pub media_type: String,
    pub path: PathBuf,
}

pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            base_url,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn health(&self) -> Result<HealthStatus> {
        let response = self
            .client
            .get(self.url("/health"))
            .send()
            .await
            .context("Failed to reach the document service")?;
        let response = ensure_success(response, "Health check failed").await?;
        response
            .json()
            .await
            .context("Failed to parse health response")
    }

    pub async fn options(&self) -> Result<DocumentOptions> {
        let response = self
            .client
            .get(self.url("/api/documents/options"))
            .send()
            .await
            .context("Failed to fetch document options")?;
        let response = ensure_success(response, "Failed to fetch document options").await?;
        response
            .json()
            .await
            .context("Failed to parse document options")
    }

    pub async fn generate(&self, request: &DocumentRequest) -> Result<DocumentResponse> {
        let response = self
            .client
            .post(self.url("/api/documents/generate"))
            .json(request)
            .send()
            .await
            .context("Failed to send generation request")?;
        let response = ensure_success(response, "Failed to generate document").await?;
        response
            .json()
            .await
            .context("Failed to parse generated document")
    }

    /// Streams the refined document, handing each chunk to `on_chunk` as it
    /// arrives. Returns the reassembled text.
    pub async fn refine<F>(&self, request: &RefinementRequest, on_chunk: F) -> Result<String>
    where
        F: FnMut(&RefinementChunk),
    {
        let response = self
            .client
            .post(self.url("/api/documents/refine"))
            .json(request)
            .send()
            .await
            .context("Failed to send refinement request")?;
        let response = ensure_success(response, "Failed to refine document").await?;

        read_refinement(response.bytes_stream(), on_chunk).await
    }

    /// Exports `content` and writes the returned attachment into `dir`.
    pub async fn export(
        &self,
        content: &str,
        metadata: &BTreeMap<String, String>,
        format: &str,
        dir: &Path,
    ) -> Result<SavedExport> {
        let response = self
            .client
            .post(self.url("/api/documents/export"))
            .json(&ExportBody {
                format,
                document_content: content,
                metadata,
            })
            .send()
            .await
            .context("Failed to send export request")?;
        let response = ensure_success(response, "Failed to export document").await?;

        let headers = response.headers();
        let file_name = headers
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(attachment_file_name)
            .unwrap_or_else(|| format!("letterpress_export.{}", format.to_lowercase()));
        let media_type = headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();

        let bytes = response
            .bytes()
            .await
            .context("Failed to read exported file")?;
        let path = dir.join(&file_name);
        tokio::fs::write(&path, &bytes)
            .await
            .with_context(|| format!("Failed to save {}", path.display()))?;

        Ok(SavedExport {
            file_name,
            media_type,
            path,
        })
    }
}

async fn ensure_success(response: Response, what: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error)
        .unwrap_or(text);
    Err(anyhow!("{what} ({status}): {message}"))
}

/// Extracts `name` from `attachment; filename="name"`.
pub fn attachment_file_name(disposition: &str) -> Option<String> {
    let (_, rest) = disposition.split_once("filename=")?;
    let name = rest.split(';').next()?.trim().trim_matches('"');
    // Never let the server pick a directory.
    let name = Path::new(name).file_name()?.to_str()?;
    (!name.is_empty()).then(|| name.to_string())
}

/// Decodes refinement events from a `text/event-stream` body and joins
/// their text. Fails if the stream stops before the final chunk.
pub async fn read_refinement<S, B, E, F>(body: S, mut on_chunk: F) -> Result<String>
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
    F: FnMut(&RefinementChunk),
{
    let mut events = pin!(body.eventsource());
    let mut document = String::new();
    let mut complete = false;

    while let Some(event) = events.next().await {
        let event = event.map_err(|error| anyhow!("Refinement stream interrupted: {error}"))?;
        let chunk: RefinementChunk =
            serde_json::from_str(&event.data).context("Failed to parse refinement chunk")?;
        document.push_str(&chunk.document);
        complete = chunk.metadata.is_complete;
        on_chunk(&chunk);
    }

    if !complete {
        return Err(anyhow!("Refinement stream ended before the final chunk"));
    }
    Ok(document)
}
