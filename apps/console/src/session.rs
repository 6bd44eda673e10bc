//! Client-side session state.
//!
//! Everything the console remembers between prompts lives in [`SessionView`],
//! which serializes to JSON so a session can be resumed later.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use chrono::Local;
use letterpress_orchestrator::{
    DocumentRequest, DocumentType, RefinementRequest, Tone, DEFAULT_LANGUAGE,
};
use serde::{Deserialize, Serialize};

const PREVIEW_EXCERPT_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub doc_type: DocumentType,
    pub tone: Tone,
    #[serde(default)]
    pub sender_name: Option<String>,
    #[serde(default)]
    pub sender_profession: Option<String>,
    pub language: String,
    #[serde(default)]
    pub additional_context: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            doc_type: DocumentType::Announcement,
            tone: Tone::Neutral,
            sender_name: None,
            sender_profession: None,
            language: DEFAULT_LANGUAGE.to_string(),
            additional_context: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// One generated or refined document, kept in creation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentVersion {
    pub doc_type: DocumentType,
    pub tone: Tone,
    pub content: String,
    pub timestamp: String,
    /// Running count of documents sharing this type and tone.
    pub number: usize,
}

impl DocumentVersion {
    pub fn title(&self) -> String {
        format!("[{}_{}_{}]", self.doc_type, self.tone, self.number)
    }

    pub fn excerpt(&self) -> String {
        let mut excerpt: String = self.content.chars().take(PREVIEW_EXCERPT_CHARS).collect();
        if self.content.chars().count() > PREVIEW_EXCERPT_CHARS {
            excerpt.push_str("...");
        }
        excerpt
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingExport {
    pub file_name: String,
    pub media_type: String,
    pub path: String,
}

/// What the next free-text prompt turns into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextRequest {
    Generate(DocumentRequest),
    Refine(RefinementRequest),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionView {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub documents: Vec<DocumentVersion>,
    /// Index into `documents` of the version being previewed.
    #[serde(default)]
    pub preview: Option<usize>,
    #[serde(default)]
    pub pending_export: Option<PendingExport>,
}

impl SessionView {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read session file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse session file {}", path.display()))
    }

    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialise session")?;
        fs::write(path, json)
            .with_context(|| format!("failed to write session file {}", path.display()))
    }

    pub fn latest(&self) -> Option<&DocumentVersion> {
        self.documents.last()
    }

    /// The first prompt of a session generates; every later prompt refines
    /// the latest document, sending all earlier versions as history.
    pub fn next_request(&self, prompt: &str) -> NextRequest {
        match self.latest() {
            None => {
                let settings = &self.settings;
                NextRequest::Generate(DocumentRequest {
                    prompt: prompt.to_string(),
                    doc_type: settings.doc_type,
                    tone: settings.tone,
                    additional_context: settings.additional_context.clone(),
                    sender_name: settings.sender_name.clone(),
                    sender_profession: settings.sender_profession.clone(),
                    language: Some(settings.language.clone()),
                })
            }
            Some(latest) => {
                let history = self
                    .documents
                    .iter()
                    .map(|version| version.content.clone())
                    .collect();
                NextRequest::Refine(
                    RefinementRequest::new(
                        latest.content.clone(),
                        prompt,
                        latest.doc_type,
                        latest.tone,
                    )
                    .with_history(history),
                )
            }
        }
    }

    pub fn record_prompt(&mut self, prompt: &str) {
        self.messages.push(ChatMessage {
            role: Role::User,
            content: prompt.to_string(),
        });
    }

    pub fn record_document(
        &mut self,
        doc_type: DocumentType,
        tone: Tone,
        content: impl Into<String>,
    ) -> &DocumentVersion {
        let content = content.into();
        let number = self
            .documents
            .iter()
            .filter(|version| version.doc_type == doc_type && version.tone == tone)
            .count()
            + 1;

        self.messages.push(ChatMessage {
            role: Role::Assistant,
            content: content.clone(),
        });
        self.documents.push(DocumentVersion {
            doc_type,
            tone,
            content,
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            number,
        });
        &self.documents[self.documents.len() - 1]
    }

    /// Resolves a 1-based position counted from the newest document.
    pub fn index_from_newest(&self, position: usize) -> Option<usize> {
        if position == 0 || position > self.documents.len() {
            return None;
        }
        Some(self.documents.len() - position)
    }

    pub fn open_preview(&mut self, position: usize) -> Option<&DocumentVersion> {
        let index = self.index_from_newest(position)?;
        self.preview = Some(index);
        self.documents.get(index)
    }

    pub fn close_preview(&mut self) {
        self.preview = None;
    }

    pub fn previewed(&self) -> Option<&DocumentVersion> {
        self.preview.and_then(|index| self.documents.get(index))
    }

    /// Drops the conversation but keeps the settings.
    pub fn reset(&mut self) {
        self.messages.clear();
        self.documents.clear();
        self.preview = None;
        self.pending_export = None;
    }
}
