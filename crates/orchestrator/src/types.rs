use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::OrchestratorError;

pub const DEFAULT_LANGUAGE: &str = "English";

/// Languages offered to clients. Free-form values are still accepted.
pub const SUPPORTED_LANGUAGES: &[&str] = &["English", "German", "Both"];

pub type Metadata = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DocumentType {
    #[serde(rename = "Announcement")]
    Announcement,
    #[serde(rename = "Student Communication")]
    StudentCommunication,
    #[serde(rename = "Meeting Summary")]
    MeetingSummary,
}

impl DocumentType {
    pub const ALL: [DocumentType; 3] = [
        Self::Announcement,
        Self::StudentCommunication,
        Self::MeetingSummary,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Announcement => "Announcement",
            Self::StudentCommunication => "Student Communication",
            Self::MeetingSummary => "Meeting Summary",
        }
    }

    /// Stable snake_case key, used for override file names.
    pub fn key(self) -> &'static str {
        match self {
            Self::Announcement => "announcement",
            Self::StudentCommunication => "student_communication",
            Self::MeetingSummary => "meeting_summary",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DocumentType {
    type Err = OrchestratorError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalised = normalise_label(value);
        Self::ALL
            .into_iter()
            .find(|doc_type| normalise_label(doc_type.label()) == normalised)
            .ok_or_else(|| OrchestratorError::validation(format!("unknown document type: {value}")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tone {
    #[serde(rename = "Neutral")]
    Neutral,
    #[serde(rename = "Friendly")]
    Friendly,
    #[serde(rename = "Firm but polite")]
    FirmButPolite,
    #[serde(rename = "Formal")]
    Formal,
}

impl Tone {
    pub const ALL: [Tone; 4] = [Self::Neutral, Self::Friendly, Self::FirmButPolite, Self::Formal];

    pub fn label(self) -> &'static str {
        match self {
            Self::Neutral => "Neutral",
            Self::Friendly => "Friendly",
            Self::FirmButPolite => "Firm but polite",
            Self::Formal => "Formal",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Tone {
    type Err = OrchestratorError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalised = normalise_label(value);
        Self::ALL
            .into_iter()
            .find(|tone| normalise_label(tone.label()) == normalised)
            .ok_or_else(|| OrchestratorError::validation(format!("unknown tone: {value}")))
    }
}

/// Lowercases and folds `_`, `-` and runs of whitespace so that
/// "firm_but_polite" and "Firm but polite" compare equal.
fn normalise_label(value: &str) -> String {
    value
        .split(|c: char| c.is_whitespace() || c == '_' || c == '-')
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRequest {
    pub prompt: String,
    pub doc_type: DocumentType,
    pub tone: Tone,
    #[serde(default)]
    pub additional_context: Option<String>,
    #[serde(default)]
    pub sender_name: Option<String>,
    #[serde(default)]
    pub sender_profession: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

impl DocumentRequest {
    pub fn new(prompt: impl Into<String>, doc_type: DocumentType, tone: Tone) -> Self {
        Self {
            prompt: prompt.into(),
            doc_type,
            tone,
            additional_context: None,
            sender_name: None,
            sender_profession: None,
            language: None,
        }
    }

    pub fn with_sender(
        mut self,
        name: impl Into<String>,
        profession: impl Into<String>,
    ) -> Self {
        self.sender_name = Some(name.into());
        self.sender_profession = Some(profession.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_additional_context(mut self, context: impl Into<String>) -> Self {
        self.additional_context = Some(context.into());
        self
    }

    /// Requested language, or English when absent or blank.
    pub fn language(&self) -> &str {
        self.language
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_LANGUAGE)
    }

    pub fn validate(&self) -> Result<(), OrchestratorError> {
        if self.prompt.trim().is_empty() {
            return Err(OrchestratorError::validation("prompt must not be empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefinementRequest {
    pub refinement_prompt: String,
    pub current_document: String,
    pub doc_type: DocumentType,
    pub tone: Tone,
    #[serde(default)]
    pub history: Option<Vec<String>>,
}

impl RefinementRequest {
    pub fn new(
        current_document: impl Into<String>,
        refinement_prompt: impl Into<String>,
        doc_type: DocumentType,
        tone: Tone,
    ) -> Self {
        Self {
            refinement_prompt: refinement_prompt.into(),
            current_document: current_document.into(),
            doc_type,
            tone,
            history: None,
        }
    }

    pub fn with_history(mut self, history: Vec<String>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn validate(&self) -> Result<(), OrchestratorError> {
        if self.refinement_prompt.trim().is_empty() {
            return Err(OrchestratorError::validation(
                "refinement_prompt must not be empty",
            ));
        }
        if self.current_document.trim().is_empty() {
            return Err(OrchestratorError::validation(
                "current_document must not be empty",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub user: String,
    pub assistant: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentResponse {
    pub document: String,
    pub metadata: Metadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<HistoryEntry>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub doc_type: DocumentType,
    pub tone: Tone,
    pub generated_with: String,
    pub is_refinement: bool,
    pub is_streaming: bool,
    pub is_complete: bool,
    pub chunk_index: usize,
    pub chunk_count: usize,
}

/// One slice of a refined document as delivered to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefinementChunk {
    pub document: String,
    pub metadata: ChunkMetadata,
}
