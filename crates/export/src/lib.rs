//! Document export to PDF, DOCX and plain text.
//!
//! Every format shares the same layout: a letterhead heading, the generation
//! timestamp and tone, a separator, the body and a footer. Files are written
//! to a transient directory and handed back together with their bytes.

use std::{
    collections::BTreeMap,
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

use chrono::{DateTime, Local};
use thiserror::Error;
use tracing::{debug, info};

use letterpress_config::ExportConfig;

mod docx;
pub mod layout;
mod pdf;
mod txt;

pub use layout::Layout;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("unsupported export format: {0}")]
    UnsupportedFormat(String),
    #[error("failed to render {format} document: {message}")]
    Render {
        format: ExportFormat,
        message: String,
    },
    #[error("failed to write export file {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Pdf,
    Docx,
    Txt,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [Self::Pdf, Self::Docx, Self::Txt];

    pub fn extension(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Txt => "txt",
        }
    }

    pub fn media_type(self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Self::Txt => "text/plain; charset=utf-8",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|format| format.extension() == wanted)
            .ok_or_else(|| ExportError::UnsupportedFormat(value.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct ExportedFile {
    pub file_name: String,
    pub media_type: &'static str,
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

pub struct DocumentExporter {
    output_dir: PathBuf,
    letterhead: String,
    footer: String,
}

impl DocumentExporter {
    pub fn new(
        output_dir: impl Into<PathBuf>,
        letterhead: impl Into<String>,
        footer: impl Into<String>,
    ) -> Self {
        Self {
            output_dir: output_dir.into(),
            letterhead: letterhead.into(),
            footer: footer.into(),
        }
    }

    pub fn from_config(config: &ExportConfig) -> Self {
        Self::new(
            config.resolved_output_dir(),
            config.letterhead.clone(),
            config.footer.clone(),
        )
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn export(
        &self,
        content: &str,
        metadata: &BTreeMap<String, String>,
        format: &str,
    ) -> Result<ExportedFile, ExportError> {
        self.export_at(content, metadata, format, Local::now())
    }

    /// Same as [`DocumentExporter::export`] with a fixed clock.
    pub fn export_at(
        &self,
        content: &str,
        metadata: &BTreeMap<String, String>,
        format: &str,
        now: DateTime<Local>,
    ) -> Result<ExportedFile, ExportError> {
        let format: ExportFormat = format.parse()?;
        let layout = Layout::new(&self.letterhead, &self.footer, content, metadata, now);

        let bytes = match format {
            ExportFormat::Pdf => pdf::render(&layout).map_err(|message| ExportError::Render {
                format,
                message,
            })?,
            ExportFormat::Docx => docx::render(&layout).map_err(|err| ExportError::Render {
                format,
                message: err.to_string(),
            })?,
            ExportFormat::Txt => txt::render(&layout).into_bytes(),
        };

        let file_name = layout::file_name(&self.letterhead, metadata, format.extension(), now);
        let path = self.output_dir.join(&file_name);
        debug!(path = %path.display(), size = bytes.len(), "writing export file");

        std::fs::write(&path, &bytes).map_err(|source| ExportError::Write {
            path: path.clone(),
            source,
        })?;

        info!(%format, file_name = %file_name, "document exported");

        Ok(ExportedFile {
            file_name,
            media_type: format.media_type(),
            path,
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_parse_case_insensitively() {
        assert_eq!("PDF".parse::<ExportFormat>().unwrap(), ExportFormat::Pdf);
        assert_eq!(" docx ".parse::<ExportFormat>().unwrap(), ExportFormat::Docx);
        assert_eq!("txt".parse::<ExportFormat>().unwrap(), ExportFormat::Txt);
    }

    #[test]
    fn unknown_formats_keep_the_original_value() {
        match "badformat".parse::<ExportFormat>() {
            Err(ExportError::UnsupportedFormat(value)) => assert_eq!(value, "badformat"),
            other => panic!("unexpected result: {other:?}"),
        }
        assert!("".parse::<ExportFormat>().is_err());
        assert!("rtf".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn media_types_match_formats() {
        assert_eq!(ExportFormat::Pdf.media_type(), "application/pdf");
        assert!(ExportFormat::Docx.media_type().contains("wordprocessingml"));
        assert!(ExportFormat::Txt.media_type().starts_with("text/plain"));
    }
}
