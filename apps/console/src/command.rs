use std::path::PathBuf;

use letterpress_orchestrator::{DocumentType, OrchestratorError, Tone};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Quit,
    Options,
    Settings,
    SetDocType(DocumentType),
    SetTone(Tone),
    SetLanguage(String),
    SetSender {
        name: Option<String>,
        profession: Option<String>,
    },
    SetContext(Option<String>),
    History,
    Preview(usize),
    ClosePreview,
    Export {
        format: String,
        position: Option<usize>,
    },
    Save(Option<PathBuf>),
    New,
    Prompt(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command: {0} (try /help)")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("{0}")]
    InvalidValue(String),
}

pub const HELP: &str = "\
Available commands:
  /help, /h                      - Show this help
  /options                       - List document types, tones, formats and languages
  /settings                      - Show the current document settings
  /type <document type>          - e.g. /type meeting summary
  /tone <tone>                   - e.g. /tone firm but polite
  /lang <language>               - English, German or Both
  /sender <name> | <profession>  - Set the sender (empty clears)
  /context <text>                - Set additional context (empty clears)
  /history                       - List documents, newest first
  /preview <n>                   - Show document n from /history
  /close                         - Close the preview
  /export <pdf|docx|txt> [n]     - Export the latest document, or document n
  /save [path]                   - Save the session
  /new                           - Start a new conversation
  /quit, /exit, /q               - Exit console
Anything else is sent as a prompt: the first one generates, later ones refine.";

/// Returns `Ok(None)` for blank input.
pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    if !line.starts_with('/') {
        return Ok(Some(Command::Prompt(line.to_string())));
    }

    let (name, rest) = match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (line, ""),
    };

    let command = match name {
        "/help" | "/h" => Command::Help,
        "/quit" | "/exit" | "/q" => Command::Quit,
        "/options" => Command::Options,
        "/settings" => Command::Settings,
        "/type" => {
            let value = required(rest, "/type <document type>")?;
            Command::SetDocType(value.parse().map_err(invalid)?)
        }
        "/tone" => {
            let value = required(rest, "/tone <tone>")?;
            Command::SetTone(value.parse().map_err(invalid)?)
        }
        "/lang" => Command::SetLanguage(required(rest, "/lang <language>")?.to_string()),
        "/sender" => {
            let (name, profession) = match rest.split_once('|') {
                Some((name, profession)) => (name, profession),
                None => (rest, ""),
            };
            Command::SetSender {
                name: non_empty(name),
                profession: non_empty(profession),
            }
        }
        "/context" => Command::SetContext(non_empty(rest)),
        "/history" => Command::History,
        "/preview" => Command::Preview(position(required(rest, "/preview <n>")?)?),
        "/close" => Command::ClosePreview,
        "/export" => {
            let mut parts = rest.split_whitespace();
            let format = parts
                .next()
                .ok_or(CommandError::Usage("/export <pdf|docx|txt> [n]"))?
                .to_string();
            let position = parts.next().map(position).transpose()?;
            Command::Export { format, position }
        }
        "/save" => Command::Save(non_empty(rest).map(PathBuf::from)),
        "/new" => Command::New,
        other => return Err(CommandError::Unknown(other.to_string())),
    };

    Ok(Some(command))
}

fn required<'a>(value: &'a str, usage: &'static str) -> Result<&'a str, CommandError> {
    if value.is_empty() {
        Err(CommandError::Usage(usage))
    } else {
        Ok(value)
    }
}

fn invalid(error: OrchestratorError) -> CommandError {
    CommandError::InvalidValue(error.to_string())
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn position(value: &str) -> Result<usize, CommandError> {
    value
        .parse::<usize>()
        .ok()
        .filter(|position| *position > 0)
        .ok_or_else(|| CommandError::InvalidValue(format!("not a document number: {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_a_prompt() {
        assert_eq!(
            parse("  Extend the registration deadline  ").unwrap(),
            Some(Command::Prompt("Extend the registration deadline".into()))
        );
        assert_eq!(parse("   ").unwrap(), None);
    }

    #[test]
    fn settings_commands_accept_loose_labels() {
        assert_eq!(
            parse("/type meeting_summary").unwrap(),
            Some(Command::SetDocType(DocumentType::MeetingSummary))
        );
        assert_eq!(
            parse("/tone Firm but polite").unwrap(),
            Some(Command::SetTone(Tone::FirmButPolite))
        );
        assert!(matches!(
            parse("/tone sarcastic"),
            Err(CommandError::InvalidValue(message)) if message.contains("unknown tone")
        ));
        assert_eq!(parse("/type"), Err(CommandError::Usage("/type <document type>")));
    }

    #[test]
    fn sender_splits_name_and_profession() {
        assert_eq!(
            parse("/sender Dr. Anna Weber | Programme Director").unwrap(),
            Some(Command::SetSender {
                name: Some("Dr. Anna Weber".into()),
                profession: Some("Programme Director".into()),
            })
        );
        assert_eq!(
            parse("/sender").unwrap(),
            Some(Command::SetSender {
                name: None,
                profession: None
            })
        );
    }

    #[test]
    fn context_without_text_clears() {
        assert_eq!(parse("/context").unwrap(), Some(Command::SetContext(None)));
        assert_eq!(
            parse("/context Applies to all master students").unwrap(),
            Some(Command::SetContext(Some("Applies to all master students".into())))
        );
    }

    #[test]
    fn export_takes_format_and_optional_position() {
        assert_eq!(
            parse("/export PDF").unwrap(),
            Some(Command::Export {
                format: "PDF".into(),
                position: None
            })
        );
        assert_eq!(
            parse("/export docx 2").unwrap(),
            Some(Command::Export {
                format: "docx".into(),
                position: Some(2)
            })
        );
        assert!(parse("/export txt zero").is_err());
        assert_eq!(
            parse("/export"),
            Err(CommandError::Usage("/export <pdf|docx|txt> [n]"))
        );
    }

    #[test]
    fn preview_requires_positive_number() {
        assert_eq!(parse("/preview 1").unwrap(), Some(Command::Preview(1)));
        assert!(parse("/preview 0").is_err());
        assert!(parse("/preview").is_err());
    }

    #[test]
    fn save_path_is_optional() {
        assert_eq!(parse("/save").unwrap(), Some(Command::Save(None)));
        assert_eq!(
            parse("/save drafts.json").unwrap(),
            Some(Command::Save(Some(PathBuf::from("drafts.json"))))
        );
    }

    #[test]
    fn unknown_commands_are_rejected() {
        assert_eq!(
            parse("/frobnicate now"),
            Err(CommandError::Unknown("/frobnicate".into()))
        );
        assert_eq!(parse("/q").unwrap(), Some(Command::Quit));
    }
}
