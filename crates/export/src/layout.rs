use std::collections::BTreeMap;

use chrono::{DateTime, Local};

pub const SEPARATOR_WIDTH: usize = 50;

const DEFAULT_DOC_TYPE: &str = "Document";
const DEFAULT_TONE: &str = "Standard";

/// Format-independent content of an exported document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub heading: String,
    pub generated_on: String,
    pub tone: String,
    pub body: String,
    pub footer: String,
}

impl Layout {
    pub fn new(
        letterhead: &str,
        footer: &str,
        content: &str,
        metadata: &BTreeMap<String, String>,
        now: DateTime<Local>,
    ) -> Self {
        let doc_type = metadata_value(metadata, "doc_type").unwrap_or(DEFAULT_DOC_TYPE);
        let tone = metadata_value(metadata, "tone").unwrap_or(DEFAULT_TONE);

        Self {
            heading: format!("{letterhead} {doc_type}"),
            generated_on: format!("Generated on: {}", now.format("%Y-%m-%d %H:%M")),
            tone: format!("Tone: {tone}"),
            body: content.to_string(),
            footer: footer.to_string(),
        }
    }

    pub fn separator() -> String {
        "=".repeat(SEPARATOR_WIDTH)
    }

    pub fn body_lines(&self) -> impl Iterator<Item = &str> {
        self.body.lines()
    }
}

fn metadata_value<'a>(metadata: &'a BTreeMap<String, String>, key: &str) -> Option<&'a str> {
    metadata
        .get(key)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}

/// `{letterhead}_{doc_type}_{YYYYmmdd_HHMMSS}.{ext}` with the document type in
/// snake case. Anything that is not alphanumeric, `-` or `_` is dropped, so the
/// name can never leave the output directory.
pub fn file_name(
    letterhead: &str,
    metadata: &BTreeMap<String, String>,
    extension: &str,
    now: DateTime<Local>,
) -> String {
    let doc_type = metadata_value(metadata, "doc_type").unwrap_or("document");
    format!(
        "{}_{}_{}.{}",
        sanitise(letterhead, false),
        sanitise(doc_type, true),
        now.format("%Y%m%d_%H%M%S"),
        extension
    )
}

fn sanitise(value: &str, lowercase: bool) -> String {
    let cleaned: String = value
        .trim()
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect();

    let cleaned = if lowercase {
        cleaned.to_ascii_lowercase()
    } else {
        cleaned
    };

    if cleaned.is_empty() {
        "document".to_string()
    } else {
        cleaned
    }
}

/// Greedy word wrap on character counts. Words longer than `width` are split.
/// Empty input lines are kept as empty output lines.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();

    for raw_line in text.lines() {
        let mut current = String::new();
        let mut current_len = 0;

        for word in raw_line.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();

            while word.len() > width {
                if current_len > 0 {
                    lines.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                let rest = word.split_off(width);
                lines.push(word.into_iter().collect());
                word = rest;
            }

            let needed = if current_len == 0 { word.len() } else { current_len + 1 + word.len() };
            if needed > width && current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current_len += word.len();
            current.extend(word);
        }

        lines.push(current);
    }

    lines
}
