//! FAQ corpus loading and text cleanup.
//!
//! Accepted file shapes:
//! - a JSON object mapping question to answer
//! - a JSON array of `{"question": ..., "answer": ...}` objects
//!
//! Object keys are read in sorted order, so ids assigned downstream are
//! stable across runs.

use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::FaqEntry;

/// Help-page footer appended to every answer in the scraped corpus.
const FOOTER_MARKERS: [&str; 2] = ["위 도움말이 도움이 되었나요?", "도움말 닫기"];

struct Patterns {
    escape_residue: Regex,
    symbols: Regex,
    repeated_marks: Regex,
    inline_space: Regex,
    blank_lines: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        escape_residue: Regex::new(r"\\[a-zA-Z0-9]+").expect("escape residue pattern is valid"),
        symbols: Regex::new(r"[\p{So}\p{Sk}]").expect("symbol pattern is valid"),
        repeated_marks: Regex::new(r"([!?])[!?]+").expect("repeated mark pattern is valid"),
        inline_space: Regex::new(r"[ \t\u{00a0}\u{3000}]+").expect("inline space pattern is valid"),
        blank_lines: Regex::new(r"\n\s*\n(\s*\n)*").expect("blank line pattern is valid"),
    })
}

/// Normalize one corpus string.
///
/// Drops the help footer, zero-width characters, literal escape residue
/// such as `\xa0`, and decorative symbols (`★`, `▶`, `■`). Runs of `!`/`?`
/// shrink to their first mark, spaces collapse, and at most one blank line
/// is kept. Sentence punctuation is left as is.
pub fn clean_text(text: &str) -> String {
    let mut body = text;
    for marker in FOOTER_MARKERS {
        if let Some(pos) = body.find(marker) {
            body = &body[..pos];
        }
    }

    let stripped: String = body
        .chars()
        .filter(|c| !matches!(c, '\u{200b}' | '\u{200c}' | '\u{200d}' | '\u{feff}'))
        .map(|c| if c == '\r' { '\n' } else { c })
        .collect();

    let p = patterns();
    let stripped = p.escape_residue.replace_all(&stripped, "");
    let stripped = p.symbols.replace_all(&stripped, "");
    let stripped = p.repeated_marks.replace_all(&stripped, "$1");
    let spaced = p.inline_space.replace_all(&stripped, " ");
    let lines: Vec<&str> = spaced.split('\n').map(str::trim).collect();
    let joined = lines.join("\n");

    p.blank_lines.replace_all(&joined, "\n\n").trim().to_string()
}

/// Parse and clean a corpus from JSON text.
pub fn parse_faq_json(content: &str) -> DomainResult<Vec<FaqEntry>> {
    let value: serde_json::Value = serde_json::from_str(content)?;

    let raw: Vec<FaqEntry> = match value {
        serde_json::Value::Object(map) => map
            .into_iter()
            .map(|(question, answer)| match answer {
                serde_json::Value::String(answer) => Ok(FaqEntry::new(question, answer)),
                other => Err(DomainError::ValidationFailed(format!(
                    "answer for {question:?} is not a string: {other}"
                ))),
            })
            .collect::<DomainResult<_>>()?,
        serde_json::Value::Array(_) => serde_json::from_value(value)?,
        _ => {
            return Err(DomainError::ValidationFailed(
                "FAQ file must be a JSON object or array".to_string(),
            ))
        }
    };

    let total = raw.len();
    let entries: Vec<FaqEntry> = raw
        .into_iter()
        .filter_map(|entry| {
            let cleaned = FaqEntry::new(clean_text(&entry.question), clean_text(&entry.answer));
            if cleaned.question.is_empty() || cleaned.answer.is_empty() {
                warn!(question = %entry.question, "Dropping FAQ entry that is empty after cleanup");
                None
            } else {
                Some(cleaned)
            }
        })
        .collect();

    debug!(total, kept = entries.len(), "Parsed FAQ corpus");
    Ok(entries)
}

/// Read, parse and clean a corpus file.
pub async fn load_faq_file(path: impl AsRef<Path>) -> DomainResult<Vec<FaqEntry>> {
    let path = path.as_ref();
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        DomainError::Io(format!("failed to read FAQ file {}: {e}", path.display()))
    })?;
    parse_faq_json(&content)
}
