//! Table output formatting for CLI commands
//!
//! Search hits and exported documents rendered with comfy-table.

use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use std::env;

use super::truncate;
use crate::domain::models::{Document, RetrievedResult};
use crate::services::splitter::QUESTION_METADATA_KEY;

/// Format search hits, best first, as rank / score / text.
pub fn format_results_table(results: &[RetrievedResult]) -> String {
    let mut table = base_table();
    table.set_header(vec![
        Cell::new("#").add_attribute(Attribute::Bold),
        Cell::new("Score").add_attribute(Attribute::Bold),
        Cell::new("Text").add_attribute(Attribute::Bold),
    ]);

    let colors = supports_color();
    for (rank, result) in results.iter().enumerate() {
        let score = Cell::new(format!("{:.3}", result.score));
        let score = if colors {
            score.fg(score_color(result.score))
        } else {
            score
        };

        table.add_row(vec![
            Cell::new(rank + 1),
            score,
            Cell::new(truncate(&result.text, 120)),
        ]);
    }

    table.to_string()
}

/// Format stored documents as id / question / text preview.
pub fn format_documents_table(documents: &[Document]) -> String {
    let mut table = base_table();
    table.set_header(vec![
        Cell::new("ID").add_attribute(Attribute::Bold),
        Cell::new("Question").add_attribute(Attribute::Bold),
        Cell::new("Text").add_attribute(Attribute::Bold),
    ]);

    for doc in documents {
        let question = doc
            .metadata
            .get(QUESTION_METADATA_KEY)
            .map_or_else(|| "-".to_string(), |q| truncate(q, 40));

        table.add_row(vec![
            Cell::new(&doc.id),
            Cell::new(question),
            Cell::new(truncate(&doc.text, 80)),
        ]);
    }

    table.to_string()
}

fn base_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn score_color(score: f32) -> Color {
    if score >= 0.75 {
        Color::Green
    } else if score >= 0.5 {
        Color::Yellow
    } else {
        Color::Red
    }
}

fn supports_color() -> bool {
    if env::var("NO_COLOR").is_ok() {
        return false;
    }

    !matches!(env::var("TERM").as_deref(), Ok("dumb"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_results_table_lists_every_hit() {
        let results = vec![
            RetrievedResult {
                text: "Q: 환불 절차\nA: 7일 이내".to_string(),
                score: 0.91,
            },
            RetrievedResult {
                text: "Q: 배송\nA: 2일".to_string(),
                score: 0.52,
            },
        ];

        let rendered = temp_env::with_var("NO_COLOR", Some("1"), || format_results_table(&results));
        assert!(rendered.contains("0.910"));
        assert!(rendered.contains("0.520"));
        assert!(rendered.contains("환불 절차"));
    }

    #[test]
    fn test_documents_table_shows_question() {
        let mut metadata = crate::domain::models::DocumentMetadata::new();
        metadata.insert(QUESTION_METADATA_KEY.to_string(), "환불 절차".to_string());
        let docs = vec![Document::new("0", "Q: 환불 절차\nA: 7일 이내").with_metadata(metadata)];

        let rendered = format_documents_table(&docs);
        assert!(rendered.contains("환불 절차"));
    }

    #[test]
    fn test_score_color_bands() {
        assert_eq!(score_color(0.9), Color::Green);
        assert_eq!(score_color(0.6), Color::Yellow);
        assert_eq!(score_color(0.2), Color::Red);
    }
}
