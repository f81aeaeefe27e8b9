//! Category and intent label parsing
//!
//! The language model answers the categorize and intent stages in free text.
//! A response resolves to one of three shapes: a definitive label, a list of
//! candidate labels the user has to choose from, or the out-of-domain
//! sentinel.

use serde::{Deserialize, Serialize};

/// First-line marker the prompts ask the model to emit for ambiguous input.
pub const OPTIONS_MARKER: &str = "OPTIONS:";

const BULLET_GLYPHS: [char; 3] = ['•', '-', '*'];

/// How to recognise a multi-option response that lacks the `OPTIONS:` marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DisambiguationDetection {
    /// Only the structured marker counts
    MarkerOnly,
    /// More than one line starting with a bullet glyph
    #[default]
    BulletLines,
    /// More than one `•` or more than one `-` anywhere in the text
    GlyphCount,
}

/// Resolved shape of a categorize/intent response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelResolution {
    /// A single label, used verbatim
    Definitive(String),
    /// Several candidates; the raw text is what gets shown to the user
    Ambiguous { raw: String, options: Vec<String> },
    /// The model answered with the out-of-domain sentinel
    OutOfDomain,
}

impl LabelResolution {
    /// Classify a (trimmed) model response.
    pub fn parse(response: &str, sentinel: &str, detection: DisambiguationDetection) -> Self {
        let response = response.trim();

        if response == sentinel.trim() {
            return Self::OutOfDomain;
        }

        let mut lines = response.lines().map(str::trim).filter(|l| !l.is_empty());
        if let Some(rest) = lines.next().and_then(strip_marker) {
            let mut options: Vec<String> = std::iter::once(rest)
                .chain(lines)
                .map(strip_bullet)
                .filter(|o| !o.is_empty())
                .collect();
            return match options.len() {
                // A bare marker names no label at all.
                0 => Self::OutOfDomain,
                1 => Self::Definitive(options.remove(0)),
                _ => Self::Ambiguous {
                    raw: response.to_string(),
                    options,
                },
            };
        }

        let ambiguous = match detection {
            DisambiguationDetection::MarkerOnly => false,
            DisambiguationDetection::BulletLines => bullet_lines(response).count() > 1,
            DisambiguationDetection::GlyphCount => {
                response.matches('•').count() > 1 || response.matches('-').count() > 1
            }
        };

        if ambiguous {
            let mut options: Vec<String> = bullet_lines(response).map(strip_bullet).collect();
            if options.is_empty() {
                options.push(response.to_string());
            }
            Self::Ambiguous {
                raw: response.to_string(),
                options,
            }
        } else {
            Self::Definitive(response.to_string())
        }
    }
}

/// Text after a leading `OPTIONS:` marker (any ASCII case), if present.
fn strip_marker(line: &str) -> Option<&str> {
    let prefix = line.get(..OPTIONS_MARKER.len())?;
    prefix
        .eq_ignore_ascii_case(OPTIONS_MARKER)
        .then(|| &line[OPTIONS_MARKER.len()..])
}

fn bullet_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .map(str::trim_start)
        .filter(|l| l.starts_with(BULLET_GLYPHS))
}

fn strip_bullet(line: &str) -> String {
    line.trim()
        .trim_start_matches(BULLET_GLYPHS)
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SENTINEL: &str = "out of domain";

    #[test]
    fn test_sentinel_is_out_of_domain() {
        let r = LabelResolution::parse("  out of domain \n", SENTINEL, DisambiguationDetection::default());
        assert_eq!(r, LabelResolution::OutOfDomain);
    }

    #[test]
    fn test_plain_label_is_definitive() {
        let r = LabelResolution::parse("배송", SENTINEL, DisambiguationDetection::default());
        assert_eq!(r, LabelResolution::Definitive("배송".to_string()));
    }

    #[test]
    fn test_marker_with_options() {
        let text = "OPTIONS:\n- 환불\n- 반품\n- 교환";
        match LabelResolution::parse(text, SENTINEL, DisambiguationDetection::MarkerOnly) {
            LabelResolution::Ambiguous { options, raw } => {
                assert_eq!(options, vec!["환불", "반품", "교환"]);
                assert_eq!(raw, text);
            }
            other => panic!("expected ambiguous, got {other:?}"),
        }
    }

    #[test]
    fn test_marker_with_single_option_is_definitive() {
        let r = LabelResolution::parse("options:\n• 환불", SENTINEL, DisambiguationDetection::default());
        assert_eq!(r, LabelResolution::Definitive("환불".to_string()));
    }

    #[test]
    fn test_bare_marker_is_out_of_domain() {
        for text in ["OPTIONS:", "options:\n  \n-  "] {
            let r = LabelResolution::parse(text, SENTINEL, DisambiguationDetection::default());
            assert_eq!(r, LabelResolution::OutOfDomain, "for {text:?}");
        }
    }

    #[test]
    fn test_options_on_marker_line() {
        let r = LabelResolution::parse("OPTIONS: 환불", SENTINEL, DisambiguationDetection::default());
        assert_eq!(r, LabelResolution::Definitive("환불".to_string()));

        match LabelResolution::parse("OPTIONS: 환불\n- 반품", SENTINEL, DisambiguationDetection::MarkerOnly) {
            LabelResolution::Ambiguous { options, .. } => assert_eq!(options, vec!["환불", "반품"]),
            other => panic!("expected ambiguous, got {other:?}"),
        }
    }

    #[test]
    fn test_bullet_lines_detection() {
        let text = "Which one?\n• 상품 등록\n• 상품 수정";
        match LabelResolution::parse(text, SENTINEL, DisambiguationDetection::BulletLines) {
            LabelResolution::Ambiguous { options, .. } => {
                assert_eq!(options, vec!["상품 등록", "상품 수정"]);
            }
            other => panic!("expected ambiguous, got {other:?}"),
        }
    }

    #[test]
    fn test_inline_dashes_are_not_bullets() {
        let text = "2024-01-01 정산 일정";
        let r = LabelResolution::parse(text, SENTINEL, DisambiguationDetection::BulletLines);
        assert_eq!(r, LabelResolution::Definitive(text.to_string()));
    }

    #[test]
    fn test_glyph_count_matches_legacy_behaviour() {
        let text = "2024-01-01 정산 일정";
        let r = LabelResolution::parse(text, SENTINEL, DisambiguationDetection::GlyphCount);
        assert!(matches!(r, LabelResolution::Ambiguous { .. }));
    }
}
