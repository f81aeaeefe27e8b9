//! Prompt templates for the answer chain.
//!
//! Templates use `{name}` placeholders. Substitution is a single pass, so
//! braces inside substituted values are left alone, and unknown
//! placeholders stay in the output untouched.

use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::domain::models::{PromptOverrides, OPTIONS_MARKER};

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{([a-z_]+)\}").expect("placeholder pattern is valid"))
}

/// Text with `{name}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    /// Wrap a template string.
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Unrendered template text.
    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Substitute `values`. Unknown placeholders are left as written.
    pub fn render(&self, values: &[(&str, &str)]) -> String {
        let lookup: HashMap<&str, &str> = values.iter().copied().collect();
        placeholder_pattern()
            .replace_all(&self.template, |caps: &Captures<'_>| {
                lookup
                    .get(&caps[1])
                    .map_or_else(|| caps[0].to_string(), |v| (*v).to_string())
            })
            .into_owned()
    }
}

/// Built-in system prompt for the category stage.
pub const CATEGORY_PROMPT: &str = "# Your Role\n\
Act as a classifier for questions about the Naver Smart Store FAQs.\n\n\
# Instructions\n\
Identify the FAQ category the user's question belongs to, using the FAQ excerpts below.\n\n\
# Output Format\n\
- If exactly one category fits, reply with the category name only, in Korean.\n\
- If several categories fit equally well, reply with the line \"{options_marker}\" followed by one candidate category per line, each line starting with \"- \".\n\
- If the question is not about Naver Smart Store, reply with exactly: {out_of_domain}\n\n\
FAQ:\n{context}\n";

/// Built-in system prompt for the intent stage.
pub const INTENT_PROMPT: &str = "# Your Role\n\
Act as an assistant who identifies what a Naver Smart Store user wants to achieve.\n\n\
# Instructions\n\
The question has been classified under the category \"{category}\". \
Using the FAQ excerpts below, state the user's intent as one short phrase in Korean.\n\n\
# Output Format\n\
- If exactly one intent fits, reply with that phrase only.\n\
- If the question could mean several different things, reply with the line \"{options_marker}\" followed by one candidate intent per line, each line starting with \"- \".\n\
- If the question is not about Naver Smart Store, reply with exactly: {out_of_domain}\n\n\
FAQ:\n{context}\n";

/// Built-in system prompt for the answer stage.
pub const ANSWER_PROMPT: &str = "# Your Role\n\
Act as an assistant who answers questions based on the Naver Smart Store FAQs.\n\n\
# Instructions\n\
Provide accurate and helpful answers in Korean using the given FAQ data to assist users.\n\n\
# Guidelines\n\
- Use only information from the FAQs.\n\
- Provide clear, concise, and accurate answers.\n\
- Maintain a professional and helpful tone.\n\
- Organize answers clearly; use bullet points or lists when appropriate.\n\
- Include step-by-step instructions if needed.\n\n\
# Constraints\n\
- Do not provide information outside the FAQs.\n\
- Do not include personal opinions or speculative content.\n\
- Do not request sensitive personal information.\n\n\
# Category\n{category}\n\n\
# Intent\n{intent}\n\n\
# Conversation History\n{history}\n\n\
FAQ:\n{context}\n";

/// The three chain prompts with the fixed values already bound.
#[derive(Debug, Clone)]
pub struct PromptSet {
    category: PromptTemplate,
    intent: PromptTemplate,
    answer: PromptTemplate,
    out_of_domain: String,
}

impl PromptSet {
    /// Built-in templates, replaced by any configured override.
    pub fn new(overrides: &PromptOverrides, out_of_domain: impl Into<String>) -> Self {
        let pick = |custom: &Option<String>, default: &str| {
            PromptTemplate::new(custom.clone().unwrap_or_else(|| default.to_string()))
        };

        Self {
            category: pick(&overrides.category, CATEGORY_PROMPT),
            intent: pick(&overrides.intent, INTENT_PROMPT),
            answer: pick(&overrides.answer, ANSWER_PROMPT),
            out_of_domain: out_of_domain.into(),
        }
    }

    /// System prompt for the category stage.
    pub fn category(&self, context: &str) -> String {
        self.category.render(&[
            ("context", context),
            ("options_marker", OPTIONS_MARKER),
            ("out_of_domain", &self.out_of_domain),
        ])
    }

    /// System prompt for the intent stage.
    pub fn intent(&self, context: &str, category: &str) -> String {
        self.intent.render(&[
            ("context", context),
            ("category", category),
            ("options_marker", OPTIONS_MARKER),
            ("out_of_domain", &self.out_of_domain),
        ])
    }

    /// User message for the intent stage.
    pub fn intent_question(query: &str, category: &str) -> String {
        format!("질문: '{query}'\n카테고리: '{category}'")
    }

    /// System prompt for the answer stage, with the rendered history.
    pub fn answer(&self, context: &str, category: &str, intent: &str, history: &str) -> String {
        self.answer.render(&[
            ("context", context),
            ("category", category),
            ("intent", intent),
            ("history", history),
        ])
    }
}
