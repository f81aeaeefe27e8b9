//! Property-based tests for retrieval, history and chunking invariants
//!
//! 1. Scores: `1 / (1 + d)` stays in (0, 1] and never increases with distance
//! 2. History: truncation fits the budget unless only the newest line is left
//! 3. Chunking: no chunk exceeds `chunk_size` characters
//! 4. Mock embedding: deterministic and unit length

use faqbot::adapters::mock::MockEmbeddingProvider;
use faqbot::adapters::HeuristicTokenCounter;
use faqbot::domain::models::{score_from_distance, ChunkingConfig};
use faqbot::domain::ports::TokenCounter;
use faqbot::services::{ConversationState, FaqTextSplitter};
use proptest::prelude::*;

fn line_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z가-힣 ?]{0,60}").expect("Valid regex")
}

fn paragraph_text_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop::string::string_regex("[a-z가-힣 .]{0,120}").expect("Valid regex"),
        1..6,
    )
    .prop_map(|paragraphs| paragraphs.join("\n\n"))
}

proptest! {
    #[test]
    fn proptest_score_bounded_and_monotonic(a in 0.0f32..1.0e6, b in 0.0f32..1.0e6) {
        let (near, far) = if a <= b { (a, b) } else { (b, a) };

        let s_near = score_from_distance(near);
        let s_far = score_from_distance(far);

        prop_assert!(s_near > 0.0 && s_near <= 1.0);
        prop_assert!(s_far > 0.0 && s_far <= 1.0);
        prop_assert!(s_near >= s_far);
    }

    #[test]
    fn proptest_history_truncation_fits_budget(
        turns in prop::collection::vec((line_strategy(), line_strategy()), 1..12),
        budget in 1usize..80,
    ) {
        let counter = HeuristicTokenCounter;
        let mut session = ConversationState::new();
        for (query, answer) in &turns {
            session.append(query, answer, None);
        }
        let newest = session.lines().last().cloned();

        session.truncate(budget, &counter);

        prop_assert!(!session.is_empty());
        prop_assert_eq!(session.lines().last().cloned(), newest);
        prop_assert!(
            counter.count(&session.render()) <= budget || session.lines().len() == 1,
            "history over budget with {} lines kept",
            session.lines().len()
        );
    }

    #[test]
    fn proptest_chunks_never_exceed_size(
        text in paragraph_text_strategy(),
        chunk_size in 8usize..200,
        overlap_ratio in 0.0f64..0.9,
    ) {
        let chunk_overlap = (chunk_size as f64 * overlap_ratio) as usize;
        let splitter = FaqTextSplitter::new(ChunkingConfig {
            chunk_size,
            chunk_overlap,
            separator: "\n\n".to_string(),
        })
        .expect("Valid chunking config");

        for chunk in splitter.split_text(&text) {
            prop_assert!(!chunk.is_empty());
            prop_assert!(chunk.chars().count() <= chunk_size);
        }
    }

    #[test]
    fn proptest_mock_embedding_is_deterministic_unit_vector(
        text in prop::string::string_regex("[a-z가-힣0-9]{1,80}").expect("Valid regex"),
    ) {
        let provider = MockEmbeddingProvider::new();

        let first = provider.hashed_embedding(&text).expect("alphanumeric text embeds");
        let second = provider.hashed_embedding(&text).expect("alphanumeric text embeds");

        prop_assert_eq!(&first, &second);
        let norm: f32 = first.iter().map(|x| x * x).sum::<f32>().sqrt();
        prop_assert!((norm - 1.0).abs() < 1e-4);
    }
}
