//! Integration tests for corpus ingestion: idempotence and resumability.

mod common;

use std::io::Write;

use common::{refund_entry, sample_entries, TestIndex};
use faqbot::domain::errors::DomainError;
use faqbot::domain::models::FaqEntry;
use faqbot::adapters::JsonProgressStore;
use faqbot::domain::ports::ProgressStore;

fn texts(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("FAQ 문서 번호 {i}")).collect()
}

#[tokio::test]
async fn test_reingesting_same_corpus_adds_nothing() {
    let t = TestIndex::new(2).await;
    let service = t.ingestion();
    let entries = sample_entries();

    let first = service.ingest_entries(&entries).await.unwrap();
    let count = t.index.count().await.unwrap();
    let calls = t.embeddings.call_count().await;

    let second = service.ingest_entries(&entries).await.unwrap();

    assert_eq!(first.committed, entries.len());
    assert_eq!(second.committed, 0);
    assert_eq!(t.index.count().await.unwrap(), count);
    assert_eq!(t.embeddings.call_count().await, calls, "no re-embedding on a completed corpus");
}

#[tokio::test]
async fn test_lost_checkpoint_is_recovered_from_stored_ids() {
    let t = TestIndex::new(1).await;
    let docs = texts(4);
    t.index.insert(&docs, None, None).await.unwrap();
    let calls = t.embeddings.call_count().await;

    std::fs::remove_file(&t.progress_path).unwrap();

    let report = t.reopen().insert(&docs, None, None).await.unwrap();

    assert_eq!(report.resumed_from, 0);
    assert_eq!(report.skipped_existing, 4);
    assert_eq!(report.committed, 0);
    assert_eq!(report.last_index, 4);
    assert_eq!(t.embeddings.call_count().await, calls);
    assert_eq!(t.index.count().await.unwrap(), 4);
}

#[tokio::test]
async fn test_failed_batch_is_resumed_on_next_run() {
    let t = TestIndex::new(2).await;
    let docs = texts(6);
    t.store.fail_batches_containing("2");

    let first = t.index.insert(&docs, None, None).await.unwrap();

    // [0,1] committed, [2,3] failed, [4,5] committed past the frozen checkpoint.
    assert_eq!(first.committed, 4);
    assert_eq!(first.failed_batches, 1);
    assert_eq!(first.last_index, 2);
    assert!(!first.is_complete());
    assert_eq!(t.index.count().await.unwrap(), 4);

    let stored = JsonProgressStore::new(&t.progress_path).load().await.unwrap();
    assert_eq!(stored.last_index, 2);

    t.store.heal();
    let calls = t.embeddings.call_count().await;
    let second = t.reopen().insert(&docs, None, None).await.unwrap();

    assert_eq!(second.resumed_from, 2);
    assert_eq!(second.skipped_existing, 2);
    assert_eq!(second.committed, 2);
    assert_eq!(second.last_index, 6);
    assert!(second.is_complete());
    assert_eq!(t.embeddings.call_count().await - calls, 2, "only the failed batch is re-embedded");

    let ids: Vec<String> = t.index.export().await.unwrap().into_iter().map(|d| d.id).collect();
    assert_eq!(ids.len(), 6);
    for i in 0..6 {
        assert!(ids.contains(&i.to_string()));
    }
}

#[tokio::test]
async fn test_checkpoint_never_moves_backwards() {
    let t = TestIndex::new(1).await;
    let docs = texts(3);
    t.index.insert(&docs, None, None).await.unwrap();

    // A shorter input leaves the stored checkpoint alone.
    let report = t.reopen().insert(&docs[..1], None, None).await.unwrap();

    assert_eq!(report.committed, 0);
    assert_eq!(t.index.progress().await.unwrap().last_index, 3);
}

#[tokio::test]
async fn test_ingested_chunks_carry_question_metadata() {
    let t = TestIndex::new(1).await;
    t.ingestion().ingest_entries(&[refund_entry()]).await.unwrap();

    let docs = t.index.export().await.unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].id, "0");
    assert_eq!(docs[0].text, "Q: 환불 절차\nA: 환불은 7일 이내...");
    assert_eq!(docs[0].metadata.get("question").map(String::as_str), Some("환불 절차"));
}

#[tokio::test]
async fn test_empty_corpus_is_rejected() {
    let t = TestIndex::new(1).await;
    let result = t.ingestion().ingest_entries(&[]).await;

    assert!(matches!(result, Err(DomainError::ValidationFailed(_))));
    assert_eq!(t.index.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_ingest_file_cleans_and_stores_entries() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"환불 절차": "환불은 7일 이내...\n\n\n위 도움말이 도움이 되었나요?\n별점", "배송 기간": "2~3일"}}"#
    )
    .unwrap();
    file.flush().unwrap();

    let t = TestIndex::new(4).await;
    let report = t.ingestion().ingest_file(file.path()).await.unwrap();

    assert_eq!(report.committed, 2);
    let stored = t.index.load_all().await;
    assert!(stored.contains(&"Q: 환불 절차\nA: 환불은 7일 이내...".to_string()));
    assert!(stored.iter().all(|text| !text.contains("도움말")));

    let entries: Vec<FaqEntry> = faqbot::services::load_faq_file(file.path()).await.unwrap();
    assert_eq!(entries.len(), 2);
}
