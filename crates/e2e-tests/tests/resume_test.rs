//! Resume and failure-recovery E2E tests.
//!
//! An interrupted or partly failed run must leave a checkpoint from which a
//! later run produces exactly the artifact an uninterrupted run would.

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;

use e2e_tests::{sample_texts, TestHarness};
use trend_embeddings::{MockEmbeddingService, PartialArtifact};

/// Final artifact bytes of an uninterrupted run over `texts`.
async fn reference_bytes(texts: &[String], batch_size: usize) -> Vec<u8> {
    let harness = TestHarness::new();
    let outcome = harness
        .embedder(Arc::new(MockEmbeddingService::new(8)), batch_size, Duration::ZERO)
        .run(texts)
        .await
        .unwrap();
    assert!(outcome.final_written);
    harness.final_bytes()
}

/// A complete checkpoint with the final artifact deleted: the re-run makes
/// no requests and writes the same artifact.
#[tokio::test]
async fn test_full_checkpoint_rerun_is_idempotent() {
    let texts = sample_texts(37);
    let expected = reference_bytes(&texts, 10).await;

    let harness = TestHarness::new();
    let mock = MockEmbeddingService::new(8);
    let mut partial = PartialArtifact::new("mock-embedding");
    for (row, text) in texts.iter().enumerate() {
        partial.insert(row, mock.vector_for(text));
    }
    harness.store.save_partial(&partial).unwrap();

    let mock = Arc::new(mock);
    let outcome = harness
        .embedder(mock.clone(), 10, Duration::ZERO)
        .run(&texts)
        .await
        .unwrap();

    assert_eq!(mock.call_count(), 0);
    assert_eq!(outcome.skipped, 4);
    assert!(outcome.final_written);
    assert_eq!(harness.final_bytes(), expected);
}

/// A failed batch is skipped past, waited on, and retried by the next run;
/// the recovered artifact equals the uninterrupted one.
#[tokio::test(start_paused = true)]
async fn test_failed_batch_recovered_by_next_run() {
    let texts = sample_texts(45);
    let expected = reference_bytes(&texts, 10).await;

    let harness = TestHarness::new();

    // First run: second request fails
    let first = Arc::new(MockEmbeddingService::new(8).failing_on_call(2));
    let started = tokio::time::Instant::now();
    let outcome = harness
        .embedder(first.clone(), 10, Duration::from_secs(5))
        .run(&texts)
        .await
        .unwrap();

    assert!(started.elapsed() >= Duration::from_secs(5));
    assert_eq!(first.call_count(), 5);
    assert_eq!(outcome.failed, vec![10..20]);
    assert!(!outcome.final_written);
    assert!(!harness.store.final_path().exists());

    let partial = harness.store.load_partial().unwrap().unwrap();
    assert_eq!(partial.len(), 35);
    assert!((10..20).all(|row| !partial.contains(row)));

    // Second run: only the failed batch is requested
    let second = Arc::new(MockEmbeddingService::new(8));
    let outcome = harness
        .embedder(second.clone(), 10, Duration::from_secs(5))
        .run(&texts)
        .await
        .unwrap();

    assert_eq!(second.calls(), vec![texts[10..20].to_vec()]);
    assert_eq!(outcome.skipped, 4);
    assert!(outcome.final_written);
    assert!(!harness.store.partial_path().exists());
    assert_eq!(harness.final_bytes(), expected);
}

/// A run stopped midway resumes at the first missing batch.
#[tokio::test]
async fn test_resume_after_interruption() {
    let texts = sample_texts(250);
    let expected = reference_bytes(&texts, 100).await;

    let harness = TestHarness::new();
    let mock = MockEmbeddingService::new(8);
    let mut partial = PartialArtifact::new("mock-embedding");
    for (row, text) in texts.iter().enumerate().take(200) {
        partial.insert(row, mock.vector_for(text));
    }
    harness.store.save_partial(&partial).unwrap();

    let mock = Arc::new(mock);
    let outcome = harness
        .embedder(mock.clone(), 100, Duration::ZERO)
        .run(&texts)
        .await
        .unwrap();

    let calls = mock.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].len(), 50);
    assert_eq!(calls[0][0], texts[200]);
    assert_eq!(outcome.batches, 3);
    assert_eq!(harness.store.load_final().unwrap().len(), 250);
    assert_eq!(harness.final_bytes(), expected);
}
