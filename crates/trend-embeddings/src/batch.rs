//! Checkpointed batch embedder.
//!
//! Walks the corpus in contiguous batches, skipping batches whose rows are
//! all checkpointed already, and saves the checkpoint after every batch it
//! embeds. A failed batch is logged, followed by a fixed wait, and left for
//! the next run; the loop moves on to the following batch.

use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;

use backoff::backoff::{Backoff, Constant};
use tracing::{debug, info, warn};

use crate::artifact::{ArtifactStore, FinalArtifact, PartialArtifact};
use crate::error::EmbeddingError;
use crate::model::EmbeddingService;

/// Batch embedder configuration.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Rows per request; the last batch may be smaller
    pub batch_size: usize,
    /// Wait after a failed batch before moving on
    pub retry_delay: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            retry_delay: Duration::from_secs(5),
        }
    }
}

/// What a run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmbedOutcome {
    pub total_rows: usize,
    /// Batches visited
    pub batches: usize,
    /// Batches skipped because every row was checkpointed
    pub skipped: usize,
    /// Batches embedded and checkpointed
    pub embedded: usize,
    /// Row ranges of failed batches, left for the next run
    pub failed: Vec<Range<usize>>,
    /// Whether the final artifact was written and the checkpoint removed
    pub final_written: bool,
}

impl EmbedOutcome {
    pub fn is_complete(&self) -> bool {
        self.final_written
    }
}

/// Drives an [`EmbeddingService`] over the corpus with checkpointing.
pub struct BatchEmbedder {
    service: Arc<dyn EmbeddingService>,
    store: ArtifactStore,
    config: BatchConfig,
}

impl BatchEmbedder {
    /// Create a new batch embedder.
    pub fn new(
        service: Arc<dyn EmbeddingService>,
        store: ArtifactStore,
        config: BatchConfig,
    ) -> Result<Self, EmbeddingError> {
        if config.batch_size == 0 {
            return Err(EmbeddingError::Config("batch_size must be > 0".to_string()));
        }
        Ok(Self {
            service,
            store,
            config,
        })
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Embed `texts`, resuming from any checkpoint.
    ///
    /// Row `i` is `texts[i]`. The final artifact is written only once every
    /// row has a vector; otherwise the checkpoint stays on disk and the
    /// outcome lists the failed ranges.
    pub async fn run(&self, texts: &[String]) -> Result<EmbedOutcome, EmbeddingError> {
        let total_rows = texts.len();
        let model = self.service.info().name.clone();
        let mut partial = self.resume(&model, total_rows)?;

        let mut outcome = EmbedOutcome {
            total_rows,
            ..Default::default()
        };
        let mut delay = Constant::new(self.config.retry_delay);

        info!(
            total_rows,
            batch_size = self.config.batch_size,
            already_done = partial.len(),
            "Starting embedding"
        );

        for start in (0..total_rows).step_by(self.config.batch_size) {
            let end = (start + self.config.batch_size).min(total_rows);
            let rows = start..end;
            outcome.batches += 1;

            // All-or-nothing: one missing row resubmits the whole batch
            if rows.clone().all(|row| partial.contains(row)) {
                debug!(start, end, "Batch already embedded, skipping");
                outcome.skipped += 1;
                continue;
            }

            match self.embed_rows(rows.clone(), &texts[rows.clone()], &partial).await {
                Ok(vectors) => {
                    for (row, vector) in vectors {
                        partial.insert(row, vector);
                    }
                    self.store.save_partial(&partial)?;
                    outcome.embedded += 1;
                    info!(start, end, done = partial.len(), total_rows, "Embedded batch");
                }
                Err(e) => {
                    warn!(
                        start,
                        end,
                        error = %e,
                        "Error during batch; it will be retried on the next run"
                    );
                    outcome.failed.push(rows);
                    if let Some(wait) = delay.next_backoff() {
                        info!(wait_secs = wait.as_secs_f64(), "Waiting before the next batch");
                        tokio::time::sleep(wait).await;
                    }
                }
            }
        }

        if partial.len() == total_rows {
            let artifact = FinalArtifact::assemble(&partial, texts)?;
            self.store.save_final(&artifact)?;
            self.store.remove_partial()?;
            outcome.final_written = true;
            info!(
                rows = artifact.len(),
                path = ?self.store.final_path(),
                "All embeddings complete"
            );
        } else {
            warn!(
                missing = total_rows - partial.len(),
                failed_batches = outcome.failed.len(),
                path = ?self.store.partial_path(),
                "Embedding incomplete; checkpoint kept for the next run"
            );
        }

        Ok(outcome)
    }

    /// Load the checkpoint, or start an empty one.
    fn resume(&self, model: &str, total_rows: usize) -> Result<PartialArtifact, EmbeddingError> {
        let Some(mut partial) = self.store.load_partial()? else {
            return Ok(PartialArtifact::new(model));
        };

        if partial.model != model {
            return Err(EmbeddingError::Artifact(format!(
                "checkpoint {:?} was produced by model '{}', but '{}' is configured; \
                 delete it or switch models",
                self.store.partial_path(),
                partial.model,
                model
            )));
        }

        let stale = partial.retain_below(total_rows);
        if stale > 0 {
            warn!(stale, total_rows, "Dropped checkpoint rows beyond the current input");
        }

        info!(rows = partial.len(), "Loading previous partial progress");
        Ok(partial)
    }

    /// Embed one batch and pair each vector with its row.
    ///
    /// The response must hold exactly one vector per text, each with the
    /// dimension already established by the checkpoint or the model.
    async fn embed_rows(
        &self,
        rows: Range<usize>,
        texts: &[String],
        partial: &PartialArtifact,
    ) -> Result<Vec<(usize, Vec<f32>)>, EmbeddingError> {
        let vectors = self.service.embed_batch(texts).await?;

        if vectors.len() != texts.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: texts.len(),
                actual: vectors.len(),
            });
        }

        let mut expected = partial.dimension().or(self.service.info().dimension);
        for vector in &vectors {
            let actual = vector.dimension();
            match expected {
                Some(dim) if dim != actual => {
                    return Err(EmbeddingError::DimensionMismatch {
                        expected: dim,
                        actual,
                    });
                }
                Some(_) => {}
                None => expected = Some(actual),
            }
        }

        Ok(rows.zip(vectors.into_iter().map(|e| e.values)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockEmbeddingService;
    use tempfile::TempDir;

    fn texts(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("finding number {i}")).collect()
    }

    fn embedder(mock: Arc<MockEmbeddingService>, dir: &TempDir, batch_size: usize) -> BatchEmbedder {
        let config = BatchConfig {
            batch_size,
            ..Default::default()
        };
        BatchEmbedder::new(mock, ArtifactStore::in_dir(dir.path()), config).unwrap()
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let temp = TempDir::new().unwrap();
        let config = BatchConfig {
            batch_size: 0,
            ..Default::default()
        };
        let result = BatchEmbedder::new(
            Arc::new(MockEmbeddingService::new(4)),
            ArtifactStore::in_dir(temp.path()),
            config,
        );
        assert!(matches!(result, Err(EmbeddingError::Config(_))));
    }

    #[tokio::test]
    async fn test_full_run_writes_final_and_removes_checkpoint() {
        let temp = TempDir::new().unwrap();
        let mock = Arc::new(MockEmbeddingService::new(4));
        let embedder = embedder(mock.clone(), &temp, 10);
        let input = texts(25);

        let outcome = embedder.run(&input).await.unwrap();

        assert!(outcome.is_complete());
        assert_eq!(outcome.batches, 3);
        assert_eq!(outcome.embedded, 3);
        assert_eq!(mock.call_count(), 3);
        // Last batch is the remainder
        assert_eq!(mock.calls()[2].len(), 5);

        let store = embedder.store();
        assert!(!store.partial_path().exists());
        let artifact = store.load_final().unwrap();
        assert_eq!(artifact.len(), 25);
        assert_eq!(artifact.records[7].text, input[7]);
        assert_eq!(artifact.records[7].embedding, mock.vector_for(&input[7]));
    }

    #[tokio::test]
    async fn test_resume_skips_completed_batches() {
        let temp = TempDir::new().unwrap();
        let input = texts(250);
        let store = ArtifactStore::in_dir(temp.path());

        let seed = MockEmbeddingService::new(4);
        let mut partial = PartialArtifact::new("mock-embedding");
        for (row, text) in input.iter().enumerate().take(200) {
            partial.insert(row, seed.vector_for(text));
        }
        store.save_partial(&partial).unwrap();

        let mock = Arc::new(MockEmbeddingService::new(4));
        let outcome = embedder(mock.clone(), &temp, 100).run(&input).await.unwrap();

        assert_eq!(mock.call_count(), 1);
        assert_eq!(mock.calls()[0].len(), 50);
        assert_eq!(mock.calls()[0][0], input[200]);
        assert_eq!(outcome.skipped, 2);
        assert_eq!(store.load_final().unwrap().len(), 250);
    }

    #[tokio::test]
    async fn test_partially_done_batch_is_resubmitted_whole() {
        let temp = TempDir::new().unwrap();
        let input = texts(10);
        let store = ArtifactStore::in_dir(temp.path());

        let mut partial = PartialArtifact::new("mock-embedding");
        partial.insert(0, MockEmbeddingService::new(4).vector_for(&input[0]));
        store.save_partial(&partial).unwrap();

        let mock = Arc::new(MockEmbeddingService::new(4));
        embedder(mock.clone(), &temp, 5).run(&input).await.unwrap();

        assert_eq!(mock.call_count(), 2);
        assert_eq!(mock.calls()[0].len(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_batch_is_left_for_next_run() {
        let temp = TempDir::new().unwrap();
        let input = texts(50);
        let mock = Arc::new(MockEmbeddingService::new(4).failing_on_call(2));
        let embedder = embedder(mock.clone(), &temp, 10);

        let started = tokio::time::Instant::now();
        let outcome = embedder.run(&input).await.unwrap();

        assert_eq!(mock.call_count(), 5);
        assert_eq!(outcome.failed, vec![10..20]);
        assert_eq!(outcome.embedded, 4);
        assert!(!outcome.is_complete());
        // Fixed delay after the failure
        assert!(started.elapsed() >= Duration::from_secs(5));

        let store = embedder.store();
        assert!(!store.final_path().exists());
        let partial = store.load_partial().unwrap().unwrap();
        assert_eq!(partial.len(), 40);
        assert!((10..20).all(|row| !partial.contains(row)));
        assert!((20..50).all(|row| partial.contains(row)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_count_mismatch_fails_only_that_batch() {
        let temp = TempDir::new().unwrap();
        let input = texts(20);
        let mock = Arc::new(MockEmbeddingService::new(4).short_on_call(1));
        let embedder = embedder(mock.clone(), &temp, 10);

        let outcome = embedder.run(&input).await.unwrap();

        assert_eq!(outcome.failed, vec![0..10]);
        let partial = embedder.store().load_partial().unwrap().unwrap();
        assert!((0..10).all(|row| !partial.contains(row)));
        assert_eq!(partial.len(), 10);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_fails_batch() {
        let temp = TempDir::new().unwrap();
        let input = texts(3);
        let mock = Arc::new(MockEmbeddingService::new(4).with_vector(input[1].clone(), vec![1.0, 0.0]));
        let embedder = BatchEmbedder::new(
            mock,
            ArtifactStore::in_dir(temp.path()),
            BatchConfig {
                batch_size: 3,
                retry_delay: Duration::ZERO,
            },
        )
        .unwrap();

        let outcome = embedder.run(&input).await.unwrap();
        assert_eq!(outcome.failed, vec![0..3]);
        assert!(!outcome.is_complete());
    }

    #[tokio::test]
    async fn test_checkpoint_from_other_model_rejected() {
        let temp = TempDir::new().unwrap();
        let store = ArtifactStore::in_dir(temp.path());
        let mut partial = PartialArtifact::new("another-model");
        partial.insert(0, vec![1.0; 4]);
        store.save_partial(&partial).unwrap();

        let mock = Arc::new(MockEmbeddingService::new(4));
        let result = embedder(mock.clone(), &temp, 10).run(&texts(3)).await;

        assert!(matches!(result, Err(EmbeddingError::Artifact(_))));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_stale_checkpoint_rows_dropped() {
        let temp = TempDir::new().unwrap();
        let input = texts(4);
        let store = ArtifactStore::in_dir(temp.path());
        let seed = MockEmbeddingService::new(4);
        let mut partial = PartialArtifact::new("mock-embedding");
        for (row, text) in input.iter().enumerate() {
            partial.insert(row, seed.vector_for(text));
        }
        partial.insert(9, vec![0.5; 4]);
        store.save_partial(&partial).unwrap();

        let mock = Arc::new(MockEmbeddingService::new(4));
        let outcome = embedder(mock.clone(), &temp, 2).run(&input).await.unwrap();

        assert!(outcome.is_complete());
        assert_eq!(mock.call_count(), 0);
        assert_eq!(store.load_final().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_empty_input_writes_empty_artifact() {
        let temp = TempDir::new().unwrap();
        let mock = Arc::new(MockEmbeddingService::new(4));
        let embedder = embedder(mock.clone(), &temp, 10);

        let outcome = embedder.run(&[]).await.unwrap();

        assert!(outcome.is_complete());
        assert_eq!(outcome.batches, 0);
        assert!(embedder.store().load_final().unwrap().is_empty());
    }
}
