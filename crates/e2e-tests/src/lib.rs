//! End-to-end test infrastructure for the trend finder.
//!
//! Provides a shared TestHarness and helper functions for E2E tests
//! covering the sheet-to-report pipeline.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use trend_embeddings::{ArtifactStore, BatchConfig, BatchEmbedder, EmbeddingService};

/// Shared test harness for E2E tests.
///
/// Owns a temp directory holding the CSV sheet and both artifacts.
pub struct TestHarness {
    /// Keeps temp dir alive for the lifetime of the harness
    pub _temp_dir: tempfile::TempDir,
    /// Directory holding the artifacts
    pub data_dir: PathBuf,
    /// Artifact store rooted at `data_dir`
    pub store: ArtifactStore,
}

impl TestHarness {
    /// Create a new test harness with an empty temp directory.
    pub fn new() -> Self {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let data_dir = temp_dir.path().to_path_buf();
        let store = ArtifactStore::in_dir(&data_dir);

        Self {
            _temp_dir: temp_dir,
            data_dir,
            store,
        }
    }

    /// Write a findings sheet and return its path as a source string.
    pub fn write_sheet(&self, csv: &str) -> String {
        let path = self.data_dir.join("findings.csv");
        std::fs::write(&path, csv).expect("Failed to write sheet");
        path.to_string_lossy().into_owned()
    }

    /// Batch embedder over this harness's store.
    pub fn embedder(
        &self,
        service: Arc<dyn EmbeddingService>,
        batch_size: usize,
        retry_delay: Duration,
    ) -> BatchEmbedder {
        let config = BatchConfig {
            batch_size,
            retry_delay,
        };
        BatchEmbedder::new(service, self.store.clone(), config).expect("Failed to create embedder")
    }

    /// Raw bytes of the final artifact.
    pub fn final_bytes(&self) -> Vec<u8> {
        std::fs::read(self.store.final_path()).expect("Failed to read final artifact")
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// `count` distinct finding texts.
pub fn sample_texts(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| format!("Finding number {i}: attacks observed in sector {}", i % 7))
        .collect()
}

/// Unit vector in 3 dimensions pointing at `angle_deg` in the xy-plane,
/// tilted by `z` out of it.
pub fn direction(angle_deg: f32, z: f32) -> Vec<f32> {
    let r = angle_deg.to_radians();
    let v = [r.cos(), r.sin(), z];
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    v.iter().map(|x| x / norm).collect()
}
