//! Checkpoint and final embedding artifacts.
//!
//! Both artifacts are bincode-encoded. The checkpoint maps row index to
//! vector and grows after every embedded batch; the final artifact is the
//! complete, row-ordered table of (text, vector).

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::EmbeddingError;

/// On-disk format version for both artifacts
pub const ARTIFACT_VERSION: u32 = 1;

/// Default checkpoint file name
pub const DEFAULT_PARTIAL_FILE: &str = "precomputed_embeddings_partial.bin";

/// Default final artifact file name
pub const DEFAULT_FINAL_FILE: &str = "precomputed_embeddings.bin";

/// In-progress embeddings keyed by row index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialArtifact {
    pub version: u32,
    /// Model that produced every vector in `records`
    pub model: String,
    pub records: BTreeMap<usize, Vec<f32>>,
}

impl PartialArtifact {
    /// Create an empty checkpoint for `model`.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            version: ARTIFACT_VERSION,
            model: model.into(),
            records: BTreeMap::new(),
        }
    }

    /// Whether `row` already has a vector.
    pub fn contains(&self, row: usize) -> bool {
        self.records.contains_key(&row)
    }

    /// Record (or replace) the vector for `row`.
    pub fn insert(&mut self, row: usize, vector: Vec<f32>) {
        self.records.insert(row, vector);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Dimension established by the vectors recorded so far.
    pub fn dimension(&self) -> Option<usize> {
        self.records.values().next().map(Vec::len)
    }

    /// Drop rows at or beyond `total_rows`. Returns how many were dropped.
    pub fn retain_below(&mut self, total_rows: usize) -> usize {
        let stale = self.records.split_off(&total_rows);
        stale.len()
    }
}

/// One embedded finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    pub row: usize,
    pub text: String,
    pub embedding: Vec<f32>,
}

/// Complete embedding table, one record per finding in row order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalArtifact {
    pub version: u32,
    pub model: String,
    pub dimension: usize,
    pub records: Vec<EmbeddingRecord>,
}

impl FinalArtifact {
    /// Join checkpointed vectors with their texts.
    ///
    /// Fails if any row in `0..texts.len()` has no vector.
    pub fn assemble(partial: &PartialArtifact, texts: &[String]) -> Result<Self, EmbeddingError> {
        let records = texts
            .iter()
            .enumerate()
            .map(|(row, text)| -> Result<EmbeddingRecord, EmbeddingError> {
                let embedding = partial.records.get(&row).cloned().ok_or_else(|| {
                    EmbeddingError::Artifact(format!("row {row} has no embedding"))
                })?;
                Ok(EmbeddingRecord {
                    row,
                    text: text.clone(),
                    embedding,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            version: ARTIFACT_VERSION,
            model: partial.model.clone(),
            dimension: partial.dimension().unwrap_or(0),
            records,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Texts in row order.
    pub fn texts(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.text.as_str()).collect()
    }

    /// Vectors in row order.
    pub fn embeddings(&self) -> Vec<Vec<f32>> {
        self.records.iter().map(|r| r.embedding.clone()).collect()
    }

    /// Check row keys are dense and every vector has the recorded dimension.
    pub fn validate(&self) -> Result<(), EmbeddingError> {
        for (pos, record) in self.records.iter().enumerate() {
            if record.row != pos {
                return Err(EmbeddingError::Artifact(format!(
                    "record at position {pos} is keyed as row {}",
                    record.row
                )));
            }
            if record.embedding.len() != self.dimension {
                return Err(EmbeddingError::DimensionMismatch {
                    expected: self.dimension,
                    actual: record.embedding.len(),
                });
            }
        }
        Ok(())
    }
}

/// Presence and size of the artifacts on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactStatus {
    /// Rows in the checkpoint, if one exists
    pub partial_rows: Option<usize>,
    /// Rows in the final artifact, if one exists
    pub final_rows: Option<usize>,
}

/// File locations of the checkpoint and final artifact.
///
/// There is no locking: one process at a time may write the checkpoint.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    partial_path: PathBuf,
    final_path: PathBuf,
}

impl ArtifactStore {
    pub fn new(partial_path: impl Into<PathBuf>, final_path: impl Into<PathBuf>) -> Self {
        Self {
            partial_path: partial_path.into(),
            final_path: final_path.into(),
        }
    }

    /// Store using the default file names inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(dir.join(DEFAULT_PARTIAL_FILE), dir.join(DEFAULT_FINAL_FILE))
    }

    pub fn partial_path(&self) -> &Path {
        &self.partial_path
    }

    pub fn final_path(&self) -> &Path {
        &self.final_path
    }

    /// Load the checkpoint if one exists.
    pub fn load_partial(&self) -> Result<Option<PartialArtifact>, EmbeddingError> {
        if !self.partial_path.exists() {
            return Ok(None);
        }
        let partial: PartialArtifact = read_artifact(&self.partial_path)?;
        check_version(partial.version, &self.partial_path)?;
        debug!(path = ?self.partial_path, rows = partial.len(), "Loaded checkpoint");
        Ok(Some(partial))
    }

    /// Overwrite the checkpoint with `partial`.
    pub fn save_partial(&self, partial: &PartialArtifact) -> Result<(), EmbeddingError> {
        write_artifact(&self.partial_path, partial)
    }

    /// Delete the checkpoint. Returns whether a file was removed.
    pub fn remove_partial(&self) -> Result<bool, EmbeddingError> {
        if self.partial_path.exists() {
            fs::remove_file(&self.partial_path)?;
            info!(path = ?self.partial_path, "Removed checkpoint");
            return Ok(true);
        }
        Ok(false)
    }

    /// Write the final artifact.
    pub fn save_final(&self, artifact: &FinalArtifact) -> Result<(), EmbeddingError> {
        write_artifact(&self.final_path, artifact)
    }

    /// Load the final artifact.
    ///
    /// Fails with [`EmbeddingError::MissingArtifact`] when the embedding stage
    /// has not completed.
    pub fn load_final(&self) -> Result<FinalArtifact, EmbeddingError> {
        if !self.final_path.exists() {
            return Err(EmbeddingError::MissingArtifact(self.final_path.clone()));
        }
        let artifact: FinalArtifact = read_artifact(&self.final_path)?;
        check_version(artifact.version, &self.final_path)?;
        artifact.validate()?;
        Ok(artifact)
    }

    /// Inspect both artifacts.
    pub fn status(&self) -> Result<ArtifactStatus, EmbeddingError> {
        let partial_rows = self.load_partial()?.map(|p| p.len());
        let final_rows = if self.final_path.exists() {
            Some(self.load_final()?.len())
        } else {
            None
        };
        Ok(ArtifactStatus {
            partial_rows,
            final_rows,
        })
    }
}

fn check_version(version: u32, path: &Path) -> Result<(), EmbeddingError> {
    if version != ARTIFACT_VERSION {
        return Err(EmbeddingError::Artifact(format!(
            "{path:?} has format version {version}, expected {ARTIFACT_VERSION}"
        )));
    }
    Ok(())
}

fn read_artifact<T: DeserializeOwned>(path: &Path) -> Result<T, EmbeddingError> {
    let bytes = fs::read(path)?;
    Ok(bincode::deserialize(&bytes)?)
}

/// Write to a sibling temp file, then rename over the target.
fn write_artifact<T: Serialize>(path: &Path, value: &T) -> Result<(), EmbeddingError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let bytes = bincode::serialize(value)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
