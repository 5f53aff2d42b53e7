//! Mock embedding service for testing.

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::EmbeddingError;
use crate::model::{Embedding, EmbeddingService, ModelInfo};

/// Mock service that generates deterministic vectors from text hashes.
///
/// Records every batch it receives and can be told to fail or misbehave on
/// specific calls (1-based), so resume and failure paths can be exercised
/// without network access.
pub struct MockEmbeddingService {
    info: ModelInfo,
    dimension: usize,
    overrides: HashMap<String, Vec<f32>>,
    fail_on: HashSet<usize>,
    short_on: HashSet<usize>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl MockEmbeddingService {
    /// Create a mock producing `dimension`-length vectors.
    pub fn new(dimension: usize) -> Self {
        Self {
            info: ModelInfo::new("mock-embedding", Some(dimension)),
            dimension,
            overrides: HashMap::new(),
            fail_on: HashSet::new(),
            short_on: HashSet::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Use a different model name.
    pub fn with_model(mut self, name: impl Into<String>) -> Self {
        self.info.name = name.into();
        self
    }

    /// Return `vector` verbatim whenever `text` is embedded.
    pub fn with_vector(mut self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        self.overrides.insert(text.into(), vector);
        self
    }

    /// Fail the `call`-th request (1-based).
    pub fn failing_on_call(mut self, call: usize) -> Self {
        self.fail_on.insert(call);
        self
    }

    /// Return one vector too few on the `call`-th request (1-based).
    pub fn short_on_call(mut self, call: usize) -> Self {
        self.short_on.insert(call);
        self
    }

    /// Batches received so far, in call order.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Number of requests received so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or_default()
    }

    /// The vector this mock produces for `text`.
    pub fn vector_for(&self, text: &str) -> Vec<f32> {
        if let Some(v) = self.overrides.get(text) {
            return v.clone();
        }

        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let mut state = hasher.finish() | 1;

        let raw: Vec<f32> = (0..self.dimension)
            .map(|_| {
                // xorshift64
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                (state % 2000) as f32 / 1000.0 - 1.0
            })
            .collect();
        Embedding::new(raw).values
    }
}

#[async_trait]
impl EmbeddingService for MockEmbeddingService {
    fn info(&self) -> &ModelInfo {
        &self.info
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError> {
        let call = {
            let mut calls = self
                .calls
                .lock()
                .map_err(|e| EmbeddingError::Api(e.to_string()))?;
            calls.push(texts.to_vec());
            calls.len()
        };

        if self.fail_on.contains(&call) {
            return Err(EmbeddingError::Api(format!("mock failure on call {call}")));
        }

        let mut vectors: Vec<Embedding> = texts
            .iter()
            .map(|t| Embedding::from_raw(self.vector_for(t)))
            .collect();

        if self.short_on.contains(&call) {
            vectors.pop();
        }

        Ok(vectors)
    }
}
