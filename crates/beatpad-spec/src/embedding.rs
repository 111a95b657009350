//! Latent vectors and versioned corner encodings.

use serde::{Deserialize, Serialize};

use crate::corner::CornerLabel;

/// An opaque latent vector produced by a model.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Embedding(Vec<f64>);

impl Embedding {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    /// A zero vector of the given dimension.
    pub fn zeros(dim: usize) -> Self {
        Self(vec![0.0; dim])
    }

    pub fn dim(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}

impl From<Vec<f64>> for Embedding {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

/// The four corner embeddings of one corner generation.
///
/// `version` identifies the corner content the set was encoded from. Cache
/// entries are keyed by it, so bumping the version invalidates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodingSet {
    version: u64,
    embeddings: [Embedding; 4],
}

impl EncodingSet {
    pub fn new(version: u64, embeddings: [Embedding; 4]) -> Self {
        Self {
            version,
            embeddings,
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Embedding of one corner.
    pub fn get(&self, label: CornerLabel) -> &Embedding {
        &self.embeddings[label.index()]
    }

    /// Embeddings in slot order.
    pub fn embeddings(&self) -> &[Embedding; 4] {
        &self.embeddings
    }

    /// Dimension of corner A; the interpolator checks the others against it.
    pub fn dimension(&self) -> usize {
        self.embeddings[0].dim()
    }
}
