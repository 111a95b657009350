//! A deterministic, non-ML model.
//!
//! The embedding of a pattern is its step grid flattened to 0.0/1.0 values, so
//! interpolating embeddings interpolates step votes directly. Decoding
//! thresholds each component at 0.5 after adding a small jitter whose
//! amplitude scales with temperature. The jitter stream is seeded from the
//! embedding itself, so the same embedding and temperature always decode to
//! the same pattern.

use std::cell::Cell;

use beatpad_spec::{derive_decode_seed, Embedding, ModelError, Pattern, Track, PATTERN_STEPS};
use futures_util::future::{self, FutureExt};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::model::{ModelFuture, ModelService};

/// Embedding dimension of the reference model.
pub const REFERENCE_DIMENSION: usize = Track::COUNT * PATTERN_STEPS;

/// Peak-to-peak jitter at temperature 1.0.
const JITTER_SCALE: f64 = 0.5;

/// Deterministic stand-in for a generative drum model.
#[derive(Debug, Default)]
pub struct ReferenceModel {
    ready: Cell<bool>,
}

impl ReferenceModel {
    /// Creates an unloaded model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a model that is already loaded.
    pub fn loaded() -> Self {
        let model = Self::new();
        model.ready.set(true);
        model
    }

    fn unavailable() -> ModelError {
        ModelError::Unavailable("reference model is not loaded".to_string())
    }
}

/// Flattens a pattern into its reference embedding.
pub fn embed_pattern(pattern: &Pattern) -> Embedding {
    let mut values = Vec::with_capacity(REFERENCE_DIMENSION);
    for &track in Track::all() {
        values.extend(
            pattern
                .row(track)
                .iter()
                .map(|on| if *on { 1.0 } else { 0.0 }),
        );
    }
    Embedding::new(values)
}

/// Decodes a reference embedding.
pub fn decode_embedding(embedding: &Embedding, temperature: f64) -> Result<Pattern, ModelError> {
    if embedding.dim() != REFERENCE_DIMENSION {
        return Err(ModelError::Malformed(format!(
            "expected embedding of dimension {}, got {}",
            REFERENCE_DIMENSION,
            embedding.dim()
        )));
    }
    let mut rng = Pcg32::seed_from_u64(derive_decode_seed(embedding, temperature));
    let amplitude = temperature.max(0.0) * JITTER_SCALE;
    let values = embedding.as_slice();
    Ok(Pattern::from_fn(|track, step| {
        let jitter = (rng.gen::<f64>() - 0.5) * amplitude;
        values[track.index() * PATTERN_STEPS + step] + jitter >= 0.5
    }))
}

impl ModelService for ReferenceModel {
    fn load(&self) -> ModelFuture<()> {
        self.ready.set(true);
        future::ready(Ok(())).boxed_local()
    }

    fn is_ready(&self) -> bool {
        self.ready.get()
    }

    fn encode(&self, patterns: [Pattern; 4]) -> ModelFuture<[Embedding; 4]> {
        let result = if self.is_ready() {
            Ok(patterns.each_ref().map(embed_pattern))
        } else {
            Err(Self::unavailable())
        };
        future::ready(result).boxed_local()
    }

    fn decode(&self, embedding: Embedding, temperature: f64) -> ModelFuture<Pattern> {
        let result = if self.is_ready() {
            decode_embedding(&embedding, temperature)
        } else {
            Err(Self::unavailable())
        };
        future::ready(result).boxed_local()
    }
}
