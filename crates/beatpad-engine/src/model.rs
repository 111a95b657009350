//! The external model service contract.
//!
//! The engine never looks inside a model. It only needs a way to turn four
//! corner patterns into four embeddings and an embedding back into a pattern.
//! Futures are `'static` and `!Send`: the engine runs on one logical thread and
//! holds pending calls in shared futures for coalescing.

use beatpad_spec::{Embedding, ModelError, Pattern};
use futures_util::future::LocalBoxFuture;

/// A pending model call.
pub type ModelFuture<T> = LocalBoxFuture<'static, Result<T, ModelError>>;

/// An encoder/decoder over drum patterns.
///
/// Implementations must fail fast with [`ModelError::Unavailable`] when called
/// before [`ModelService::load`] has completed.
pub trait ModelService {
    /// Loads the model. Idempotent.
    fn load(&self) -> ModelFuture<()>;

    /// True once the model can serve encode/decode calls.
    fn is_ready(&self) -> bool;

    /// Encodes the four corner patterns (slot order A..D) into four embeddings.
    fn encode(&self, patterns: [Pattern; 4]) -> ModelFuture<[Embedding; 4]>;

    /// Decodes one embedding into a pattern.
    fn decode(&self, embedding: Embedding, temperature: f64) -> ModelFuture<Pattern>;
}
