//! BeatPad Engine - Latent-Space Corner Blending
//!
//! This crate blends four corner drum patterns across a two-dimensional
//! control surface. Corner patterns are encoded once into latent vectors, any
//! surface position is turned into bilinear weights, and the weighted latent
//! mix is decoded back into a pattern by an external model.
//!
//! # Consistency
//!
//! Model calls are slow and complete out of order. The engine keeps results
//! consistent with the newest user intent:
//!
//! - Corner content is versioned; any change invalidates encodings and every
//!   cached decode of the old version
//! - Decodes are memoized per `(version, cell)` and concurrent requests for the
//!   same key share one model call
//! - Pad blends carry request tokens; only the newest may update the current
//!   pattern
//! - Path playback batches install only if the path and corners they were
//!   computed from are unchanged
//!
//! Without a model, or before corners are encoded, blending degrades to a
//! direct per-step vote over the corner patterns.
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use beatpad_engine::{BlendEngine, ReferenceModel};
//! use beatpad_spec::{CornerLabel, EngineConfig, Pattern, Point, Track};
//!
//! # futures_util::FutureExt::now_or_never(async {
//! let engine = BlendEngine::new(EngineConfig::default(), Rc::new(ReferenceModel::loaded())).unwrap();
//! let kick = Pattern::from_rows([(Track::Kick, "x...x...x...x...")]).unwrap();
//! for label in CornerLabel::ALL {
//!     engine.set_corner(label, kick.clone());
//! }
//! let outcome = engine.blend_at(Point::new(0.3, 0.7)).await.unwrap();
//! assert_eq!(outcome.pattern, kick);
//! assert!(outcome.applied);
//! # }).unwrap();
//! ```
//!
//! # Module Structure
//!
//! - [`model`]: The model service contract
//! - [`reference`]: A deterministic in-process model
//! - [`sequence`]: Quantized drum note sequences (model wire format)
//! - [`latent`]: Latent interpolation
//! - [`blend`]: Direct pattern blending fallback
//! - [`encoding`]: Versioned corner encodings
//! - [`cache`]: Versioned decode cache
//! - [`guard`]: Stale-response tokens
//! - [`playback`]: Path playback precomputation
//! - [`engine`]: The session facade

pub mod blend;
pub mod cache;
pub mod encoding;
pub mod engine;
pub mod guard;
pub mod latent;
pub mod model;
pub mod playback;
pub mod reference;
pub mod sequence;

// Re-export main types
pub use blend::direct_blend;
pub use cache::{CacheStats, DecodeCache, PatternSource, Resolved};
pub use encoding::EncodingManager;
pub use engine::{BlendEngine, BlendOutcome, DrawMode, PlaybackOutcome};
pub use guard::{RequestGuard, RequestToken};
pub use latent::{decode_at, interpolate};
pub use model::{ModelFuture, ModelService};
pub use playback::{compute_steps, sample_positions, PathPlayback, PlaybackPrecomputer, PlaybackStep};
pub use reference::{ReferenceModel, REFERENCE_DIMENSION};
pub use sequence::{pitch_for_track, track_for_pitch, DrumNote, NoteSequence};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
