//! BeatPad Data Model
//!
//! This crate provides the value types shared by the BeatPad blending engine and
//! its front ends: drum patterns, the four corner slots, the control-surface grid,
//! freehand paths, bilinear weights, latent embeddings, and engine configuration.
//!
//! Everything here is synchronous and pure. The asynchronous engine that talks to
//! a generative model lives in `beatpad-engine`.
//!
//! # Example
//!
//! ```
//! use beatpad_spec::{BlendWeights, Grid, Path, Point};
//!
//! let grid = Grid::new(4, 4).unwrap();
//! let cell = grid.to_cell(Point::new(0.99, 0.99));
//! assert_eq!(cell.index, 15);
//!
//! let weights = BlendWeights::at(grid.center_of(cell));
//! assert!((weights.sum() - 1.0).abs() < 1e-9);
//!
//! let mut path = Path::new();
//! path.append(Point::new(0.0, 0.0));
//! path.append(Point::new(1.0, 0.0));
//! assert_eq!(path.sample_by_distance(0.5), Some(Point::new(0.5, 0.0)));
//! ```
//!
//! # Modules
//!
//! - [`pattern`]: Tracks and 16-step patterns
//! - [`corner`]: Corner labels and the four-slot corner set
//! - [`grid`]: Points, cells, and the grid mapper
//! - [`weights`]: Bilinear corner weights
//! - [`path`]: Freehand paths and the index/distance samplers
//! - [`embedding`]: Latent vectors and versioned encoding sets
//! - [`config`]: Engine configuration
//! - [`validation`]: Config validation
//! - [`hash`]: BLAKE3 fingerprints and seed derivation
//! - [`error`]: Error taxonomy

pub mod config;
pub mod corner;
pub mod embedding;
pub mod error;
pub mod grid;
pub mod hash;
pub mod path;
pub mod pattern;
pub mod validation;
pub mod weights;

// Re-export commonly used types at the crate root
pub use config::EngineConfig;
pub use corner::{CornerLabel, CornerSet};
pub use embedding::{Embedding, EncodingSet};
pub use error::{
    BlendError, CodedError, ErrorCode, GridError, ModelError, PatternError, ValidationError,
    ValidationResult,
};
pub use grid::{Cell, Grid, Point};
pub use hash::{corner_set_hash, derive_decode_seed, pattern_hash};
pub use path::{sample_by_distance, sample_by_index, Path, DEFAULT_PATH_EPSILON};
pub use pattern::{Pattern, Track, PATTERN_STEPS};
pub use validation::validate_config;
pub use weights::BlendWeights;
