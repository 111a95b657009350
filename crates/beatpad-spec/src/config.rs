//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::error::GridError;
use crate::grid::Grid;
use crate::path::{Path, DEFAULT_PATH_EPSILON};
use crate::pattern::PATTERN_STEPS;

/// Default grid columns.
pub const DEFAULT_COLUMNS: u32 = 4;
/// Default grid rows.
pub const DEFAULT_ROWS: u32 = 4;
/// Default loop length in bars.
pub const DEFAULT_BARS: u32 = 2;
/// Default decode temperature.
pub const DEFAULT_TEMPERATURE: f64 = 0.5;
/// Default direct blend threshold.
pub const DEFAULT_BLEND_THRESHOLD: f64 = 0.5;

/// Tunables for one blend session.
///
/// Every field has a default, so `{}` is a valid config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Grid columns.
    pub columns: u32,
    /// Grid rows.
    pub rows: u32,
    /// Loop length in bars; path playback precomputes `bars * 16` steps.
    pub bars: u32,
    /// Sampling temperature passed to every decode call.
    pub temperature: f64,
    /// Minimum distance between consecutive recorded path points.
    pub path_epsilon: f64,
    /// Direct blend cut-off: a step is on when its weighted vote reaches this.
    pub blend_threshold: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            columns: DEFAULT_COLUMNS,
            rows: DEFAULT_ROWS,
            bars: DEFAULT_BARS,
            temperature: DEFAULT_TEMPERATURE,
            path_epsilon: DEFAULT_PATH_EPSILON,
            blend_threshold: DEFAULT_BLEND_THRESHOLD,
        }
    }
}

impl EngineConfig {
    /// Parses a config from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Builds the grid described by this config.
    pub fn grid(&self) -> Result<Grid, GridError> {
        Grid::new(self.columns, self.rows)
    }

    /// Creates an empty path using this config's epsilon.
    pub fn new_path(&self) -> Path {
        Path::with_epsilon(self.path_epsilon)
    }

    /// Total steps in one loop.
    pub fn loop_steps(&self) -> usize {
        self.bars as usize * PATTERN_STEPS
    }
}
