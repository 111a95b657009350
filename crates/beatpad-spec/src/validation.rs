//! Config validation.
//!
//! Validation collects every problem instead of stopping at the first one, so
//! a user fixing a config file sees the full list at once.

use crate::config::EngineConfig;
use crate::error::{ErrorCode, ValidationError, ValidationResult};

/// Largest supported grid dimension per axis.
pub const MAX_GRID_AXIS: u32 = 64;
/// Longest supported loop, in bars.
pub const MAX_BARS: u32 = 16;
/// Highest accepted decode temperature.
pub const MAX_TEMPERATURE: f64 = 2.0;
/// Largest accepted path epsilon.
pub const MAX_PATH_EPSILON: f64 = 0.5;

/// Validates an engine config.
///
/// # Example
/// ```
/// use beatpad_spec::{validate_config, EngineConfig};
///
/// assert!(validate_config(&EngineConfig::default()).is_ok());
/// ```
pub fn validate_config(config: &EngineConfig) -> ValidationResult {
    let mut errors = Vec::new();

    for (name, value) in [("columns", config.columns), ("rows", config.rows)] {
        if value == 0 {
            errors.push(ValidationError::with_path(
                ErrorCode::EmptyGrid,
                format!("{} must be at least 1", name),
                name,
            ));
        } else if value > MAX_GRID_AXIS {
            errors.push(ValidationError::with_path(
                ErrorCode::GridTooLarge,
                format!("{} must be at most {}, got {}", name, MAX_GRID_AXIS, value),
                name,
            ));
        }
    }

    if config.bars == 0 || config.bars > MAX_BARS {
        errors.push(ValidationError::with_path(
            ErrorCode::BarsOutOfRange,
            format!("bars must be in 1..={}, got {}", MAX_BARS, config.bars),
            "bars",
        ));
    }

    if !in_closed(config.temperature, 0.0, MAX_TEMPERATURE) {
        errors.push(ValidationError::with_path(
            ErrorCode::TemperatureOutOfRange,
            format!(
                "temperature must be in [0, {}], got {}",
                MAX_TEMPERATURE, config.temperature
            ),
            "temperature",
        ));
    }

    if !in_closed(config.path_epsilon, 0.0, MAX_PATH_EPSILON) {
        errors.push(ValidationError::with_path(
            ErrorCode::PathEpsilonOutOfRange,
            format!(
                "path_epsilon must be in [0, {}], got {}",
                MAX_PATH_EPSILON, config.path_epsilon
            ),
            "path_epsilon",
        ));
    }

    let t = config.blend_threshold;
    if !(t.is_finite() && t > 0.0 && t <= 1.0) {
        errors.push(ValidationError::with_path(
            ErrorCode::BlendThresholdOutOfRange,
            format!("blend_threshold must be in (0, 1], got {}", t),
            "blend_threshold",
        ));
    }

    ValidationResult::from_errors(errors)
}

fn in_closed(v: f64, lo: f64, hi: f64) -> bool {
    v.is_finite() && v >= lo && v <= hi
}
