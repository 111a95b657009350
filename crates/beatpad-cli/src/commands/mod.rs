//! CLI command implementations

pub mod blend;
pub mod grid;
pub mod json_output;
pub mod path;
pub mod validate;

#[cfg(feature = "serve")]
pub mod serve;

use anyhow::{Context, Result};
use beatpad_engine::BlendEngine;
use beatpad_spec::{
    validate_config, BlendError, CodedError, CornerLabel, EngineConfig, ModelError,
    ValidationError,
};
use std::future::Future;
use std::path::Path;

use crate::input::{load_config, load_corners, InputError};
use crate::model::resolve_model;
use json_output::{error_codes, input_error_to_json, validation_error_to_json, JsonError};

/// A config that failed validation.
#[derive(Debug)]
pub struct InvalidConfig {
    pub errors: Vec<ValidationError>,
}

impl std::fmt::Display for InvalidConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "config has {} error(s)", self.errors.len())?;
        for error in &self.errors {
            write!(f, "\n  {}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for InvalidConfig {}

/// Loads and validates the engine config.
pub fn load_valid_config(config_path: Option<&str>) -> Result<EngineConfig> {
    let config = load_config(config_path.map(Path::new))
        .with_context(|| format!("Failed to load config: {}", config_path.unwrap_or("-")))?;
    let result = validate_config(&config);
    if result.is_err() {
        return Err(InvalidConfig {
            errors: result.errors,
        }
        .into());
    }
    Ok(config)
}

/// Builds an engine with its corners filled from a corner file and loads the
/// model. A model that fails to load is logged and left unloaded, so the
/// engine falls back to direct blending.
pub async fn open_session(
    corners_path: &str,
    config_path: Option<&str>,
    model: Option<&str>,
) -> Result<BlendEngine> {
    let config = load_valid_config(config_path)?;
    let corners = load_corners(Path::new(corners_path))
        .with_context(|| format!("Failed to load corners: {}", corners_path))?;
    let engine = BlendEngine::new(config, resolve_model(model)?)?;
    for label in CornerLabel::ALL {
        if let Some(pattern) = corners.get(label) {
            engine.set_corner(label, pattern.clone());
        }
    }
    if let Err(err) = engine.load_model().await {
        tracing::warn!(error = %err, "continuing without model");
    }
    Ok(engine)
}

/// Runs a `!Send` future to completion on a current-thread runtime.
pub fn block_on_local<F: Future>(future: F) -> Result<F::Output> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;
    Ok(rt.block_on(future))
}

/// Converts a command failure into JSON errors, keeping stable codes for
/// known error types.
pub fn errors_to_json(err: &anyhow::Error) -> Vec<JsonError> {
    if let Some(invalid) = err.downcast_ref::<InvalidConfig>() {
        return invalid.errors.iter().map(validation_error_to_json).collect();
    }
    if let Some(input) = err.downcast_ref::<InputError>() {
        return vec![input_error_to_json(input)];
    }
    if let Some(blend) = err.downcast_ref::<BlendError>() {
        return vec![JsonError::new(blend.code(), format!("{:#}", err))];
    }
    if let Some(model) = err.downcast_ref::<ModelError>() {
        return vec![JsonError::new(model.code(), format!("{:#}", err))];
    }
    vec![JsonError::new(error_codes::COMMAND_FAILED, format!("{:#}", err))]
}
