//! JSON output types for machine-readable CLI output.
//!
//! Every command that accepts `--json` prints one [`JsonOutput`] document on
//! stdout: `{ "success": bool, "result": ..., "errors": [...] }`.

use beatpad_spec::{CodedError, ValidationError};
use serde::{Deserialize, Serialize};

use crate::input::InputError;

/// Error codes for CLI operations.
///
/// These codes are stable and can be used for programmatic error handling.
/// Format: CLI_XXX for CLI-level errors; engine and validation errors pass
/// their own codes through (BLEND_00x, MODEL_00x, E00x).
pub mod error_codes {
    /// File could not be read
    pub const FILE_READ: &str = "CLI_001";
    /// JSON parse error
    pub const JSON_PARSE: &str = "CLI_002";
    /// JSON serialization error
    pub const JSON_SERIALIZE: &str = "CLI_003";
    /// Invalid command argument
    pub const INVALID_ARGUMENT: &str = "CLI_004";
    /// Invalid server request
    pub const INVALID_REQUEST: &str = "CLI_005";
    /// Any other command failure
    pub const COMMAND_FAILED: &str = "CLI_006";
}

/// A structured error in JSON output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JsonError {
    /// Stable error code (e.g., "CLI_001", "E001", "BLEND_005")
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Config field the error refers to (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Source file path (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl JsonError {
    /// Creates a new error with code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            path: None,
            file: None,
        }
    }

    /// Sets the config path for this error.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Sets the file path for this error.
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Converts any coded engine error.
    pub fn from_coded(err: &dyn CodedError) -> Self {
        Self::new(err.code(), err.to_string())
    }
}

/// Envelope for `--json` output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonOutput<T> {
    /// Whether the command succeeded
    pub success: bool,
    /// Command result (present on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
    /// Errors (empty on success)
    pub errors: Vec<JsonError>,
}

impl<T> JsonOutput<T> {
    pub fn success(result: T) -> Self {
        Self {
            success: true,
            result: Some(result),
            errors: Vec::new(),
        }
    }

    pub fn failure(errors: Vec<JsonError>) -> Self {
        Self {
            success: false,
            result: None,
            errors,
        }
    }
}

impl<T: Serialize> JsonOutput<T> {
    /// Serializes to pretty JSON, degrading to a fixed error document.
    pub fn to_json_string(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| {
            let fallback: JsonOutput<()> = JsonOutput::failure(vec![JsonError::new(
                error_codes::JSON_SERIALIZE,
                format!("Failed to serialize output: {}", e),
            )]);
            serde_json::to_string(&fallback).unwrap_or_else(|_| {
                r#"{"success":false,"errors":[{"code":"CLI_003","message":"Failed to serialize output"}]}"#.to_string()
            })
        })
    }
}

/// Converts an input loading error.
pub fn input_error_to_json(err: &InputError) -> JsonError {
    match err {
        InputError::FileRead { path, source } => JsonError::new(
            error_codes::FILE_READ,
            format!("Failed to read file '{}': {}", path.display(), source),
        )
        .with_file(path.display().to_string()),
        InputError::JsonParse { path, message } => {
            JsonError::new(error_codes::JSON_PARSE, format!("JSON parse error: {}", message))
                .with_file(path.display().to_string())
        }
    }
}

/// Converts a config validation error.
pub fn validation_error_to_json(err: &ValidationError) -> JsonError {
    let json = JsonError::new(err.code.code(), err.message.clone());
    match &err.path {
        Some(path) => json.with_path(path.clone()),
        None => json,
    }
}
