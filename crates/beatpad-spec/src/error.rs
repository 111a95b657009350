//! Error types for patterns, the model contract, blending, and config validation.

use thiserror::Error;

use crate::corner::CornerLabel;
use crate::pattern::Track;

/// Trait for errors that carry a stable machine-readable code.
///
/// The CLI uses these codes in `--json` output and in WebSocket error replies.
pub trait CodedError: std::error::Error {
    /// Returns the stable error code (e.g., "BLEND_001").
    fn code(&self) -> &'static str;

    /// Returns the error category (e.g., "model", "blend").
    fn category(&self) -> &'static str;
}

/// Error codes for config validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// E001: Grid has zero columns or rows
    EmptyGrid,
    /// E002: Grid exceeds the maximum size per axis
    GridTooLarge,
    /// E003: Loop length in bars out of range
    BarsOutOfRange,
    /// E004: Decode temperature not finite or out of range
    TemperatureOutOfRange,
    /// E005: Path near-duplicate epsilon out of range
    PathEpsilonOutOfRange,
    /// E006: Direct blend threshold out of range
    BlendThresholdOutOfRange,
}

impl ErrorCode {
    /// Returns the error code string (e.g., "E001").
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::EmptyGrid => "E001",
            ErrorCode::GridTooLarge => "E002",
            ErrorCode::BarsOutOfRange => "E003",
            ErrorCode::TemperatureOutOfRange => "E004",
            ErrorCode::PathEpsilonOutOfRange => "E005",
            ErrorCode::BlendThresholdOutOfRange => "E006",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A validation error with code, message, and optional field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The error code.
    pub code: ErrorCode,
    /// Human-readable error message.
    pub message: String,
    /// Name of the offending config field (e.g., "columns").
    pub path: Option<String>,
}

impl ValidationError {
    /// Creates a new validation error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: None,
        }
    }

    /// Creates a new validation error with a field path.
    pub fn with_path(code: ErrorCode, message: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: Some(path.into()),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref path) = self.path {
            write!(f, "{}: {} (at {})", self.code, self.message, path)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

impl std::error::Error for ValidationError {}

/// Result of config validation.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether validation passed (no errors).
    pub ok: bool,
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    /// Creates a successful validation result.
    pub fn success() -> Self {
        Self {
            ok: true,
            errors: Vec::new(),
        }
    }

    /// Creates a failed validation result.
    pub fn failure(errors: Vec<ValidationError>) -> Self {
        Self { ok: false, errors }
    }

    /// Builds a result from a list of collected errors.
    pub fn from_errors(errors: Vec<ValidationError>) -> Self {
        if errors.is_empty() {
            Self::success()
        } else {
            Self::failure(errors)
        }
    }

    /// Returns true if validation passed.
    pub fn is_ok(&self) -> bool {
        self.ok
    }

    /// Returns true if validation failed.
    pub fn is_err(&self) -> bool {
        !self.ok
    }
}

/// Errors raised while building or parsing a [`Pattern`](crate::Pattern).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("track '{track}' has {got} steps, expected {expected}")]
    WrongLength {
        track: Track,
        expected: usize,
        got: usize,
    },
    #[error("track '{track}' has invalid step character '{ch}' (use x/1 for on, ./-/0 for off)")]
    InvalidStep { track: Track, ch: char },
}

impl CodedError for PatternError {
    fn code(&self) -> &'static str {
        match self {
            PatternError::WrongLength { .. } => "PATTERN_001",
            PatternError::InvalidStep { .. } => "PATTERN_002",
        }
    }

    fn category(&self) -> &'static str {
        "pattern"
    }
}

/// Errors raised when constructing a [`Grid`](crate::Grid).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("grid must have at least one column and one row, got {columns}x{rows}")]
    Empty { columns: u32, rows: u32 },
    #[error("grid of {columns}x{rows} has more cells than can be indexed")]
    TooManyCells { columns: u32, rows: u32 },
}

/// Failures reported by an external model service.
///
/// This is the error half of the model contract; the engine maps it into
/// [`BlendError`] depending on whether an encode or a decode failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// The model is not loaded (or failed to load).
    #[error("model unavailable: {0}")]
    Unavailable(String),
    /// The call reached the model but failed (network, inference).
    #[error("model request failed: {0}")]
    Request(String),
    /// The model returned (or was given) data of the wrong shape.
    #[error("malformed model data: {0}")]
    Malformed(String),
}

impl CodedError for ModelError {
    fn code(&self) -> &'static str {
        match self {
            ModelError::Unavailable(_) => "MODEL_001",
            ModelError::Request(_) => "MODEL_002",
            ModelError::Malformed(_) => "MODEL_003",
        }
    }

    fn category(&self) -> &'static str {
        "model"
    }
}

/// Errors surfaced by the blending engine.
///
/// `Clone` so a single pending result can be handed to every coalesced caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlendError {
    /// The model was not ready when a call was attempted.
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),
    /// Encoding the corner patterns failed.
    #[error("encoding corner patterns failed: {0}")]
    EncodeFailed(String),
    /// Decoding an interpolated embedding failed.
    #[error("decoding embedding failed: {0}")]
    DecodeFailed(String),
    /// The four corner embeddings do not share a dimension.
    #[error("embedding for corner {corner} has dimension {got}, expected {expected}")]
    DimensionMismatch {
        corner: CornerLabel,
        expected: usize,
        got: usize,
    },
    /// No corner pattern is set, so not even the direct blend can run.
    #[error("no corner patterns are set")]
    NoCorners,
}

impl BlendError {
    /// Maps a failed encode call.
    ///
    /// `ModelUnavailable` is reserved for calls refused before they are
    /// issued; once the model has been called every failure is an encode
    /// failure, including connection errors.
    pub fn from_encode(err: ModelError) -> Self {
        BlendError::EncodeFailed(err.to_string())
    }

    /// Maps a failed decode call.
    pub fn from_decode(err: ModelError) -> Self {
        BlendError::DecodeFailed(err.to_string())
    }
}

impl CodedError for BlendError {
    fn code(&self) -> &'static str {
        match self {
            BlendError::ModelUnavailable(_) => "BLEND_001",
            BlendError::EncodeFailed(_) => "BLEND_002",
            BlendError::DecodeFailed(_) => "BLEND_003",
            BlendError::DimensionMismatch { .. } => "BLEND_004",
            BlendError::NoCorners => "BLEND_005",
        }
    }

    fn category(&self) -> &'static str {
        "blend"
    }
}
