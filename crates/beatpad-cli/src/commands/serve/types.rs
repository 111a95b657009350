//! Request and response types for the WebSocket session server.

use beatpad_engine::DrawMode;
use beatpad_spec::{CornerLabel, Pattern, Point, Track};
use serde::{Deserialize, Serialize};

use crate::commands::json_output::JsonError;

/// A request with an optional client-chosen id, echoed in the response.
///
/// Requests run concurrently, so responses may arrive out of order; the id
/// lets a client match them up.
#[derive(Debug, Clone, Deserialize)]
pub struct RequestEnvelope {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(flatten)]
    pub request: SessionRequest,
}

/// Request types supported by the server.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionRequest {
    /// Fill a corner slot.
    SetCorner { corner: CornerLabel, pattern: Pattern },
    /// Empty a corner slot.
    ClearCorner { corner: CornerLabel },
    /// Flip one step of a corner pattern.
    ToggleStep {
        corner: CornerLabel,
        track: Track,
        step: usize,
    },
    /// Blend the cell under a position.
    Blend { x: f64, y: f64 },
    /// Decode exactly at a position, bypassing the cache.
    DecodeExact { x: f64, y: f64 },
    /// Start a new path.
    BeginPath { x: f64, y: f64 },
    /// Extend the current path.
    AppendPathPoint { x: f64, y: f64 },
    /// Discard the path and its playback table.
    ResetPath,
    /// Precompute playback along the path (defaults to one loop).
    PrecomputePath {
        #[serde(default)]
        steps: Option<usize>,
    },
    /// Advance playback to a global step counter.
    AdvancePlayback { step: usize },
    /// Switch between pad and path drawing.
    SetDrawMode { mode: DrawMode },
    /// Session and cache statistics.
    Stats,
}

impl SessionRequest {
    /// The wire name of the request type.
    pub fn kind(&self) -> &'static str {
        match self {
            SessionRequest::SetCorner { .. } => "set_corner",
            SessionRequest::ClearCorner { .. } => "clear_corner",
            SessionRequest::ToggleStep { .. } => "toggle_step",
            SessionRequest::Blend { .. } => "blend",
            SessionRequest::DecodeExact { .. } => "decode_exact",
            SessionRequest::BeginPath { .. } => "begin_path",
            SessionRequest::AppendPathPoint { .. } => "append_path_point",
            SessionRequest::ResetPath => "reset_path",
            SessionRequest::PrecomputePath { .. } => "precompute_path",
            SessionRequest::AdvancePlayback { .. } => "advance_playback",
            SessionRequest::SetDrawMode { .. } => "set_draw_mode",
            SessionRequest::Stats => "stats",
        }
    }
}

/// Result of a corner edit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CornerUpdate {
    pub changed: bool,
    /// Encoding version after the edit
    pub encoding_version: u64,
    /// The edited pattern (toggle only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<Pattern>,
}

/// Result of a path edit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathUpdate {
    /// False when the point was dropped as a near duplicate
    pub accepted: bool,
    pub points: usize,
    pub revision: u64,
}

/// Session snapshot returned by `stats`.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStats {
    pub model_ready: bool,
    pub encoding_version: u64,
    pub encode_calls: u64,
    pub cache: beatpad_engine::CacheStats,
    pub draw_mode: DrawMode,
    pub filled_corners: usize,
    pub path_points: usize,
    pub playback_steps: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub puck: Option<Point>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<Pattern>,
}

/// Response to one request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    /// Echo of the request id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    /// Echo of the request type.
    #[serde(rename = "type")]
    pub kind: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    pub errors: Vec<JsonError>,
}

/// Error response for requests that could not be parsed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Whether the request succeeded (always false for errors).
    pub success: bool,
    /// Error details.
    pub errors: Vec<JsonError>,
}

impl ErrorResponse {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            success: false,
            errors: vec![JsonError::new(code, message)],
        }
    }
}
