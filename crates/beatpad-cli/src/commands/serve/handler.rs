//! Request handler logic for the WebSocket session server.

use beatpad_engine::BlendEngine;
use beatpad_spec::{BlendError, Point, PATTERN_STEPS};
use serde::Serialize;
use tokio_tungstenite::tungstenite::Message;

use crate::commands::json_output::{error_codes, JsonError};

use super::types::{
    CornerUpdate, ErrorResponse, PathUpdate, RequestEnvelope, SessionRequest, SessionResponse,
    SessionStats,
};

/// One client's blend session.
pub struct SessionHandler {
    engine: BlendEngine,
}

impl SessionHandler {
    pub fn new(engine: BlendEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &BlendEngine {
        &self.engine
    }

    /// Handles a JSON request and returns a JSON response.
    pub async fn handle_request(&self, json_text: &str) -> String {
        let envelope: RequestEnvelope = match serde_json::from_str(json_text) {
            Ok(req) => req,
            Err(e) => {
                let error = ErrorResponse::new(
                    error_codes::INVALID_REQUEST,
                    format!("Invalid request JSON: {}", e),
                );
                return serde_json::to_string(&error).unwrap_or_else(|_| {
                    r#"{"success":false,"errors":[{"code":"CLI_005","message":"Invalid request JSON"}]}"#.to_string()
                });
            }
        };

        let kind = envelope.request.kind();
        let response = match self.dispatch(envelope.request).await {
            Ok(result) => SessionResponse {
                id: envelope.id,
                kind: kind.to_string(),
                success: true,
                result: Some(result),
                errors: Vec::new(),
            },
            Err(error) => SessionResponse {
                id: envelope.id,
                kind: kind.to_string(),
                success: false,
                result: None,
                errors: vec![error],
            },
        };

        serde_json::to_string(&response).unwrap_or_else(|e| {
            let error = ErrorResponse::new(
                error_codes::JSON_SERIALIZE,
                format!("Failed to serialize response: {}", e),
            );
            serde_json::to_string(&error).unwrap_or_else(|_| {
                r#"{"success":false,"errors":[{"code":"CLI_003","message":"Failed to serialize response"}]}"#.to_string()
            })
        })
    }

    async fn dispatch(&self, request: SessionRequest) -> Result<serde_json::Value, JsonError> {
        let engine = &self.engine;
        match request {
            SessionRequest::SetCorner { corner, pattern } => {
                let changed = engine.set_corner(corner, pattern);
                to_value(self.corner_update(changed, None))
            }
            SessionRequest::ClearCorner { corner } => {
                let changed = engine.clear_corner(corner);
                to_value(self.corner_update(changed, None))
            }
            SessionRequest::ToggleStep {
                corner,
                track,
                step,
            } => {
                if step >= PATTERN_STEPS {
                    return Err(JsonError::new(
                        error_codes::INVALID_ARGUMENT,
                        format!("step must be below {}, got {}", PATTERN_STEPS, step),
                    ));
                }
                let pattern = engine.toggle_corner_step(corner, track, step);
                to_value(self.corner_update(true, Some(pattern)))
            }
            SessionRequest::Blend { x, y } => {
                let outcome = engine.blend_at(Point::new(x, y)).await.map_err(blend_error)?;
                to_value(outcome)
            }
            SessionRequest::DecodeExact { x, y } => {
                let pattern = engine
                    .decode_exact_at(Point::new(x, y))
                    .await
                    .map_err(blend_error)?;
                to_value(serde_json::json!({ "pattern": pattern }))
            }
            SessionRequest::BeginPath { x, y } => {
                engine.begin_path(Point::new(x, y));
                to_value(self.path_update(true))
            }
            SessionRequest::AppendPathPoint { x, y } => {
                let accepted = engine.append_path_point(Point::new(x, y));
                to_value(self.path_update(accepted))
            }
            SessionRequest::ResetPath => {
                engine.reset_path();
                to_value(self.path_update(true))
            }
            SessionRequest::PrecomputePath { steps } => {
                let steps = steps.unwrap_or_else(|| engine.loop_steps());
                let outcome = engine
                    .precompute_path_playback(steps)
                    .await
                    .map_err(blend_error)?;
                to_value(outcome)
            }
            SessionRequest::AdvancePlayback { step } => {
                let frame = engine.advance_playback(step);
                to_value(serde_json::json!({
                    "frame": frame,
                    "current": engine.current_pattern(),
                }))
            }
            SessionRequest::SetDrawMode { mode } => {
                engine.set_draw_mode(mode);
                to_value(serde_json::json!({
                    "mode": engine.draw_mode(),
                    "current": engine.current_pattern(),
                }))
            }
            SessionRequest::Stats => to_value(self.stats()),
        }
    }

    fn corner_update(&self, changed: bool, pattern: Option<beatpad_spec::Pattern>) -> CornerUpdate {
        CornerUpdate {
            changed,
            encoding_version: self.engine.encoding_version(),
            pattern,
        }
    }

    fn path_update(&self, accepted: bool) -> PathUpdate {
        let path = self.engine.path();
        PathUpdate {
            accepted,
            points: path.len(),
            revision: path.revision(),
        }
    }

    /// Snapshot of the session state.
    pub fn stats(&self) -> SessionStats {
        let engine = &self.engine;
        SessionStats {
            model_ready: engine.is_model_ready(),
            encoding_version: engine.encoding_version(),
            encode_calls: engine.encode_calls(),
            cache: engine.cache_stats(),
            draw_mode: engine.draw_mode(),
            filled_corners: engine.corners().filled(),
            path_points: engine.path().len(),
            playback_steps: engine.playback().map(|p| p.len()).unwrap_or(0),
            puck: engine.puck(),
            current: engine.current_pattern(),
        }
    }
}

fn blend_error(err: BlendError) -> JsonError {
    JsonError::from_coded(&err)
}

fn to_value<T: Serialize>(value: T) -> Result<serde_json::Value, JsonError> {
    serde_json::to_value(value).map_err(|e| {
        JsonError::new(
            error_codes::JSON_SERIALIZE,
            format!("Failed to serialize result: {}", e),
        )
    })
}

/// Process a single WebSocket message and return a response.
pub async fn process_message(handler: &SessionHandler, msg: Message) -> Option<String> {
    match msg {
        Message::Text(text) => Some(handler.handle_request(&text).await),
        Message::Binary(data) => {
            // Try to parse binary as UTF-8 JSON
            match String::from_utf8(data) {
                Ok(text) => Some(handler.handle_request(&text).await),
                Err(_) => {
                    let error = ErrorResponse::new(
                        error_codes::INVALID_REQUEST,
                        "Binary message must be valid UTF-8 JSON",
                    );
                    Some(serde_json::to_string(&error).unwrap_or_else(|_| {
                        r#"{"success":false,"errors":[{"code":"CLI_005","message":"Binary message must be valid UTF-8 JSON"}]}"#.to_string()
                    }))
                }
            }
        }
        // Handled by tungstenite
        Message::Ping(_) | Message::Pong(_) => None,
        Message::Close(_) => None,
        Message::Frame(_) => None,
    }
}

/// Whether a message carries a request.
pub fn is_request(msg: &Message) -> bool {
    matches!(msg, Message::Text(_) | Message::Binary(_))
}
