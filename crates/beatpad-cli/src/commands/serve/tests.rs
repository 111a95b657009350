//! Tests for the WebSocket session server.

use beatpad_engine::{BlendEngine, ReferenceModel};
use beatpad_spec::{EngineConfig, Track};
use serde_json::Value;
use std::rc::Rc;
use tokio_tungstenite::tungstenite::Message;

use crate::commands::json_output::error_codes;

use super::handler::{process_message, SessionHandler};
use super::types::{ErrorResponse, SessionResponse};

fn loaded_handler() -> SessionHandler {
    let engine =
        BlendEngine::new(EngineConfig::default(), Rc::new(ReferenceModel::loaded())).unwrap();
    SessionHandler::new(engine)
}

async fn request(handler: &SessionHandler, json: &str) -> SessionResponse {
    let response = handler.handle_request(json).await;
    serde_json::from_str(&response).unwrap()
}

async fn fill_corners(handler: &SessionHandler) {
    for (corner, track) in [("a", "kick"), ("b", "snare"), ("c", "hat_closed"), ("d", "ride")] {
        let json = format!(
            r#"{{"type":"set_corner","corner":"{}","pattern":{{"{}":"x.x.x.x.x.x.x.x."}}}}"#,
            corner, track
        );
        assert!(request(handler, &json).await.success);
    }
}

#[tokio::test]
async fn test_invalid_json() {
    let handler = loaded_handler();
    let response = handler.handle_request("not json").await;
    let output: ErrorResponse = serde_json::from_str(&response).unwrap();
    assert!(!output.success);
    assert_eq!(output.errors[0].code, error_codes::INVALID_REQUEST);
}

#[tokio::test]
async fn test_unknown_type() {
    let handler = loaded_handler();
    let response = handler.handle_request(r#"{"type":"unknown"}"#).await;
    let output: ErrorResponse = serde_json::from_str(&response).unwrap();
    assert!(!output.success);
}

#[tokio::test]
async fn test_id_and_type_are_echoed() {
    let handler = loaded_handler();
    let response = request(&handler, r#"{"id": 41, "type": "stats"}"#).await;
    assert_eq!(response.id, Some(41));
    assert_eq!(response.kind, "stats");
    assert!(response.success);
    assert_eq!(response.result.unwrap()["model_ready"], true);
}

#[tokio::test]
async fn test_set_corner_bumps_encoding_version() {
    let handler = loaded_handler();
    let json = r#"{"type":"set_corner","corner":"a","pattern":{"kick":"x...x...x...x..."}}"#;
    let first = request(&handler, json).await.result.unwrap();
    assert_eq!(first["changed"], true);

    let again = request(&handler, json).await.result.unwrap();
    assert_eq!(again["changed"], false);
    assert_eq!(again["encoding_version"], first["encoding_version"]);
}

#[tokio::test]
async fn test_toggle_step_rejects_out_of_range() {
    let handler = loaded_handler();
    let response = request(
        &handler,
        r#"{"type":"toggle_step","corner":"b","track":"snare","step":16}"#,
    )
    .await;
    assert!(!response.success);
    assert_eq!(response.errors[0].code, error_codes::INVALID_ARGUMENT);

    let response = request(
        &handler,
        r#"{"type":"toggle_step","corner":"b","track":"snare","step":4}"#,
    )
    .await;
    assert!(response.success);
    assert!(handler
        .engine()
        .corners()
        .get(beatpad_spec::CornerLabel::B)
        .is_some_and(|p| p.is_on(Track::Snare, 4)));
}

#[tokio::test]
async fn test_blend_with_no_corners_fails() {
    let handler = loaded_handler();
    let response = request(&handler, r#"{"type":"blend","x":0.5,"y":0.5}"#).await;
    assert!(!response.success);
    assert_eq!(response.errors[0].code, "BLEND_005");
}

#[tokio::test]
async fn test_blend_caches_cell() {
    let handler = loaded_handler();
    fill_corners(&handler).await;

    let first = request(&handler, r#"{"type":"blend","x":0.1,"y":0.1}"#).await;
    let result = first.result.unwrap();
    assert_eq!(result["applied"], true);
    assert_eq!(result["source"]["kind"], "latent");

    // Same cell, different point.
    request(&handler, r#"{"type":"blend","x":0.2,"y":0.2}"#).await;
    let stats = handler.stats();
    assert_eq!(stats.cache.misses, 1);
    assert_eq!(stats.cache.hits, 1);
}

#[tokio::test]
async fn test_path_precompute_and_playback() {
    let handler = loaded_handler();
    fill_corners(&handler).await;

    request(&handler, r#"{"type":"set_draw_mode","mode":"path"}"#).await;
    request(&handler, r#"{"type":"begin_path","x":0.0,"y":0.0}"#).await;
    let dropped = request(&handler, r#"{"type":"append_path_point","x":0.001,"y":0.0}"#).await;
    assert_eq!(dropped.result.unwrap()["accepted"], false);
    request(&handler, r#"{"type":"append_path_point","x":1.0,"y":1.0}"#).await;

    let precompute = request(&handler, r#"{"type":"precompute_path","steps":8}"#).await;
    let result = precompute.result.unwrap();
    assert_eq!(result["installed"], true);
    assert_eq!(result["playback"]["steps"].as_array().unwrap().len(), 8);

    let frame = request(&handler, r#"{"type":"advance_playback","step":9}"#).await;
    let result = frame.result.unwrap();
    assert!(result["frame"]["pattern"].is_object());
    assert!(result["current"].is_object());
    assert_eq!(handler.stats().playback_steps, 8);
}

#[tokio::test]
async fn test_reset_path_clears_playback() {
    let handler = loaded_handler();
    fill_corners(&handler).await;
    request(&handler, r#"{"type":"begin_path","x":0.0,"y":0.0}"#).await;
    request(&handler, r#"{"type":"append_path_point","x":1.0,"y":0.0}"#).await;
    request(&handler, r#"{"type":"precompute_path","steps":4}"#).await;

    let reset = request(&handler, r#"{"type":"reset_path"}"#).await;
    assert_eq!(reset.result.unwrap()["points"], 0);
    assert_eq!(handler.stats().playback_steps, 0);
}

#[tokio::test]
async fn test_binary_message_is_parsed() {
    let handler = loaded_handler();
    let response = process_message(&handler, Message::Binary(br#"{"type":"stats"}"#.to_vec()))
        .await
        .unwrap();
    let value: Value = serde_json::from_str(&response).unwrap();
    assert_eq!(value["success"], true);

    let response = process_message(&handler, Message::Binary(vec![0xff, 0xfe]))
        .await
        .unwrap();
    let output: ErrorResponse = serde_json::from_str(&response).unwrap();
    assert_eq!(output.errors[0].code, error_codes::INVALID_REQUEST);

    assert!(process_message(&handler, Message::Ping(Vec::new())).await.is_none());
}
