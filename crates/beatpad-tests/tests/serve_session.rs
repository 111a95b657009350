//! Integration tests for the WebSocket session server.
//!
//! These tests verify the server by:
//! - Starting it on a dynamic port inside a local task set
//! - Connecting as a WebSocket client
//! - Editing corners, blending and playing back a path over the socket
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p beatpad-tests --test serve_session
//! ```

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::time::Duration;

use beatpad_cli::commands::serve::{serve, ServeOptions, SessionResponse};
use beatpad_spec::CornerLabel;
use beatpad_tests::fixtures::corner_patterns;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::task::{JoinHandle, LocalSet};
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const RESPONSE_TIMEOUT: Duration = Duration::from_secs(10);

/// Starts a server on a random port. Must be called inside a `LocalSet`.
async fn start_server() -> (SocketAddr, broadcast::Sender<()>, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();
    let (shutdown, _) = broadcast::channel(1);
    let handle = tokio::task::spawn_local(serve(
        listener,
        ServeOptions::default(),
        shutdown.clone(),
    ));
    (addr, shutdown, handle)
}

async fn connect(addr: SocketAddr) -> Client {
    let (client, _) = connect_async(format!("ws://{}", addr))
        .await
        .expect("Failed to connect");
    client
}

async fn send(client: &mut Client, request: Value) {
    client
        .send(Message::Text(request.to_string()))
        .await
        .expect("Failed to send request");
}

async fn receive(client: &mut Client) -> SessionResponse {
    loop {
        let msg = timeout(RESPONSE_TIMEOUT, client.next())
            .await
            .expect("Timed out waiting for response")
            .expect("Connection closed")
            .expect("WebSocket error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(&text).expect("Response is not a session response");
        }
    }
}

/// Sends `requests` (each carrying an id) and collects the responses by id.
/// Requests on one connection run concurrently, so arrival order is free.
async fn round_trip(client: &mut Client, requests: Vec<Value>) -> BTreeMap<u64, SessionResponse> {
    let count = requests.len();
    for request in requests {
        send(client, request).await;
    }
    let mut responses = BTreeMap::new();
    while responses.len() < count {
        let response = receive(client).await;
        let id = response.id.expect("response without id");
        responses.insert(id, response);
    }
    responses
}

fn set_corner_requests() -> Vec<Value> {
    CornerLabel::ALL
        .into_iter()
        .zip(corner_patterns())
        .enumerate()
        .map(|(i, (label, pattern))| {
            json!({
                "id": i as u64 + 1,
                "type": "set_corner",
                "corner": label,
                "pattern": pattern,
            })
        })
        .collect()
}

fn result(response: &SessionResponse) -> &Value {
    assert!(
        response.success,
        "{} failed: {:?}",
        response.kind, response.errors
    );
    response.result.as_ref().expect("successful response has a result")
}

async fn stop(shutdown: broadcast::Sender<()>, handle: JoinHandle<()>) {
    let _ = shutdown.send(());
    timeout(RESPONSE_TIMEOUT, handle)
        .await
        .expect("Server did not shut down")
        .expect("Server task panicked");
}

// ============================================================================
// Session Tests
// ============================================================================

#[tokio::test]
async fn test_corners_then_blend() {
    LocalSet::new()
        .run_until(async {
            let (addr, shutdown, handle) = start_server().await;
            let mut client = connect(addr).await;

            let responses = round_trip(&mut client, set_corner_requests()).await;
            assert_eq!(responses.len(), 4);
            for response in responses.values() {
                assert_eq!(response.kind, "set_corner");
                assert_eq!(result(response)["changed"], true);
            }

            send(&mut client, json!({"id": 10, "type": "blend", "x": 0.95, "y": 0.05})).await;
            let blend = receive(&mut client).await;
            assert_eq!(blend.id, Some(10));
            let outcome = result(&blend);
            assert_eq!(outcome["cell"]["index"], 3);
            assert_eq!(outcome["applied"], true);
            assert_eq!(outcome["source"]["kind"], "latent");
            assert_eq!(outcome["pattern"]["snare"][4], true);

            send(&mut client, json!({"id": 11, "type": "stats"})).await;
            let stats = receive(&mut client).await;
            let stats = result(&stats);
            assert_eq!(stats["filled_corners"], 4);
            assert_eq!(stats["encode_calls"], 1);
            assert_eq!(stats["cache"]["misses"], 1);
            assert_eq!(stats["current"], outcome["pattern"]);

            drop(client);
            stop(shutdown, handle).await;
        })
        .await;
}

#[tokio::test]
async fn test_connections_have_separate_sessions() {
    LocalSet::new()
        .run_until(async {
            let (addr, shutdown, handle) = start_server().await;
            let mut first = connect(addr).await;
            let mut second = connect(addr).await;

            round_trip(&mut first, set_corner_requests()).await;

            send(&mut second, json!({"id": 1, "type": "stats"})).await;
            let stats = receive(&mut second).await;
            assert_eq!(result(&stats)["filled_corners"], 0);

            send(&mut second, json!({"id": 2, "type": "blend", "x": 0.5, "y": 0.5})).await;
            let blend = receive(&mut second).await;
            assert!(!blend.success);
            assert_eq!(blend.errors[0].code, "BLEND_005");

            drop(first);
            drop(second);
            stop(shutdown, handle).await;
        })
        .await;
}

#[tokio::test]
async fn test_path_playback_over_socket() {
    LocalSet::new()
        .run_until(async {
            let (addr, shutdown, handle) = start_server().await;
            let mut client = connect(addr).await;
            round_trip(&mut client, set_corner_requests()).await;

            let mode = round_trip(
                &mut client,
                vec![json!({"id": 20, "type": "set_draw_mode", "mode": "path"})],
            )
            .await;
            assert!(mode[&20].success);

            // Path edits must land in order, so wait for each one.
            for (id, request) in [
                (21, json!({"id": 21, "type": "begin_path", "x": 0.0, "y": 0.0})),
                (22, json!({"id": 22, "type": "append_path_point", "x": 1.0, "y": 1.0})),
            ] {
                let responses = round_trip(&mut client, vec![request]).await;
                assert_eq!(result(&responses[&id])["accepted"], true);
            }

            send(&mut client, json!({"id": 23, "type": "precompute_path", "steps": 4})).await;
            let precompute = receive(&mut client).await;
            let outcome = result(&precompute);
            assert_eq!(outcome["installed"], true);
            assert_eq!(outcome["playback"]["steps"].as_array().unwrap().len(), 4);

            send(&mut client, json!({"id": 24, "type": "advance_playback", "step": 0})).await;
            let advance = receive(&mut client).await;
            let frame = result(&advance);
            assert_eq!(frame["frame"]["pattern"]["kick"][0], true);

            drop(client);
            stop(shutdown, handle).await;
        })
        .await;
}

#[tokio::test]
async fn test_malformed_request_keeps_connection_open() {
    LocalSet::new()
        .run_until(async {
            let (addr, shutdown, handle) = start_server().await;
            let mut client = connect(addr).await;

            client
                .send(Message::Text("{not json".to_string()))
                .await
                .unwrap();
            let msg = timeout(RESPONSE_TIMEOUT, client.next())
                .await
                .unwrap()
                .unwrap()
                .unwrap();
            let Message::Text(text) = msg else {
                panic!("expected text response, got {:?}", msg);
            };
            let error: Value = serde_json::from_str(&text).unwrap();
            assert_eq!(error["success"], false);
            assert_eq!(error["errors"][0]["code"], "CLI_005");

            send(&mut client, json!({"id": 1, "type": "stats"})).await;
            assert!(receive(&mut client).await.success);

            drop(client);
            stop(shutdown, handle).await;
        })
        .await;
}
