//! WebSocket session server for interactive front ends.
//!
//! Each connection gets its own blend engine. Requests on a connection run
//! concurrently, so a slow decode never blocks a later blend; the engine's
//! request guards decide which results become the session's current pattern.
//!
//! ## Protocol
//!
//! Requests are JSON objects with a `type` field and an optional `id` that is
//! echoed in the response:
//!
//! ```json
//! {"id": 7, "type": "set_corner", "corner": "a", "pattern": {"kick": "x...x...x...x..."}}
//! {"id": 8, "type": "blend", "x": 0.3, "y": 0.6}
//! ```
//!
//! Responses carry `type`, `success`, `result` and `errors`. A blend that was
//! superseded by a newer one still answers, with `"applied": false`.

mod handler;
mod types;

#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use beatpad_engine::BlendEngine;
use beatpad_spec::EngineConfig;
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::process::ExitCode;
use std::rc::Rc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc};
use tokio::task::LocalSet;
use tokio_tungstenite::tungstenite::Message;
use tracing::{info, warn};

use super::load_valid_config;
use crate::model::resolve_model;

pub use handler::{process_message, SessionHandler};
pub use types::{
    CornerUpdate, ErrorResponse, PathUpdate, RequestEnvelope, SessionRequest, SessionResponse,
    SessionStats,
};

/// Default port for the WebSocket server.
pub const DEFAULT_PORT: u16 = 9124;

/// Settings shared by every connection.
#[derive(Debug, Clone, Default)]
pub struct ServeOptions {
    pub config: EngineConfig,
    /// Model selector passed to [`resolve_model`]
    pub model: Option<String>,
}

impl ServeOptions {
    /// Opens a fresh engine and loads its model. A model that fails to load
    /// leaves the session blending directly.
    pub async fn open_engine(&self) -> Result<BlendEngine> {
        let model = resolve_model(self.model.as_deref())?;
        let engine = BlendEngine::new(self.config.clone(), model)?;
        if let Err(err) = engine.load_model().await {
            warn!(error = %err, "session continuing without model");
        }
        Ok(engine)
    }
}

/// Run the WebSocket session server.
///
/// # Arguments
/// * `port` - Port to listen on
/// * `config_path` - Optional engine config JSON file
/// * `model` - Model selector
///
/// # Returns
/// Exit code: 0 on clean shutdown, 1 on error
pub fn run(port: u16, config_path: Option<&str>, model: Option<&str>) -> Result<ExitCode> {
    let options = ServeOptions {
        config: load_valid_config(config_path)?,
        model: model.map(str::to_string),
    };

    // Build tokio runtime
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    let local = LocalSet::new();
    rt.block_on(local.run_until(run_server(port, options)))
}

/// Run the WebSocket server (async entry point).
async fn run_server(port: u16, options: ServeOptions) -> Result<ExitCode> {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    eprintln!("WebSocket session server listening on ws://{}", addr);
    eprintln!("Press Ctrl+C to shutdown");

    // Create shutdown channel
    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    // Set up SIGINT handler
    let signal_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        if let Ok(()) = tokio::signal::ctrl_c().await {
            eprintln!("\nShutting down...");
            let _ = signal_tx.send(());
        }
    });

    serve(listener, options, shutdown_tx).await;
    eprintln!("Server shutdown complete");
    Ok(ExitCode::SUCCESS)
}

/// Accepts connections until `shutdown` fires.
///
/// Must run inside a [`LocalSet`]: sessions and their requests are spawned
/// as local tasks.
pub async fn serve(listener: TcpListener, options: ServeOptions, shutdown: broadcast::Sender<()>) {
    let options = Rc::new(options);
    let mut shutdown_rx = shutdown.subscribe();

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        info!(%peer_addr, "new connection");
                        let shutdown_rx = shutdown.subscribe();
                        tokio::task::spawn_local(handle_connection(
                            stream,
                            peer_addr,
                            Rc::clone(&options),
                            shutdown_rx,
                        ));
                    }
                    Err(e) => {
                        warn!(error = %e, "accept error");
                    }
                }
            }
            _ = shutdown_rx.recv() => {
                break;
            }
        }
    }
}

/// Handle a single WebSocket connection.
async fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    options: Rc<ServeOptions>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let ws_stream = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!(%peer_addr, error = %e, "WebSocket handshake failed");
            return;
        }
    };

    let handler = match options.open_engine().await {
        Ok(engine) => Rc::new(SessionHandler::new(engine)),
        Err(e) => {
            warn!(%peer_addr, error = %e, "failed to open session");
            return;
        }
    };

    let (mut write, mut read) = ws_stream.split();
    let (response_tx, mut response_rx) = mpsc::unbounded_channel::<String>();

    loop {
        tokio::select! {
            msg_opt = read.next() => {
                match msg_opt {
                    Some(Ok(msg)) if handler::is_request(&msg) => {
                        let handler = Rc::clone(&handler);
                        let response_tx = response_tx.clone();
                        tokio::task::spawn_local(async move {
                            if let Some(response) = process_message(&handler, msg).await {
                                // The receiver is gone once the connection closed.
                                let _ = response_tx.send(response);
                            }
                        });
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(%peer_addr, error = %e, "receive error");
                        break;
                    }
                    None => {
                        // Connection closed
                        break;
                    }
                }
            }
            Some(response) = response_rx.recv() => {
                if let Err(e) = write.send(Message::Text(response)).await {
                    warn!(%peer_addr, error = %e, "send error");
                    break;
                }
            }
            _ = shutdown_rx.recv() => {
                // Server shutting down
                let _ = write.send(Message::Close(None)).await;
                break;
            }
        }
    }

    info!(%peer_addr, "connection closed");
}
