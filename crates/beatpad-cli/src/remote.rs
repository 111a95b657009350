//! HTTP model client.
//!
//! Talks to a model server over JSON:
//!
//! - `GET {base}/health`: any 2xx marks the model ready
//! - `POST {base}/encode`: `{"sequences": [NoteSequence; 4]}` -> `{"z": [[f64]; 4]}`
//! - `POST {base}/decode`: `{"z": [f64], "temperature": f64}` -> `{"sequence": NoteSequence}`
//!
//! Connection failures and timeouts map to [`ModelError::Unavailable`] so the
//! engine degrades to direct blending instead of failing.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use beatpad_engine::{ModelFuture, ModelService, NoteSequence};
use beatpad_spec::{Embedding, ModelError, Pattern};
use futures_util::future::{self, FutureExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Per-request timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
struct EncodeRequest {
    sequences: Vec<NoteSequence>,
}

#[derive(Debug, Deserialize)]
struct EncodeResponse {
    z: Vec<Vec<f64>>,
}

#[derive(Debug, Serialize)]
struct DecodeRequest {
    z: Vec<f64>,
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct DecodeResponse {
    sequence: NoteSequence,
}

/// A model served over HTTP.
pub struct HttpModel {
    base_url: String,
    client: reqwest::Client,
    ready: Rc<Cell<bool>>,
}

impl HttpModel {
    /// Creates a client for `base_url` (trailing slashes are ignored).
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            ready: Rc::new(Cell::new(false)),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, route: &str) -> String {
        format!("{}/{}", self.base_url, route)
    }

    fn not_loaded(&self) -> ModelError {
        ModelError::Unavailable(format!("model at {} is not loaded", self.base_url))
    }
}

fn request_error(err: reqwest::Error) -> ModelError {
    if err.is_connect() || err.is_timeout() {
        ModelError::Unavailable(err.to_string())
    } else if err.is_decode() {
        ModelError::Malformed(err.to_string())
    } else {
        ModelError::Request(err.to_string())
    }
}

fn embeddings_from_response(response: EncodeResponse) -> Result<[Embedding; 4], ModelError> {
    let z: [Vec<f64>; 4] = response.z.try_into().map_err(|z: Vec<Vec<f64>>| {
        ModelError::Malformed(format!("expected 4 embeddings, got {}", z.len()))
    })?;
    Ok(z.map(Embedding::new))
}

impl ModelService for HttpModel {
    fn load(&self) -> ModelFuture<()> {
        let request = self.client.get(self.url("health"));
        let ready = Rc::clone(&self.ready);
        let base_url = self.base_url.clone();
        async move {
            let response = request.send().await.map_err(request_error)?;
            if !response.status().is_success() {
                return Err(ModelError::Unavailable(format!(
                    "health check at {} returned {}",
                    base_url,
                    response.status()
                )));
            }
            ready.set(true);
            info!(%base_url, "remote model ready");
            Ok(())
        }
        .boxed_local()
    }

    fn is_ready(&self) -> bool {
        self.ready.get()
    }

    fn encode(&self, patterns: [Pattern; 4]) -> ModelFuture<[Embedding; 4]> {
        if !self.is_ready() {
            return future::ready(Err(self.not_loaded())).boxed_local();
        }
        let body = EncodeRequest {
            sequences: patterns.iter().map(NoteSequence::from_pattern).collect(),
        };
        let request = self.client.post(self.url("encode")).json(&body);
        async move {
            debug!("remote encode");
            let response = request
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(request_error)?;
            let body: EncodeResponse = response.json().await.map_err(request_error)?;
            embeddings_from_response(body)
        }
        .boxed_local()
    }

    fn decode(&self, embedding: Embedding, temperature: f64) -> ModelFuture<Pattern> {
        if !self.is_ready() {
            return future::ready(Err(self.not_loaded())).boxed_local();
        }
        let body = DecodeRequest {
            z: embedding.into_inner(),
            temperature,
        };
        let request = self.client.post(self.url("decode")).json(&body);
        async move {
            let response = request
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(request_error)?;
            let body: DecodeResponse = response.json().await.map_err(request_error)?;
            Ok(body.sequence.to_pattern())
        }
        .boxed_local()
    }
}
