//! A model whose calls complete only when a test says so.
//!
//! Every encode/decode call parks a oneshot sender. Tests take the parked calls
//! and answer them in whatever order the scenario needs, which is how
//! out-of-order completions are reproduced deterministically. Each operation
//! can be switched to auto mode, where calls answer immediately with the
//! reference model's behaviour.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use beatpad_engine::reference::{decode_embedding, embed_pattern};
use beatpad_engine::{ModelFuture, ModelService};
use beatpad_spec::{Embedding, ModelError, Pattern};
use futures_util::future::{self, FutureExt};
use tokio::sync::oneshot;

type Reply<T> = oneshot::Sender<Result<T, ModelError>>;

/// A parked encode call.
pub struct PendingEncode {
    pub patterns: [Pattern; 4],
    reply: Reply<[Embedding; 4]>,
}

impl PendingEncode {
    /// Answers with the reference embeddings of the requested patterns.
    pub fn succeed(self) {
        let embeddings = self.patterns.each_ref().map(embed_pattern);
        let _ = self.reply.send(Ok(embeddings));
    }

    pub fn fail(self, err: ModelError) {
        let _ = self.reply.send(Err(err));
    }
}

/// A parked decode call.
pub struct PendingDecode {
    pub embedding: Embedding,
    pub temperature: f64,
    reply: Reply<Pattern>,
}

impl PendingDecode {
    /// Answers with the reference decode of the requested embedding.
    pub fn succeed(self) {
        let result = decode_embedding(&self.embedding, self.temperature);
        let _ = self.reply.send(result);
    }

    /// Answers with a fixed pattern.
    pub fn respond(self, pattern: Pattern) {
        let _ = self.reply.send(Ok(pattern));
    }

    pub fn fail(self, err: ModelError) {
        let _ = self.reply.send(Err(err));
    }
}

/// A hand-driven model service.
#[derive(Default)]
pub struct ScriptedModel {
    ready: Cell<bool>,
    auto_encode: Cell<bool>,
    auto_decode: Cell<bool>,
    encodes: RefCell<Vec<PendingEncode>>,
    decodes: RefCell<Vec<PendingDecode>>,
    encode_calls: Cell<usize>,
    decode_calls: Cell<usize>,
}

impl ScriptedModel {
    /// A loaded model with every call parked.
    pub fn loaded() -> Rc<Self> {
        let model = Self::default();
        model.ready.set(true);
        Rc::new(model)
    }

    /// A loaded model that answers every call immediately.
    pub fn automatic() -> Rc<Self> {
        let model = Self::loaded();
        model.set_auto_encode(true);
        model.set_auto_decode(true);
        model
    }

    /// A model that was never loaded; `load` flips it ready.
    pub fn unloaded() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn set_auto_encode(&self, auto: bool) {
        self.auto_encode.set(auto);
    }

    pub fn set_auto_decode(&self, auto: bool) {
        self.auto_decode.set(auto);
    }

    /// Takes every parked encode, oldest first.
    pub fn take_encodes(&self) -> Vec<PendingEncode> {
        std::mem::take(&mut *self.encodes.borrow_mut())
    }

    /// Takes every parked decode, oldest first.
    pub fn take_decodes(&self) -> Vec<PendingDecode> {
        std::mem::take(&mut *self.decodes.borrow_mut())
    }

    pub fn parked_decodes(&self) -> usize {
        self.decodes.borrow().len()
    }

    pub fn encode_calls(&self) -> usize {
        self.encode_calls.get()
    }

    pub fn decode_calls(&self) -> usize {
        self.decode_calls.get()
    }

    fn unavailable<T: 'static>() -> ModelFuture<T> {
        future::ready(Err(ModelError::Unavailable("scripted model not loaded".into()))).boxed_local()
    }

    fn parked<T: 'static>(rx: oneshot::Receiver<Result<T, ModelError>>) -> ModelFuture<T> {
        async move {
            rx.await
                .unwrap_or_else(|_| Err(ModelError::Request("call dropped by test".into())))
        }
        .boxed_local()
    }
}

impl ModelService for ScriptedModel {
    fn load(&self) -> ModelFuture<()> {
        self.ready.set(true);
        future::ready(Ok(())).boxed_local()
    }

    fn is_ready(&self) -> bool {
        self.ready.get()
    }

    fn encode(&self, patterns: [Pattern; 4]) -> ModelFuture<[Embedding; 4]> {
        if !self.is_ready() {
            return Self::unavailable();
        }
        self.encode_calls.set(self.encode_calls.get() + 1);
        if self.auto_encode.get() {
            let embeddings = patterns.each_ref().map(embed_pattern);
            return future::ready(Ok(embeddings)).boxed_local();
        }
        let (reply, rx) = oneshot::channel();
        self.encodes.borrow_mut().push(PendingEncode { patterns, reply });
        Self::parked(rx)
    }

    fn decode(&self, embedding: Embedding, temperature: f64) -> ModelFuture<Pattern> {
        if !self.is_ready() {
            return Self::unavailable();
        }
        self.decode_calls.set(self.decode_calls.get() + 1);
        if self.auto_decode.get() {
            return future::ready(decode_embedding(&embedding, temperature)).boxed_local();
        }
        let (reply, rx) = oneshot::channel();
        self.decodes.borrow_mut().push(PendingDecode {
            embedding,
            temperature,
            reply,
        });
        Self::parked(rx)
    }
}

/// Lets every spawned local task run until it parks on the model.
pub async fn settle() {
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
}
