//! Corner encoding management.
//!
//! Owns the versioned [`EncodingSet`] for the current corner content. Any
//! content change bumps the version, which invalidates the installed set and
//! every decode cached under the old version. At most one encode is in flight
//! per version; concurrent callers share it. A result is installed only if the
//! version it was requested for is still current when it arrives.

use std::cell::RefCell;
use std::rc::Rc;

use beatpad_spec::{BlendError, CornerSet, EncodingSet};
use futures_util::future::{FutureExt, LocalBoxFuture, Shared};
use tracing::{debug, warn};

use crate::model::ModelService;

type SharedEncode = Shared<LocalBoxFuture<'static, Result<Rc<EncodingSet>, BlendError>>>;

struct InFlight {
    version: u64,
    attempt: u64,
    future: SharedEncode,
}

#[derive(Default)]
struct EncodingState {
    version: u64,
    fingerprint: Option<String>,
    current: Option<Rc<EncodingSet>>,
    last_good: Option<Rc<EncodingSet>>,
    in_flight: Option<InFlight>,
    encode_calls: u64,
}

/// Versioned corner encodings with single-flight encoding.
pub struct EncodingManager {
    model: Rc<dyn ModelService>,
    state: RefCell<EncodingState>,
}

impl EncodingManager {
    pub fn new(model: Rc<dyn ModelService>) -> Self {
        Self {
            model,
            state: RefCell::new(EncodingState::default()),
        }
    }

    /// Current encoding version. Starts at 0 and only ever grows.
    pub fn version(&self) -> u64 {
        self.state.borrow().version
    }

    /// The installed encoding set, if it belongs to the current version.
    pub fn current(&self) -> Option<Rc<EncodingSet>> {
        let state = self.state.borrow();
        state
            .current
            .as_ref()
            .filter(|set| set.version() == state.version)
            .cloned()
    }

    /// The most recently installed set of any version.
    pub fn last_known_good(&self) -> Option<Rc<EncodingSet>> {
        self.state.borrow().last_good.clone()
    }

    /// Number of encode calls issued to the model.
    pub fn encode_calls(&self) -> u64 {
        self.state.borrow().encode_calls
    }

    /// Records the corner content. Returns true when it differs from the last
    /// observed content, in which case the version has been bumped.
    pub fn observe(&self, corners: &CornerSet) -> bool {
        let fingerprint = corners.fingerprint();
        let mut state = self.state.borrow_mut();
        if state.fingerprint.as_deref() == Some(fingerprint.as_str()) {
            return false;
        }
        state.fingerprint = Some(fingerprint);
        state.version += 1;
        state.current = None;
        state.in_flight = None;
        debug!(version = state.version, "corner content changed");
        true
    }

    /// Returns encodings for `corners`, encoding them if needed.
    ///
    /// Resolves to `Ok(None)` when any corner is empty. Errors are returned to
    /// the caller and leave the last known good set untouched. A set whose
    /// version was superseded while encoding is returned but not installed.
    pub async fn ensure_encodings(
        &self,
        corners: &CornerSet,
    ) -> Result<Option<Rc<EncodingSet>>, BlendError> {
        self.observe(corners);
        let Some(patterns) = corners.complete() else {
            return Ok(None);
        };

        let (version, attempt, future) = {
            let mut state = self.state.borrow_mut();
            let version = state.version;
            if let Some(set) = state.current.as_ref().filter(|s| s.version() == version) {
                return Ok(Some(set.clone()));
            }
            let joined = state
                .in_flight
                .as_ref()
                .filter(|pending| pending.version == version)
                .map(|pending| (pending.attempt, pending.future.clone()));
            match joined {
                Some((attempt, future)) => (version, attempt, future),
                None => {
                    if !self.model.is_ready() {
                        return Err(BlendError::ModelUnavailable(
                            "model is not loaded".to_string(),
                        ));
                    }
                    state.encode_calls += 1;
                    let attempt = state.encode_calls;
                    let call = self.model.encode(patterns);
                    let future = async move {
                        call.await
                            .map(|embeddings| Rc::new(EncodingSet::new(version, embeddings)))
                            .map_err(BlendError::from_encode)
                    }
                    .boxed_local()
                    .shared();
                    debug!(version, "encoding corners");
                    state.in_flight = Some(InFlight {
                        version,
                        attempt,
                        future: future.clone(),
                    });
                    (version, attempt, future)
                }
            }
        };

        let result = future.await;

        let mut state = self.state.borrow_mut();
        if matches!(&state.in_flight, Some(p) if p.attempt == attempt) {
            state.in_flight = None;
        }
        let superseded = state.version != version;
        match result {
            Ok(set) => {
                if superseded {
                    debug!(version, current = state.version, "discarding superseded encodings");
                } else {
                    state.current = Some(set.clone());
                    state.last_good = Some(set.clone());
                }
                Ok(Some(set))
            }
            Err(err) => {
                warn!(version, error = %err, "encoding failed");
                Err(err)
            }
        }
    }
}

impl std::fmt::Debug for EncodingManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("EncodingManager")
            .field("version", &state.version)
            .field("installed", &state.current.is_some())
            .field("in_flight", &state.in_flight.is_some())
            .finish()
    }
}
