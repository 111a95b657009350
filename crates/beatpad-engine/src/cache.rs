//! Versioned decode cache.
//!
//! Entries are keyed by `(encoding version, cell index)`. The cache tracks the
//! newest version it has seen; moving to a newer version drops every older
//! entry, and a decode that finishes under a superseded version is returned to
//! its caller but never stored. Concurrent requests for the same key share one
//! model call.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use beatpad_spec::{BlendError, BlendWeights, Cell, CornerSet, EncodingSet, Grid, Pattern};
use futures_util::future::{FutureExt, LocalBoxFuture, Shared};
use serde::Serialize;
use tracing::{debug, warn};

use crate::blend::direct_blend;
use crate::latent::interpolate;
use crate::model::ModelService;

type CacheKey = (u64, u32);
type SharedDecode = Shared<LocalBoxFuture<'static, Result<Pattern, BlendError>>>;

/// Cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Lookups answered from a stored entry.
    pub hits: u64,
    /// Lookups that started a model decode.
    pub misses: u64,
    /// Lookups that joined a decode already in flight.
    pub coalesced: u64,
    /// Lookups answered by direct blending because no encodings were available.
    pub fallbacks: u64,
    /// Entries currently stored.
    pub entries: usize,
}

/// Where a resolved pattern came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PatternSource {
    /// Decoded from interpolated embeddings of this encoding version.
    Latent { version: u64 },
    /// Blended directly from the corner patterns.
    Direct,
}

/// A resolved cell pattern.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolved {
    pub pattern: Pattern,
    pub source: PatternSource,
}

struct Pending {
    attempt: u64,
    future: SharedDecode,
}

#[derive(Default)]
struct CacheState {
    live_version: u64,
    entries: HashMap<CacheKey, Pattern>,
    pending: HashMap<CacheKey, Pending>,
    next_attempt: u64,
    stats: CacheStats,
}

impl CacheState {
    fn advance(&mut self, version: u64) {
        if version <= self.live_version {
            return;
        }
        let before = self.entries.len();
        self.entries.retain(|(v, _), _| *v >= version);
        self.pending.retain(|(v, _), _| *v >= version);
        debug!(
            from = self.live_version,
            to = version,
            evicted = before - self.entries.len(),
            "decode cache advanced"
        );
        self.live_version = version;
    }
}

/// Memoizes decoded cell patterns per encoding version.
pub struct DecodeCache {
    grid: Grid,
    temperature: f64,
    model: Rc<dyn ModelService>,
    state: RefCell<CacheState>,
}

impl DecodeCache {
    pub fn new(grid: Grid, model: Rc<dyn ModelService>, temperature: f64) -> Self {
        Self {
            grid,
            temperature,
            model,
            state: RefCell::new(CacheState::default()),
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Newest encoding version the cache has seen.
    pub fn live_version(&self) -> u64 {
        self.state.borrow().live_version
    }

    /// Moves the cache to `version`, evicting everything older.
    pub fn advance_version(&self, version: u64) {
        self.state.borrow_mut().advance(version);
    }

    /// Looks up a stored entry without touching the counters.
    pub fn get(&self, version: u64, cell: Cell) -> Option<Pattern> {
        self.state.borrow().entries.get(&(version, cell.index)).cloned()
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.state.borrow();
        CacheStats {
            entries: state.entries.len(),
            ..state.stats
        }
    }

    /// Drops every entry and pending decode.
    pub fn clear(&self) {
        let mut state = self.state.borrow_mut();
        state.entries.clear();
        state.pending.clear();
    }

    /// Returns the decoded pattern at the center of `cell` under `set`.
    ///
    /// At most one model decode runs per key; later callers join it.
    pub async fn resolve(&self, set: &EncodingSet, cell: Cell) -> Result<Pattern, BlendError> {
        let key = (set.version(), cell.index);

        let (attempt, future) = {
            let mut state = self.state.borrow_mut();
            state.advance(set.version());
            if let Some(pattern) = state.entries.get(&key) {
                let pattern = pattern.clone();
                state.stats.hits += 1;
                return Ok(pattern);
            }
            let joined = state
                .pending
                .get(&key)
                .map(|pending| (pending.attempt, pending.future.clone()));
            match joined {
                Some(joined) => {
                    state.stats.coalesced += 1;
                    joined
                }
                None => {
                    let weights = BlendWeights::at(self.grid.center_of(cell));
                    let z = interpolate(set, &weights)?;
                    if !self.model.is_ready() {
                        return Err(BlendError::ModelUnavailable(
                            "model is not loaded".to_string(),
                        ));
                    }
                    state.stats.misses += 1;
                    state.next_attempt += 1;
                    let attempt = state.next_attempt;
                    let call = self.model.decode(z, self.temperature);
                    let future = async move { call.await.map_err(BlendError::from_decode) }
                        .boxed_local()
                        .shared();
                    state.pending.insert(
                        key,
                        Pending {
                            attempt,
                            future: future.clone(),
                        },
                    );
                    debug!(version = key.0, cell = key.1, "decode cache miss");
                    (attempt, future)
                }
            }
        };

        let result = future.await;

        let mut state = self.state.borrow_mut();
        if state.pending.get(&key).is_some_and(|p| p.attempt == attempt) {
            state.pending.remove(&key);
        }
        match &result {
            Ok(pattern) if key.0 == state.live_version => {
                state.entries.insert(key, pattern.clone());
            }
            Ok(_) => {
                debug!(version = key.0, live = state.live_version, "dropping superseded decode");
            }
            Err(err) => {
                warn!(version = key.0, cell = key.1, error = %err, "decode failed");
            }
        }
        result
    }

    /// Like [`DecodeCache::resolve`], but falls back to a direct blend of
    /// `corners` at the cell center when no encoding set is available.
    pub async fn resolve_or_blend(
        &self,
        set: Option<&EncodingSet>,
        corners: &CornerSet,
        cell: Cell,
        threshold: f64,
    ) -> Result<Resolved, BlendError> {
        match set {
            Some(set) => Ok(Resolved {
                pattern: self.resolve(set, cell).await?,
                source: PatternSource::Latent {
                    version: set.version(),
                },
            }),
            None => {
                let weights = BlendWeights::at(self.grid.center_of(cell));
                let pattern = direct_blend(corners, &weights, threshold)?;
                self.state.borrow_mut().stats.fallbacks += 1;
                Ok(Resolved {
                    pattern,
                    source: PatternSource::Direct,
                })
            }
        }
    }
}

impl std::fmt::Debug for DecodeCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodeCache")
            .field("grid", &self.grid)
            .field("temperature", &self.temperature)
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::{embed_pattern, ReferenceModel};
    use beatpad_spec::{Point, Track};
    use pretty_assertions::assert_eq;

    fn corner_patterns() -> [Pattern; 4] {
        [
            Pattern::from_rows([(Track::Kick, "x...x...x...x...")]).unwrap(),
            Pattern::from_rows([(Track::Snare, "....x.......x...")]).unwrap(),
            Pattern::from_rows([(Track::HatClosed, "xxxxxxxxxxxxxxxx")]).unwrap(),
            Pattern::from_rows([(Track::Ride, "x.x.x.x.x.x.x.x.")]).unwrap(),
        ]
    }

    fn encoding_set(version: u64) -> EncodingSet {
        EncodingSet::new(version, corner_patterns().each_ref().map(embed_pattern))
    }

    fn cache() -> DecodeCache {
        DecodeCache::new(
            Grid::new(4, 4).unwrap(),
            Rc::new(ReferenceModel::loaded()),
            0.0,
        )
    }

    #[tokio::test]
    async fn test_second_lookup_hits() {
        let cache = cache();
        let set = encoding_set(1);
        let cell = cache.grid().to_cell(Point::new(0.1, 0.1));
        let first = cache.resolve(&set, cell).await.unwrap();
        let second = cache.resolve(&set, cell).await.unwrap();
        assert_eq!(first, second);
        // cell 0 center (0.125, 0.125) is dominated by corner A
        assert_eq!(first, corner_patterns()[0]);
        let stats = cache.stats();
        assert_eq!((stats.misses, stats.hits, stats.entries), (1, 1, 1));
    }

    #[tokio::test]
    async fn test_new_version_evicts_old_entries() {
        let cache = cache();
        let cell = cache.grid().to_cell(Point::new(0.9, 0.9));
        cache.resolve(&encoding_set(1), cell).await.unwrap();
        assert!(cache.get(1, cell).is_some());

        cache.advance_version(2);
        assert!(cache.get(1, cell).is_none());
        assert_eq!(cache.stats().entries, 0);

        cache.resolve(&encoding_set(2), cell).await.unwrap();
        assert_eq!(cache.stats().misses, 2);
    }

    #[tokio::test]
    async fn test_stale_version_is_not_stored() {
        let cache = cache();
        cache.advance_version(5);
        let cell = cache.grid().to_cell(Point::CENTER);
        cache.resolve(&encoding_set(4), cell).await.unwrap();
        assert_eq!(cache.stats().entries, 0);
        assert_eq!(cache.live_version(), 5);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_propagates() {
        let cache = cache();
        let mut embeddings = corner_patterns().each_ref().map(embed_pattern);
        embeddings[3] = beatpad_spec::Embedding::zeros(2);
        let set = EncodingSet::new(1, embeddings);
        let err = cache.resolve(&set, cache.grid().to_cell(Point::CENTER)).await.unwrap_err();
        assert!(matches!(err, BlendError::DimensionMismatch { .. }));
        assert_eq!(cache.stats().misses, 0);
    }

    #[tokio::test]
    async fn test_fallback_without_encodings() {
        let cache = cache();
        let corners = CornerSet::from_patterns(corner_patterns());
        let cell = cache.grid().to_cell(Point::new(0.95, 0.05));
        let resolved = cache.resolve_or_blend(None, &corners, cell, 0.5).await.unwrap();
        assert_eq!(resolved.source, PatternSource::Direct);
        assert_eq!(resolved.pattern, corner_patterns()[1]);
        assert_eq!(cache.stats().fallbacks, 1);

        let err = cache
            .resolve_or_blend(None, &CornerSet::new(), cell, 0.5)
            .await
            .unwrap_err();
        assert_eq!(err, BlendError::NoCorners);
    }
}
