//! The blend engine facade.
//!
//! [`BlendEngine`] ties the pieces together for one session: the corner slots,
//! the drawn path, the encoding manager, the decode cache, the pad request
//! guard and the playback precomputer. It is single-threaded; every method
//! takes `&self` and no interior borrow is held across an `.await`, so many
//! operations may be in flight at once on a local executor.

use std::cell::RefCell;
use std::rc::Rc;

use beatpad_spec::{
    BlendError, BlendWeights, Cell, CornerLabel, CornerSet, EncodingSet, EngineConfig, Grid,
    GridError, Path, Pattern, Point, Track,
};
use futures_util::future::try_join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::blend::direct_blend;
use crate::cache::{CacheStats, DecodeCache, PatternSource};
use crate::encoding::EncodingManager;
use crate::guard::{RequestGuard, RequestToken};
use crate::latent::decode_at;
use crate::model::ModelService;
use crate::playback::{compute_steps, PathPlayback, PlaybackPrecomputer, PlaybackStep};

/// What pointer input on the surface does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawMode {
    /// Pointer moves blend the cell under the pointer.
    #[default]
    Pad,
    /// Pointer moves draw a path that is played back over the loop.
    Path,
}

/// Result of a pad blend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlendOutcome {
    pub token: RequestToken,
    pub cell: Cell,
    pub pattern: Pattern,
    pub source: PatternSource,
    /// False when a newer blend or a corner edit superseded this one.
    pub applied: bool,
}

/// Result of a playback precompute.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackOutcome {
    /// `None` when the path was too short and the table was cleared.
    pub playback: Option<PathPlayback>,
    pub installed: bool,
}

#[derive(Debug, Default)]
struct Session {
    draw_mode: DrawMode,
    current: Option<Pattern>,
    manual: Option<Pattern>,
    puck: Option<Point>,
}

/// One blending session over a model.
pub struct BlendEngine {
    config: EngineConfig,
    grid: Grid,
    model: Rc<dyn ModelService>,
    corners: RefCell<CornerSet>,
    path: RefCell<Path>,
    encodings: EncodingManager,
    cache: DecodeCache,
    pad_guard: RequestGuard,
    playback: PlaybackPrecomputer,
    session: RefCell<Session>,
}

impl BlendEngine {
    /// Creates an engine. Fails only if the configured grid is empty.
    pub fn new(config: EngineConfig, model: Rc<dyn ModelService>) -> Result<Self, GridError> {
        let grid = config.grid()?;
        let encodings = EncodingManager::new(model.clone());
        encodings.observe(&CornerSet::new());
        let cache = DecodeCache::new(grid, model.clone(), config.temperature);
        cache.advance_version(encodings.version());
        Ok(Self {
            path: RefCell::new(config.new_path()),
            grid,
            model,
            corners: RefCell::new(CornerSet::new()),
            encodings,
            cache,
            pad_guard: RequestGuard::new(),
            playback: PlaybackPrecomputer::new(),
            session: RefCell::new(Session::default()),
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Steps in one loop (`bars * 16`).
    pub fn loop_steps(&self) -> usize {
        self.config.loop_steps()
    }

    /// Loads the model.
    pub async fn load_model(&self) -> Result<(), BlendError> {
        if self.model.is_ready() {
            return Ok(());
        }
        info!("loading model");
        match self.model.load().await {
            Ok(()) => {
                info!("model ready");
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "model failed to load");
                Err(BlendError::ModelUnavailable(err.to_string()))
            }
        }
    }

    pub fn is_model_ready(&self) -> bool {
        self.model.is_ready()
    }

    // ========================================================================
    // Grid
    // ========================================================================

    pub fn map_position_to_cell(&self, point: Point) -> Cell {
        self.grid.to_cell(point)
    }

    pub fn cell_center(&self, cell: Cell) -> Point {
        self.grid.center_of(cell)
    }

    // ========================================================================
    // Corners
    // ========================================================================

    /// A snapshot of the corner slots.
    pub fn corners(&self) -> CornerSet {
        self.corners.borrow().clone()
    }

    /// Fills a corner slot. Returns true if the content changed.
    pub fn set_corner(&self, label: CornerLabel, pattern: Pattern) -> bool {
        let changed = self.corners.borrow_mut().set(label, pattern);
        if changed {
            self.corners_changed();
        }
        changed
    }

    /// Empties a corner slot. Returns true if it held a pattern.
    pub fn clear_corner(&self, label: CornerLabel) -> bool {
        let changed = self.corners.borrow_mut().clear(label);
        if changed {
            self.corners_changed();
        }
        changed
    }

    /// Toggles one step of a corner pattern; an empty slot starts silent.
    /// Returns the edited pattern.
    pub fn toggle_corner_step(&self, label: CornerLabel, track: Track, step: usize) -> Pattern {
        let edited = self
            .corners
            .borrow()
            .get(label)
            .cloned()
            .unwrap_or_default()
            .toggled(track, step);
        self.set_corner(label, edited.clone());
        edited
    }

    fn corners_changed(&self) {
        let corners = self.corners();
        if self.encodings.observe(&corners) {
            self.cache.advance_version(self.encodings.version());
        }
        // Frames decoded from the old corners must not be played.
        self.playback.reset();
    }

    // ========================================================================
    // Encodings
    // ========================================================================

    /// The installed encoding set for the current corners, if any.
    pub fn get_encodings(&self) -> Option<Rc<EncodingSet>> {
        self.encodings.current()
    }

    /// Current encoding version.
    pub fn encoding_version(&self) -> u64 {
        self.encodings.version()
    }

    /// Encodes the current corners if needed.
    pub async fn ensure_encodings(&self) -> Result<Option<Rc<EncodingSet>>, BlendError> {
        let corners = self.corners();
        self.encodings.ensure_encodings(&corners).await
    }

    /// Encodings to blend with, degrading instead of failing.
    ///
    /// An unavailable model yields `None` (direct blend). Any other encode
    /// failure yields the last known good set, or `None` if there is none.
    async fn encodings_for_blend(&self) -> Option<Rc<EncodingSet>> {
        match self.ensure_encodings().await {
            Ok(set) => set,
            Err(BlendError::ModelUnavailable(reason)) => {
                debug!(%reason, "model unavailable, blending directly");
                None
            }
            Err(err) => {
                let fallback = self.encodings.last_known_good();
                warn!(
                    error = %err,
                    fallback_version = ?fallback.as_ref().map(|s| s.version()),
                    "encoding failed, using last known good encodings"
                );
                fallback
            }
        }
    }

    /// Encodes the corners and decodes every grid cell into the cache.
    ///
    /// Resolves to `None` when any corner is empty.
    pub async fn warm_grid(&self) -> Result<Option<Vec<Pattern>>, BlendError> {
        let Some(set) = self.ensure_encodings().await? else {
            return Ok(None);
        };
        let cells: Vec<Cell> = self.grid.cells().collect();
        let patterns = try_join_all(cells.iter().map(|cell| self.cache.resolve(&set, *cell))).await?;
        info!(cells = patterns.len(), version = set.version(), "grid warmed");
        Ok(Some(patterns))
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn encode_calls(&self) -> u64 {
        self.encodings.encode_calls()
    }

    // ========================================================================
    // Pad blending
    // ========================================================================

    /// Blends the cell under `point`.
    ///
    /// The pattern is always returned to the caller, but it only becomes the
    /// current pattern if no newer blend was issued and the corners did not
    /// change while it was computed.
    pub async fn blend_at(&self, point: Point) -> Result<BlendOutcome, BlendError> {
        let cell = self.grid.to_cell(point);
        let token = self.pad_guard.issue();
        let issued_version = self.encodings.version();
        let corners = self.corners();

        let set = self.encodings_for_blend().await;
        let resolved = self
            .cache
            .resolve_or_blend(set.as_deref(), &corners, cell, self.config.blend_threshold)
            .await?;

        let applied = self.encodings.version() == issued_version
            && self
                .pad_guard
                .apply_if_current(token, || {
                    let mut session = self.session.borrow_mut();
                    session.current = Some(resolved.pattern.clone());
                    session.puck = Some(self.grid.center_of(cell));
                    if session.draw_mode == DrawMode::Pad {
                        session.manual = Some(resolved.pattern.clone());
                    }
                })
                .is_some();
        if !applied {
            debug!(token = token.value(), cell = cell.index, "blend superseded");
        }

        Ok(BlendOutcome {
            token,
            cell,
            pattern: resolved.pattern,
            source: resolved.source,
            applied,
        })
    }

    /// Decodes exactly at `point` without snapping or caching.
    pub async fn decode_exact_at(&self, point: Point) -> Result<Pattern, BlendError> {
        let corners = self.corners();
        let set = self.encodings_for_blend().await;
        self.decode_point(set.as_deref(), &corners, point).await
    }

    async fn decode_point(
        &self,
        set: Option<&EncodingSet>,
        corners: &CornerSet,
        point: Point,
    ) -> Result<Pattern, BlendError> {
        match set {
            Some(set) => decode_at(&*self.model, set, point, self.config.temperature).await,
            None => direct_blend(
                corners,
                &BlendWeights::at(point),
                self.config.blend_threshold,
            ),
        }
    }

    // ========================================================================
    // Path
    // ========================================================================

    /// A snapshot of the drawn path.
    pub fn path(&self) -> Path {
        self.path.borrow().clone()
    }

    /// Starts a new path at `point`, dropping the installed playback.
    pub fn begin_path(&self, point: Point) {
        {
            let mut path = self.path.borrow_mut();
            path.reset();
            path.append(point);
        }
        self.playback.reset();
    }

    /// Extends the path. Returns false if the point was too close to the last.
    ///
    /// An accepted point drops the installed playback, which no longer
    /// follows the path.
    pub fn append_path_point(&self, point: Point) -> bool {
        let accepted = self.path.borrow_mut().append(point);
        if accepted {
            self.playback.reset();
        }
        accepted
    }

    /// Clears the path and the installed playback.
    pub fn reset_path(&self) {
        self.path.borrow_mut().reset();
        self.playback.reset();
    }

    // ========================================================================
    // Playback
    // ========================================================================

    /// Decodes `step_count` evenly spaced positions along the path.
    ///
    /// Fails with `NoCorners` before touching any batch when every corner is
    /// empty. With fewer than two path points the installed table is cleared.
    /// The batch installs only if no newer batch was started and neither the
    /// path nor the corners changed meanwhile.
    pub async fn precompute_path_playback(
        &self,
        step_count: usize,
    ) -> Result<PlaybackOutcome, BlendError> {
        let corners = self.corners();
        if corners.is_empty() {
            return Err(BlendError::NoCorners);
        }
        let token = self.playback.begin();
        let (points, path_revision) = {
            let path = self.path.borrow();
            (path.points().to_vec(), path.revision())
        };
        if points.len() < 2 {
            let installed = self.playback.clear_if_current(token);
            return Ok(PlaybackOutcome {
                playback: None,
                installed,
            });
        }

        let issued_version = self.encodings.version();
        let set = self.encodings_for_blend().await;

        let steps = compute_steps(&points, step_count, |p| {
            self.decode_point(set.as_deref(), &corners, p)
        })
        .await;
        let playback = PathPlayback {
            token,
            path_revision,
            encoding_version: set.as_ref().map(|s| s.version()),
            steps,
        };
        let still_valid = self.path.borrow().revision() == path_revision
            && self.encodings.version() == issued_version;
        let installed = self.playback.install(playback.clone(), still_valid);
        Ok(PlaybackOutcome {
            playback: Some(playback),
            installed,
        })
    }

    /// The installed playback table.
    pub fn playback(&self) -> Option<PathPlayback> {
        self.playback.installed()
    }

    /// Advances playback to global step counter `step`.
    ///
    /// In path mode a decoded step becomes the current pattern and moves the
    /// puck; a failed step keeps the previous pattern.
    pub fn advance_playback(&self, step: usize) -> Option<PlaybackStep> {
        let frame = self.playback.frame(step)?;
        let mut session = self.session.borrow_mut();
        if session.draw_mode == DrawMode::Path {
            session.puck = Some(frame.position);
            if let Some(pattern) = &frame.pattern {
                session.current = Some(pattern.clone());
            }
        }
        Some(frame)
    }

    // ========================================================================
    // Session
    // ========================================================================

    pub fn draw_mode(&self) -> DrawMode {
        self.session.borrow().draw_mode
    }

    /// Switches draw mode. Any drawn path is discarded; leaving path mode
    /// restores the last pattern chosen on the pad.
    pub fn set_draw_mode(&self, mode: DrawMode) {
        {
            let mut session = self.session.borrow_mut();
            if session.draw_mode == mode {
                return;
            }
            match mode {
                DrawMode::Path => session.manual = session.current.clone(),
                DrawMode::Pad => {
                    if let Some(manual) = session.manual.clone() {
                        session.current = Some(manual);
                    }
                }
            }
            session.draw_mode = mode;
        }
        self.reset_path();
        debug!(?mode, "draw mode changed");
    }

    /// The pattern currently playing.
    pub fn current_pattern(&self) -> Option<Pattern> {
        self.session.borrow().current.clone()
    }

    /// Replaces the current pattern directly (e.g. after a manual edit).
    pub fn set_pattern(&self, pattern: Pattern) {
        let mut session = self.session.borrow_mut();
        if session.draw_mode == DrawMode::Pad {
            session.manual = Some(pattern.clone());
        }
        session.current = Some(pattern);
    }

    /// Last position shown on the surface.
    pub fn puck(&self) -> Option<Point> {
        self.session.borrow().puck
    }
}

impl std::fmt::Debug for BlendEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlendEngine")
            .field("config", &self.config)
            .field("corners", &self.corners.borrow().filled())
            .field("encodings", &self.encodings)
            .field("cache", &self.cache)
            .field("session", &self.session.borrow())
            .finish()
    }
}
