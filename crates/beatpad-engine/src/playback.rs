//! Path playback precomputation.
//!
//! A drawn path is resampled into one position per loop step and every
//! position is decoded up front, so playback only indexes into a table. Each
//! batch carries a token; only the newest batch may install, and only if the
//! path and encodings it was computed from are unchanged.

use std::cell::RefCell;
use std::future::Future;

use beatpad_spec::{sample_by_distance, BlendError, Pattern, Point};
use futures_util::future::join_all;
use serde::Serialize;
use tracing::{debug, warn};

use crate::guard::{RequestGuard, RequestToken};

/// One precomputed playback step. `pattern` is `None` when its decode failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackStep {
    pub position: Point,
    pub pattern: Option<Pattern>,
}

/// A precomputed playback table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathPlayback {
    pub token: RequestToken,
    /// Path revision the batch was sampled from.
    pub path_revision: u64,
    /// Encoding version used, or `None` when steps were blended directly.
    pub encoding_version: Option<u64>,
    pub steps: Vec<PlaybackStep>,
}

impl PathPlayback {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The step to play at global step counter `step`, wrapping around.
    pub fn frame(&self, step: usize) -> Option<&PlaybackStep> {
        if self.steps.is_empty() {
            return None;
        }
        self.steps.get(step % self.steps.len())
    }

    /// Number of steps whose decode failed.
    pub fn failed_steps(&self) -> usize {
        self.steps.iter().filter(|s| s.pattern.is_none()).count()
    }
}

/// Resamples `points` into `step_count` positions at `i / step_count` of the
/// path's arc length.
pub fn sample_positions(points: &[Point], step_count: usize) -> Vec<Point> {
    (0..step_count)
        .filter_map(|i| sample_by_distance(points, i as f64 / step_count as f64))
        .collect()
}

/// Decodes every sampled position concurrently.
///
/// Per-step failures are logged and recorded as `None` without failing the
/// batch.
pub async fn compute_steps<F, Fut>(
    points: &[Point],
    step_count: usize,
    decode: F,
) -> Vec<PlaybackStep>
where
    F: Fn(Point) -> Fut,
    Fut: Future<Output = Result<Pattern, BlendError>>,
{
    let positions = sample_positions(points, step_count);
    let decoded = join_all(positions.iter().map(|p| decode(*p))).await;
    positions
        .into_iter()
        .zip(decoded)
        .enumerate()
        .map(|(i, (position, result))| PlaybackStep {
            position,
            pattern: result
                .map_err(|err| warn!(step = i, error = %err, "playback step decode failed"))
                .ok(),
        })
        .collect()
}

/// Owns the installed playback table and the batch token sequence.
#[derive(Debug, Default)]
pub struct PlaybackPrecomputer {
    guard: RequestGuard,
    installed: RefCell<Option<PathPlayback>>,
}

impl PlaybackPrecomputer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new batch, superseding any batch still in flight.
    pub fn begin(&self) -> RequestToken {
        self.guard.issue()
    }

    /// Installs a finished batch if its token is still the newest and
    /// `still_valid` confirms its inputs are unchanged.
    pub fn install(&self, playback: PathPlayback, still_valid: bool) -> bool {
        let token = playback.token;
        if !still_valid {
            debug!(token = token.value(), "discarding playback for outdated inputs");
            return false;
        }
        self.guard
            .apply_if_current(token, || {
                debug!(token = token.value(), steps = playback.len(), "playback installed");
                *self.installed.borrow_mut() = Some(playback);
            })
            .is_some()
    }

    /// Clears the installed table if `token` is still the newest batch.
    pub fn clear_if_current(&self, token: RequestToken) -> bool {
        self.guard
            .apply_if_current(token, || *self.installed.borrow_mut() = None)
            .is_some()
    }

    /// Invalidates any in-flight batch and clears the installed table.
    pub fn reset(&self) {
        self.guard.issue();
        *self.installed.borrow_mut() = None;
    }

    pub fn installed(&self) -> Option<PathPlayback> {
        self.installed.borrow().clone()
    }

    /// The installed step for global step counter `step`.
    pub fn frame(&self, step: usize) -> Option<PlaybackStep> {
        self.installed
            .borrow()
            .as_ref()
            .and_then(|playback| playback.frame(step).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beatpad_spec::Track;
    use pretty_assertions::assert_eq;

    fn line() -> Vec<Point> {
        vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)]
    }

    #[test]
    fn test_sample_positions_spacing() {
        let positions = sample_positions(&line(), 4);
        assert_eq!(
            positions,
            vec![
                Point::new(0.0, 0.0),
                Point::new(0.25, 0.0),
                Point::new(0.5, 0.0),
                Point::new(0.75, 0.0),
            ]
        );
        assert!(sample_positions(&line(), 0).is_empty());
    }

    #[tokio::test]
    async fn test_failed_steps_become_none() {
        let steps = compute_steps(&line(), 4, |p| async move {
            if p.x >= 0.5 {
                Err(BlendError::DecodeFailed("boom".into()))
            } else {
                Ok(Pattern::empty().with_step(Track::Kick, 0, true))
            }
        })
        .await;
        assert_eq!(steps.len(), 4);
        assert!(steps[0].pattern.is_some());
        assert!(steps[1].pattern.is_some());
        assert_eq!(steps[2].pattern, None);
        assert_eq!(steps[3].pattern, None);
    }

    fn playback(token: RequestToken) -> PathPlayback {
        PathPlayback {
            token,
            path_revision: 1,
            encoding_version: Some(1),
            steps: vec![
                PlaybackStep {
                    position: Point::new(0.0, 0.0),
                    pattern: Some(Pattern::empty()),
                },
                PlaybackStep {
                    position: Point::new(1.0, 0.0),
                    pattern: None,
                },
            ],
        }
    }

    #[test]
    fn test_only_newest_batch_installs() {
        let pre = PlaybackPrecomputer::new();
        let old = pre.begin();
        let new = pre.begin();
        assert!(!pre.install(playback(old), true));
        assert!(pre.installed().is_none());
        assert!(!pre.install(playback(new), false));
        assert!(pre.install(playback(new), true));
        assert_eq!(pre.installed().map(|p| p.failed_steps()), Some(1));
    }

    #[test]
    fn test_frame_wraps() {
        let pre = PlaybackPrecomputer::new();
        let token = pre.begin();
        pre.install(playback(token), true);
        assert_eq!(pre.frame(3).map(|s| s.position), Some(Point::new(1.0, 0.0)));
        pre.reset();
        assert_eq!(pre.frame(0), None);
    }
}
