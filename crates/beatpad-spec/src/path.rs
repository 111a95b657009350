//! Freehand paths over the control surface and their samplers.
//!
//! Two samplers are provided. [`sample_by_index`] spreads progress evenly over
//! the recorded points, so traversal speed follows how densely the points were
//! drawn. [`sample_by_distance`] spreads progress evenly over arc length and is
//! the one used for timed playback.

use serde::{Deserialize, Serialize};

use crate::grid::Point;

/// Default minimum distance between consecutive recorded points.
pub const DEFAULT_PATH_EPSILON: f64 = 0.01;

/// An append-only sequence of normalized points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Path {
    points: Vec<Point>,
    epsilon: f64,
    #[serde(skip)]
    revision: u64,
}

impl Default for Path {
    fn default() -> Self {
        Self::new()
    }
}

impl Path {
    /// Creates an empty path with the default epsilon.
    pub fn new() -> Self {
        Self::with_epsilon(DEFAULT_PATH_EPSILON)
    }

    /// Creates an empty path that drops points closer than `epsilon` to the previous one.
    pub fn with_epsilon(epsilon: f64) -> Self {
        Self {
            points: Vec::new(),
            epsilon,
            revision: 0,
        }
    }

    /// Builds a path from points, applying the same filtering as [`Path::append`].
    pub fn from_points(points: impl IntoIterator<Item = Point>, epsilon: f64) -> Self {
        let mut path = Self::with_epsilon(epsilon);
        for p in points {
            path.append(p);
        }
        path
    }

    /// Appends a point (clamped to the unit square).
    ///
    /// Returns false when the point was dropped as a near-duplicate of the last one.
    pub fn append(&mut self, point: Point) -> bool {
        let point = point.clamped();
        if let Some(last) = self.points.last() {
            if last.distance(point) < self.epsilon {
                return false;
            }
        }
        self.points.push(point);
        self.revision += 1;
        true
    }

    /// Discards every point.
    pub fn reset(&mut self) {
        self.points.clear();
        self.revision += 1;
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Counter bumped by every mutation; used to detect stale precomputed playback.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Sum of segment lengths.
    pub fn total_length(&self) -> f64 {
        total_length(&self.points)
    }

    pub fn sample_by_index(&self, t: f64) -> Option<Point> {
        sample_by_index(&self.points, t)
    }

    pub fn sample_by_distance(&self, t: f64) -> Option<Point> {
        sample_by_distance(&self.points, t)
    }
}

fn total_length(points: &[Point]) -> f64 {
    points.windows(2).map(|w| w[0].distance(w[1])).sum()
}

/// Handles the shared boundary rules; `None` means "interpolate".
fn boundary(points: &[Point], t: f64) -> Option<Option<Point>> {
    let first = match points.first() {
        Some(p) => *p,
        None => return Some(None),
    };
    let last = points[points.len() - 1];
    if t.is_nan() || t <= 0.0 {
        return Some(Some(first));
    }
    if t >= 1.0 {
        return Some(Some(last));
    }
    if points.len() == 1 {
        return Some(Some(first));
    }
    None
}

/// Samples a path uniformly by point index.
///
/// `t` in [0, 1] is mapped onto the `len - 1` segments; the result is linearly
/// interpolated inside the selected segment. Returns `None` for an empty path.
pub fn sample_by_index(points: &[Point], t: f64) -> Option<Point> {
    if let Some(edge) = boundary(points, t) {
        return edge;
    }
    let segments = (points.len() - 1) as f64;
    let position = t * segments;
    let i = (position.floor() as usize).min(points.len() - 2);
    let u = position - i as f64;
    Some(points[i].lerp(points[i + 1], u))
}

/// Samples a path uniformly by arc length (constant speed).
///
/// Returns `None` for an empty path; a path of zero total length yields its
/// first point.
pub fn sample_by_distance(points: &[Point], t: f64) -> Option<Point> {
    if let Some(edge) = boundary(points, t) {
        return edge;
    }
    let total = total_length(points);
    if total <= 0.0 {
        return Some(points[0]);
    }
    let target = t * total;
    let mut travelled = 0.0;
    for w in points.windows(2) {
        let seg = w[0].distance(w[1]);
        if seg > 0.0 && target <= travelled + seg {
            return Some(w[0].lerp(w[1], (target - travelled) / seg));
        }
        travelled += seg;
    }
    Some(points[points.len() - 1])
}
