//! Bilinear corner weights over the unit square.

use serde::{Deserialize, Serialize};

use crate::corner::CornerLabel;
use crate::grid::Point;

/// Weights of corners A (0,0), B (1,0), C (0,1) and D (1,1) at a position.
///
/// Each weight lies in [0, 1] and the four sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlendWeights {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

impl BlendWeights {
    /// Computes the weights at a position; the position is clamped first.
    pub fn at(point: Point) -> Self {
        let Point { x, y } = point.clamped();
        Self {
            a: (1.0 - x) * (1.0 - y),
            b: x * (1.0 - y),
            c: (1.0 - x) * y,
            d: x * y,
        }
    }

    /// Weight of one corner.
    pub fn get(&self, label: CornerLabel) -> f64 {
        match label {
            CornerLabel::A => self.a,
            CornerLabel::B => self.b,
            CornerLabel::C => self.c,
            CornerLabel::D => self.d,
        }
    }

    /// Weights in slot order.
    pub fn as_array(&self) -> [f64; 4] {
        [self.a, self.b, self.c, self.d]
    }

    pub fn sum(&self) -> f64 {
        self.a + self.b + self.c + self.d
    }
}
