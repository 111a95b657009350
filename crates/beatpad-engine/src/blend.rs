//! Direct pattern blending, used whenever no encodings are available.

use beatpad_spec::{BlendError, BlendWeights, CornerSet, Pattern};

/// Blends corner patterns step by step without the model.
///
/// A step is on when the weighted sum of the corners that have it on reaches
/// `threshold`. Missing corners contribute nothing. Fails with
/// [`BlendError::NoCorners`] when all four slots are empty.
pub fn direct_blend(
    corners: &CornerSet,
    weights: &BlendWeights,
    threshold: f64,
) -> Result<Pattern, BlendError> {
    if corners.is_empty() {
        return Err(BlendError::NoCorners);
    }
    Ok(Pattern::from_fn(|track, step| {
        let score: f64 = corners
            .iter()
            .filter_map(|(label, pattern)| pattern.map(|p| (label, p)))
            .filter(|(_, p)| p.is_on(track, step))
            .map(|(label, _)| weights.get(label))
            .sum();
        score >= threshold
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use beatpad_spec::{CornerLabel, Point, Track};
    use pretty_assertions::assert_eq;

    fn four_on_floor() -> Pattern {
        Pattern::from_rows([(Track::Kick, "x...x...x...x...")]).unwrap()
    }

    fn offbeat_hats() -> Pattern {
        Pattern::from_rows([(Track::HatClosed, "..x...x...x...x.")]).unwrap()
    }

    #[test]
    fn test_empty_corners_fail() {
        let err = direct_blend(&CornerSet::new(), &BlendWeights::at(Point::CENTER), 0.5).unwrap_err();
        assert_eq!(err, BlendError::NoCorners);
    }

    #[test]
    fn test_pure_corner_reproduces_pattern() {
        let corners = CornerSet::from_patterns([
            four_on_floor(),
            offbeat_hats(),
            Pattern::empty(),
            Pattern::empty(),
        ]);
        let at_a = direct_blend(&corners, &BlendWeights::at(Point::new(0.0, 0.0)), 0.5).unwrap();
        assert_eq!(at_a, four_on_floor());
        let at_b = direct_blend(&corners, &BlendWeights::at(Point::new(1.0, 0.0)), 0.5).unwrap();
        assert_eq!(at_b, offbeat_hats());
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let mut corners = CornerSet::new();
        corners.set(CornerLabel::A, four_on_floor());
        corners.set(CornerLabel::B, four_on_floor());
        // A and B together carry exactly 0.5 at the center
        let weights = BlendWeights::at(Point::CENTER);
        assert_eq!(direct_blend(&corners, &weights, 0.5).unwrap(), four_on_floor());
        assert!(direct_blend(&corners, &weights, 0.6).unwrap().is_silent());
    }

    #[test]
    fn test_single_corner_kick() {
        let all_on = Pattern::from_rows([(Track::Kick, "xxxxxxxxxxxxxxxx")]).unwrap();
        let mut corners = CornerSet::new();
        corners.set(CornerLabel::A, all_on.clone());
        let at = |x, y| direct_blend(&corners, &BlendWeights::at(Point::new(x, y)), 0.5).unwrap();
        assert_eq!(at(0.0, 0.0), all_on);
        assert!(at(1.0, 1.0).is_silent());
        assert!(at(0.5, 0.5).is_silent());
    }

    #[test]
    fn test_missing_corners_contribute_nothing() {
        let mut corners = CornerSet::new();
        corners.set(CornerLabel::D, four_on_floor());
        let near_d = direct_blend(&corners, &BlendWeights::at(Point::new(0.9, 0.9)), 0.5).unwrap();
        assert_eq!(near_d, four_on_floor());
        let near_a = direct_blend(&corners, &BlendWeights::at(Point::new(0.1, 0.1)), 0.5).unwrap();
        assert!(near_a.is_silent());
    }
}
