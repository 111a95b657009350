//! Test fixture utilities: corner patterns and on-disk input files.

use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use beatpad_engine::{BlendEngine, ModelService};
use beatpad_spec::{CornerLabel, CornerSet, EngineConfig, Pattern, Point, Track};
use tempfile::TempDir;

/// Four corner patterns on disjoint tracks, so the dominant corner of any
/// blend is easy to read off the result.
pub fn corner_patterns() -> [Pattern; 4] {
    [
        Pattern::from_rows([(Track::Kick, "x...x...x...x...")]).expect("valid row"),
        Pattern::from_rows([(Track::Snare, "....x.......x...")]).expect("valid row"),
        Pattern::from_rows([(Track::HatClosed, "x.x.x.x.x.x.x.x.")]).expect("valid row"),
        Pattern::from_rows([(Track::Ride, "xxxxxxxxxxxxxxxx")]).expect("valid row"),
    ]
}

/// The corner patterns as a full set.
pub fn corner_set() -> CornerSet {
    CornerSet::from_patterns(corner_patterns())
}

/// The track that marks each corner in [`corner_patterns`].
pub fn marker_track(label: CornerLabel) -> Track {
    match label {
        CornerLabel::A => Track::Kick,
        CornerLabel::B => Track::Snare,
        CornerLabel::C => Track::HatClosed,
        CornerLabel::D => Track::Ride,
    }
}

/// Builds an engine over `model` with the default config.
pub fn engine_with(model: Rc<dyn ModelService>) -> BlendEngine {
    BlendEngine::new(EngineConfig::default(), model).expect("default grid is valid")
}

/// Fills all four corners of `engine` with [`corner_patterns`].
pub fn fill_corners(engine: &BlendEngine) {
    for (label, pattern) in CornerLabel::ALL.into_iter().zip(corner_patterns()) {
        engine.set_corner(label, pattern);
    }
}

/// A diagonal path from A to D through the centre.
pub fn diagonal_path() -> Vec<Point> {
    vec![Point::new(0.0, 0.0), Point::CENTER, Point::new(1.0, 1.0)]
}

/// A temp directory holding CLI input files.
pub struct InputFixture {
    pub root: TempDir,
}

impl InputFixture {
    /// Create a new empty fixture.
    pub fn new() -> Self {
        Self {
            root: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    /// Get the fixture root path.
    pub fn path(&self) -> &Path {
        self.root.path()
    }

    /// Write a raw file into the fixture.
    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.root.path().join(name);
        fs::write(&path, content).expect("Failed to write fixture file");
        path
    }

    /// Write the standard four-corner set as `corners.json`.
    pub fn write_corners(&self) -> PathBuf {
        let json = serde_json::to_string_pretty(&corner_set()).expect("corner set serializes");
        self.write("corners.json", &json)
    }

    /// Write a corner set with only corner A filled.
    pub fn write_partial_corners(&self) -> PathBuf {
        let mut corners = CornerSet::new();
        corners.set(CornerLabel::A, corner_patterns()[0].clone());
        let json = serde_json::to_string_pretty(&corners).expect("corner set serializes");
        self.write("partial.json", &json)
    }

    /// Write an engine config.
    pub fn write_config(&self, config: &EngineConfig) -> PathBuf {
        let json = serde_json::to_string_pretty(config).expect("config serializes");
        self.write("config.json", &json)
    }

    /// Write a path points file.
    pub fn write_path(&self, points: &[Point]) -> PathBuf {
        let json = serde_json::to_string(points).expect("points serialize");
        self.write("path.json", &json)
    }
}

impl Default for InputFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corner_patterns_are_disjoint() {
        let patterns = corner_patterns();
        for (label, pattern) in CornerLabel::ALL.into_iter().zip(&patterns) {
            let track = marker_track(label);
            assert!(pattern.hits().all(|(t, _)| t == track));
        }
    }

    #[test]
    fn test_written_corners_round_trip() {
        let fixture = InputFixture::new();
        let path = fixture.write_corners();
        let content = fs::read_to_string(path).unwrap();
        let corners: CornerSet = serde_json::from_str(&content).unwrap();
        assert_eq!(corners, corner_set());
    }
}
