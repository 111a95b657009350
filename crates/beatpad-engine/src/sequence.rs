//! Quantized drum note sequences.
//!
//! This is the wire shape a generative drum model speaks: one note per hit,
//! General MIDI drum pitches, quantized to sixteenth-note steps. Field names
//! are camelCase on the wire.

use beatpad_spec::{Pattern, Track, PATTERN_STEPS};
use serde::{Deserialize, Serialize};

/// Steps per quarter note (sixteenth-note resolution).
pub const STEPS_PER_QUARTER: u32 = 4;

/// General MIDI pitch used for each track when rendering a pattern.
pub fn pitch_for_track(track: Track) -> u8 {
    match track {
        Track::Kick => 36,
        Track::Snare => 38,
        Track::HatClosed => 42,
        Track::HatOpen => 46,
        Track::TomLow => 45,
        Track::TomMid => 47,
        Track::TomHigh => 50,
        Track::Crash => 49,
        Track::Ride => 51,
    }
}

/// Maps a drum pitch back to a track. Unknown pitches map to `None`.
pub fn track_for_pitch(pitch: u8) -> Option<Track> {
    Track::all()
        .iter()
        .copied()
        .find(|track| pitch_for_track(*track) == pitch)
}

/// One drum hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrumNote {
    pub pitch: u8,
    #[serde(default = "default_is_drum")]
    pub is_drum: bool,
    pub quantized_start_step: u32,
    pub quantized_end_step: u32,
}

fn default_is_drum() -> bool {
    true
}

/// A one-bar quantized drum sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteSequence {
    #[serde(default)]
    pub notes: Vec<DrumNote>,
    #[serde(default = "default_total_steps")]
    pub total_quantized_steps: u32,
    #[serde(default)]
    pub quantization_info: QuantizationInfo,
}

fn default_total_steps() -> u32 {
    PATTERN_STEPS as u32
}

/// Quantization resolution of a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuantizationInfo {
    pub steps_per_quarter: u32,
}

impl Default for QuantizationInfo {
    fn default() -> Self {
        Self {
            steps_per_quarter: STEPS_PER_QUARTER,
        }
    }
}

impl NoteSequence {
    /// Renders a pattern as a note sequence, one note per hit, ordered by step.
    pub fn from_pattern(pattern: &Pattern) -> Self {
        let mut notes: Vec<DrumNote> = pattern
            .hits()
            .map(|(track, step)| DrumNote {
                pitch: pitch_for_track(track),
                is_drum: true,
                quantized_start_step: step as u32,
                quantized_end_step: step as u32 + 1,
            })
            .collect();
        notes.sort_by_key(|n| (n.quantized_start_step, n.pitch));
        Self {
            notes,
            total_quantized_steps: PATTERN_STEPS as u32,
            quantization_info: QuantizationInfo::default(),
        }
    }

    /// Collapses the sequence back into a pattern.
    ///
    /// Non-drum notes and unknown pitches are ignored; start steps past the
    /// end of the bar are clamped onto the last step.
    pub fn to_pattern(&self) -> Pattern {
        let mut pattern = Pattern::empty();
        for note in self.notes.iter().filter(|n| n.is_drum) {
            if let Some(track) = track_for_pitch(note.pitch) {
                let step = (note.quantized_start_step as usize).min(PATTERN_STEPS - 1);
                pattern = pattern.with_step(track, step, true);
            }
        }
        pattern
    }
}

impl From<&Pattern> for NoteSequence {
    fn from(pattern: &Pattern) -> Self {
        NoteSequence::from_pattern(pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_pitch_map_is_a_bijection() {
        for &track in Track::all() {
            assert_eq!(track_for_pitch(pitch_for_track(track)), Some(track));
        }
        assert_eq!(track_for_pitch(60), None);
    }

    #[test]
    fn test_from_pattern() {
        let pattern = Pattern::from_rows([
            (Track::Kick, "x..............."),
            (Track::Snare, "....x..........."),
        ])
        .unwrap();
        let seq = NoteSequence::from_pattern(&pattern);
        assert_eq!(seq.total_quantized_steps, 16);
        assert_eq!(seq.notes.len(), 2);
        assert_eq!(seq.notes[0].pitch, 36);
        assert_eq!(seq.notes[1].quantized_start_step, 4);
        assert_eq!(seq.notes[1].quantized_end_step, 5);
        assert_eq!(seq.to_pattern(), pattern);
    }

    #[test]
    fn test_wire_shape() {
        let json = r#"{
            "notes": [
                {"pitch": 42, "isDrum": true, "quantizedStartStep": 2, "quantizedEndStep": 3},
                {"pitch": 60, "isDrum": true, "quantizedStartStep": 0, "quantizedEndStep": 1},
                {"pitch": 36, "isDrum": false, "quantizedStartStep": 0, "quantizedEndStep": 1},
                {"pitch": 38, "quantizedStartStep": 40, "quantizedEndStep": 41}
            ],
            "totalQuantizedSteps": 16,
            "quantizationInfo": {"stepsPerQuarter": 4}
        }"#;
        let seq: NoteSequence = serde_json::from_str(json).unwrap();
        let pattern = seq.to_pattern();
        assert_eq!(pattern.hit_count(), 2);
        assert!(pattern.is_on(Track::HatClosed, 2));
        assert!(pattern.is_on(Track::Snare, 15));

        let out = serde_json::to_value(NoteSequence::from_pattern(&pattern)).unwrap();
        assert_eq!(out["quantizationInfo"]["stepsPerQuarter"], 4);
        assert_eq!(out["notes"][0]["isDrum"], true);
    }
}
