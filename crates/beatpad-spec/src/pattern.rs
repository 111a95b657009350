//! Drum tracks and fixed-length step patterns.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::PatternError;

/// Number of steps in one pattern (one bar of sixteenth notes).
pub const PATTERN_STEPS: usize = 16;

/// Drum tracks, in their fixed display and encoding order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Track {
    /// Bass drum.
    Kick,
    /// Snare drum.
    Snare,
    /// Closed hi-hat.
    HatClosed,
    /// Open hi-hat.
    HatOpen,
    /// Low tom.
    TomLow,
    /// Mid tom.
    TomMid,
    /// High tom.
    TomHigh,
    /// Crash cymbal.
    Crash,
    /// Ride cymbal.
    Ride,
}

impl Track {
    /// Number of tracks in every pattern.
    pub const COUNT: usize = 9;

    /// Returns all tracks in order.
    pub fn all() -> &'static [Track; Track::COUNT] {
        &[
            Track::Kick,
            Track::Snare,
            Track::HatClosed,
            Track::HatOpen,
            Track::TomLow,
            Track::TomMid,
            Track::TomHigh,
            Track::Crash,
            Track::Ride,
        ]
    }

    /// Position of this track in [`Track::all`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Returns the track as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Track::Kick => "kick",
            Track::Snare => "snare",
            Track::HatClosed => "hat_closed",
            Track::HatOpen => "hat_open",
            Track::TomLow => "tom_low",
            Track::TomMid => "tom_mid",
            Track::TomHigh => "tom_high",
            Track::Crash => "crash",
            Track::Ride => "ride",
        }
    }
}

impl std::fmt::Display for Track {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Track {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Track::all()
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown track: {}", s))
    }
}

/// One row as it may appear in JSON: a bool array or a step string like `"x...x..."`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum StepRow {
    Steps(Vec<bool>),
    Text(String),
}

/// A drum pattern: one row of [`PATTERN_STEPS`] on/off steps per [`Track`].
///
/// Patterns are values; editing helpers return a new pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<Track, StepRow>",
    into = "BTreeMap<Track, Vec<bool>>"
)]
pub struct Pattern {
    rows: [[bool; PATTERN_STEPS]; Track::COUNT],
}

impl Default for Pattern {
    fn default() -> Self {
        Self::empty()
    }
}

impl Pattern {
    /// A pattern with every step off.
    pub fn empty() -> Self {
        Self {
            rows: [[false; PATTERN_STEPS]; Track::COUNT],
        }
    }

    /// Builds a pattern by evaluating `f` for every (track, step).
    pub fn from_fn(mut f: impl FnMut(Track, usize) -> bool) -> Self {
        let mut pattern = Self::empty();
        for &track in Track::all() {
            for step in 0..PATTERN_STEPS {
                pattern.rows[track.index()][step] = f(track, step);
            }
        }
        pattern
    }

    /// Parses step strings such as `(Track::Kick, "x...x...x...x...")`.
    ///
    /// Tracks not listed stay silent.
    pub fn from_rows<'a>(
        rows: impl IntoIterator<Item = (Track, &'a str)>,
    ) -> Result<Self, PatternError> {
        let mut pattern = Self::empty();
        for (track, text) in rows {
            pattern.rows[track.index()] = parse_row(track, text)?;
        }
        Ok(pattern)
    }

    /// Returns whether `track` is on at `step`. Out-of-range steps are off.
    pub fn is_on(&self, track: Track, step: usize) -> bool {
        self.rows[track.index()].get(step).copied().unwrap_or(false)
    }

    /// Returns the full row for a track.
    pub fn row(&self, track: Track) -> &[bool; PATTERN_STEPS] {
        &self.rows[track.index()]
    }

    /// Returns a copy with one step set. Out-of-range steps leave the pattern unchanged.
    pub fn with_step(&self, track: Track, step: usize, on: bool) -> Pattern {
        let mut next = self.clone();
        if let Some(cell) = next.rows[track.index()].get_mut(step) {
            *cell = on;
        }
        next
    }

    /// Returns a copy with one step flipped.
    pub fn toggled(&self, track: Track, step: usize) -> Pattern {
        self.with_step(track, step, !self.is_on(track, step))
    }

    /// Iterates over every (track, step) that is on.
    pub fn hits(&self) -> impl Iterator<Item = (Track, usize)> + '_ {
        Track::all().iter().flat_map(move |&track| {
            self.rows[track.index()]
                .iter()
                .enumerate()
                .filter(|(_, on)| **on)
                .map(move |(step, _)| (track, step))
        })
    }

    /// Number of steps that are on across all tracks.
    pub fn hit_count(&self) -> usize {
        self.rows.iter().flatten().filter(|on| **on).count()
    }

    /// True when no step is on.
    pub fn is_silent(&self) -> bool {
        self.hit_count() == 0
    }

    /// Renders a row as a step string (`x` on, `.` off).
    pub fn row_string(&self, track: Track) -> String {
        self.rows[track.index()]
            .iter()
            .map(|on| if *on { 'x' } else { '.' })
            .collect()
    }
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, &track) in Track::all().iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{:<10} {}", track.as_str(), self.row_string(track))?;
        }
        Ok(())
    }
}

fn parse_row(track: Track, text: &str) -> Result<[bool; PATTERN_STEPS], PatternError> {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() != PATTERN_STEPS {
        return Err(PatternError::WrongLength {
            track,
            expected: PATTERN_STEPS,
            got: chars.len(),
        });
    }
    let mut row = [false; PATTERN_STEPS];
    for (step, ch) in chars.into_iter().enumerate() {
        row[step] = match ch {
            'x' | 'X' | '1' => true,
            '.' | '-' | '0' => false,
            other => return Err(PatternError::InvalidStep { track, ch: other }),
        };
    }
    Ok(row)
}

impl TryFrom<BTreeMap<Track, StepRow>> for Pattern {
    type Error = PatternError;

    fn try_from(map: BTreeMap<Track, StepRow>) -> Result<Self, Self::Error> {
        let mut pattern = Pattern::empty();
        for (track, row) in map {
            pattern.rows[track.index()] = match row {
                StepRow::Text(text) => parse_row(track, &text)?,
                StepRow::Steps(steps) => {
                    let got = steps.len();
                    steps
                        .try_into()
                        .map_err(|_| PatternError::WrongLength {
                            track,
                            expected: PATTERN_STEPS,
                            got,
                        })?
                }
            };
        }
        Ok(pattern)
    }
}

impl From<Pattern> for BTreeMap<Track, Vec<bool>> {
    fn from(pattern: Pattern) -> Self {
        Track::all()
            .iter()
            .map(|&track| (track, pattern.rows[track.index()].to_vec()))
            .collect()
    }
}
