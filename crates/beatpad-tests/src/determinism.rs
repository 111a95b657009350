//! Determinism checks for pattern producers.
//!
//! A decode with the same embedding and temperature must yield the same
//! pattern every time; so must a direct blend at the same position. These
//! helpers run a producer several times and report the first run whose
//! pattern differs from the first.

use std::fmt;

use beatpad_spec::{pattern_hash, Pattern, Track, PATTERN_STEPS};

/// Result of a determinism verification.
#[derive(Debug, Clone)]
pub struct DeterminismResult {
    /// Whether all runs produced the same pattern.
    pub is_deterministic: bool,
    /// Number of runs performed.
    pub runs: usize,
    /// Hash of the first run's pattern.
    pub hash: String,
    /// The first difference found, if any.
    pub diff: Option<PatternDiff>,
}

/// The first step that differs between two runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternDiff {
    /// Which run (0-indexed) produced the differing pattern.
    pub run_index: usize,
    pub track: Track,
    pub step: usize,
    /// Value in the first run.
    pub expected: bool,
}

impl fmt::Display for PatternDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "run {} differs at {} step {}: expected {}, got {}",
            self.run_index,
            self.track,
            self.step,
            on_off(self.expected),
            on_off(!self.expected)
        )
    }
}

fn on_off(on: bool) -> &'static str {
    if on {
        "on"
    } else {
        "off"
    }
}

impl DeterminismResult {
    /// Panic with a detailed message if not deterministic.
    pub fn assert_deterministic(&self) {
        if let Some(diff) = &self.diff {
            panic!(
                "Non-deterministic pattern detected!\nRuns: {}\nHash: {}\n{}",
                self.runs, self.hash, diff
            );
        }
    }
}

/// Finds the first step where `actual` differs from `expected`.
pub fn first_difference(expected: &Pattern, actual: &Pattern, run_index: usize) -> Option<PatternDiff> {
    Track::all().iter().find_map(|&track| {
        (0..PATTERN_STEPS).find_map(|step| {
            let want = expected.is_on(track, step);
            (want != actual.is_on(track, step)).then_some(PatternDiff {
                run_index,
                track,
                step,
                expected: want,
            })
        })
    })
}

/// Runs `produce` `runs` times and checks every pattern matches the first.
pub fn verify_determinism<F>(produce: F, runs: usize) -> DeterminismResult
where
    F: Fn() -> Pattern,
{
    assert!(runs >= 2, "Must run at least 2 times to verify determinism");

    let reference = produce();
    let hash = pattern_hash(&reference);
    for run_index in 1..runs {
        let pattern = produce();
        if let Some(diff) = first_difference(&reference, &pattern, run_index) {
            return DeterminismResult {
                is_deterministic: false,
                runs,
                hash,
                diff: Some(diff),
            };
        }
    }
    DeterminismResult {
        is_deterministic: true,
        runs,
        hash,
        diff: None,
    }
}

/// Asserts that `produce` is deterministic over `runs` runs.
pub fn assert_deterministic<F>(produce: F, runs: usize)
where
    F: Fn() -> Pattern,
{
    verify_determinism(produce, runs).assert_deterministic();
}
