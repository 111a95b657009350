//! The four labelled corner slots of the blend surface.

use serde::{Deserialize, Serialize};

use crate::hash::corner_set_hash;
use crate::pattern::Pattern;

/// Corner labels. A sits at (0,0), B at (1,0), C at (0,1), D at (1,1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CornerLabel {
    A,
    B,
    C,
    D,
}

impl CornerLabel {
    /// All labels in slot order.
    pub const ALL: [CornerLabel; 4] = [CornerLabel::A, CornerLabel::B, CornerLabel::C, CornerLabel::D];

    /// Slot index (A=0 .. D=3).
    pub fn index(self) -> usize {
        self as usize
    }

    /// Returns the label as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            CornerLabel::A => "A",
            CornerLabel::B => "B",
            CornerLabel::C => "C",
            CornerLabel::D => "D",
        }
    }
}

impl std::fmt::Display for CornerLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for CornerLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "a" | "A" => Ok(CornerLabel::A),
            "b" | "B" => Ok(CornerLabel::B),
            "c" | "C" => Ok(CornerLabel::C),
            "d" | "D" => Ok(CornerLabel::D),
            _ => Err(format!("unknown corner: {} (expected A, B, C or D)", s)),
        }
    }
}

/// Exactly four corner slots, each optionally holding a pattern.
///
/// The set is complete when every slot is filled; only complete sets can be
/// encoded by the model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CornerSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    a: Option<Pattern>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    b: Option<Pattern>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    c: Option<Pattern>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    d: Option<Pattern>,
}

impl CornerSet {
    /// Creates an empty corner set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a complete corner set.
    pub fn from_patterns(patterns: [Pattern; 4]) -> Self {
        let [a, b, c, d] = patterns;
        Self {
            a: Some(a),
            b: Some(b),
            c: Some(c),
            d: Some(d),
        }
    }

    fn slot(&self, label: CornerLabel) -> &Option<Pattern> {
        match label {
            CornerLabel::A => &self.a,
            CornerLabel::B => &self.b,
            CornerLabel::C => &self.c,
            CornerLabel::D => &self.d,
        }
    }

    fn slot_mut(&mut self, label: CornerLabel) -> &mut Option<Pattern> {
        match label {
            CornerLabel::A => &mut self.a,
            CornerLabel::B => &mut self.b,
            CornerLabel::C => &mut self.c,
            CornerLabel::D => &mut self.d,
        }
    }

    /// Returns the pattern in a slot, if any.
    pub fn get(&self, label: CornerLabel) -> Option<&Pattern> {
        self.slot(label).as_ref()
    }

    /// Fills or replaces a slot. Returns true if the slot content changed.
    pub fn set(&mut self, label: CornerLabel, pattern: Pattern) -> bool {
        let slot = self.slot_mut(label);
        if slot.as_ref() == Some(&pattern) {
            return false;
        }
        *slot = Some(pattern);
        true
    }

    /// Empties a slot. Returns true if it held a pattern.
    pub fn clear(&mut self, label: CornerLabel) -> bool {
        self.slot_mut(label).take().is_some()
    }

    /// Number of filled slots.
    pub fn filled(&self) -> usize {
        CornerLabel::ALL
            .iter()
            .filter(|&&l| self.slot(l).is_some())
            .count()
    }

    /// True when all four slots are filled.
    pub fn is_complete(&self) -> bool {
        self.filled() == 4
    }

    /// True when no slot is filled.
    pub fn is_empty(&self) -> bool {
        self.filled() == 0
    }

    /// Returns the four patterns in slot order when the set is complete.
    pub fn complete(&self) -> Option<[Pattern; 4]> {
        match (&self.a, &self.b, &self.c, &self.d) {
            (Some(a), Some(b), Some(c), Some(d)) => {
                Some([a.clone(), b.clone(), c.clone(), d.clone()])
            }
            _ => None,
        }
    }

    /// Iterates over `(label, slot)` in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (CornerLabel, Option<&Pattern>)> + '_ {
        CornerLabel::ALL.iter().map(move |&l| (l, self.get(l)))
    }

    /// Content fingerprint (BLAKE3 hex) covering every slot, including empty ones.
    pub fn fingerprint(&self) -> String {
        corner_set_hash(self)
    }
}
