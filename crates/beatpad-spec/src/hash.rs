//! BLAKE3 fingerprints and seed derivation.
//!
//! Fingerprints identify corner content so the engine can tell a meaningful
//! corner change from a no-op re-assignment. Seeds make the reference model's
//! decode jitter reproducible.

use crate::corner::CornerSet;
use crate::embedding::Embedding;
use crate::pattern::{Pattern, Track, PATTERN_STEPS};

/// Appends the canonical byte form of a pattern: one bit per step, row-major.
fn write_pattern(buf: &mut Vec<u8>, pattern: &Pattern) {
    for &track in Track::all() {
        let mut bits: u16 = 0;
        for step in 0..PATTERN_STEPS {
            if pattern.is_on(track, step) {
                bits |= 1 << step;
            }
        }
        buf.extend_from_slice(&bits.to_le_bytes());
    }
}

/// Computes the BLAKE3 hash of a pattern.
///
/// # Returns
/// * A 64-character lowercase hexadecimal string
pub fn pattern_hash(pattern: &Pattern) -> String {
    let mut buf = Vec::with_capacity(Track::COUNT * 2);
    write_pattern(&mut buf, pattern);
    blake3::hash(&buf).to_hex().to_string()
}

/// Computes the BLAKE3 hash of a corner set.
///
/// Each slot contributes a presence byte followed by the pattern bits, so an
/// empty slot and a silent pattern hash differently.
///
/// ```text
/// corner_hash = hex(BLAKE3(for slot in A..D: present_u8 || pattern_bits))
/// ```
pub fn corner_set_hash(corners: &CornerSet) -> String {
    let mut buf = Vec::with_capacity(4 * (1 + Track::COUNT * 2));
    for (_, slot) in corners.iter() {
        match slot {
            Some(pattern) => {
                buf.push(1);
                write_pattern(&mut buf, pattern);
            }
            None => buf.push(0),
        }
    }
    blake3::hash(&buf).to_hex().to_string()
}

/// Derives a 64-bit seed from an embedding and a temperature.
///
/// ```text
/// seed = truncate_u64(BLAKE3(f64_le(z[0]) || ... || f64_le(temperature)))
/// ```
pub fn derive_decode_seed(embedding: &Embedding, temperature: f64) -> u64 {
    let mut input = Vec::with_capacity((embedding.dim() + 1) * 8);
    for value in embedding.as_slice() {
        input.extend_from_slice(&value.to_le_bytes());
    }
    input.extend_from_slice(&temperature.to_le_bytes());

    let hash = blake3::hash(&input);
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[0..8]);
    u64::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_hash_is_stable() {
        let p = Pattern::empty().with_step(Track::Ride, 7, true);
        assert_eq!(pattern_hash(&p), pattern_hash(&p.clone()));
        assert_ne!(pattern_hash(&p), pattern_hash(&Pattern::empty()));
        assert_eq!(pattern_hash(&p).len(), 64);
    }

    #[test]
    fn test_empty_slot_differs_from_silent_pattern() {
        let empty = CornerSet::new();
        let mut silent = CornerSet::new();
        silent.set(crate::CornerLabel::A, Pattern::empty());
        assert_ne!(corner_set_hash(&empty), corner_set_hash(&silent));
    }

    #[test]
    fn test_decode_seed() {
        let z = Embedding::new(vec![0.25, -1.0, 3.5]);
        assert_eq!(derive_decode_seed(&z, 0.5), derive_decode_seed(&z, 0.5));
        assert_ne!(derive_decode_seed(&z, 0.5), derive_decode_seed(&z, 0.6));
    }
}
