//! # Degraded Fallback
//!
//! Deterministic SHA-256 pseudo-embeddings used when the encoder fails.
//! The vectors are stable for a given text and dimension so that reruns
//! stay reproducible, but they encode no meaning.

use std::sync::atomic::{AtomicBool, Ordering};

use sha2::{Digest, Sha256};

static DEGRADED_MODE: AtomicBool = AtomicBool::new(false);

/// Whether any embedding in this process has fallen back to hashing.
pub fn degraded_mode() -> bool {
    DEGRADED_MODE.load(Ordering::Relaxed)
}

/// Reset the degraded flag, e.g. after an encoder endpoint has recovered.
pub fn clear_degraded_mode() {
    DEGRADED_MODE.store(false, Ordering::Relaxed);
}

pub(crate) fn mark_degraded() {
    DEGRADED_MODE.store(true, Ordering::Relaxed);
}

/// A unit-length pseudo-embedding of `dimension` components derived from
/// SHA-256 of `text`.
pub fn hash_embedding(text: &str, dimension: usize) -> Vec<f32> {
    let mut v = expand_digest(text.as_bytes(), dimension);
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in &mut v {
            *x /= norm;
        }
    }
    v
}

/// Stretch SHA-256 output over `dimension` components in `[-1, 1]`.
///
/// Block `i` is `SHA-256(seed || i as u32 LE)`; each byte yields one
/// component.
pub(crate) fn expand_digest(seed: &[u8], dimension: usize) -> Vec<f32> {
    let mut out = Vec::with_capacity(dimension);
    let mut block: u32 = 0;
    while out.len() < dimension {
        let mut hasher = Sha256::new();
        hasher.update(seed);
        hasher.update(block.to_le_bytes());
        let digest = hasher.finalize();
        for byte in digest.iter() {
            if out.len() == dimension {
                break;
            }
            out.push(f32::from(*byte) / 127.5 - 1.0);
        }
        block += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_and_unit_length() {
        let a = hash_embedding("A.5.1 Policies", 768);
        let b = hash_embedding("A.5.1 Policies", 768);
        assert_eq!(a, b);
        assert_eq!(a.len(), 768);
        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }

    #[test]
    fn different_text_differs() {
        assert_ne!(hash_embedding("a", 64), hash_embedding("b", 64));
    }

    #[test]
    fn odd_dimensions() {
        assert_eq!(expand_digest(b"x", 5).len(), 5);
        assert_eq!(expand_digest(b"x", 33).len(), 33);
        assert!(expand_digest(b"x", 0).is_empty());
    }
}
