//! Pooling and vector arithmetic.

use crate::encoder::TokenStates;
use crate::error::EmbeddingError;

/// Attention-mask-weighted mean of the token hidden states.
///
/// Padding positions (mask 0) contribute nothing. Fails when the shapes
/// disagree or every position is masked out.
pub fn mean_pool(states: &TokenStates) -> Result<Vec<f32>, EmbeddingError> {
    if states.hidden.len() != states.attention_mask.len() {
        return Err(EmbeddingError::MalformedOutput {
            reason: format!(
                "{} token states but {} mask entries",
                states.hidden.len(),
                states.attention_mask.len()
            ),
        });
    }
    let width = states
        .hidden
        .first()
        .map(Vec::len)
        .ok_or_else(|| EmbeddingError::MalformedOutput {
            reason: "no token states".into(),
        })?;

    let mut sum = vec![0.0f32; width];
    let mut weight = 0.0f32;
    for (row, &mask) in states.hidden.iter().zip(&states.attention_mask) {
        if row.len() != width {
            return Err(EmbeddingError::MalformedOutput {
                reason: format!("ragged token states: {} vs {width}", row.len()),
            });
        }
        if mask == 0 {
            continue;
        }
        let m = mask as f32;
        for (acc, v) in sum.iter_mut().zip(row) {
            *acc += v * m;
        }
        weight += m;
    }

    if weight == 0.0 {
        return Err(EmbeddingError::MalformedOutput {
            reason: "attention mask is all zero".into(),
        });
    }
    for v in &mut sum {
        *v /= weight;
    }
    Ok(sum)
}

/// Scale `v` to unit L2 norm in place.
pub fn l2_normalize(v: &mut [f32]) -> Result<(), EmbeddingError> {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if !norm.is_finite() || norm == 0.0 {
        return Err(EmbeddingError::MalformedOutput {
            reason: format!("cannot normalize vector with norm {norm}"),
        });
    }
    for x in v.iter_mut() {
        *x /= norm;
    }
    Ok(())
}

/// Cosine similarity; 0.0 for mismatched lengths or zero vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    dot / (na * nb)
}
