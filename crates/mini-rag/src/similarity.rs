use crate::error::{RagError, Result};

/// Floor applied to each norm so zero vectors never divide by zero.
pub const NORM_EPSILON: f32 = 1e-10;

// Sums accumulate in f64 so squares of large f32 components don't overflow.

pub fn dot(a: &[f32], b: &[f32]) -> f64 {
    a.iter().zip(b).map(|(&x, &y)| x as f64 * y as f64).sum()
}

pub fn l2_norm(v: &[f32]) -> f64 {
    v.iter().map(|&x| x as f64 * x as f64).sum::<f64>().sqrt()
}

/// L2-normalize in place. Vectors with a near-zero norm are left untouched.
pub fn normalize(v: &mut [f32]) {
    let norm = l2_norm(v);
    if norm > 1e-12 {
        for x in v.iter_mut() {
            *x = (*x as f64 / norm) as f32;
        }
    }
}

/// Cosine similarity of two equal-length vectors.
///
/// Norms are floored at [`NORM_EPSILON`], so a zero vector scores 0.0
/// against anything. The result is clamped to [-1, 1].
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(RagError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let floor = NORM_EPSILON as f64;
    let denom = l2_norm(a).max(floor) * l2_norm(b).max(floor);
    Ok(((dot(a, b) / denom) as f32).clamp(-1.0, 1.0))
}
