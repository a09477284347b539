//! Vector arithmetic shared by the embedding generator and the ANN backends.

/// Euclidean (L2) norm of a vector.
#[inline]
pub fn l2_norm(vector: &[f32]) -> f32 {
    vector.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Computes cosine similarity between two vectors.
///
/// Returns a value in `[-1, 1]`, where 1 means identical direction.
/// Defined as `0.0` when either vector has zero norm or when the lengths
/// differ, so callers comparing vectors from different models never divide
/// by zero or read out of bounds.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a = l2_norm(a);
    let norm_b = l2_norm(b);

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot_product / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

/// L2-normalizes a vector in place.
///
/// A zero vector is left unchanged. Returns the norm the vector had before
/// normalization so callers can detect the degenerate case.
pub fn normalize(vector: &mut [f32]) -> f32 {
    let norm = l2_norm(vector);
    if norm > 0.0 {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
    norm
}

/// Returns a normalized copy of a vector.
#[must_use]
pub fn normalized(vector: &[f32]) -> Vec<f32> {
    let mut copy = vector.to_vec();
    normalize(&mut copy);
    copy
}
