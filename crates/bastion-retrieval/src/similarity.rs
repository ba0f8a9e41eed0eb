//! Cosine similarity, applied the same way to every chunk.

use bastion_core::constants::MAX_NON_EXACT_SCORE;

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f64::EPSILON {
        return 0.0;
    }
    dot / denom
}

/// Relevance in `[0, 1]`. Only the identical text scores 1.0; anything
/// else tops out just below it, whatever its vector looks like.
pub fn relevance(query_text: &str, query_vec: &[f32], chunk_text: &str, chunk_vec: &[f32]) -> f64 {
    if query_text.trim() == chunk_text.trim() {
        return 1.0;
    }
    cosine_similarity(query_vec, chunk_vec).clamp(0.0, MAX_NON_EXACT_SCORE)
}
