//! Ordering, flooring, and truncation of scored chunks.

use std::cmp::Ordering;

use bastion_core::models::{RetrievalMatch, RetrievalResult};

/// Descending score, then earlier offset, then chunk id.
fn compare(a: &RetrievalMatch, b: &RetrievalMatch) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.chunk.offset_in_source.cmp(&b.chunk.offset_in_source))
        .then_with(|| a.chunk.chunk_id.cmp(&b.chunk.chunk_id))
}

pub fn rank(
    mut scored: Vec<RetrievalMatch>,
    top_k: usize,
    similarity_floor: f64,
) -> RetrievalResult {
    if top_k == 0 {
        return RetrievalResult::default();
    }
    scored.retain(|m| m.score >= similarity_floor);
    scored.sort_by(compare);
    scored.truncate(top_k);
    RetrievalResult { matches: scored }
}
