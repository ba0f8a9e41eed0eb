//! Embedding function change detection.
//!
//! On startup the retriever compares the active provider's fingerprint with
//! the one stored next to the chunks.

use bastion_core::models::EmbeddingFingerprint;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FingerprintCheck {
    /// Nothing stored yet.
    FirstRun,
    NoChange,
    /// Stored vectors came from another function. A full reset is required.
    Mismatch {
        stored: EmbeddingFingerprint,
        current: EmbeddingFingerprint,
    },
}

pub fn detect_fingerprint_change(
    current: &EmbeddingFingerprint,
    stored: Option<&EmbeddingFingerprint>,
) -> FingerprintCheck {
    let Some(stored) = stored else {
        info!(fingerprint = %current, "no stored embedding fingerprint, first run");
        return FingerprintCheck::FirstRun;
    };

    if stored.digest == current.digest {
        FingerprintCheck::NoChange
    } else {
        warn!(
            stored = %stored,
            current = %current,
            "embedding function changed, stored vectors are unusable"
        );
        FingerprintCheck::Mismatch {
            stored: stored.clone(),
            current: current.clone(),
        }
    }
}
