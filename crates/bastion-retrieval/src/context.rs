//! Prompt context assembled from retrieval matches.

use bastion_core::models::RetrievalResult;

/// Concatenate matches as `Source: <id> (score: x.xx)` blocks, stopping
/// before the block that would exceed `max_chars`. Titled documents get a
/// `Title:` line under the source line.
pub fn build_context(result: &RetrievalResult, max_chars: usize) -> String {
    let mut out = String::new();
    for m in &result.matches {
        let title = m
            .chunk
            .metadata
            .title
            .as_deref()
            .map(|t| format!("Title: {t}\n"))
            .unwrap_or_default();
        let block = format!(
            "Source: {} (score: {:.2})\n{title}{}\n\n",
            m.chunk.source_id, m.score, m.chunk.text
        );
        if out.chars().count() + block.chars().count() > max_chars {
            break;
        }
        out.push_str(&block);
    }
    out.trim_end().to_string()
}
