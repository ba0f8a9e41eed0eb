//! Keyword classification.
//!
//! Each adapter scores `1 - 0.5^hits`, where a hit is a distinct trigger term
//! found in the task text or a trigger context key present in the task
//! context. A declared type naming the adapter, one of its categories, or one
//! of its terms forces 1.0.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;

use bastion_core::config::RouterConfig;
use bastion_core::models::{AdapterSelection, RoutingDecision, Task, TriggerSet};
use bastion_core::traits::ICapabilityAdapter;

/// Lowercase alphanumeric runs.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn contains_phrase(tokens: &[String], phrase: &[String]) -> bool {
    match phrase.len() {
        0 => false,
        1 => tokens.contains(&phrase[0]),
        n => tokens.windows(n).any(|w| w == phrase),
    }
}

/// Distinct matched terms plus matched context keys.
pub fn count_hits(tokens: &[String], task: &Task, triggers: &TriggerSet) -> usize {
    let terms = triggers
        .terms
        .iter()
        .filter(|term| contains_phrase(tokens, &tokenize(term)))
        .count();
    let keys = triggers
        .context_keys
        .iter()
        .filter(|key| task.context_value(key).is_some())
        .count();
    terms + keys
}

pub fn score_for_hits(hits: usize) -> f64 {
    let hits = i32::try_from(hits).unwrap_or(i32::MAX);
    1.0 - 0.5f64.powi(hits)
}

fn declared_match(task: &Task, adapter: &dyn ICapabilityAdapter) -> bool {
    task.declared_type.as_deref().is_some_and(|declared| {
        declared.trim().eq_ignore_ascii_case(adapter.name())
            || adapter.declared_triggers().matches_declared(declared)
    })
}

/// Score every adapter and pick the ones at or above the threshold, highest
/// first with ties in registration order. Weights are normalized scores.
pub fn classify(
    task: &Task,
    adapters: &[Arc<dyn ICapabilityAdapter>],
    config: &RouterConfig,
) -> RoutingDecision {
    let tokens = tokenize(&task.raw_text);

    let scored: Vec<(&str, f64)> = adapters
        .iter()
        .map(|adapter| {
            let score = if declared_match(task, adapter.as_ref()) {
                1.0
            } else {
                score_for_hits(count_hits(&tokens, task, adapter.declared_triggers()))
            };
            (adapter.name(), score)
        })
        .collect();

    let mut selected: Vec<(&str, f64)> = scored
        .iter()
        .copied()
        .filter(|(_, score)| *score >= config.relevance_threshold)
        .collect();
    // Stable sort keeps registration order among equal scores.
    selected.sort_by(|a, b| b.1.total_cmp(&a.1));

    let fallback_used = selected.is_empty();
    let selections = if fallback_used {
        adapters
            .iter()
            .find(|a| a.name() == config.fallback_adapter)
            .map(|a| {
                vec![AdapterSelection {
                    adapter_name: a.name().to_string(),
                    weight: 1.0,
                }]
            })
            .unwrap_or_default()
    } else {
        let total: f64 = selected.iter().map(|(_, s)| s).sum();
        let n = selected.len() as f64;
        selected
            .iter()
            .map(|(name, score)| AdapterSelection {
                adapter_name: name.to_string(),
                weight: if total > 0.0 { score / total } else { 1.0 / n },
            })
            .collect()
    };

    RoutingDecision {
        task_id: task.id.clone(),
        selections,
        classification_scores: scored
            .into_iter()
            .map(|(name, score)| (name.to_string(), score))
            .collect::<BTreeMap<_, _>>(),
        fallback_used,
        decided_at: Utc::now(),
    }
}
