use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What an adapter answers to. Terms match the task text; context keys match
/// keys present in the task context; categories match a declared type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerSet {
    pub terms: Vec<String>,
    pub categories: Vec<String>,
    pub context_keys: Vec<String>,
}

impl TriggerSet {
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            terms: terms.into_iter().map(|t| t.into().to_lowercase()).collect(),
            ..Self::default()
        }
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(|c| c.into().to_lowercase()).collect();
        self
    }

    pub fn with_context_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.context_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Append extra terms, skipping ones already present.
    pub fn extend_terms<I, S>(&mut self, extra: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for term in extra {
            let term = term.into().to_lowercase();
            if !term.trim().is_empty() && !self.terms.contains(&term) {
                self.terms.push(term);
            }
        }
    }

    /// The first category, used as the task type when this adapter leads.
    pub fn primary_category(&self) -> Option<&str> {
        self.categories.first().map(String::as_str)
    }

    /// Whether a declared type names one of this set's terms or categories.
    pub fn matches_declared(&self, declared: &str) -> bool {
        let declared = declared.trim().to_lowercase();
        self.categories.iter().any(|c| *c == declared) || self.terms.iter().any(|t| *t == declared)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdapterSelection {
    pub adapter_name: String,
    pub weight: f64,
}

/// The classifier's verdict for one task. Produced once, never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub task_id: String,
    /// Highest score first.
    pub selections: Vec<AdapterSelection>,
    pub classification_scores: BTreeMap<String, f64>,
    /// Nothing cleared the relevance threshold.
    pub fallback_used: bool,
    pub decided_at: DateTime<Utc>,
}

impl RoutingDecision {
    pub fn adapter_names(&self) -> Vec<&str> {
        self.selections.iter().map(|s| s.adapter_name.as_str()).collect()
    }

    pub fn score_of(&self, adapter: &str) -> Option<f64> {
        self.classification_scores.get(adapter).copied()
    }
}
