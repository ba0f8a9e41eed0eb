use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::constants::{CTX_QUERY, CTX_TARGET};

/// Domains (`example.com`, `a.b.co.uk`) and dotted IPv4 addresses.
/// `None` if the pattern fails to compile.
static HOST_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)\b(?:",
        r"(?:25[0-5]|2[0-4]\d|1?\d?\d)(?:\.(?:25[0-5]|2[0-4]\d|1?\d?\d)){3}",
        r"|(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,63}",
        r")\b",
    ))
    .ok()
});

const SEARCH_PREFIXES: &[&str] = &["search for", "search", "find", "look for", "show me"];

/// One incoming request. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub raw_text: String,
    /// Optional routing hint naming an adapter, category, or trigger term.
    pub declared_type: Option<String>,
    /// Ordered so prompts and audit payloads are reproducible.
    pub context: BTreeMap<String, String>,
}

impl Task {
    pub fn new(raw_text: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            raw_text: raw_text.into(),
            declared_type: None,
            context: BTreeMap::new(),
        }
    }

    pub fn with_declared_type(mut self, declared: impl Into<String>) -> Self {
        self.declared_type = Some(declared.into());
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn with_context_map(mut self, context: BTreeMap<String, String>) -> Self {
        self.context.extend(context);
        self
    }

    pub fn context_value(&self, key: &str) -> Option<&str> {
        self.context
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    /// The assessment target: `context["target"]`, else the first host-like
    /// token in the raw text.
    pub fn target(&self) -> Option<String> {
        if let Some(t) = self.context_value(CTX_TARGET) {
            return Some(t.trim().to_string());
        }
        let re = HOST_RE.as_ref()?;
        re.find(&self.raw_text)
            .map(|m| m.as_str().trim_end_matches('.').to_string())
    }

    /// Text to search the knowledge base with.
    pub fn query_text(&self) -> String {
        if let Some(q) = self.context_value(CTX_QUERY) {
            return q.trim().to_string();
        }
        let trimmed = self.raw_text.trim();
        for prefix in SEARCH_PREFIXES {
            let head = trimmed.get(..prefix.len());
            let rest = trimmed.get(prefix.len()..);
            if let (Some(head), Some(rest)) = (head, rest) {
                if head.eq_ignore_ascii_case(prefix) && rest.starts_with(char::is_whitespace) {
                    return rest.trim().to_string();
                }
            }
        }
        trimmed.to_string()
    }
}
