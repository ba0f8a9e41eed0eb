//! System prompts and task prompt formatting.

use serde::Deserialize;

use bastion_core::errors::ConfigError;
use bastion_core::models::Task;

const EMBEDDED_PROMPTS: &str = include_str!("../prompts.toml");

#[derive(Debug, Clone, Deserialize)]
pub struct AgentPrompt {
    pub prompt: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Prompts {
    pub security_analyst: AgentPrompt,
    pub pentesting_expert: AgentPrompt,
    pub intelligence_analyst: AgentPrompt,
}

impl Prompts {
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError {
            path: "prompts.toml".to_string(),
            message: e.to_string(),
        })
    }

    /// The prompts compiled into the crate.
    pub fn embedded() -> Result<Self, ConfigError> {
        Self::parse(EMBEDDED_PROMPTS)
    }

    pub fn get(&self, role: &str) -> Option<&str> {
        match role {
            "security_analyst" => Some(self.security_analyst.prompt.trim()),
            "pentesting_expert" => Some(self.pentesting_expert.prompt.trim()),
            "intelligence_analyst" => Some(self.intelligence_analyst.prompt.trim()),
            _ => None,
        }
    }
}

/// The task text followed by its context entries in key order.
pub fn format_task_prompt(task: &Task) -> String {
    let mut prompt = task.raw_text.trim().to_string();
    let entries: Vec<_> = task
        .context
        .iter()
        .filter(|(_, v)| !v.trim().is_empty())
        .collect();
    if !entries.is_empty() {
        prompt.push_str("\n\nContext:");
        for (key, value) in entries {
            prompt.push_str(&format!("\n- {key}: {}", value.trim()));
        }
    }
    prompt
}
