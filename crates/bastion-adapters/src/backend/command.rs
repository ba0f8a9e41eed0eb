//! Child-process backend.
//!
//! Spawns the program per request, writes the request JSON to stdin, and
//! reads the response from stdout. Non-JSON stdout is returned as
//! `{"output": <text>}`. The child is killed if the caller stops waiting.

use std::process::Stdio;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use super::{into_payload, BackendError, BackendRequest, IReasoningBackend};

pub struct CommandBackend {
    program: String,
    args: Vec<String>,
}

impl CommandBackend {
    pub fn new(program: &str, args: Vec<String>) -> Self {
        Self {
            program: program.to_string(),
            args,
        }
    }
}

#[async_trait]
impl IReasoningBackend for CommandBackend {
    fn kind(&self) -> &'static str {
        "command"
    }

    async fn reachable(&self) -> bool {
        which::which(&self.program).is_ok()
    }

    async fn invoke(&self, request: &BackendRequest) -> Result<Map<String, Value>, BackendError> {
        let input =
            serde_json::to_vec(request).map_err(|e| BackendError::Malformed(e.to_string()))?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                BackendError::Transport(format!("failed to spawn {}: {e}", self.program))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            // A program that ignores stdin may close it early; that is not an error.
            if let Err(e) = stdin.write_all(&input).await {
                debug!(program = %self.program, error = %e, "stdin closed early");
            }
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        if !output.status.success() {
            return Err(BackendError::Exit {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stdout = stdout.trim();
        Ok(match serde_json::from_str::<Value>(stdout) {
            Ok(value) => into_payload(value),
            Err(_) => into_payload(Value::from(stdout)),
        })
    }
}
