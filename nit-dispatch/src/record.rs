//! Per-block dispatch results.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Plugin label carried by every dispatch record.
pub const SCRIPT_PLUGIN: &str = "NIT_Script";

/// How a script block ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchStatus {
    /// Every statement ran.
    Success,
    /// Lexing, parsing, or a tool call failed.
    Error,
    /// The security verdict refused the block.
    Blocked,
}

/// Result of one script block, in document order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchRecord {
    /// Always [`SCRIPT_PLUGIN`].
    pub plugin: String,
    /// Outcome.
    pub status: DispatchStatus,
    /// Last statement value on success, otherwise a message.
    pub output: Value,
    /// Block text including its tags.
    pub raw_block: String,
    /// Tools the block invoked, including any before a failure.
    #[serde(default)]
    pub executed_tools: Vec<String>,
}

impl DispatchRecord {
    pub(crate) fn new(status: DispatchStatus, output: Value, raw_block: &str) -> Self {
        Self {
            plugin: SCRIPT_PLUGIN.to_owned(),
            status,
            output,
            raw_block: raw_block.to_owned(),
            executed_tools: Vec::new(),
        }
    }

    pub(crate) fn with_executed_tools(mut self, tools: Vec<String>) -> Self {
        self.executed_tools = tools;
        self
    }

    /// Whether the block ran to completion.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == DispatchStatus::Success
    }

    /// Output as display text: strings verbatim, anything else as JSON.
    #[must_use]
    pub fn output_text(&self) -> String {
        render_value(&self.output)
    }
}

pub(crate) fn render_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
