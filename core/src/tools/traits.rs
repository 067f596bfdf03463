use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::descriptor::ToolDescriptor;
use super::error::ToolResult;

/// Outcome of one tool invocation.
///
/// `payload` is passed through untouched so that callers can read typed
/// fields (e.g. the recipe chosen by a migration plan) instead of mining text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub success: bool,
    pub payload: Value,
}

impl ToolOutput {
    pub fn ok(payload: Value) -> Self {
        Self {
            success: true,
            payload,
        }
    }

    pub fn failed(payload: Value) -> Self {
        Self {
            success: false,
            payload,
        }
    }

    /// Best human-readable reason for a failed output
    pub fn error_message(&self) -> String {
        self.payload
            .get("error")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .or_else(|| self.payload.as_str().map(|s| s.to_string()))
            .unwrap_or_else(|| "tool reported failure".to_string())
    }

    /// Compact single-line rendering of the payload
    pub fn summary(&self) -> String {
        match &self.payload {
            Value::String(s) => s.replace('\n', " "),
            other => other.to_string(),
        }
    }
}

/// A named group of callable external operations (project/build tools,
/// code-transformation tools, an MCP server, ...).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ToolCollection: Send + Sync {
    /// Collection name used for grouping in prompts and logs
    fn name(&self) -> String;

    /// Advertised operations; called once at startup
    async fn list_tools(&self) -> ToolResult<Vec<ToolDescriptor>>;

    /// Invoke one operation. `arguments` is `None` when the call carries no parameters.
    async fn call_tool(
        &self,
        name: &str,
        arguments: Option<BTreeMap<String, String>>,
    ) -> ToolResult<ToolOutput>;
}
