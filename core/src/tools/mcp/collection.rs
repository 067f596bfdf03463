use super::client::McpClient;
use super::types::{McpError, McpServerConfig, McpToolResult};
use crate::tools::{ToolCollection, ToolDescriptor, ToolError, ToolOutput, ToolResult};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

/// Exposes the tools of one MCP server as a tool collection
pub struct McpToolCollection {
    name: String,
    client: Arc<McpClient>,
}

impl McpToolCollection {
    pub fn new(name: impl Into<String>, client: Arc<McpClient>) -> Self {
        Self {
            name: name.into(),
            client,
        }
    }

    /// Spawn the server described by `config` and wrap it
    pub async fn connect(config: McpServerConfig) -> Result<Self, McpError> {
        let name = config.name.clone();
        let client = Arc::new(McpClient::new(config));
        client.connect().await?;
        Ok(Self::new(name, client))
    }

    pub fn client(&self) -> &Arc<McpClient> {
        &self.client
    }
}

fn to_tool_error(err: McpError) -> ToolError {
    match err {
        McpError::Timeout => ToolError::Timeout,
        other => ToolError::ExecutionFailed(format!("MCP call failed: {}", other)),
    }
}

/// Map a flattened MCP result onto a tool output.
///
/// Servers report failure either through `isError` or with a JSON body
/// carrying `"success": false`.
pub(crate) fn into_output(result: McpToolResult) -> ToolOutput {
    let payload = result.payload();
    let reported_failure = payload.get("success").and_then(Value::as_bool) == Some(false);

    if result.is_error || reported_failure {
        ToolOutput::failed(payload)
    } else {
        ToolOutput::ok(payload)
    }
}

#[async_trait]
impl ToolCollection for McpToolCollection {
    fn name(&self) -> String {
        self.name.clone()
    }

    async fn list_tools(&self) -> ToolResult<Vec<ToolDescriptor>> {
        let tools = self.client.list_tools().await.map_err(to_tool_error)?;
        Ok(tools
            .into_iter()
            .map(|t| ToolDescriptor::from_json_schema(t.name, t.description, &t.input_schema))
            .collect())
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Option<BTreeMap<String, String>>,
    ) -> ToolResult<ToolOutput> {
        let arguments = arguments.map(|args| {
            Value::Object(
                args.into_iter()
                    .map(|(k, v)| (k, Value::String(v)))
                    .collect::<Map<String, Value>>(),
            )
        });

        let result = self
            .client
            .call_tool(name, arguments)
            .await
            .map_err(to_tool_error)?;

        if result.is_error {
            warn!(
                target: "mcp_collection",
                collection = %self.name,
                tool = %name,
                "MCP tool reported an error"
            );
        }
        Ok(into_output(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_content_is_passed_through() {
        let output = into_output(McpToolResult {
            content: r#"{"success": true, "recipe": {"recipe_id": "X"}}"#.to_string(),
            is_error: false,
        });
        assert!(output.success);
        assert_eq!(output.payload["recipe"]["recipe_id"], json!("X"));
    }

    #[test]
    fn test_success_false_body_is_a_failure() {
        let output = into_output(McpToolResult {
            content: r#"{"success": false, "error": "no pom.xml"}"#.to_string(),
            is_error: false,
        });
        assert!(!output.success);
        assert_eq!(output.error_message(), "no pom.xml");
    }

    #[test]
    fn test_is_error_text_is_a_failure() {
        let output = into_output(McpToolResult {
            content: "mod: command not found".to_string(),
            is_error: true,
        });
        assert!(!output.success);
        assert_eq!(output.payload, json!("mod: command not found"));
    }

    #[test]
    fn test_timeout_maps_to_tool_timeout() {
        assert!(matches!(to_tool_error(McpError::Timeout), ToolError::Timeout));
        assert!(matches!(
            to_tool_error(McpError::Protocol("bad".to_string())),
            ToolError::ExecutionFailed(_)
        ));
    }
}
