//! Tests for MCP configuration and protocol types.

use migrant_core::tools::mcp::types::{CallToolResult, ListToolsResult};
use migrant_core::tools::mcp::{
    McpServerConfig, McpToolCollection, McpToolResult, DEFAULT_PROTOCOL_VERSION,
    SUPPORTED_PROTOCOL_VERSIONS,
};
use migrant_core::tools::{ParamType, ToolCollection, ToolDescriptor};
use serde_json::json;
use std::collections::HashMap;

#[test]
fn test_server_config_round_trip() {
    let mut config = McpServerConfig::new(
        "maven",
        "python",
        vec!["maven_server.py".to_string()],
    );
    config.env = Some(HashMap::from([(
        "JAVA_HOME".to_string(),
        "/usr/lib/jvm/17".to_string(),
    )]));
    config.cwd = Some("/srv/tools".to_string());

    let json = serde_json::to_string(&config).unwrap();
    assert!(json.contains("maven_server.py"));
    assert!(!json.contains("protocol_version"));

    let decoded: McpServerConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded, config);
}

#[test]
fn test_minimal_config_uses_defaults() {
    let config: McpServerConfig =
        serde_json::from_value(json!({"name": "moderne", "command": "mod-mcp"})).unwrap();

    assert!(config.args.is_empty());
    assert_eq!(config.protocol_version(), DEFAULT_PROTOCOL_VERSION);
    assert_eq!(config.request_timeout_ms(), 30_000);
    assert!(config.validate_protocol_version().is_ok());
    assert!(SUPPORTED_PROTOCOL_VERSIONS.contains(&DEFAULT_PROTOCOL_VERSION));

    let unsupported = McpServerConfig {
        protocol_version: Some("1999-01-01".to_string()),
        ..config
    };
    assert!(unsupported.validate_protocol_version().is_err());
}

#[test]
fn test_tools_list_maps_to_descriptors() {
    let listed: ListToolsResult = serde_json::from_value(json!({
        "tools": [{
            "name": "modUpgradeAll",
            "description": "Run a recipe across the project",
            "inputSchema": {
                "type": "object",
                "properties": {"recipe_id": {"type": "string"}},
                "required": ["recipe_id"]
            }
        }],
        "nextCursor": "page-2"
    }))
    .unwrap();

    assert_eq!(listed.next_cursor.as_deref(), Some("page-2"));
    let tool = &listed.tools[0];
    let descriptor = ToolDescriptor::from_json_schema(
        tool.name.clone(),
        tool.description.clone(),
        &tool.input_schema,
    );
    assert_eq!(
        descriptor.parameters.get("recipe_id"),
        Some(&ParamType::String)
    );
    assert_eq!(descriptor.signature(), "modUpgradeAll(recipe_id: string)");
}

#[test]
fn test_tool_result_payload() {
    let result: CallToolResult = serde_json::from_value(json!({
        "content": [
            {"type": "text", "text": "{\"success\": true, \"recipe\": {\"recipe_id\": \"X\"}}"}
        ]
    }))
    .unwrap();
    let flattened = McpToolResult::from(result);

    assert!(!flattened.is_error);
    assert_eq!(flattened.payload()["recipe"]["recipe_id"], "X");

    let text = McpToolResult {
        content: "Build finished".to_string(),
        is_error: false,
    };
    assert_eq!(text.payload(), json!("Build finished"));
}

#[tokio::test]
async fn test_connect_to_missing_server_fails() {
    let config = McpServerConfig::new(
        "ghost",
        "/nonexistent/migrant-mcp-server",
        vec![],
    );
    assert!(McpToolCollection::connect(config).await.is_err());
}

/// Interleaves its own requests and a notification before answering
/// `initialize`, and logs every line it receives to `$1`.
#[cfg(unix)]
const CHATTY_SERVER: &str = r#"
read -r line; printf '%s\n' "$line" >> "$1"
printf '%s\n' '{"jsonrpc":"2.0","id":1,"method":"roots/list"}'
printf '%s\n' '{"jsonrpc":"2.0","id":"srv-ping","method":"ping"}'
printf '%s\n' '{"jsonrpc":"2.0","method":"notifications/message","params":{"level":"info"}}'
printf '%s\n' '{"jsonrpc":"2.0","id":1,"result":{"protocolVersion":"2024-11-05","capabilities":{},"serverInfo":{"name":"chatty","version":"0.1"}}}'
while read -r line; do
  printf '%s\n' "$line" >> "$1"
  case "$line" in
    *'"tools/list"'*) printf '%s\n' '{"jsonrpc":"2.0","id":2,"result":{"tools":[{"name":"analyzeProject","description":"Analyze","inputSchema":{"type":"object","properties":{}}}]}}' ;;
  esac
done
"#;

#[cfg(unix)]
#[tokio::test]
async fn test_server_requests_do_not_hijack_pending_responses() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("received.log");
    let mut config = McpServerConfig::new(
        "chatty",
        "sh",
        vec![
            "-c".to_string(),
            CHATTY_SERVER.to_string(),
            "sh".to_string(),
            log.display().to_string(),
        ],
    );
    config.request_timeout_ms = Some(5_000);

    let collection = McpToolCollection::connect(config).await.unwrap();
    let info = collection.client().server_info().await.unwrap();
    assert_eq!(info.name, "chatty");

    let tools = collection.list_tools().await.unwrap();
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].name, "analyzeProject");

    let received = std::fs::read_to_string(&log).unwrap();
    assert!(received
        .lines()
        .any(|l| l.contains("\"id\":1") && l.contains("\"code\":-32601")));
    assert!(received
        .lines()
        .any(|l| l == r#"{"jsonrpc":"2.0","id":"srv-ping","result":{}}"#));

    collection.client().disconnect().await.unwrap();
}
