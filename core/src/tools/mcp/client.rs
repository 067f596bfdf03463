/// MCP client over stdio
///
/// Spawns the server process and speaks newline-delimited JSON-RPC 2.0 on its
/// stdin/stdout, correlating responses to requests by id.
use super::types::*;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::{oneshot, Mutex};
use tokio::time::{timeout, Duration};
use tracing::{debug, error, info, warn};

type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<JsonRpcResponse>>>>;
type SharedStdin = Arc<Mutex<Option<ChildStdin>>>;

/// JSON-RPC "method not found"
const METHOD_NOT_FOUND: i32 = -32601;

/// MCP client for communicating with a single MCP server
pub struct McpClient {
    config: McpServerConfig,
    process: Mutex<Option<Child>>,
    /// Shared with the reader, which answers server-initiated requests
    stdin: SharedStdin,
    request_id: AtomicU64,
    /// request_id -> response channel
    pending: PendingMap,
    server_info: Mutex<Option<ServerInfo>>,
}

impl McpClient {
    pub fn new(config: McpServerConfig) -> Self {
        Self {
            config,
            process: Mutex::new(None),
            stdin: Arc::new(Mutex::new(None)),
            request_id: AtomicU64::new(1),
            pending: Arc::new(Mutex::new(HashMap::new())),
            server_info: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &McpServerConfig {
        &self.config
    }

    /// Start the server process and run the initialize handshake
    pub async fn connect(&self) -> Result<(), McpError> {
        self.config.validate_protocol_version()?;

        info!(
            target: "mcp_client",
            server = %self.config.name,
            command = %self.config.command,
            "Connecting to MCP server"
        );

        let mut cmd = Command::new(&self.config.command);
        cmd.args(&self.config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        if let Some(ref env) = self.config.env {
            cmd.envs(env);
        }
        if let Some(ref cwd) = self.config.cwd {
            cmd.current_dir(cwd);
        }

        let mut child = cmd.spawn().map_err(|e| {
            error!(target: "mcp_client", error = %e, "Failed to spawn MCP server process");
            McpError::Transport(format!("Failed to spawn process: {}", e))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| McpError::Transport("Failed to capture stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| McpError::Transport("Failed to capture stdout".to_string()))?;

        *self.stdin.lock().await = Some(stdin);
        *self.process.lock().await = Some(child);

        self.spawn_reader(stdout);

        let init = self.initialize().await?;
        self.notify("notifications/initialized", None).await?;

        info!(
            target: "mcp_client",
            server = %self.config.name,
            server_name = %init.server_info.name,
            protocol = %init.protocol_version,
            "MCP server connected"
        );
        *self.server_info.lock().await = Some(init.server_info);

        Ok(())
    }

    /// Close stdin and stop the server process
    pub async fn disconnect(&self) -> Result<(), McpError> {
        info!(target: "mcp_client", server = %self.config.name, "Disconnecting from MCP server");

        if let Some(mut stdin) = self.stdin.lock().await.take() {
            let _ = stdin.shutdown().await;
        }
        if let Some(mut child) = self.process.lock().await.take() {
            let _ = child.kill().await;
            let _ = child.wait().await;
        }
        self.pending.lock().await.clear();

        Ok(())
    }

    async fn initialize(&self) -> Result<InitializeResult, McpError> {
        let params = InitializeParams {
            protocol_version: self.config.protocol_version().to_string(),
            capabilities: ClientCapabilities::default(),
            client_info: ClientInfo {
                name: "migrant".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        let result = self.request("initialize", Some(json!(params))).await?;
        serde_json::from_value(result)
            .map_err(|e| McpError::Protocol(format!("Invalid initialize result: {}", e)))
    }

    /// List every tool, following pagination cursors
    pub async fn list_tools(&self) -> Result<Vec<McpTool>, McpError> {
        let mut all_tools = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let params = ListToolsParams { cursor };
            let result = self.request("tools/list", Some(json!(params))).await?;
            let page: ListToolsResult = serde_json::from_value(result)
                .map_err(|e| McpError::Protocol(format!("Invalid tools/list result: {}", e)))?;

            all_tools.extend(page.tools);
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        debug!(
            target: "mcp_client",
            server = %self.config.name,
            count = all_tools.len(),
            "Listed tools"
        );
        Ok(all_tools)
    }

    /// Call a tool; `arguments` is omitted from the request when `None`
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Option<Value>,
    ) -> Result<McpToolResult, McpError> {
        debug!(target: "mcp_client", server = %self.config.name, tool = %name, "Calling tool");

        let params = CallToolParams {
            name: name.to_string(),
            arguments,
        };
        let result = self.request("tools/call", Some(json!(params))).await?;
        let call: CallToolResult = serde_json::from_value(result)
            .map_err(|e| McpError::Protocol(format!("Invalid tools/call result: {}", e)))?;

        Ok(McpToolResult::from(call))
    }

    pub async fn server_info(&self) -> Option<ServerInfo> {
        self.server_info.lock().await.clone()
    }

    async fn write_line(&self, line: String) -> Result<(), McpError> {
        write_message(&self.stdin, &line).await
    }

    async fn notify(&self, method: &str, params: Option<Value>) -> Result<(), McpError> {
        let notification = JsonRpcNotification {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
        };
        self.write_line(serde_json::to_string(&notification)?).await
    }

    /// Send a request and wait for its response
    async fn request(&self, method: &str, params: Option<Value>) -> Result<Value, McpError> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id, tx);

        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: json!(id),
            method: method.to_string(),
            params,
        };

        if let Err(e) = self.write_line(serde_json::to_string(&request)?).await {
            self.pending.lock().await.remove(&id);
            error!(target: "mcp_client", method = %method, error = %e, "Failed to write request");
            return Err(e);
        }

        let wait = Duration::from_millis(self.config.request_timeout_ms());
        let response = match timeout(wait, rx).await {
            Ok(Ok(response)) => response,
            Ok(Err(_)) => {
                return Err(McpError::Transport("Response channel closed".to_string()));
            }
            Err(_) => {
                self.pending.lock().await.remove(&id);
                warn!(target: "mcp_client", method = %method, "Request timeout");
                return Err(McpError::Timeout);
            }
        };

        if let Some(error) = response.error {
            return Err(McpError::ServerError(format!(
                "{} (code: {})",
                error.message, error.code
            )));
        }

        response
            .result
            .ok_or_else(|| McpError::Protocol("Missing result in response".to_string()))
    }

    fn spawn_reader(&self, stdout: ChildStdout) {
        let pending = Arc::clone(&self.pending);
        let stdin = Arc::clone(&self.stdin);
        let server_name = self.config.name.clone();

        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();

            while let Ok(Some(line)) = lines.next_line().await {
                if line.trim().is_empty() {
                    continue;
                }

                let message: Value = match serde_json::from_str(&line) {
                    Ok(message) => message,
                    Err(e) => {
                        debug!(
                            target: "mcp_client",
                            server = %server_name,
                            error = %e,
                            line = %line,
                            "Ignoring non JSON-RPC line"
                        );
                        continue;
                    }
                };

                // Requests and notifications from the server share the id space
                // with our own requests, so route on `method` before `id`
                if let Some(method) = message.get("method").and_then(Value::as_str) {
                    let Some(id) = message.get("id").cloned() else {
                        debug!(target: "mcp_client", server = %server_name, method = %method, "Server notification");
                        continue;
                    };
                    let reply = reply_to_server_request(id, method);
                    let sent = match serde_json::to_string(&reply) {
                        Ok(text) => write_message(&stdin, &text).await,
                        Err(e) => Err(McpError::from(e)),
                    };
                    if let Err(e) = sent {
                        warn!(
                            target: "mcp_client",
                            server = %server_name,
                            method = %method,
                            error = %e,
                            "Failed to answer server request"
                        );
                    }
                    continue;
                }

                let response: JsonRpcResponse = match serde_json::from_value(message) {
                    Ok(response) => response,
                    Err(e) => {
                        debug!(
                            target: "mcp_client",
                            server = %server_name,
                            error = %e,
                            "Ignoring malformed response"
                        );
                        continue;
                    }
                };
                let Some(id) = response.id.as_u64() else {
                    continue;
                };
                if let Some(tx) = pending.lock().await.remove(&id) {
                    let _ = tx.send(response);
                } else {
                    warn!(
                        target: "mcp_client",
                        server = %server_name,
                        id = id,
                        "Received response for unknown request"
                    );
                }
            }

            // Dropping the senders wakes any waiters with a closed channel
            pending.lock().await.clear();
            debug!(target: "mcp_client", server = %server_name, "Stdout reader exited");
        });
    }
}

async fn write_message(stdin: &SharedStdin, line: &str) -> Result<(), McpError> {
    let mut guard = stdin.lock().await;
    let stdin = guard
        .as_mut()
        .ok_or_else(|| McpError::Transport("stdin not available".to_string()))?;

    stdin.write_all(line.as_bytes()).await?;
    stdin.write_all(b"\n").await?;
    stdin.flush().await?;
    Ok(())
}

/// Answer a request the server sent us. Only `ping` is supported; the agent
/// advertises no client capabilities, so anything else is unknown.
fn reply_to_server_request(id: Value, method: &str) -> JsonRpcResponse {
    if method == "ping" {
        return JsonRpcResponse {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(json!({})),
            error: None,
        };
    }
    JsonRpcResponse {
        jsonrpc: "2.0".to_string(),
        id,
        result: None,
        error: Some(JsonRpcError {
            code: METHOD_NOT_FOUND,
            message: format!("Method not found: {}", method),
            data: None,
        }),
    }
}
