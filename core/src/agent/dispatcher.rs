use super::action::{error_report, Action};
use crate::tools::ToolRegistry;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Outcome of dispatching one action
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    /// Single line starting with `FUNCTION_CALL:` or `FINAL_ANSWER:`
    pub report: String,
    /// Structured tool result, when a tool ran
    pub payload: Option<Value>,
}

impl Dispatch {
    fn text(report: String) -> Self {
        Self {
            report,
            payload: None,
        }
    }
}

/// Routes validated actions to the collection that owns the tool
#[derive(Clone)]
pub struct ActionDispatcher {
    registry: Arc<ToolRegistry>,
}

impl ActionDispatcher {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    /// Never fails: every problem is encoded as a `FINAL_ANSWER: Error - ...` report
    pub async fn dispatch(&self, action: &Action) -> Dispatch {
        let (tool_name, parameters) = match action {
            Action::FinalAnswer { .. } => return Dispatch::text(action.to_string()),
            Action::FunctionCall {
                tool_name,
                parameters,
            } => (tool_name, parameters),
        };

        let Some(owner) = self.registry.owner_of(tool_name) else {
            error!(target: "agent.dispatch", tool = %tool_name, "Unknown function");
            return Dispatch::text(error_report(&format!("Unknown function: {}", tool_name)));
        };
        info!(
            target: "agent.dispatch",
            tool = %tool_name,
            collection = %owner.name,
            "Dispatching tool call"
        );

        let arguments = (!parameters.is_empty()).then(|| parameters.clone());
        let output = match self.invoke(owner.collection.clone(), tool_name, arguments).await {
            Ok(output) => output,
            Err(message) => {
                error!(target: "agent.dispatch", tool = %tool_name, error = %message, "Tool call failed");
                return Dispatch::text(error_report(&format!(
                    "Error executing {}: {}",
                    tool_name, message
                )));
            }
        };

        if !output.success {
            warn!(
                target: "agent.dispatch",
                tool = %tool_name,
                result = %output.summary(),
                "Tool reported failure"
            );
            return Dispatch {
                report: error_report(&format!(
                    "{} failed: {}",
                    tool_name,
                    output.error_message()
                )),
                payload: Some(output.payload),
            };
        }

        info!(target: "agent.dispatch", tool = %tool_name, result = %output.summary(), "Tool execution result");
        Dispatch {
            report: action.to_string(),
            payload: Some(output.payload),
        }
    }

    /// Call the tool on its own task so that a panicking collection is
    /// reported like any other tool error
    async fn invoke(
        &self,
        collection: Arc<dyn crate::tools::ToolCollection>,
        tool_name: &str,
        arguments: Option<BTreeMap<String, String>>,
    ) -> Result<crate::tools::ToolOutput, String> {
        let name = tool_name.to_string();
        let task = tokio::spawn(async move { collection.call_tool(&name, arguments).await });
        match task.await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(e.to_string()),
            Err(join) => Err(format!("tool task failed: {}", join)),
        }
    }
}
