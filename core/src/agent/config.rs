//! Configuration for the migration agent.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for one cognitive loop run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Maximum number of decide/dispatch iterations
    pub max_iterations: usize,

    /// Timeout for each model call in milliseconds
    pub llm_timeout_ms: u64,

    /// Tool that applies a recipe; never called before a recipe id is known
    pub apply_tool: String,

    /// Tool whose result carries the selected recipe
    pub plan_tool: String,

    /// Expected order of tool calls, used to annotate prompts
    pub workflow_steps: Vec<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: 4,
            llm_timeout_ms: 10_000,
            apply_tool: "modUpgradeAll".to_string(),
            plan_tool: "migrationPlan".to_string(),
            workflow_steps: vec![
                "analyzeProject".to_string(),
                "migrationPlan".to_string(),
                "modUpgradeAll".to_string(),
            ],
        }
    }
}

impl AgentConfig {
    pub fn llm_timeout(&self) -> Duration {
        Duration::from_millis(self.llm_timeout_ms)
    }

    /// Set the max iterations
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    /// Set the model call timeout
    pub fn with_llm_timeout(mut self, timeout: Duration) -> Self {
        self.llm_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_apply_tool(mut self, name: impl Into<String>) -> Self {
        self.apply_tool = name.into();
        self
    }

    pub fn with_plan_tool(mut self, name: impl Into<String>) -> Self {
        self.plan_tool = name.into();
        self
    }

    pub fn with_workflow_steps<I, S>(mut self, steps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.workflow_steps = steps.into_iter().map(Into::into).collect();
        self
    }
}
