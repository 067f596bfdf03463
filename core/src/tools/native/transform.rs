use crate::tools::{ParamType, ToolCollection, ToolDescriptor, ToolError, ToolOutput, ToolResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::{debug, info, warn};

pub const MOD_BUILD_ALL: &str = "modBuildAll";
pub const MOD_UPGRADE_ALL: &str = "modUpgradeAll";
pub const MOD_APPLY_UPGRADE_ALL: &str = "modApplyUpgradeAll";

/// How to launch the code-transformation CLI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformCliConfig {
    pub program: String,
    /// Arguments placed before the operation (e.g. `-jar moderne-cli.jar`)
    #[serde(default)]
    pub prefix_args: Vec<String>,
}

impl Default for TransformCliConfig {
    /// `MIGRANT_TRANSFORM_CLI` holds the whole command line, e.g. `java -jar mod.jar`
    fn default() -> Self {
        std::env::var("MIGRANT_TRANSFORM_CLI")
            .ok()
            .and_then(|cmd| Self::from_command_line(&cmd))
            .unwrap_or_else(|| Self::new("mod", Vec::new()))
    }
}

impl TransformCliConfig {
    pub fn new(program: impl Into<String>, prefix_args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            prefix_args,
        }
    }

    pub fn from_command_line(command: &str) -> Option<Self> {
        let mut parts = command.split_whitespace().map(String::from);
        let program = parts.next()?;
        Some(Self::new(program, parts.collect()))
    }
}

/// Build, upgrade and apply operations backed by the transform CLI
pub struct TransformTools {
    cli: TransformCliConfig,
    project: PathBuf,
}

impl TransformTools {
    pub fn new(cli: TransformCliConfig, project: impl Into<PathBuf>) -> Self {
        Self {
            cli,
            project: project.into(),
        }
    }

    async fn run(&self, operation: &str, args: Vec<String>) -> ToolResult<ToolOutput> {
        let command_line = std::iter::once(self.cli.program.as_str())
            .chain(self.cli.prefix_args.iter().map(String::as_str))
            .chain(args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ");
        info!(target: "transform_tools", operation = %operation, command = %command_line, "Running transform CLI");

        let output = Command::new(&self.cli.program)
            .args(&self.cli.prefix_args)
            .args(&args)
            .output()
            .await
            .map_err(|e| {
                ToolError::ExecutionFailed(format!("Failed to run '{}': {}", self.cli.program, e))
            })?;

        let exit_code = output.status.code();
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        debug!(target: "transform_tools", operation = %operation, exit_code = ?exit_code, "Transform CLI exited");

        if output.status.success() {
            return Ok(ToolOutput::ok(json!({
                "success": true,
                "exit_code": exit_code,
                "stdout": stdout,
                "stderr": stderr,
            })));
        }

        warn!(target: "transform_tools", operation = %operation, exit_code = ?exit_code, "Transform CLI failed");
        let reason = match stderr.trim() {
            "" => format!(
                "{} exited with status {}",
                operation,
                exit_code.map_or_else(|| "unknown".to_string(), |c| c.to_string())
            ),
            text => text.to_string(),
        };
        Ok(ToolOutput::failed(json!({
            "success": false,
            "exit_code": exit_code,
            "stdout": stdout,
            "stderr": stderr,
            "error": reason,
        })))
    }
}

#[async_trait]
impl ToolCollection for TransformTools {
    fn name(&self) -> String {
        "transform".to_string()
    }

    async fn list_tools(&self) -> ToolResult<Vec<ToolDescriptor>> {
        Ok(vec![
            ToolDescriptor::new(MOD_BUILD_ALL, "Build the transformation model (LST) of the project"),
            ToolDescriptor::new(
                MOD_UPGRADE_ALL,
                "Run an upgrade recipe against the project; use [from_migration_plan] for the planned recipe",
            )
            .with_param("recipe_id", ParamType::String),
            ToolDescriptor::new(
                MOD_APPLY_UPGRADE_ALL,
                "Apply the changes produced by the last recipe run to the working tree",
            ),
        ])
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Option<BTreeMap<String, String>>,
    ) -> ToolResult<ToolOutput> {
        let project = self.project.display().to_string();
        match name {
            MOD_BUILD_ALL => self.run(name, vec!["build".to_string(), project]).await,
            MOD_UPGRADE_ALL => {
                let recipe = arguments
                    .as_ref()
                    .and_then(|args| args.get("recipe_id"))
                    .filter(|r| !r.trim().is_empty())
                    .ok_or_else(|| ToolError::InvalidArguments("Missing 'recipe_id'".to_string()))?;
                self.run(
                    name,
                    vec![
                        "run".to_string(),
                        project,
                        "--recipe".to_string(),
                        recipe.clone(),
                    ],
                )
                .await
            }
            MOD_APPLY_UPGRADE_ALL => {
                self.run(
                    name,
                    vec![
                        "git".to_string(),
                        "apply".to_string(),
                        project,
                        "--last-recipe-run".to_string(),
                    ],
                )
                .await
            }
            other => Err(ToolError::NotFound(other.to_string())),
        }
    }
}
