use crate::analysis::{AnalysisError, AnalysisReport, MavenAnalyzer, RecipeCatalog};
use crate::tools::{ParamType, ToolCollection, ToolDescriptor, ToolError, ToolOutput, ToolResult};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{info, warn};

pub const ANALYZE_PROJECT: &str = "analyzeProject";
pub const MIGRATION_PLAN: &str = "migrationPlan";

/// Project analysis and migration planning tools
pub struct ProjectTools {
    default_project: PathBuf,
    analyzer: MavenAnalyzer,
    catalog: RecipeCatalog,
}

impl ProjectTools {
    pub fn new(
        default_project: impl Into<PathBuf>,
        analyzer: MavenAnalyzer,
        catalog: RecipeCatalog,
    ) -> Self {
        Self {
            default_project: default_project.into(),
            analyzer,
            catalog,
        }
    }

    fn project_path(&self, arguments: &Option<BTreeMap<String, String>>) -> PathBuf {
        arguments
            .as_ref()
            .and_then(|args| args.get("project_path"))
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| self.default_project.clone())
    }

    async fn analyze_project(&self, path: PathBuf) -> ToolOutput {
        match self.analyzer.analyze(&path).await {
            Ok(report) => success_payload(&report),
            Err(e) => failure(e),
        }
    }

    async fn migration_plan(&self, path: PathBuf) -> ToolOutput {
        let report = match self.analyzer.analyze(&path).await {
            Ok(report) => report,
            Err(e) => return failure(e),
        };

        if !report.needs_upgrade() {
            return ToolOutput::failed(json!({
                "success": false,
                "error": format!(
                    "No migration needed: project is on Java {} and Spring Boot {}",
                    report.jdk_version.as_deref().unwrap_or("unknown"),
                    report.spring_boot_version.as_deref().unwrap_or("not used"),
                ),
            }));
        }

        match self.catalog.select(&report) {
            Some(selected) => {
                info!(
                    target: "project_tools",
                    recipe = %selected.recipe_id,
                    "Selected migration recipe"
                );
                ToolOutput::ok(plan_payload(&report, &selected))
            }
            None => {
                warn!(
                    target: "project_tools",
                    goals = ?report.upgrade_goals(),
                    "No recipe matches the upgrade goals"
                );
                ToolOutput::failed(json!({
                    "success": false,
                    "error": "No suitable migration recipe found",
                }))
            }
        }
    }
}

fn plan_payload(report: &AnalysisReport, selected: &crate::analysis::RecipeMatch) -> Value {
    json!({
        "success": true,
        "recipe": selected,
        "current_jdk": report.jdk_version,
        "target_jdk": report.latest_java_version,
        "current_spring_boot": report.spring_boot_version,
        "target_spring_boot": report.latest_spring_boot_version,
        "conditions_matched": report.conditions_matched,
        "project_path": report.project_path,
    })
}

/// Serialize `value` as a successful result tagged with `"success": true`
fn success_payload<T: Serialize>(value: &T) -> ToolOutput {
    match serde_json::to_value(value) {
        Ok(mut payload) => {
            if let Value::Object(map) = &mut payload {
                map.insert("success".to_string(), Value::Bool(true));
            }
            ToolOutput::ok(payload)
        }
        Err(e) => {
            warn!(target: "project_tools", error = %e, "Failed to encode analysis report");
            ToolOutput::failed(json!({
                "success": false,
                "error": format!("Failed to encode analysis report: {}", e),
            }))
        }
    }
}

fn failure(err: AnalysisError) -> ToolOutput {
    warn!(target: "project_tools", error = %err, "Project analysis failed");
    ToolOutput::failed(json!({
        "success": false,
        "error": err.to_string(),
    }))
}

#[async_trait]
impl ToolCollection for ProjectTools {
    fn name(&self) -> String {
        "project".to_string()
    }

    async fn list_tools(&self) -> ToolResult<Vec<ToolDescriptor>> {
        Ok(vec![
            ToolDescriptor::new(
                ANALYZE_PROJECT,
                "Analyze a Maven project to identify its JDK version, Spring Boot version and dependencies",
            )
            .with_param("project_path", ParamType::String),
            ToolDescriptor::new(
                MIGRATION_PLAN,
                "Generate a migration plan and select the upgrade recipe for the project",
            )
            .with_param("project_path", ParamType::String),
        ])
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Option<BTreeMap<String, String>>,
    ) -> ToolResult<ToolOutput> {
        let path = self.project_path(&arguments);
        match name {
            ANALYZE_PROJECT => Ok(self.analyze_project(path).await),
            MIGRATION_PLAN => Ok(self.migration_plan(path).await),
            other => Err(ToolError::NotFound(other.to_string())),
        }
    }
}
