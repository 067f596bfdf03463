//! End-to-end tests for the cognitive loop with a scripted model.

use async_trait::async_trait;
use migrant_core::agent::{AgentConfig, CognitiveLoop, DecisionError, LoopState};
use migrant_core::llm::{LanguageModel, LlmError};
use migrant_core::preferences::{MigrationKind, Preferences, ReleaseChannel};
use migrant_core::tools::{
    ToolCollection, ToolDescriptor, ToolError, ToolOutput, ToolRegistry, ToolResult,
};
use serde_json::{json, Value};
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============================================================================
// Test Helpers
// ============================================================================

/// Replays canned responses in order; an exhausted script is an error
struct ScriptedModel {
    turns: Mutex<VecDeque<Result<String, String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    fn new(turns: &[&str]) -> Self {
        Self {
            turns: Mutex::new(turns.iter().map(|t| Ok(t.to_string())).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn failing(message: &str) -> Self {
        Self {
            turns: Mutex::new(VecDeque::from([Err(message.to_string())])),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn generate(&self, prompt: &str, _timeout: Duration) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match self.turns.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(LlmError::Http(message)),
            None => Err(LlmError::InvalidResponse("script exhausted".to_string())),
        }
    }
}

/// Repeats the same response forever
struct RepeatingModel(&'static str);

#[async_trait]
impl LanguageModel for RepeatingModel {
    async fn generate(&self, _prompt: &str, _timeout: Duration) -> Result<String, LlmError> {
        Ok(self.0.to_string())
    }
}

struct PanickingModel;

#[async_trait]
impl LanguageModel for PanickingModel {
    async fn generate(&self, _prompt: &str, _timeout: Duration) -> Result<String, LlmError> {
        panic!("model worker crashed")
    }
}

type Call = (String, Option<BTreeMap<String, String>>);

/// Tool collection answering from a fixed table and recording every call
struct FakeCollection {
    name: &'static str,
    responses: BTreeMap<&'static str, ToolOutput>,
    calls: Mutex<Vec<Call>>,
}

impl FakeCollection {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            responses: BTreeMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn with_tool(mut self, tool: &'static str, output: ToolOutput) -> Self {
        self.responses.insert(tool, output);
        self
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ToolCollection for FakeCollection {
    fn name(&self) -> String {
        self.name.to_string()
    }

    async fn list_tools(&self) -> ToolResult<Vec<ToolDescriptor>> {
        Ok(self
            .responses
            .keys()
            .map(|name| ToolDescriptor::new(*name, format!("{} tool", name)))
            .collect())
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Option<BTreeMap<String, String>>,
    ) -> ToolResult<ToolOutput> {
        self.calls
            .lock()
            .unwrap()
            .push((name.to_string(), arguments));
        self.responses
            .get(name)
            .cloned()
            .ok_or_else(|| ToolError::NotFound(name.to_string()))
    }
}

fn preferences() -> Preferences {
    Preferences::new("/proj", MigrationKind::Java, ReleaseChannel::Stable)
}

fn project_tools() -> Arc<FakeCollection> {
    Arc::new(
        FakeCollection::new("project")
            .with_tool(
                "analyzeProject",
                ToolOutput::ok(json!({"success": true, "jdk_version": "8"})),
            )
            .with_tool(
                "migrationPlan",
                ToolOutput::ok(json!({
                    "success": true,
                    "recipe": {"recipe_id": "X", "recipe_name": "Upgrade", "match_type": "exact"}
                })),
            ),
    )
}

fn transform_tools() -> Arc<FakeCollection> {
    Arc::new(
        FakeCollection::new("transform")
            .with_tool("modUpgradeAll", ToolOutput::ok(json!({"exit_code": 0}))),
    )
}

async fn registry(
    project: &Arc<FakeCollection>,
    transform: &Arc<FakeCollection>,
) -> Arc<ToolRegistry> {
    let collections: Vec<Arc<dyn ToolCollection>> = vec![project.clone(), transform.clone()];
    Arc::new(ToolRegistry::build(collections).await.unwrap())
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_full_migration_scenario() {
    let project = project_tools();
    let transform = transform_tools();
    let model = Arc::new(ScriptedModel::new(&[
        "FUNCTION_CALL: analyzeProject",
        "FUNCTION_CALL: migrationPlan",
        "FUNCTION_CALL: modUpgradeAll|recipe_id=[from_migration_plan]",
        "FINAL_ANSWER: [Migration completed successfully]",
    ]));

    let agent = CognitiveLoop::new(
        model.clone(),
        registry(&project, &transform).await,
        AgentConfig::default(),
    );
    let mut streamed = Vec::new();
    let outcome = agent
        .run_with(preferences(), |line| streamed.push(line.to_string()))
        .await
        .unwrap();

    assert_eq!(outcome.state, LoopState::Done);
    assert_eq!(outcome.iterations, 4);
    assert!(!outcome.budget_exhausted);
    assert_eq!(
        outcome.reports,
        vec![
            "FUNCTION_CALL: analyzeProject",
            "FUNCTION_CALL: migrationPlan",
            "FUNCTION_CALL: modUpgradeAll|recipe_id=X",
            "FINAL_ANSWER: [Migration completed successfully]",
        ]
    );
    assert_eq!(streamed, outcome.reports);
    assert_eq!(
        outcome.result,
        "FINAL_ANSWER: [Migration completed successfully]"
    );
    assert_eq!(outcome.context.recipe_id(), Some("X"));

    let upgrade_calls = transform.calls();
    assert_eq!(upgrade_calls.len(), 1);
    assert_eq!(upgrade_calls[0].0, "modUpgradeAll");
    assert_eq!(
        upgrade_calls[0].1.as_ref().unwrap().get("recipe_id").map(String::as_str),
        Some("X")
    );

    // Parameterless calls reach the collection without arguments
    assert_eq!(project.calls()[0], ("analyzeProject".to_string(), None));

    let prompts = model.prompts();
    assert!(prompts[0].contains("Query: Analyze project at /proj."));
    assert!(prompts[1].contains("Previous action: FUNCTION_CALL: analyzeProject"));
    assert!(prompts[3].contains("Recipe ID: known (X)"));
}

#[tokio::test]
async fn test_apply_before_plan_is_refused() {
    let project = project_tools();
    let transform = transform_tools();
    let model = Arc::new(ScriptedModel::new(&["FUNCTION_CALL: modUpgradeAll|recipe_id=Z"]));

    let agent = CognitiveLoop::new(
        model,
        registry(&project, &transform).await,
        AgentConfig::default(),
    );
    let outcome = agent.run(preferences()).await.unwrap();

    assert_eq!(outcome.iterations, 1);
    assert_eq!(
        outcome.result,
        "FINAL_ANSWER: Error in decision making: No recipe_id available for modUpgradeAll; run migrationPlan first"
    );
    assert!(transform.calls().is_empty());
}

#[tokio::test]
async fn test_placeholder_without_plan_is_refused() {
    let project = project_tools();
    let transform = transform_tools();
    let model = Arc::new(ScriptedModel::new(&[
        "FUNCTION_CALL: mod_upgrade_all|recipe_id=[from_migration_plan]",
    ]));

    let agent = CognitiveLoop::new(
        model,
        registry(&project, &transform).await,
        AgentConfig::default(),
    );
    let outcome = agent.run(preferences()).await.unwrap();

    assert!(outcome
        .result
        .starts_with("FINAL_ANSWER: Error in decision making: No recipe_id available"));
    assert!(transform.calls().is_empty());
}

#[tokio::test]
async fn test_budget_bounds_the_run() {
    let project = project_tools();
    let transform = transform_tools();

    let agent = CognitiveLoop::new(
        Arc::new(RepeatingModel("FUNCTION_CALL: analyzeProject")),
        registry(&project, &transform).await,
        AgentConfig::default(),
    );
    let outcome = agent.run(preferences()).await.unwrap();

    assert_eq!(outcome.state, LoopState::Done);
    assert!(outcome.budget_exhausted);
    assert_eq!(outcome.iterations, 4);
    assert_eq!(outcome.reports.len(), 5);
    assert_eq!(project.calls().len(), 4);
    assert_eq!(
        outcome.result,
        "FINAL_ANSWER: [Maximum iterations reached. Please review the migration progress.]"
    );
}

#[tokio::test]
async fn test_model_failure_ends_run_with_answer() {
    let project = project_tools();
    let transform = transform_tools();

    let agent = CognitiveLoop::new(
        Arc::new(ScriptedModel::failing("connection refused")),
        registry(&project, &transform).await,
        AgentConfig::default(),
    );
    let outcome = agent.run(preferences()).await.unwrap();

    assert_eq!(outcome.iterations, 1);
    assert!(outcome
        .result
        .starts_with("FINAL_ANSWER: Error in decision making: Model unavailable"));
    assert!(project.calls().is_empty());
}

#[tokio::test]
async fn test_failed_tool_ends_run() {
    let project = Arc::new(
        FakeCollection::new("project")
            .with_tool("analyzeProject", ToolOutput::ok(json!({"success": true})))
            .with_tool(
                "migrationPlan",
                ToolOutput::failed(json!({
                    "success": false,
                    "error": "No suitable migration recipe found"
                })),
            ),
    );
    let transform = transform_tools();
    let model = Arc::new(ScriptedModel::new(&[
        "FUNCTION_CALL: analyzeProject",
        "FUNCTION_CALL: migrationPlan",
    ]));

    let agent = CognitiveLoop::new(
        model,
        registry(&project, &transform).await,
        AgentConfig::default(),
    );
    let outcome = agent.run(preferences()).await.unwrap();

    assert_eq!(outcome.iterations, 2);
    assert_eq!(
        outcome.result,
        "FINAL_ANSWER: Error - migrationPlan failed: No suitable migration recipe found"
    );
    assert_eq!(outcome.context.recipe_id(), None);
    assert_eq!(
        outcome.context.last_result(),
        Some(&json!({"success": false, "error": "No suitable migration recipe found"}))
    );
}

#[tokio::test]
async fn test_recipe_id_survives_later_steps() {
    let project = project_tools();
    let transform = transform_tools();
    let model = Arc::new(ScriptedModel::new(&[
        "FUNCTION_CALL: migrationPlan",
        "FUNCTION_CALL: analyzeProject",
        "FINAL_ANSWER: done",
    ]));

    let agent = CognitiveLoop::new(
        model,
        registry(&project, &transform).await,
        AgentConfig::default(),
    );
    let outcome = agent.run(preferences()).await.unwrap();

    assert_eq!(outcome.context.recipe_id(), Some("X"));
    assert_eq!(outcome.context.last_action(), Some("FINAL_ANSWER: done"));
    assert_eq!(
        outcome.context.last_result().and_then(|v| v.get("jdk_version")),
        Some(&Value::String("8".to_string()))
    );
}

#[tokio::test]
async fn test_worker_panic_is_fatal() {
    let project = project_tools();
    let transform = transform_tools();

    let agent = CognitiveLoop::new(
        Arc::new(PanickingModel),
        registry(&project, &transform).await,
        AgentConfig::default(),
    );
    let result = agent.run(preferences()).await;

    assert!(matches!(result, Err(DecisionError::Worker(_))));
}

#[tokio::test]
async fn test_duplicate_tool_names_are_rejected() {
    let first: Arc<dyn ToolCollection> = project_tools();
    let second: Arc<dyn ToolCollection> = Arc::new(
        FakeCollection::new("other").with_tool("migrationPlan", ToolOutput::ok(json!({}))),
    );

    let err = ToolRegistry::build(vec![first, second]).await.err().unwrap();
    assert_eq!(
        err.to_string(),
        "Tool 'migrationPlan' is advertised by both 'project' and 'other'"
    );
}
