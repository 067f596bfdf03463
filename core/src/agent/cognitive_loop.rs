use super::action::{is_final_report, Action};
use super::config::AgentConfig;
use super::decision::{DecisionEngine, DecisionError};
use super::dispatcher::ActionDispatcher;
use super::memory::{extract_recipe_id, recipe_id_from_payload, Context, LAST_RESULT};
use super::workflow::WorkflowTracker;
use crate::llm::LanguageModel;
use crate::preferences::Preferences;
use crate::tools::ToolRegistry;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Result reported when the iteration budget runs out
pub const MAX_ITERATIONS_MESSAGE: &str =
    "[Maximum iterations reached. Please review the migration progress.]";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopState {
    Running,
    Done,
}

/// Everything a finished run leaves behind
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub state: LoopState,
    /// Last report line, always starting with `FINAL_ANSWER:`
    pub result: String,
    pub iterations: usize,
    /// Every report line in order, including a synthesized budget report
    pub reports: Vec<String>,
    pub context: Context,
    pub budget_exhausted: bool,
}

/// Drives decide -> dispatch -> remember until a final answer or the
/// iteration budget is reached. One run at a time; nothing is shared
/// between runs except the read-only registry.
pub struct CognitiveLoop {
    engine: DecisionEngine,
    dispatcher: ActionDispatcher,
    config: AgentConfig,
}

impl CognitiveLoop {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        registry: Arc<ToolRegistry>,
        config: AgentConfig,
    ) -> Self {
        let engine = DecisionEngine::new(model, Arc::clone(&registry), config.clone());
        let dispatcher = ActionDispatcher::new(registry);
        Self {
            engine,
            dispatcher,
            config,
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn engine(&self) -> &DecisionEngine {
        &self.engine
    }

    /// First request of a run
    pub fn opening_query(preferences: &Preferences) -> String {
        format!(
            "Analyze project at {path}. Then create a migration plan for a {kind} upgrade \
             on the {channel} release channel, and finally apply the selected recipe.",
            path = preferences.project_path.display(),
            kind = preferences.migration_kind,
            channel = preferences.release_channel,
        )
    }

    /// Follow-up request embedding the previous report
    pub fn continuation_query(report: &str) -> String {
        format!(
            "Previous action: {}\nWhat should I do next to continue the migration process?",
            report
        )
    }

    pub async fn run(&self, preferences: Preferences) -> Result<RunOutcome, DecisionError> {
        self.run_with(preferences, |_| {}).await
    }

    /// Run to completion, handing each report line to `on_report` as it is produced
    pub async fn run_with<F>(
        &self,
        preferences: Preferences,
        mut on_report: F,
    ) -> Result<RunOutcome, DecisionError>
    where
        F: FnMut(&str),
    {
        let mut context = Context::new(preferences);
        let mut tracker = WorkflowTracker::new(self.config.workflow_steps.iter().cloned());
        let mut query = Self::opening_query(context.preferences());
        let mut reports = Vec::new();
        let mut iterations = 0;

        info!(
            target: "agent.loop",
            project = %context.preferences().project_path.display(),
            max_iterations = self.config.max_iterations,
            "Starting migration run"
        );

        while iterations < self.config.max_iterations {
            iterations += 1;
            info!(target: "agent.loop", iteration = iterations, "Iteration");
            debug!(target: "agent.loop", query = %query, "Query");

            let action = match self.engine.decide(&context, &mut tracker, &query).await {
                Ok(action) => action,
                Err(e) => {
                    error!(
                        target: "agent.loop",
                        iteration = iterations,
                        error = %e,
                        "Run failed"
                    );
                    return Err(e);
                }
            };
            let dispatch = self.dispatcher.dispatch(&action).await;
            let report = dispatch.report;
            on_report(&report);

            context.set_last_action(report.clone());
            if let Some(payload) = dispatch.payload {
                let recipe_id = recipe_id_from_payload(&payload);
                context.set(LAST_RESULT, payload);
                if let Some(id) = recipe_id {
                    info!(target: "agent.loop", recipe_id = %id, "Recipe selected");
                    context.set_recipe_id(id);
                }
            } else if let Some(id) = extract_recipe_id(&report) {
                context.set_recipe_id(id);
            }
            reports.push(report.clone());

            if is_final_report(&report) {
                info!(target: "agent.loop", iterations, result = %report, "Run finished");
                return Ok(RunOutcome {
                    state: LoopState::Done,
                    result: report,
                    iterations,
                    reports,
                    context,
                    budget_exhausted: false,
                });
            }
            query = Self::continuation_query(&report);
        }

        let result = Action::final_answer(MAX_ITERATIONS_MESSAGE).to_string();
        warn!(
            target: "agent.loop",
            iterations,
            "Maximum iterations reached"
        );
        on_report(&result);
        reports.push(result.clone());
        Ok(RunOutcome {
            state: LoopState::Done,
            result,
            iterations,
            reports,
            context,
            budget_exhausted: true,
        })
    }
}
