use super::action::Action;
use super::config::AgentConfig;
use super::memory::Context;
use super::parser::{ParseError, ResponseParser};
use super::workflow::WorkflowTracker;
use crate::llm::LanguageModel;
use crate::tools::ToolRegistry;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Error, Debug)]
pub enum DecisionError {
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("No recipe_id available for {apply_tool}; run {plan_tool} first")]
    MissingRecipeIdForApply {
        apply_tool: String,
        plan_tool: String,
    },

    /// The model worker task panicked or was cancelled
    #[error("Model worker failed: {0}")]
    Worker(String),
}

impl DecisionError {
    /// Everything except a failed worker is reported to the model as text
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, DecisionError::Worker(_))
    }
}

/// Asks the model for the next action and validates it
pub struct DecisionEngine {
    model: Arc<dyn LanguageModel>,
    registry: Arc<ToolRegistry>,
    parser: ResponseParser,
    config: AgentConfig,
}

impl DecisionEngine {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        registry: Arc<ToolRegistry>,
        config: AgentConfig,
    ) -> Self {
        let parser = ResponseParser::new(&registry);
        Self {
            model,
            registry,
            parser,
            config,
        }
    }

    pub fn parser(&self) -> &ResponseParser {
        &self.parser
    }

    /// Full prompt for one turn
    pub fn build_prompt(&self, context: &Context, tracker: &WorkflowTracker, query: &str) -> String {
        let prefs = context.preferences();
        let plan_tool = &self.config.plan_tool;
        let apply_tool = &self.config.apply_tool;

        let recipe_hint = match context.recipe_id() {
            Some(id) => format!("known ({})", id),
            None => format!("not yet known; run {} first", plan_tool),
        };

        format!(
            "You are a Java migration assistant that analyzes Maven projects and drives their upgrade.\n\
             \n\
             Current User Preferences:\n\
             - Project Path: {path}\n\
             - Migration Type: {kind}\n\
             - Release Type: {channel}\n\
             \n\
             Available tools:\n\
             {tools}\n\
             \n\
             Workflow progress:\n\
             - Steps: {steps}\n\
             - Last completed step: {last}\n\
             - Expected next step: {next}\n\
             - Recipe ID: {recipe}\n\
             \n\
             You must respond with EXACTLY ONE line in one of these formats:\n\
             1. For function calls:\n   FUNCTION_CALL: function_name|param1=value1|param2=value2|...\n\
             2. For final answers:\n   FINAL_ANSWER: [your response]\n\
             \n\
             IMPORTANT:\n\
             - No additional text or explanations\n\
             - One response per iteration\n\
             - Use EXACT function names as shown in the tools list\n\
             - Use recipe_id=[from_migration_plan] to pass the recipe selected by {plan_tool}\n\
             \n\
             Example responses:\n\
             FUNCTION_CALL: {first}\n\
             FUNCTION_CALL: {plan_tool}\n\
             FUNCTION_CALL: {apply_tool}|recipe_id=[from_migration_plan]\n\
             FINAL_ANSWER: [Migration completed successfully]\n\
             \n\
             Query: {query}",
            path = prefs.project_path.display(),
            kind = prefs.migration_kind,
            channel = prefs.release_channel,
            tools = self.registry.describe(),
            steps = tracker.steps().join(" -> "),
            last = tracker.last_completed().unwrap_or("none"),
            next = tracker.expected_step().unwrap_or("none (workflow complete)"),
            recipe = recipe_hint,
            first = tracker.steps().first().map(String::as_str).unwrap_or("analyzeProject"),
            plan_tool = plan_tool,
            apply_tool = apply_tool,
            query = query,
        )
    }

    /// Decide the next action.
    ///
    /// Recoverable failures come back as a `FinalAnswer` describing the
    /// problem; only a failed model worker is returned as `Err`.
    pub async fn decide(
        &self,
        context: &Context,
        tracker: &mut WorkflowTracker,
        query: &str,
    ) -> Result<Action, DecisionError> {
        match self.try_decide(context, tracker, query).await {
            Ok(action) => Ok(action),
            Err(e) if e.is_recoverable() => {
                warn!(target: "agent.decision", error = %e, "Decision failed; answering with error");
                Ok(Action::final_answer(format!("Error in decision making: {}", e)))
            }
            Err(e) => {
                error!(target: "agent.decision", error = %e, "Model worker failed");
                Err(e)
            }
        }
    }

    async fn try_decide(
        &self,
        context: &Context,
        tracker: &mut WorkflowTracker,
        query: &str,
    ) -> Result<Action, DecisionError> {
        let prompt = self.build_prompt(context, tracker, query);
        debug!(target: "agent.decision", prompt_len = prompt.len(), "Sending prompt to model");

        let text = self.ask_model(prompt).await?;
        info!(target: "agent.decision", response = %text, "Model responded");

        let action = self.parser.parse(&text, context)?;

        if let Action::FunctionCall { tool_name, .. } = &action {
            if *tool_name == self.config.apply_tool && context.recipe_id().is_none() {
                return Err(DecisionError::MissingRecipeIdForApply {
                    apply_tool: self.config.apply_tool.clone(),
                    plan_tool: self.config.plan_tool.clone(),
                });
            }
            tracker.record_step(tool_name);
        }

        Ok(action)
    }

    /// Run the model call on its own task, bounded by the configured timeout.
    /// On timeout the task is aborted and its result discarded.
    async fn ask_model(&self, prompt: String) -> Result<String, DecisionError> {
        let timeout = self.config.llm_timeout();
        let model = Arc::clone(&self.model);
        let mut handle = tokio::spawn(async move { model.generate(&prompt, timeout).await });

        match tokio::time::timeout(timeout, &mut handle).await {
            Ok(Ok(Ok(text))) => Ok(text),
            Ok(Ok(Err(e))) => Err(DecisionError::ModelUnavailable(e.to_string())),
            Ok(Err(join)) => Err(DecisionError::Worker(join.to_string())),
            Err(_) => {
                handle.abort();
                Err(DecisionError::ModelUnavailable(format!(
                    "no response within {:?}",
                    timeout
                )))
            }
        }
    }
}
