//! Migration agent: turns model output into validated tool calls.
//!
//! A [`CognitiveLoop`] asks the [`DecisionEngine`] for the next [`Action`],
//! hands it to the [`ActionDispatcher`] and records the outcome in the
//! per-run [`Context`]. The [`WorkflowTracker`] follows the expected order
//! of steps and annotates prompts with it.

pub mod action;
pub mod cognitive_loop;
pub mod config;
pub mod decision;
pub mod dispatcher;
pub mod memory;
pub mod parser;
pub mod workflow;

pub use action::{error_report, is_final_report, Action, FINAL_ANSWER_PREFIX, FUNCTION_CALL_PREFIX};
pub use cognitive_loop::{CognitiveLoop, LoopState, RunOutcome, MAX_ITERATIONS_MESSAGE};
pub use config::AgentConfig;
pub use decision::{DecisionEngine, DecisionError};
pub use dispatcher::{ActionDispatcher, Dispatch};
pub use memory::{extract_recipe_id, recipe_id_from_payload, Context};
pub use parser::{normalize, ParseError, ResponseParser, RECIPE_PLACEHOLDER};
pub use workflow::WorkflowTracker;
