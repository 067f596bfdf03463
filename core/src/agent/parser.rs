use super::action::{Action, FINAL_ANSWER_PREFIX, FUNCTION_CALL_PREFIX};
use super::memory::{extract_recipe_id, recipe_id_from_payload, Context, RECIPE_ID};
use crate::tools::ToolRegistry;
use std::collections::{BTreeMap, HashMap, HashSet};
use thiserror::Error;
use tracing::debug;

/// Stands for the recipe selected by the migration plan
pub const RECIPE_PLACEHOLDER: &str = "[from_migration_plan]";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid response format: {0}")]
    InvalidFormat(String),

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("No recipe_id available to replace [from_migration_plan]; run the migration plan first")]
    MissingRecipeId,
}

/// Turns one model turn into a validated [`Action`]
#[derive(Debug, Clone)]
pub struct ResponseParser {
    /// normalized name -> canonical name
    synonyms: HashMap<String, String>,
    known: HashSet<String>,
}

/// Lower-case and drop underscores: `mod_upgrade_all` -> `modupgradeall`
pub fn normalize(name: &str) -> String {
    name.to_lowercase().replace('_', "")
}

impl ResponseParser {
    pub fn new(registry: &ToolRegistry) -> Self {
        let known: HashSet<String> = registry.tool_names().into_iter().collect();
        let synonyms = known
            .iter()
            .map(|name| (normalize(name), name.clone()))
            .collect();
        Self { synonyms, known }
    }

    /// Extra spelling for a canonical tool name
    pub fn with_synonym(mut self, alias: &str, canonical: impl Into<String>) -> Self {
        self.synonyms.insert(normalize(alias), canonical.into());
        self
    }

    /// Canonical registry name for a requested tool name
    pub fn resolve_tool_name(&self, requested: &str) -> Option<String> {
        let resolved = self
            .synonyms
            .get(&normalize(requested))
            .cloned()
            .unwrap_or_else(|| requested.to_string());
        self.known.contains(&resolved).then_some(resolved)
    }

    /// Parse the last non-empty line of `raw_text`
    pub fn parse(&self, raw_text: &str, context: &Context) -> Result<Action, ParseError> {
        let line = raw_text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .last()
            .ok_or_else(|| ParseError::InvalidFormat("empty response".to_string()))?;

        if let Some(rest) = line.strip_prefix(FUNCTION_CALL_PREFIX) {
            return self.parse_function_call(rest, context);
        }
        if let Some(rest) = line.strip_prefix(FINAL_ANSWER_PREFIX) {
            return Ok(Action::final_answer(rest.trim()));
        }
        Err(ParseError::InvalidFormat(line.to_string()))
    }

    fn parse_function_call(&self, rest: &str, context: &Context) -> Result<Action, ParseError> {
        let mut segments = rest.split('|');
        let requested = segments.next().unwrap_or_default().trim();
        let tool_name = self
            .resolve_tool_name(requested)
            .ok_or_else(|| ParseError::UnknownFunction(requested.to_string()))?;

        let mut parameters = BTreeMap::new();
        for segment in segments {
            let Some((key, value)) = segment.split_once('=') else {
                continue;
            };
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            parameters.insert(key.to_string(), value.trim().to_string());
        }

        if parameters.get(RECIPE_ID).map(String::as_str) == Some(RECIPE_PLACEHOLDER) {
            let recipe_id = resolve_recipe_id(context).ok_or(ParseError::MissingRecipeId)?;
            debug!(target: "agent.parser", recipe_id = %recipe_id, "Resolved recipe placeholder");
            parameters.insert(RECIPE_ID.to_string(), recipe_id);
        }

        Ok(Action::function_call(tool_name, parameters))
    }
}

/// Stored recipe id, else whatever the last action left behind
fn resolve_recipe_id(context: &Context) -> Option<String> {
    context
        .recipe_id()
        .map(String::from)
        .or_else(|| context.last_action().and_then(extract_recipe_id))
        .or_else(|| context.last_result().and_then(recipe_id_from_payload))
}
