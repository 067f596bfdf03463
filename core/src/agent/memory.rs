//! Per-run memory carried across loop iterations.
//!
//! Only the cognitive loop writes here; the decision engine reads.

use crate::preferences::Preferences;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

pub const LAST_ACTION: &str = "last_action";
pub const LAST_RESULT: &str = "last_result";
pub const RECIPE_ID: &str = "recipe_id";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Context {
    preferences: Preferences,
    entries: HashMap<String, Value>,
}

impl Context {
    pub fn new(preferences: Preferences) -> Self {
        Self {
            preferences,
            entries: HashMap::new(),
        }
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn entries(&self) -> &HashMap<String, Value> {
        &self.entries
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Later writes overwrite earlier ones. A recipe id, once known, is
    /// never cleared: null or empty values for it are ignored.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        if key == RECIPE_ID && value.as_str().map_or(true, |s| s.trim().is_empty()) {
            debug!(target: "agent.memory", value = %value, "Ignoring empty recipe_id");
            return;
        }
        self.entries.insert(key, value);
    }

    pub fn last_action(&self) -> Option<&str> {
        self.get(LAST_ACTION).and_then(Value::as_str)
    }

    pub fn set_last_action(&mut self, report: impl Into<String>) {
        self.set(LAST_ACTION, Value::String(report.into()));
    }

    pub fn last_result(&self) -> Option<&Value> {
        self.get(LAST_RESULT)
    }

    pub fn recipe_id(&self) -> Option<&str> {
        self.get(RECIPE_ID).and_then(Value::as_str)
    }

    pub fn set_recipe_id(&mut self, recipe_id: impl Into<String>) {
        self.set(RECIPE_ID, Value::String(recipe_id.into()));
    }
}

/// `recipe.recipe_id` or a top-level `recipe_id` of a tool payload
pub fn recipe_id_from_payload(payload: &Value) -> Option<String> {
    payload
        .get("recipe")
        .and_then(|r| r.get(RECIPE_ID))
        .or_else(|| payload.get(RECIPE_ID))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Find a recipe id inside free text that embeds a JSON object.
///
/// Every `{` is tried as the start of a JSON value; trailing text after the
/// object is ignored.
pub fn extract_recipe_id(text: &str) -> Option<String> {
    text.match_indices('{').find_map(|(start, _)| {
        let mut stream = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
        match stream.next() {
            Some(Ok(value)) => recipe_id_from_payload(&value),
            _ => None,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preferences::{MigrationKind, ReleaseChannel};
    use serde_json::json;

    fn context() -> Context {
        Context::new(Preferences::new(
            "/proj",
            MigrationKind::Java,
            ReleaseChannel::Stable,
        ))
    }

    #[test]
    fn test_recipe_id_is_never_cleared() {
        let mut ctx = context();
        ctx.set_recipe_id("A");
        ctx.set(RECIPE_ID, Value::Null);
        ctx.set_recipe_id("");
        assert_eq!(ctx.recipe_id(), Some("A"));

        ctx.set_recipe_id("B");
        assert_eq!(ctx.recipe_id(), Some("B"));
    }

    #[test]
    fn test_payload_shapes() {
        assert_eq!(
            recipe_id_from_payload(&json!({"recipe": {"recipe_id": "X"}})).as_deref(),
            Some("X")
        );
        assert_eq!(
            recipe_id_from_payload(&json!({"success": true, "recipe_id": "Y"})).as_deref(),
            Some("Y")
        );
        assert_eq!(recipe_id_from_payload(&json!({"recipe": "Z"})), None);
        assert_eq!(recipe_id_from_payload(&json!("text")), None);
    }

    #[test]
    fn test_extract_from_log_text() {
        let text = r#"Tool execution result: {"success": true, "recipe": {"recipe_id": "org.acme.Up"}} FUNCTION_CALL: migrationPlan|"#;
        assert_eq!(extract_recipe_id(text).as_deref(), Some("org.acme.Up"));

        // An unrelated object before the interesting one
        let text = r#"{"stage": 1} then {"recipe_id": "R"}"#;
        assert_eq!(extract_recipe_id(text).as_deref(), Some("R"));

        assert_eq!(extract_recipe_id("FUNCTION_CALL: migrationPlan"), None);
        assert_eq!(extract_recipe_id("{ broken"), None);
    }
}
