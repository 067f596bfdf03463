use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const FUNCTION_CALL_PREFIX: &str = "FUNCTION_CALL:";
pub const FINAL_ANSWER_PREFIX: &str = "FINAL_ANSWER:";

/// Decoded output of one decision cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    /// `tool_name` is always the canonical registry name
    FunctionCall {
        tool_name: String,
        parameters: BTreeMap<String, String>,
    },
    FinalAnswer { message: String },
}

impl Action {
    pub fn function_call(
        tool_name: impl Into<String>,
        parameters: BTreeMap<String, String>,
    ) -> Self {
        Action::FunctionCall {
            tool_name: tool_name.into(),
            parameters,
        }
    }

    pub fn final_answer(message: impl Into<String>) -> Self {
        Action::FinalAnswer {
            message: message.into(),
        }
    }

    pub fn tool_name(&self) -> Option<&str> {
        match self {
            Action::FunctionCall { tool_name, .. } => Some(tool_name),
            Action::FinalAnswer { .. } => None,
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, Action::FinalAnswer { .. })
    }
}

/// Wire form: `FUNCTION_CALL: name|k=v|...` or `FINAL_ANSWER: message`, always one line
impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::FunctionCall {
                tool_name,
                parameters,
            } => {
                write!(f, "{} {}", FUNCTION_CALL_PREFIX, tool_name)?;
                for (key, value) in parameters {
                    write!(f, "|{}={}", key, single_line(value))?;
                }
                Ok(())
            }
            Action::FinalAnswer { message } => {
                write!(f, "{} {}", FINAL_ANSWER_PREFIX, single_line(message))
            }
        }
    }
}

/// Report line for a recoverable failure
pub fn error_report(message: &str) -> String {
    format!("{} Error - {}", FINAL_ANSWER_PREFIX, single_line(message))
}

pub fn is_final_report(report: &str) -> bool {
    report.starts_with(FINAL_ANSWER_PREFIX)
}

fn single_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_rendering() {
        assert_eq!(
            Action::function_call("analyzeProject", BTreeMap::new()).to_string(),
            "FUNCTION_CALL: analyzeProject"
        );

        let mut params = BTreeMap::new();
        params.insert("recipe_id".to_string(), "X".to_string());
        params.insert("dry_run".to_string(), "true".to_string());
        assert_eq!(
            Action::function_call("modUpgradeAll", params).to_string(),
            "FUNCTION_CALL: modUpgradeAll|dry_run=true|recipe_id=X"
        );

        assert_eq!(
            Action::final_answer("line one\nline two").to_string(),
            "FINAL_ANSWER: line one line two"
        );
    }

    #[test]
    fn test_error_report() {
        let report = error_report("Unknown function: frobnicate");
        assert_eq!(report, "FINAL_ANSWER: Error - Unknown function: frobnicate");
        assert!(is_final_report(&report));
    }
}
