use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Primitive type tag of a tool parameter; only used for prompt text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Number,
    Boolean,
    Unspecified,
}

impl ParamType {
    /// Map a JSON-Schema `type` value to a tag
    pub fn from_schema_type(ty: Option<&str>) -> Self {
        match ty {
            Some("string") => ParamType::String,
            Some("number") | Some("integer") => ParamType::Number,
            Some("boolean") => ParamType::Boolean,
            _ => ParamType::Unspecified,
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ParamType::String => "string",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
            ParamType::Unspecified => "unspecified",
        };
        f.write_str(s)
    }
}

/// One entry of the tool catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Canonical tool name
    pub name: String,
    /// Free text for prompt construction
    pub description: String,
    /// Parameter name -> type tag
    pub parameters: BTreeMap<String, ParamType>,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: BTreeMap::new(),
        }
    }

    /// Add a parameter
    pub fn with_param(mut self, name: impl Into<String>, ty: ParamType) -> Self {
        self.parameters.insert(name.into(), ty);
        self
    }

    /// Build a descriptor from a JSON-Schema object (`properties.*.type`).
    /// Missing or unknown types become `ParamType::Unspecified`.
    pub fn from_json_schema(
        name: impl Into<String>,
        description: Option<String>,
        schema: &Value,
    ) -> Self {
        let parameters = schema
            .get("properties")
            .and_then(|p| p.as_object())
            .map(|props| {
                props
                    .iter()
                    .map(|(key, info)| {
                        let ty = ParamType::from_schema_type(
                            info.get("type").and_then(|t| t.as_str()),
                        );
                        (key.clone(), ty)
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            name: name.into(),
            description: description
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| "No description available".to_string()),
            parameters,
        }
    }

    /// `name(p: type, ...)` signature used in prompts
    pub fn signature(&self) -> String {
        if self.parameters.is_empty() {
            return format!("{}(no parameters)", self.name);
        }
        let params = self
            .parameters
            .iter()
            .map(|(name, ty)| format!("{}: {}", name, ty))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{}({})", self.name, params)
    }
}
