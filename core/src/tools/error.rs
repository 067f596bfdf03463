use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Timeout")]
    Timeout,
}

pub type ToolResult<T> = Result<T, ToolError>;

/// Failures while assembling the tool catalog at startup
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Tool '{name}' is advertised by both '{first}' and '{second}'")]
    DuplicateTool {
        name: String,
        first: String,
        second: String,
    },

    #[error("Failed to list tools of '{collection}': {source}")]
    ListFailed {
        collection: String,
        #[source]
        source: ToolError,
    },
}
