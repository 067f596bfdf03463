// Migrant Core Library
// LLM-driven Java/Maven upgrade agent runtime

pub mod agent;
pub mod analysis;
pub mod llm;
pub mod preferences;
pub mod tools;

// Export core types
pub use agent::{
    Action, ActionDispatcher, AgentConfig, CognitiveLoop, Context, DecisionEngine, DecisionError,
    Dispatch, LoopState, ParseError, ResponseParser, RunOutcome, WorkflowTracker,
};
pub use analysis::{AnalysisConfig, AnalysisReport, MavenAnalyzer};
pub use llm::{LanguageModel, LlmClient, LlmClientConfig};
pub use preferences::{MigrationKind, PreferenceStore, Preferences, ReleaseChannel};
pub use tools::{ToolCollection, ToolDescriptor, ToolOutput, ToolRegistry};

// Error types
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MigrantError {
    #[error("Decision error: {0}")]
    Decision(#[from] agent::DecisionError),

    #[error("Registry error: {0}")]
    RegistryError(#[from] tools::RegistryError),

    #[error("MCP error: {0}")]
    McpError(#[from] tools::mcp::McpError),

    #[error("Input error: {0}")]
    InputError(String),

    #[error("Analysis error: {0}")]
    AnalysisError(#[from] analysis::AnalysisError),

    #[error("Preference error: {0}")]
    PreferenceError(#[from] preferences::PreferenceError),

    #[error("LLM error: {0}")]
    LlmError(#[from] llm::LlmError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
pub type Result<T> = std::result::Result<T, MigrantError>;
