//! Language model collaborator
//!
//! - `LanguageModel`: plain text in, plain text out, bounded by a timeout
//! - `LlmClient`, `LlmClientConfig`, `LlmResponse`: OpenAI-compatible HTTP backend

mod client;
mod model;

pub use client::{LlmClient, LlmClientConfig, LlmResponse};
#[cfg(test)]
pub use model::MockLanguageModel;
pub use model::LanguageModel;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Model backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid model response: {0}")]
    InvalidResponse(String),

    #[error("Model call timed out after {0:?}")]
    Timeout(std::time::Duration),
}
