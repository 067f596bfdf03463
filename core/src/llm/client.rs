use super::{LanguageModel, LlmError};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, error, warn};

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.is_empty())
}

/// Configuration for LlmClient loaded from environment variables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmClientConfig {
    pub base_url: String, // e.g., https://generativelanguage.googleapis.com/v1beta/openai
    pub model: String,    // e.g., gemini-2.0-flash
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub request_timeout_ms: u64,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for LlmClientConfig {
    fn default() -> Self {
        Self {
            base_url: env_nonempty("MIGRANT_LLM_BASE_URL").unwrap_or_else(|| {
                "https://generativelanguage.googleapis.com/v1beta/openai".to_string()
            }),
            model: env_nonempty("MIGRANT_LLM_MODEL")
                .unwrap_or_else(|| "gemini-2.0-flash".to_string()),
            api_key: env_nonempty("MIGRANT_LLM_API_KEY").or_else(|| env_nonempty("GEMINI_API_KEY")),
            request_timeout_ms: std::env::var("MIGRANT_LLM_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(30_000),
            temperature: std::env::var("MIGRANT_LLM_TEMPERATURE")
                .ok()
                .and_then(|v| v.parse::<f32>().ok())
                .unwrap_or(0.2),
            max_output_tokens: 256,
        }
    }
}

/// Minimal response containing the assistant text
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LlmResponse {
    pub text: String,
    pub model: Option<String>,
    pub provider: Option<String>, // "responses" or "chat.completions"
    pub usage: Option<Value>,
}

/// HTTP client that prefers the OpenAI Responses API and falls back to Chat Completions
#[derive(Clone)]
pub struct LlmClient {
    http: Client,
    cfg: LlmClientConfig,
}

impl LlmClient {
    pub fn new(cfg: LlmClientConfig) -> Result<Self, LlmError> {
        let http = Client::builder()
            .timeout(Duration::from_millis(cfg.request_timeout_ms))
            .build()
            .map_err(|e| LlmError::Client(e.to_string()))?;
        Ok(Self { http, cfg })
    }

    pub fn from_env() -> Result<Self, LlmError> {
        Self::new(LlmClientConfig::default())
    }

    pub fn config(&self) -> &LlmClientConfig {
        &self.cfg
    }

    fn post(&self, path: &str, timeout: Duration) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.cfg.base_url.trim_end_matches('/'), path);
        debug!(target: "llm_client", url = %url, "POST");

        let req = self
            .http
            .post(url)
            .timeout(timeout)
            .header("content-type", "application/json");
        match &self.cfg.api_key {
            Some(key) => req.bearer_auth(key),
            None => req,
        }
    }

    /// Generate a completion for a single prompt.
    /// Falls back to Chat Completions when the Responses API is missing,
    /// errors, or returns nothing usable.
    pub async fn complete(&self, prompt: &str, timeout: Duration) -> Result<LlmResponse, LlmError> {
        let body = json!({
            "model": self.cfg.model,
            "input": prompt,
            "max_output_tokens": self.cfg.max_output_tokens,
            "temperature": self.cfg.temperature,
        });

        match self.post("responses", timeout).json(&body).send().await {
            Ok(resp) if resp.status().is_success() => match resp.json::<Value>().await {
                Ok(val) => {
                    if let Some(text) = extract_text_from_responses(&val) {
                        return Ok(LlmResponse {
                            text,
                            model: model_name(&val),
                            provider: Some("responses".to_string()),
                            usage: val.get("usage").cloned(),
                        });
                    }
                    debug!(target: "llm_client", "Responses API returned no text; trying chat.completions");
                }
                Err(err) => {
                    warn!(target: "llm_client", error = %err, "Unparseable Responses JSON; trying chat.completions");
                }
            },
            Ok(resp) if resp.status() == StatusCode::NOT_FOUND => {
                // Endpoint missing; try chat fallback
            }
            Ok(resp) => {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                warn!(target: "llm_client", %status, body = %body, "Responses API error; trying chat.completions fallback");
            }
            Err(err) if err.is_timeout() => return Err(LlmError::Timeout(timeout)),
            Err(err) => {
                warn!(target: "llm_client", error = %err, "Responses API request failed; trying chat.completions fallback");
            }
        }

        let body = json!({
            "model": self.cfg.model,
            "messages": [{"role": "user", "content": prompt}],
            "max_tokens": self.cfg.max_output_tokens,
            "temperature": self.cfg.temperature,
        });

        let resp = self
            .post("chat/completions", timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(timeout)
                } else {
                    LlmError::Http(e.to_string())
                }
            })?;
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            error!(target: "llm_client", %status, body = %text, "Chat Completions error");
            return Err(LlmError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let val: Value = resp
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;
        let text = extract_text_from_chat_completions(&val).ok_or_else(|| {
            LlmError::InvalidResponse("Missing choices[0].message.content".to_string())
        })?;
        Ok(LlmResponse {
            text,
            model: model_name(&val),
            provider: Some("chat.completions".to_string()),
            usage: val.get("usage").cloned(),
        })
    }
}

#[async_trait]
impl LanguageModel for LlmClient {
    async fn generate(&self, prompt: &str, timeout: Duration) -> Result<String, LlmError> {
        let response = self.complete(prompt, timeout).await?;
        debug!(
            target: "llm_client",
            provider = ?response.provider,
            model = ?response.model,
            "Model responded"
        );
        Ok(response.text.trim().to_string())
    }
}

fn model_name(v: &Value) -> Option<String> {
    v.get("model").and_then(|m| m.as_str()).map(|s| s.to_string())
}

fn extract_text_from_chat_completions(v: &Value) -> Option<String> {
    v.get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
        .map(|s| s.to_string())
}

fn extract_text_from_responses(v: &Value) -> Option<String> {
    if let Some(s) = v.get("output_text").and_then(|x| x.as_str()) {
        if !s.is_empty() {
            return Some(s.to_string());
        }
    }
    if let Some(arr) = v.get("output").and_then(|x| x.as_array()) {
        let acc: String = arr
            .iter()
            .filter_map(|item| item.get("content").and_then(|c| c.as_array()))
            .flatten()
            .filter_map(|c| {
                c.get("text")
                    .and_then(|t| t.get("value"))
                    .and_then(|v| v.as_str())
                    .or_else(|| c.get("text").and_then(|v| v.as_str()))
            })
            .collect();
        if !acc.is_empty() {
            return Some(acc);
        }
    }
    // Some servers answer the Responses route in chat shape
    extract_text_from_chat_completions(v)
}
