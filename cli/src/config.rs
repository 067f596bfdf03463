use std::fs;
use std::path::{Path, PathBuf};

use migrant_core::analysis::AnalysisConfig;
use migrant_core::llm::LlmClientConfig;
use migrant_core::tools::mcp::McpServerConfig;
use migrant_core::tools::native::TransformCliConfig;
use migrant_core::AgentConfig;

/// Where a tool collection comes from
#[derive(Clone, Debug, PartialEq)]
pub enum ToolSource {
    /// Built-in implementation
    Native,
    /// External MCP server over stdio
    Mcp(McpServerConfig),
}

/// Sources for the two collections the agent drives
#[derive(Clone, Debug, PartialEq)]
pub struct ToolSources {
    pub project: ToolSource,
    pub transform: ToolSource,
}

impl Default for ToolSources {
    fn default() -> Self {
        Self {
            project: ToolSource::Native,
            transform: ToolSource::Native,
        }
    }
}

/// Everything the `migrant` binary needs to build an agent
#[derive(Clone, Debug, Default)]
pub struct MigrantConfig {
    pub llm: LlmClientConfig,
    pub agent: AgentConfig,
    pub analysis: AnalysisConfig,
    pub transform: TransformCliConfig,
    pub tools: ToolSources,
}

impl MigrantConfig {
    /// Load configuration from a TOML file (path via MIGRANT_CONFIG or ./migrant.toml),
    /// overlaying values onto env-driven defaults.
    pub fn load() -> Self {
        let path = std::env::var("MIGRANT_CONFIG").unwrap_or_else(|_| "migrant.toml".into());
        Self::load_from(Path::new(&path))
    }

    pub fn load_from(path: &Path) -> Self {
        let default = Self::default();
        if !path.exists() {
            tracing::info!(target: "migrant", path = %path.display(), "No TOML config found; using defaults/env");
            return default;
        }
        match fs::read_to_string(path) {
            Ok(s) => match toml::from_str::<MigrantToml>(&s) {
                Ok(t) => t.overlay(default),
                Err(e) => {
                    tracing::warn!(target: "migrant", error = %e, "Failed to parse TOML; using defaults");
                    default
                }
            },
            Err(e) => {
                tracing::warn!(target: "migrant", error = %e, "Failed to read TOML; using defaults");
                default
            }
        }
    }
}

// =========================
// TOML overlay definitions
// =========================

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct MigrantToml {
    pub llm: Option<LlmToml>,
    pub agent: Option<AgentToml>,
    pub analysis: Option<AnalysisToml>,
    pub transform: Option<TransformToml>,
    pub mcp: Option<McpToml>,
}

impl MigrantToml {
    fn overlay(self, mut base: MigrantConfig) -> MigrantConfig {
        if let Some(l) = self.llm {
            l.apply(&mut base.llm);
        }
        if let Some(a) = self.agent {
            a.apply(&mut base.agent);
        }
        if let Some(a) = self.analysis {
            a.apply(&mut base.analysis);
        }
        if let Some(t) = self.transform {
            t.apply(&mut base.transform);
        }
        if let Some(m) = self.mcp {
            m.apply(&mut base.tools);
        }
        base
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct LlmToml {
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub request_timeout_ms: Option<u64>,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
}
impl LlmToml {
    fn apply(self, l: &mut LlmClientConfig) {
        if let Some(x) = self.base_url {
            l.base_url = x;
        }
        if let Some(x) = self.model {
            l.model = x;
        }
        if let Some(x) = self.api_key.filter(|k| !k.is_empty()) {
            l.api_key = Some(x);
        }
        if let Some(x) = self.request_timeout_ms {
            l.request_timeout_ms = x;
        }
        if let Some(x) = self.temperature {
            l.temperature = x;
        }
        if let Some(x) = self.max_output_tokens {
            l.max_output_tokens = x;
        }
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct AgentToml {
    pub max_iterations: Option<usize>,
    pub llm_timeout_ms: Option<u64>,
    pub apply_tool: Option<String>,
    pub plan_tool: Option<String>,
    pub workflow_steps: Option<Vec<String>>,
}
impl AgentToml {
    fn apply(self, a: &mut AgentConfig) {
        if let Some(x) = self.max_iterations {
            a.max_iterations = x;
        }
        if let Some(x) = self.llm_timeout_ms {
            a.llm_timeout_ms = x;
        }
        if let Some(x) = self.apply_tool {
            a.apply_tool = x;
        }
        if let Some(x) = self.plan_tool {
            a.plan_tool = x;
        }
        if let Some(x) = self.workflow_steps {
            a.workflow_steps = x.into_iter().filter(|s| !s.is_empty()).collect();
        }
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct AnalysisToml {
    pub latest_java: Option<u32>,
    pub latest_spring_boot: Option<String>,
    pub recipes_path: Option<PathBuf>,
}
impl AnalysisToml {
    fn apply(self, a: &mut AnalysisConfig) {
        if let Some(x) = self.latest_java {
            a.latest_java = x;
        }
        if let Some(x) = self.latest_spring_boot {
            a.latest_spring_boot = x;
        }
        if let Some(x) = self.recipes_path {
            a.recipes_path = Some(x);
        }
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct TransformToml {
    pub program: Option<String>,
    pub prefix_args: Option<Vec<String>>, // e.g., ["-jar", "mod.jar"]
}
impl TransformToml {
    fn apply(self, t: &mut TransformCliConfig) {
        if let Some(x) = self.program {
            t.program = x;
        }
        if let Some(x) = self.prefix_args {
            t.prefix_args = x;
        }
    }
}

/// `[mcp.project]` / `[mcp.transform]` replace the native collection
#[derive(Debug, Clone, Default, serde::Deserialize)]
struct McpToml {
    pub project: Option<McpServerConfig>,
    pub transform: Option<McpServerConfig>,
}
impl McpToml {
    fn apply(self, t: &mut ToolSources) {
        if let Some(x) = self.project {
            t.project = ToolSource::Mcp(x);
        }
        if let Some(x) = self.transform {
            t.transform = ToolSource::Mcp(x);
        }
    }
}
