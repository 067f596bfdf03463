use super::descriptor::ToolDescriptor;
use super::error::RegistryError;
use super::traits::ToolCollection;
use std::sync::Arc;
use tracing::{debug, info};

/// A tool collection together with the catalog it advertised at startup
#[derive(Clone)]
pub struct RegisteredCollection {
    pub name: String,
    pub collection: Arc<dyn ToolCollection>,
    pub tools: Vec<ToolDescriptor>,
}

impl RegisteredCollection {
    /// Whether this collection advertises `tool_name`
    pub fn advertises(&self, tool_name: &str) -> bool {
        self.tools.iter().any(|t| t.name == tool_name)
    }
}

/// Read-only catalog of every callable operation, grouped by collection.
///
/// Collections keep the order they were registered in; ownership lookups
/// walk them in that order.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    collections: Vec<RegisteredCollection>,
}

impl ToolRegistry {
    /// List the tools of every collection (once each) and build the catalog.
    /// A name advertised by two collections is rejected.
    pub async fn build(
        collections: Vec<Arc<dyn ToolCollection>>,
    ) -> Result<Self, RegistryError> {
        let mut registry = Self::default();

        for collection in collections {
            let name = collection.name();
            let tools = collection
                .list_tools()
                .await
                .map_err(|source| RegistryError::ListFailed {
                    collection: name.clone(),
                    source,
                })?;
            registry.register(collection, tools)?;
        }

        Ok(registry)
    }

    /// Register a collection with an already-known catalog
    pub fn register(
        &mut self,
        collection: Arc<dyn ToolCollection>,
        tools: Vec<ToolDescriptor>,
    ) -> Result<(), RegistryError> {
        let name = collection.name();

        for tool in &tools {
            if let Some(existing) = self.collections.iter().find(|c| c.advertises(&tool.name)) {
                return Err(RegistryError::DuplicateTool {
                    name: tool.name.clone(),
                    first: existing.name.clone(),
                    second: name,
                });
            }
            debug!(target: "tool_registry", collection = %name, tool = %tool.name, "Registering tool");
        }

        info!(
            target: "tool_registry",
            collection = %name,
            count = tools.len(),
            "Registered tool collection"
        );

        self.collections.push(RegisteredCollection {
            name,
            collection,
            tools,
        });
        Ok(())
    }

    /// Whether any collection advertises `name`
    pub fn contains(&self, name: &str) -> bool {
        self.owner_of(name).is_some()
    }

    /// Descriptor for a canonical tool name
    pub fn descriptor(&self, name: &str) -> Option<&ToolDescriptor> {
        self.collections
            .iter()
            .flat_map(|c| c.tools.iter())
            .find(|t| t.name == name)
    }

    /// First collection (in registration order) advertising `name`
    pub fn owner_of(&self, name: &str) -> Option<&RegisteredCollection> {
        self.collections.iter().find(|c| c.advertises(name))
    }

    pub fn collections(&self) -> &[RegisteredCollection] {
        &self.collections
    }

    /// All canonical tool names in registration order
    pub fn tool_names(&self) -> Vec<String> {
        self.collections
            .iter()
            .flat_map(|c| c.tools.iter().map(|t| t.name.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.collections.iter().map(|c| c.tools.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Prompt-ready listing, grouped by collection:
    ///
    /// ```text
    /// PROJECT TOOLS:
    /// 1. analyzeProject(project_path: string) - Analyze a Maven project
    /// ```
    pub fn describe(&self) -> String {
        let mut sections = Vec::with_capacity(self.collections.len());
        for collection in &self.collections {
            let mut lines = vec![format!("{} TOOLS:", collection.name.to_uppercase())];
            if collection.tools.is_empty() {
                lines.push("(none)".to_string());
            }
            for (i, tool) in collection.tools.iter().enumerate() {
                lines.push(format!(
                    "{}. {} - {}",
                    i + 1,
                    tool.signature(),
                    tool.description
                ));
            }
            sections.push(lines.join("\n"));
        }
        sections.join("\n\n")
    }
}
