use super::report::AnalysisReport;
use super::AnalysisError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// One automated code transformation known to the transform CLI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Recipe chosen for a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeMatch {
    pub recipe_id: String,
    pub recipe_name: String,
    pub match_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeCatalog {
    recipes: Vec<Recipe>,
}

fn recipe(id: &str, name: &str, description: &str) -> Recipe {
    Recipe {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
    }
}

impl Default for RecipeCatalog {
    fn default() -> Self {
        Self::new(vec![
            recipe(
                "org.openrewrite.java.migrate.UpgradeToJava21",
                "Migrate to Java 21",
                "Upgrade build files and sources to Java 21 and its language features.",
            ),
            recipe(
                "org.openrewrite.java.migrate.UpgradeToJava17",
                "Migrate to Java 17",
                "Upgrade build files and sources to Java 17.",
            ),
            recipe(
                "org.openrewrite.java.migrate.Java8toJava11",
                "Migrate to Java 11",
                "Upgrade Java 8 sources and build files to Java 11.",
            ),
            recipe(
                "org.openrewrite.java.spring.boot3.UpgradeSpringBoot_3_3",
                "Migrate to Spring Boot 3.3",
                "Upgrade Spring Boot dependencies, properties and APIs to 3.3.",
            ),
            recipe(
                "org.openrewrite.java.spring.boot3.UpgradeSpringBoot_3_2",
                "Migrate to Spring Boot 3.2",
                "Upgrade Spring Boot dependencies, properties and APIs to 3.2.",
            ),
            recipe(
                "org.openrewrite.java.spring.boot2.UpgradeSpringBoot_2_7",
                "Migrate to Spring Boot 2.7",
                "Upgrade Spring Boot 2.x projects to 2.7.",
            ),
        ])
    }
}

impl RecipeCatalog {
    pub fn new(recipes: Vec<Recipe>) -> Self {
        Self { recipes }
    }

    /// Load a JSON array of recipes
    pub async fn load(path: &Path) -> Result<Self, AnalysisError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| AnalysisError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let recipes: Vec<Recipe> = serde_json::from_str(&content).map_err(|e| {
            AnalysisError::Catalog(format!("{}: {}", path.display(), e))
        })?;

        info!(
            target: "recipes",
            path = %path.display(),
            count = recipes.len(),
            "Loaded recipe catalog"
        );
        Ok(Self::new(recipes))
    }

    /// Configured catalog file, or the built-in catalog
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, AnalysisError> {
        match path {
            Some(path) => Self::load(path).await,
            None => Ok(Self::default()),
        }
    }

    pub fn recipes(&self) -> &[Recipe] {
        &self.recipes
    }

    /// First recipe whose name contains one of the report's goals, goals in order
    pub fn select(&self, report: &AnalysisReport) -> Option<RecipeMatch> {
        for goal in report.upgrade_goals() {
            debug!(target: "recipes", goal = %goal, "Searching recipe catalog");
            if let Some(recipe) = self
                .recipes
                .iter()
                .find(|r| r.name.to_lowercase().contains(&goal))
            {
                return Some(RecipeMatch {
                    recipe_id: recipe.id.clone(),
                    recipe_name: recipe.name.clone(),
                    match_type: "exact".to_string(),
                });
            }
        }
        None
    }
}
