//! Static analysis of Maven projects
//!
//! Reads the root `pom.xml` and every declared module, extracting the JDK
//! level, Spring Boot version and dependency list, then decides which
//! upgrades the project is eligible for.
//!
//! - `pom`: descriptor deserialisation
//! - `report`: analysis report, eligibility and version helpers
//! - `recipes`: recipe catalog and recipe selection

pub mod pom;
pub mod recipes;
pub mod report;

pub use recipes::{Recipe, RecipeCatalog, RecipeMatch};
pub use report::{AnalysisConfig, AnalysisReport, Dependency};

use pom::Pom;
use report::{compare_versions, java_major};
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

const POM_FILE: &str = "pom.xml";
const MANAGED_VERSION: &str = "managed";

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("No pom.xml found in {0}")]
    MissingPom(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {message}")]
    Xml { path: PathBuf, message: String },

    #[error("Recipe catalog error: {0}")]
    Catalog(String),
}

/// Walks a Maven project tree and produces an [`AnalysisReport`]
#[derive(Debug, Clone, Default)]
pub struct MavenAnalyzer {
    config: AnalysisConfig,
}

impl MavenAnalyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub async fn analyze(&self, project_dir: &Path) -> Result<AnalysisReport, AnalysisError> {
        let root_pom = project_dir.join(POM_FILE);
        if !tokio::fs::try_exists(&root_pom).await.unwrap_or(false) {
            return Err(AnalysisError::MissingPom(project_dir.to_path_buf()));
        }

        info!(target: "analyzer", project = %project_dir.display(), "Analyzing Maven project");

        let mut queue = VecDeque::from([root_pom]);
        let mut visited = HashSet::new();
        let mut jdk_version: Option<String> = None;
        let mut spring_boot_version: Option<String> = None;
        let mut dependencies = Vec::new();
        let mut module_count = 0;

        while let Some(pom_path) = queue.pop_front() {
            let key = tokio::fs::canonicalize(&pom_path)
                .await
                .unwrap_or_else(|_| pom_path.clone());
            if !visited.insert(key) {
                continue;
            }

            let is_root = module_count == 0;
            let pom = match read_pom(&pom_path).await {
                Ok(pom) => pom,
                Err(e) if is_root => return Err(e),
                Err(e) => {
                    warn!(target: "analyzer", pom = %pom_path.display(), error = %e, "Skipping module");
                    continue;
                }
            };
            module_count += 1;

            if let Some(v) = pom.jdk_version() {
                debug!(target: "analyzer", pom = %pom_path.display(), jdk = %v, "Found JDK version");
                jdk_version = lowest_jdk(jdk_version, v);
            }
            if let Some(v) = pom.spring_boot_version() {
                debug!(target: "analyzer", pom = %pom_path.display(), spring_boot = %v, "Found Spring Boot version");
                spring_boot_version = Some(match spring_boot_version {
                    Some(current) if compare_versions(&current, &v).is_le() => current,
                    _ => v,
                });
            }

            for dep in &pom.dependencies.dependency {
                let dependency = Dependency {
                    group: dep.group_id.clone(),
                    artifact: dep.artifact_id.clone(),
                    version: dep
                        .version
                        .as_deref()
                        .map(|v| pom.resolve(v))
                        .unwrap_or_else(|| MANAGED_VERSION.to_string()),
                };
                if !dependencies.contains(&dependency) {
                    dependencies.push(dependency);
                }
            }

            let base = pom_path.parent().unwrap_or(project_dir);
            for module in &pom.modules.module {
                queue.push_back(module_pom(base, module));
            }
        }

        let report = AnalysisReport::new(
            project_dir.display().to_string(),
            jdk_version,
            spring_boot_version,
            dependencies,
            module_count,
            &self.config,
        );

        info!(
            target: "analyzer",
            jdk = ?report.jdk_version,
            spring_boot = ?report.spring_boot_version,
            dependencies = report.dependency_count,
            modules = report.module_count,
            "Analysis complete"
        );
        Ok(report)
    }
}

async fn read_pom(path: &Path) -> Result<Pom, AnalysisError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| AnalysisError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    Pom::parse(&content).map_err(|e| AnalysisError::Xml {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// `<module>` entries name a directory or, less often, a descriptor file
fn module_pom(base: &Path, module: &str) -> PathBuf {
    let path = base.join(module.trim());
    if path.extension().is_some_and(|ext| ext == "xml") {
        path
    } else {
        path.join(POM_FILE)
    }
}

/// Keep the lower JDK level, normalised to its major version
fn lowest_jdk(current: Option<String>, candidate: String) -> Option<String> {
    let Some(major) = java_major(&candidate) else {
        return current;
    };
    match current.as_deref().and_then(java_major) {
        Some(existing) if existing <= major => current,
        _ => Some(major.to_string()),
    }
}
