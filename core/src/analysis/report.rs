use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::PathBuf;

/// Analyzer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Newest Java LTS release to migrate to
    pub latest_java: u32,
    /// Newest Spring Boot release to migrate to
    pub latest_spring_boot: String,
    /// Recipe catalog file; the built-in catalog is used when unset
    pub recipes_path: Option<PathBuf>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            latest_java: 21,
            latest_spring_boot: "3.3.5".to_string(),
            recipes_path: std::env::var("MIGRANT_RECIPES").ok().map(PathBuf::from),
        }
    }
}

impl AnalysisConfig {
    pub fn with_latest_java(mut self, version: u32) -> Self {
        self.latest_java = version;
        self
    }

    pub fn with_latest_spring_boot(mut self, version: impl Into<String>) -> Self {
        self.latest_spring_boot = version.into();
        self
    }

    pub fn with_recipes_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.recipes_path = Some(path.into());
        self
    }
}

/// Declared Maven dependency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub group: String,
    pub artifact: String,
    /// `"managed"` when the version comes from a parent or BOM
    pub version: String,
}

/// Result of analysing one Maven project tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub project_path: String,
    /// Lowest JDK major version declared across modules
    pub jdk_version: Option<String>,
    /// Lowest Spring Boot version declared across modules
    pub spring_boot_version: Option<String>,
    pub dependencies: Vec<Dependency>,
    pub dependency_count: usize,
    pub module_count: usize,
    pub is_eligible_for_java_upgrade: bool,
    pub is_eligible_for_spring_upgrade: bool,
    pub conditions_matched: String,
    pub latest_java_version: String,
    pub latest_spring_boot_version: String,
    pub generated_at: DateTime<Utc>,
}

impl AnalysisReport {
    pub(crate) fn new(
        project_path: String,
        jdk_version: Option<String>,
        spring_boot_version: Option<String>,
        dependencies: Vec<Dependency>,
        module_count: usize,
        config: &AnalysisConfig,
    ) -> Self {
        let java_major = jdk_version.as_deref().and_then(java_major);
        let is_eligible_for_java_upgrade = java_major.is_some_and(|v| v < config.latest_java);
        let is_eligible_for_spring_upgrade = spring_boot_version.as_deref().is_some_and(|v| {
            compare_versions(v, &config.latest_spring_boot) == Ordering::Less
        });

        let mut conditions = Vec::new();
        if is_eligible_for_java_upgrade {
            if let Some(v) = &jdk_version {
                conditions.push(format!("Current Java version is {}", v));
            }
        }
        if is_eligible_for_spring_upgrade {
            if let Some(v) = &spring_boot_version {
                conditions.push(format!("Spring Boot version is {}", v));
            }
        }

        Self {
            project_path,
            jdk_version,
            spring_boot_version,
            dependency_count: dependencies.len(),
            dependencies,
            module_count,
            is_eligible_for_java_upgrade,
            is_eligible_for_spring_upgrade,
            conditions_matched: conditions.join(" and "),
            latest_java_version: config.latest_java.to_string(),
            latest_spring_boot_version: config.latest_spring_boot.clone(),
            generated_at: Utc::now(),
        }
    }

    pub fn needs_upgrade(&self) -> bool {
        self.is_eligible_for_java_upgrade || self.is_eligible_for_spring_upgrade
    }

    /// Lower-cased goals matched against recipe names, Java first
    pub fn upgrade_goals(&self) -> Vec<String> {
        let mut goals = Vec::new();
        if self.is_eligible_for_java_upgrade {
            goals.push(format!("migrate to java {}", self.latest_java_version));
        }
        if self.is_eligible_for_spring_upgrade {
            goals.push(format!(
                "migrate to spring boot {}",
                major_minor(&self.latest_spring_boot_version)
            ));
        }
        goals
    }
}

/// Major version of a JDK level; `1.8` and `8` are the same release
pub fn java_major(version: &str) -> Option<u32> {
    let version = version.trim();
    let significant = match version.strip_prefix("1.") {
        Some(rest) => rest,
        None => version,
    };
    let digits: String = significant
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Numeric dotted segments; a qualifier ends the version (`3.2.0-RC1` -> `[3, 2, 0]`)
fn version_parts(version: &str) -> Vec<u64> {
    let mut parts = Vec::new();
    for segment in version.trim().split('.') {
        let digits: String = segment.chars().take_while(|c| c.is_ascii_digit()).collect();
        match digits.parse() {
            Ok(n) => parts.push(n),
            Err(_) => break,
        }
        if digits.len() != segment.len() {
            break;
        }
    }
    parts
}

/// Compare dotted versions numerically; missing segments count as zero
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let (a, b) = (version_parts(a), version_parts(b));
    let len = a.len().max(b.len());
    for i in 0..len {
        let ord = a.get(i).unwrap_or(&0).cmp(b.get(i).unwrap_or(&0));
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

fn major_minor(version: &str) -> String {
    version.split('.').take(2).collect::<Vec<_>>().join(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_java_major() {
        assert_eq!(java_major("1.8"), Some(8));
        assert_eq!(java_major("8"), Some(8));
        assert_eq!(java_major("17"), Some(17));
        assert_eq!(java_major(" 11 "), Some(11));
        assert_eq!(java_major("${java.version}"), None);
    }

    #[test]
    fn test_compare_versions() {
        assert_eq!(compare_versions("2.7.18", "3.3.5"), Ordering::Less);
        assert_eq!(compare_versions("3.3", "3.3.0"), Ordering::Equal);
        assert_eq!(compare_versions("3.2.0-RC1", "3.2.0"), Ordering::Equal);
        assert_eq!(compare_versions("3.10.1", "3.9.9"), Ordering::Greater);
    }

    #[test]
    fn test_eligibility_and_goals() {
        let config = AnalysisConfig::default()
            .with_latest_java(21)
            .with_latest_spring_boot("3.3.5");
        let report = AnalysisReport::new(
            "/proj".to_string(),
            Some("11".to_string()),
            Some("2.7.18".to_string()),
            vec![],
            1,
            &config,
        );

        assert!(report.needs_upgrade());
        assert_eq!(
            report.conditions_matched,
            "Current Java version is 11 and Spring Boot version is 2.7.18"
        );
        assert_eq!(
            report.upgrade_goals(),
            vec!["migrate to java 21", "migrate to spring boot 3.3"]
        );
    }

    #[test]
    fn test_up_to_date_project() {
        let config = AnalysisConfig::default();
        let report = AnalysisReport::new(
            "/proj".to_string(),
            Some("21".to_string()),
            None,
            vec![],
            1,
            &config,
        );
        assert!(!report.needs_upgrade());
        assert!(report.upgrade_goals().is_empty());
        assert_eq!(report.conditions_matched, "");
    }
}
