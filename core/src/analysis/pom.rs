//! Maven descriptor (`pom.xml`) deserialisation
//!
//! Only the elements the analyzer reads are modelled; everything else is
//! skipped by the deserializer.

use serde::Deserialize;
use std::collections::HashMap;

const SPRING_BOOT_GROUP: &str = "org.springframework.boot";
const SPRING_BOOT_PARENT: &str = "spring-boot-starter-parent";
const COMPILER_PLUGIN: &str = "maven-compiler-plugin";

/// JDK level properties in lookup order
const JDK_PROPERTIES: &[&str] = &[
    "java.version",
    "maven.compiler.release",
    "maven.compiler.source",
];

#[derive(Debug, Default, Deserialize)]
pub struct Pom {
    #[serde(default)]
    pub parent: Option<PomCoordinates>,
    #[serde(default)]
    pub properties: HashMap<String, String>,
    #[serde(default)]
    pub dependencies: PomDependencies,
    #[serde(default)]
    pub modules: PomModules,
    #[serde(default)]
    pub build: Option<PomBuild>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct PomCoordinates {
    #[serde(default, rename = "groupId")]
    pub group_id: String,
    #[serde(default, rename = "artifactId")]
    pub artifact_id: String,
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PomDependencies {
    #[serde(default)]
    pub dependency: Vec<PomCoordinates>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PomModules {
    #[serde(default)]
    pub module: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PomBuild {
    #[serde(default)]
    pub plugins: PomPlugins,
}

#[derive(Debug, Default, Deserialize)]
pub struct PomPlugins {
    #[serde(default)]
    pub plugin: Vec<PomPlugin>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PomPlugin {
    #[serde(default, rename = "artifactId")]
    pub artifact_id: String,
    #[serde(default)]
    pub configuration: Option<CompilerConfiguration>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CompilerConfiguration {
    #[serde(default)]
    pub release: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

impl Pom {
    pub fn parse(content: &str) -> Result<Self, quick_xml::DeError> {
        quick_xml::de::from_str(content)
    }

    /// Substitute a `${property}` reference with this descriptor's value.
    /// Unknown references are returned unchanged.
    pub fn resolve(&self, value: &str) -> String {
        let value = value.trim();
        value
            .strip_prefix("${")
            .and_then(|v| v.strip_suffix('}'))
            .and_then(|key| self.properties.get(key))
            .map(|v| v.trim().to_string())
            .unwrap_or_else(|| value.to_string())
    }

    /// Declared JDK level: well-known properties first, then the compiler plugin
    pub fn jdk_version(&self) -> Option<String> {
        let from_properties = JDK_PROPERTIES
            .iter()
            .filter_map(|key| self.properties.get(*key))
            .map(|v| self.resolve(v))
            .find(|v| !v.is_empty());
        if from_properties.is_some() {
            return from_properties;
        }

        self.build
            .iter()
            .flat_map(|b| b.plugins.plugin.iter())
            .filter(|p| p.artifact_id == COMPILER_PLUGIN)
            .filter_map(|p| p.configuration.as_ref())
            .filter_map(|c| c.release.as_ref().or(c.source.as_ref()))
            .map(|v| self.resolve(v))
            .find(|v| !v.is_empty() && !v.starts_with("${"))
    }

    /// Spring Boot version from the starter parent, else the first boot
    /// dependency carrying an explicit version
    pub fn spring_boot_version(&self) -> Option<String> {
        if let Some(parent) = &self.parent {
            if parent.group_id == SPRING_BOOT_GROUP && parent.artifact_id == SPRING_BOOT_PARENT {
                if let Some(version) = &parent.version {
                    return Some(self.resolve(version));
                }
            }
        }

        self.dependencies
            .dependency
            .iter()
            .filter(|d| d.group_id == SPRING_BOOT_GROUP && d.artifact_id.contains("spring-boot"))
            .filter_map(|d| d.version.as_deref())
            .map(|v| self.resolve(v))
            .find(|v| !v.starts_with("${"))
    }
}
