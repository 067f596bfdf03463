//! Tests for Maven project analysis and recipe selection.

use migrant_core::analysis::{AnalysisConfig, AnalysisError, MavenAnalyzer, RecipeCatalog};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const ROOT_POM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0">
    <modelVersion>4.0.0</modelVersion>
    <parent>
        <groupId>org.springframework.boot</groupId>
        <artifactId>spring-boot-starter-parent</artifactId>
        <version>2.7.18</version>
    </parent>
    <groupId>com.example</groupId>
    <artifactId>shop</artifactId>
    <packaging>pom</packaging>
    <properties>
        <java.version>11</java.version>
        <guava.version>32.1.3-jre</guava.version>
    </properties>
    <modules>
        <module>api</module>
        <module>worker</module>
        <module>missing</module>
    </modules>
    <dependencies>
        <dependency>
            <groupId>com.google.guava</groupId>
            <artifactId>guava</artifactId>
            <version>${guava.version}</version>
        </dependency>
    </dependencies>
</project>"#;

const API_POM: &str = r#"<project>
    <artifactId>api</artifactId>
    <dependencies>
        <dependency>
            <groupId>org.springframework.boot</groupId>
            <artifactId>spring-boot-starter-web</artifactId>
        </dependency>
        <dependency>
            <groupId>com.google.guava</groupId>
            <artifactId>guava</artifactId>
            <version>32.1.3-jre</version>
        </dependency>
    </dependencies>
</project>"#;

const WORKER_POM: &str = r#"<project>
    <artifactId>worker</artifactId>
    <build>
        <plugins>
            <plugin>
                <groupId>org.apache.maven.plugins</groupId>
                <artifactId>maven-compiler-plugin</artifactId>
                <configuration>
                    <source>1.8</source>
                    <target>1.8</target>
                </configuration>
            </plugin>
        </plugins>
    </build>
</project>"#;

fn write(dir: &Path, relative: &str, content: &str) {
    let path = dir.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn multi_module_project() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "pom.xml", ROOT_POM);
    write(dir.path(), "api/pom.xml", API_POM);
    write(dir.path(), "worker/pom.xml", WORKER_POM);
    dir
}

fn analyzer() -> MavenAnalyzer {
    MavenAnalyzer::new(
        AnalysisConfig::default()
            .with_latest_java(21)
            .with_latest_spring_boot("3.3.5"),
    )
}

#[tokio::test]
async fn test_multi_module_analysis() {
    let dir = multi_module_project();
    let report = analyzer().analyze(dir.path()).await.unwrap();

    // Lowest JDK across modules wins; 1.8 reads as 8
    assert_eq!(report.jdk_version.as_deref(), Some("8"));
    assert_eq!(report.spring_boot_version.as_deref(), Some("2.7.18"));
    // Missing module is skipped
    assert_eq!(report.module_count, 3);

    // Guava appears twice with the same resolved version
    assert_eq!(report.dependency_count, 2);
    let guava = report
        .dependencies
        .iter()
        .find(|d| d.artifact == "guava")
        .unwrap();
    assert_eq!(guava.version, "32.1.3-jre");
    let web = report
        .dependencies
        .iter()
        .find(|d| d.artifact == "spring-boot-starter-web")
        .unwrap();
    assert_eq!(web.version, "managed");

    assert!(report.is_eligible_for_java_upgrade);
    assert!(report.is_eligible_for_spring_upgrade);
    assert_eq!(
        report.conditions_matched,
        "Current Java version is 8 and Spring Boot version is 2.7.18"
    );
    assert_eq!(
        report.upgrade_goals(),
        vec!["migrate to java 21", "migrate to spring boot 3.3"]
    );
}

#[tokio::test]
async fn test_up_to_date_project_needs_nothing() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "pom.xml",
        r#"<project>
            <properties><maven.compiler.release>21</maven.compiler.release></properties>
        </project>"#,
    );

    let report = analyzer().analyze(dir.path()).await.unwrap();
    assert_eq!(report.jdk_version.as_deref(), Some("21"));
    assert_eq!(report.spring_boot_version, None);
    assert!(!report.needs_upgrade());
    assert!(RecipeCatalog::default().select(&report).is_none());
}

#[tokio::test]
async fn test_missing_root_pom() {
    let dir = tempfile::tempdir().unwrap();
    let err = analyzer().analyze(dir.path()).await.unwrap_err();
    assert!(matches!(err, AnalysisError::MissingPom(_)));
}

#[tokio::test]
async fn test_malformed_root_pom() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "pom.xml", "<project><properties>");
    let err = analyzer().analyze(dir.path()).await.unwrap_err();
    assert!(matches!(err, AnalysisError::Xml { .. }));
}

#[tokio::test]
async fn test_recipe_selection_prefers_java() {
    let dir = multi_module_project();
    let report = analyzer().analyze(dir.path()).await.unwrap();

    let selected = RecipeCatalog::default().select(&report).unwrap();
    assert_eq!(
        selected.recipe_id,
        "org.openrewrite.java.migrate.UpgradeToJava21"
    );
    assert_eq!(selected.match_type, "exact");
}

#[tokio::test]
async fn test_catalog_file() {
    let dir = multi_module_project();
    let catalog_path = dir.path().join("recipes.json");
    fs::write(
        &catalog_path,
        r#"[{"id": "com.example.Boot33", "name": "Migrate to Spring Boot 3.3"}]"#,
    )
    .unwrap();

    let catalog = RecipeCatalog::load_or_default(Some(&catalog_path))
        .await
        .unwrap();
    assert_eq!(catalog.recipes().len(), 1);

    // No Java recipe in this catalog, so the Spring Boot goal matches
    let report = analyzer().analyze(dir.path()).await.unwrap();
    assert_eq!(
        catalog.select(&report).unwrap().recipe_id,
        "com.example.Boot33"
    );

    fs::write(&catalog_path, "not json").unwrap();
    let err = RecipeCatalog::load(&catalog_path).await.unwrap_err();
    assert!(matches!(err, AnalysisError::Catalog(_)));
}
