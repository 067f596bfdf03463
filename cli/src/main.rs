mod config;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use config::{MigrantConfig, ToolSource};
use dialoguer::{Input, Select};
use migrant_core::analysis::{AnalysisReport, MavenAnalyzer, RecipeCatalog, RecipeMatch};
use migrant_core::llm::LlmClient;
use migrant_core::tools::mcp::McpToolCollection;
use migrant_core::tools::native::{ProjectTools, TransformTools};
use migrant_core::tools::{ToolCollection, ToolRegistry};
use migrant_core::{
    CognitiveLoop, MigrantError, MigrationKind, PreferenceStore, Preferences, ReleaseChannel, Result,
};
use serde_json::json;
use tracing::{error, info, warn};

/// Migrant: LLM-driven Java/Maven upgrade agent.
#[derive(Debug, Parser)]
#[command(name = "migrant", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Analyze a Maven project once and print a summary.
    Analyze {
        /// Project directory containing pom.xml
        #[arg(long)]
        path: PathBuf,

        /// Also write the full report as JSON to this file
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Run the migration agent until it gives a final answer.
    ///
    /// Missing options are asked for interactively, offering the last
    /// saved preferences as defaults.
    Run {
        #[arg(long)]
        path: Option<PathBuf>,

        /// java or python
        #[arg(long)]
        kind: Option<MigrationKind>,

        /// stable or rc
        #[arg(long)]
        channel: Option<ReleaseChannel>,

        #[arg(long)]
        max_iterations: Option<usize>,

        /// Do not remember these preferences for the next run
        #[arg(long)]
        no_save: bool,
    },

    /// Show or clear saved preferences.
    Preferences {
        #[command(subcommand)]
        command: PreferencesCommand,
    },
}

#[derive(Debug, Subcommand)]
enum PreferencesCommand {
    Show,
    Clear,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    // Logs go to stderr; stdout carries reports only
    let filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "info,migrant_core=info,migrant=info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Analyze { path, output } => analyze(&path, output.as_deref()).await,
        Command::Run {
            path,
            kind,
            channel,
            max_iterations,
            no_save,
        } => run(path, kind, channel, max_iterations, no_save).await,
        Command::Preferences { command } => preferences(command),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            error!(target: "migrant", error = %e, "Command failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn require_directory(path: &Path) -> Option<ExitCode> {
    if path.is_dir() {
        None
    } else {
        eprintln!("Error: {} is not a directory", path.display());
        Some(ExitCode::FAILURE)
    }
}

async fn analyze(path: &Path, output: Option<&Path>) -> Result<ExitCode> {
    if let Some(code) = require_directory(path) {
        return Ok(code);
    }
    let cfg = MigrantConfig::load();

    let report = MavenAnalyzer::new(cfg.analysis.clone()).analyze(path).await?;
    let catalog = RecipeCatalog::load_or_default(cfg.analysis.recipes_path.as_deref()).await?;
    let selected = catalog.select(&report);

    print_summary(&report, selected.as_ref());

    if let Some(output) = output {
        let document = json!({
            "analysis": report,
            "recipe": selected,
        });
        tokio::fs::write(output, serde_json::to_string_pretty(&document)?).await?;
        info!(target: "migrant", path = %output.display(), "Wrote analysis report");
        println!("\nReport written to {}", output.display());
    }
    Ok(ExitCode::SUCCESS)
}

fn print_summary(report: &AnalysisReport, selected: Option<&RecipeMatch>) {
    println!("Project: {}", report.project_path);
    println!("Modules: {}", report.module_count);
    println!(
        "Java version: {}",
        report.jdk_version.as_deref().unwrap_or("unknown")
    );
    println!(
        "Spring Boot version: {}",
        report.spring_boot_version.as_deref().unwrap_or("not used")
    );
    println!("Dependencies: {}", report.dependency_count);

    println!("\nRecommendations:");
    if !report.needs_upgrade() {
        println!("  - No upgrade needed");
    }
    if report.is_eligible_for_java_upgrade {
        println!(
            "  - Upgrade Java {} -> {}",
            report.jdk_version.as_deref().unwrap_or("?"),
            report.latest_java_version
        );
    }
    if report.is_eligible_for_spring_upgrade {
        println!(
            "  - Upgrade Spring Boot {} -> {}",
            report.spring_boot_version.as_deref().unwrap_or("?"),
            report.latest_spring_boot_version
        );
    }

    match selected {
        Some(recipe) => println!(
            "\nSelected recipe: {} ({})",
            recipe.recipe_id, recipe.recipe_name
        ),
        None if report.needs_upgrade() => println!("\nNo suitable migration recipe found"),
        None => {}
    }
}

fn open_store() -> Option<PreferenceStore> {
    match PreferenceStore::open_default() {
        Ok(store) => Some(store),
        Err(e) => {
            warn!(target: "migrant", error = %e, "Preferences unavailable");
            None
        }
    }
}

fn prompt_error(err: dialoguer::Error) -> MigrantError {
    MigrantError::InputError(err.to_string())
}

/// Fill in whatever the command line left out
fn resolve_preferences(
    saved: Option<Preferences>,
    path: Option<PathBuf>,
    kind: Option<MigrationKind>,
    channel: Option<ReleaseChannel>,
) -> Result<Preferences> {
    let defaults = saved.unwrap_or_else(|| {
        Preferences::new(
            std::env::current_dir().unwrap_or_default(),
            MigrationKind::default(),
            ReleaseChannel::default(),
        )
    });

    let project_path = match path {
        Some(p) => p,
        None => PathBuf::from(
            Input::<String>::new()
                .with_prompt("Project path")
                .default(defaults.project_path.display().to_string())
                .interact_text()
                .map_err(prompt_error)?,
        ),
    };

    let migration_kind = match kind {
        Some(k) => k,
        None => {
            let options = [MigrationKind::Java, MigrationKind::Python];
            let current = options
                .iter()
                .position(|k| *k == defaults.migration_kind)
                .unwrap_or(0);
            let choice = Select::new()
                .with_prompt("Migration type")
                .items(&options)
                .default(current)
                .interact()
                .map_err(prompt_error)?;
            options[choice]
        }
    };

    let release_channel = match channel {
        Some(c) => c,
        None => {
            let options = [ReleaseChannel::Stable, ReleaseChannel::ReleaseCandidate];
            let current = options
                .iter()
                .position(|c| *c == defaults.release_channel)
                .unwrap_or(0);
            let choice = Select::new()
                .with_prompt("Release type")
                .items(&options)
                .default(current)
                .interact()
                .map_err(prompt_error)?;
            options[choice]
        }
    };

    Ok(Preferences::new(project_path, migration_kind, release_channel))
}

async fn run(
    path: Option<PathBuf>,
    kind: Option<MigrationKind>,
    channel: Option<ReleaseChannel>,
    max_iterations: Option<usize>,
    no_save: bool,
) -> Result<ExitCode> {
    let store = open_store();
    let saved = store.as_ref().and_then(PreferenceStore::load);
    let prefs = resolve_preferences(saved, path, kind, channel)?;
    if let Some(code) = require_directory(&prefs.project_path) {
        return Ok(code);
    }

    if !no_save {
        if let Some(store) = &store {
            if let Err(e) = store.save(&prefs) {
                warn!(target: "migrant", error = %e, "Failed to save preferences");
            }
        }
    }

    let mut cfg = MigrantConfig::load();
    if let Some(max) = max_iterations {
        cfg.agent = cfg.agent.with_max_iterations(max);
    }

    let mut mcp_servers: Vec<Arc<McpToolCollection>> = Vec::new();
    let project: Arc<dyn ToolCollection> = match &cfg.tools.project {
        ToolSource::Native => {
            let catalog =
                RecipeCatalog::load_or_default(cfg.analysis.recipes_path.as_deref()).await?;
            Arc::new(ProjectTools::new(
                prefs.project_path.clone(),
                MavenAnalyzer::new(cfg.analysis.clone()),
                catalog,
            ))
        }
        ToolSource::Mcp(server) => {
            let collection = Arc::new(McpToolCollection::connect(server.clone()).await?);
            mcp_servers.push(Arc::clone(&collection));
            collection
        }
    };
    let transform: Arc<dyn ToolCollection> = match &cfg.tools.transform {
        ToolSource::Native => Arc::new(TransformTools::new(
            cfg.transform.clone(),
            prefs.project_path.clone(),
        )),
        ToolSource::Mcp(server) => {
            let collection = Arc::new(McpToolCollection::connect(server.clone()).await?);
            mcp_servers.push(Arc::clone(&collection));
            collection
        }
    };

    let registry = Arc::new(ToolRegistry::build(vec![project, transform]).await?);
    let model = Arc::new(LlmClient::new(cfg.llm.clone())?);
    let agent = CognitiveLoop::new(model, registry, cfg.agent.clone());

    let outcome = agent
        .run_with(prefs, |report| println!("{}", report))
        .await;

    for server in &mcp_servers {
        if let Err(e) = server.client().disconnect().await {
            warn!(target: "migrant", error = %e, "Failed to stop MCP server");
        }
    }

    let outcome = outcome?;
    info!(
        target: "migrant",
        iterations = outcome.iterations,
        budget_exhausted = outcome.budget_exhausted,
        "Migration run finished"
    );
    Ok(ExitCode::SUCCESS)
}

fn preferences(command: PreferencesCommand) -> Result<ExitCode> {
    let store = PreferenceStore::open_default()?;
    match command {
        PreferencesCommand::Show => match store.load() {
            Some(prefs) => println!("{}", serde_json::to_string_pretty(&prefs)?),
            None => println!("No saved preferences"),
        },
        PreferencesCommand::Clear => {
            store.clear()?;
            println!("Preferences cleared");
        }
    }
    Ok(ExitCode::SUCCESS)
}
