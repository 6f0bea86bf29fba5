//! sdkforge - Java SDK generation from TypeSpec
//!
//! The `sdkforge` command drives the TypeSpec, Maven and npm toolchains for
//! one module of an SDK repository.
//!
//! ## Commands
//!
//! - `init` / `sync` / `generate` / `build` / `clean`: single pipeline steps
//! - `changelog`: compare a built jar with the latest stable release
//! - `migrate`: repeat generate, build and changelog until the changelog settles
//! - `call`: invoke a registered tool with JSON arguments

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use maven_artifacts::{RegistryClient, RegistryConfig};
use sdkforge_core::cookbook::{converge, Progress};
use sdkforge_core::{
    check_environment, client_rename, render_environment, typespec_migration, ChangelogDriver,
    ForgeConfig, GenerationPipeline, ProcessRunner, StepReport, ToolRegistry,
};
use serde_json::Value;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "sdkforge")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Generate, build and change-track Java SDKs from TypeSpec", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Timeout for every external tool call, in seconds
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Maven repository base URL
    #[arg(long, global = true)]
    registry: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create tsp-location.yaml for a new module from a tspconfig.yaml URL
    Init {
        /// URL of the tspconfig.yaml
        #[arg(long)]
        tsp_config: String,

        /// Directory at or below the repository root
        #[arg(default_value = ".")]
        workspace: PathBuf,
    },

    /// Download the TypeSpec source referenced by tsp-location.yaml
    Sync {
        /// Module directory holding tsp-location.yaml
        #[arg(default_value = ".")]
        module: PathBuf,
    },

    /// Generate Java sources from the synced TypeSpec source
    Generate {
        /// Module directory holding tsp-location.yaml
        #[arg(default_value = ".")]
        module: PathBuf,
    },

    /// Build one module and the modules it depends on
    Build {
        #[arg(long)]
        group_id: String,

        #[arg(long)]
        artifact_id: String,

        /// Module directory
        #[arg(default_value = ".")]
        module: PathBuf,
    },

    /// Delete generated sources of a management-plane module
    Clean {
        /// Module directory
        #[arg(default_value = ".")]
        module: PathBuf,
    },

    /// Compare a built jar with the latest stable release
    Changelog {
        /// Built jar under the module's target directory
        jar: PathBuf,

        #[arg(long)]
        group_id: String,

        #[arg(long)]
        artifact_id: String,
    },

    /// Regenerate, rebuild and diff until the changelog stops changing
    Migrate {
        #[arg(long)]
        group_id: String,

        #[arg(long)]
        artifact_id: String,

        /// Upper bound on generate-build-changelog rounds
        #[arg(long, default_value = "3")]
        max_iterations: usize,

        /// Module directory
        #[arg(default_value = ".")]
        module: PathBuf,
    },

    /// Show the latest stable release of an artifact
    Latest {
        group_id: String,
        artifact_id: String,
    },

    /// Instructions for renaming a model, operation or parameter
    RenameGuide { old_name: String, new_name: String },

    /// Instructions for migrating a module to TypeSpec
    MigrationGuide,

    /// Check which toolchain executables are installed
    Doctor {
        #[arg(default_value = ".")]
        cwd: PathBuf,
    },

    /// Invoke a registered tool
    Call {
        /// Tool name, e.g. build_java_sdk
        tool: String,

        /// Arguments as a JSON object
        #[arg(long, default_value = "{}")]
        args: String,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    sdkforge_core::telemetry::init_tracing(cli.json, level);

    let config = forge_config(cli.timeout_secs, cli.registry.as_deref());
    let pipeline = GenerationPipeline::new(config.clone(), ProcessRunner::new());

    match cli.command {
        Commands::Init {
            tsp_config,
            workspace,
        } => report(pipeline.init(&workspace, &tsp_config).await?),
        Commands::Sync { module } => report(pipeline.sync(&module).await?),
        Commands::Generate { module } => report(pipeline.generate(&module).await?),
        Commands::Build {
            group_id,
            artifact_id,
            module,
        } => report(pipeline.build(&module, &group_id, &artifact_id).await?),
        Commands::Clean { module } => report(pipeline.clean(&module).await?),
        Commands::Changelog {
            jar,
            group_id,
            artifact_id,
        } => {
            let driver = changelog_driver(&config)?;
            let changelog = driver.for_release(&jar, &group_id, &artifact_id).await?;
            print!("{}", changelog.text);
            Ok(exit_code(changelog.success))
        }
        Commands::Migrate {
            group_id,
            artifact_id,
            max_iterations,
            module,
        } => {
            let driver = changelog_driver(&config)?;
            cmd_migrate(
                &pipeline,
                &driver,
                &module,
                &group_id,
                &artifact_id,
                max_iterations,
            )
            .await
        }
        Commands::Latest {
            group_id,
            artifact_id,
        } => cmd_latest(&config, &group_id, &artifact_id).await,
        Commands::RenameGuide { old_name, new_name } => {
            print!("{}", client_rename(&old_name, &new_name));
            Ok(ExitCode::SUCCESS)
        }
        Commands::MigrationGuide => {
            print!("{}", typespec_migration());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Doctor { cwd } => {
            let tools = check_environment(&config.toolchain, &cwd);
            print!("{}", render_environment(&tools));
            Ok(exit_code(tools.iter().all(|t| t.is_available())))
        }
        Commands::Call { tool, args } => {
            let args: Value =
                serde_json::from_str(&args).context("--args must be a JSON document")?;
            let driver = changelog_driver(&config)?;
            let registry = ToolRegistry::standard(Arc::new(pipeline), Arc::new(driver));
            let text = registry
                .call(&tool, args)
                .await
                .with_context(|| format!("Tool '{}' failed", tool))?;
            print!("{}", text);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn forge_config(timeout_secs: Option<u64>, registry: Option<&str>) -> ForgeConfig {
    let mut config = ForgeConfig::from_env();
    if let Some(secs) = timeout_secs {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    if let Some(url) = registry {
        config = config.with_registry(RegistryConfig::new(url));
    }
    config
}

fn changelog_driver(config: &ForgeConfig) -> Result<ChangelogDriver> {
    let registry =
        RegistryClient::new(config.registry.clone()).context("Failed to create registry client")?;
    Ok(ChangelogDriver::new(
        config.clone(),
        ProcessRunner::new(),
        registry,
    ))
}

fn report(step: StepReport) -> Result<ExitCode> {
    print!("{}", step.text);
    Ok(exit_code(step.success))
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

async fn cmd_latest(config: &ForgeConfig, group_id: &str, artifact_id: &str) -> Result<ExitCode> {
    let client =
        RegistryClient::new(config.registry.clone()).context("Failed to create registry client")?;
    let version = client
        .resolve_latest_stable(group_id, artifact_id)
        .await
        .with_context(|| format!("Failed to resolve {}:{}", group_id, artifact_id))?;

    println!("{}", version.version);
    if !version.stable {
        info!(version = %version.version, "no stable release; showing declared latest");
    }
    Ok(ExitCode::SUCCESS)
}

/// Outcome of one generate-build-changelog round.
enum Round {
    Changelog(String),
    Failed(String),
}

#[derive(Default)]
struct MigrationState {
    last_changelog: Option<String>,
    failure: Option<String>,
}

async fn migration_round(
    pipeline: &GenerationPipeline,
    driver: &ChangelogDriver,
    module: &Path,
    group_id: &str,
    artifact_id: &str,
) -> Result<Round> {
    let generated = pipeline.generate(module).await?;
    if !generated.success {
        return Ok(Round::Failed(generated.text));
    }

    let built = pipeline.build(module, group_id, artifact_id).await?;
    let jar = match built.path {
        Some(jar) if built.success => jar,
        _ => return Ok(Round::Failed(built.text)),
    };

    let changelog = driver.for_release(&jar, group_id, artifact_id).await?;
    if changelog.success {
        Ok(Round::Changelog(changelog.text))
    } else {
        Ok(Round::Failed(changelog.text))
    }
}

async fn cmd_migrate(
    pipeline: &GenerationPipeline,
    driver: &ChangelogDriver,
    module: &Path,
    group_id: &str,
    artifact_id: &str,
    max_iterations: usize,
) -> Result<ExitCode> {
    let state = RefCell::new(MigrationState::default());

    let outcome = converge(max_iterations, |iteration| {
        let state = &state;
        async move {
            info!(iteration = iteration, "migration round");
            match migration_round(pipeline, driver, module, group_id, artifact_id).await? {
                Round::Failed(text) => {
                    state.borrow_mut().failure = Some(text);
                    Ok::<_, anyhow::Error>(Progress::Stable)
                }
                Round::Changelog(text) => {
                    let mut state = state.borrow_mut();
                    let settled = state.last_changelog.as_deref() == Some(text.as_str());
                    state.last_changelog = Some(text);
                    Ok(if settled {
                        Progress::Stable
                    } else {
                        Progress::Changed
                    })
                }
            }
        }
    })
    .await?;

    let state = state.into_inner();
    if let Some(text) = state.failure {
        print!("{}", text);
        return Ok(ExitCode::FAILURE);
    }

    if let Some(text) = state.last_changelog {
        print!("{}", text);
    }
    eprintln!(
        "Migration stopped after {} round(s); changelog {}.",
        outcome.iterations,
        if outcome.stable { "settled" } else { "still changing" }
    );
    Ok(exit_code(outcome.stable))
}
