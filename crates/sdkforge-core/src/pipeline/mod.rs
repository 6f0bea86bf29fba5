//! Generation pipeline: init, sync, generate, build and clean.
//!
//! Each step is one or two external calls, each with an explicit working
//! directory. Tool failures come back as an unsuccessful [`StepReport`]; only
//! [`PipelineError`](crate::error::PipelineError) (missing executable, no
//! repository root) is an `Err`. Nothing is retried.

pub mod clean;
pub mod source;

use crate::config::ForgeConfig;
use crate::error::Result;
use crate::obs::{emit_step_finished, StepSpan};
use crate::paths::{
    absolutize, find_root, locate_module, locate_repo_root, ModuleLocation, BUILD_DESCRIPTOR,
    REPO_ROOT_MARKERS,
};
use crate::process::{ProcessInvocation, ProcessResult, ProcessRunner};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub use clean::{is_management_plane, GENERATED_SUBTREES, MANAGEMENT_PLANE_SEGMENT};
pub use source::{select_entry_file, LOCATION_DESCRIPTOR, SPEC_SOURCE_DIR};

/// Pipeline step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Init,
    Sync,
    Generate,
    Build,
    Clean,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Init => "init",
            Step::Sync => "sync",
            Step::Generate => "generate",
            Step::Build => "build",
            Step::Clean => "clean",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one step, in a form a calling agent can read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReport {
    pub step: Step,
    pub success: bool,
    pub text: String,
    /// Produced file: the location descriptor for `init`, the jar for `build`.
    pub path: Option<PathBuf>,
}

impl StepReport {
    fn succeeded(step: Step, text: impl Into<String>) -> Self {
        Self {
            step,
            success: true,
            text: text.into(),
            path: None,
        }
    }

    fn failed(step: Step, text: impl Into<String>) -> Self {
        Self {
            step,
            success: false,
            text: text.into(),
            path: None,
        }
    }

    /// Report for a finished tool call, embedding its output on failure.
    fn from_process(step: Step, result: &ProcessResult) -> Self {
        let mut text = format!("Java SDK {step} results:\n\n");
        if result.success {
            text.push_str(&format!("SDK {step} completed successfully.\n"));
            Self::succeeded(step, text)
        } else {
            text.push_str(&format!(
                "SDK {step} failed with {}\n\n",
                result.failure_reason()
            ));
            text.push_str(&result.render_output());
            Self::failed(step, text)
        }
    }

    fn with_path(mut self, path: Option<PathBuf>) -> Self {
        self.path = path;
        self
    }

    fn with_note(mut self, note: &str) -> Self {
        self.text.push_str(note);
        self
    }
}

/// Runs pipeline steps against modules of an SDK repository.
#[derive(Debug, Clone)]
pub struct GenerationPipeline {
    config: ForgeConfig,
    runner: ProcessRunner,
}

impl GenerationPipeline {
    pub fn new(config: ForgeConfig, runner: ProcessRunner) -> Self {
        Self { config, runner }
    }

    pub fn config(&self) -> &ForgeConfig {
        &self.config
    }

    fn invocation(&self, program: &str, working_dir: &Path) -> ProcessInvocation {
        ProcessInvocation::new(program, working_dir).timeout(self.config.timeout)
    }

    /// Create the location descriptor for a new module from a
    /// `tspconfig.yaml` URL.
    ///
    /// `workspace` must be at or below the repository root. On success the
    /// report's `path` is the new `tsp-location.yaml`, found through
    /// `git status`, when git reports exactly where it was written.
    pub async fn init(&self, workspace: &Path, tsp_config_url: &str) -> Result<StepReport> {
        let repo_root = locate_repo_root(&absolutize(workspace))?;
        StepSpan::new(Step::Init.as_str(), &repo_root)
            .instrument(self.run_init(&repo_root, tsp_config_url))
            .await
    }

    async fn run_init(&self, repo_root: &Path, tsp_config_url: &str) -> Result<StepReport> {
        let invocation = self
            .invocation(&self.config.toolchain.tsp_client, repo_root)
            .args([
                "init",
                "--debug",
                "--skip-sync-and-generate",
                "--tsp-config",
                tsp_config_url,
            ]);
        let result = self.runner.run(&invocation).await?;
        let mut report = StepReport::from_process(Step::Init, &result);

        if report.success {
            report = match self.find_new_descriptor(repo_root).await {
                Some(path) => {
                    let note = format!("Location descriptor: {}\n", path.display());
                    report.with_note(&note).with_path(Some(path))
                }
                None => report.with_note(&format!(
                    "No new {LOCATION_DESCRIPTOR} reported by git status.\n"
                )),
            };
        }

        emit_step_finished(Step::Init.as_str(), report.success);
        Ok(report)
    }

    /// Best effort: any git problem leaves the init report without a path.
    async fn find_new_descriptor(&self, repo_root: &Path) -> Option<PathBuf> {
        let invocation = self
            .invocation(&self.config.toolchain.git, repo_root)
            .args(["status", "--porcelain", "--untracked-files=all"]);
        let result = match self.runner.run(&invocation).await {
            Ok(result) => result,
            Err(err) => {
                warn!(error = %err, "could not run git status");
                return None;
            }
        };
        if !result.success {
            warn!(reason = %result.failure_reason(), "git status failed");
            return None;
        }

        let mut found = source::descriptors_in_status(&result.stdout);
        if found.len() > 1 {
            warn!(count = found.len(), "several descriptors changed; not choosing one");
            return None;
        }
        found.pop().map(|relative| repo_root.join(relative))
    }

    /// Download the specification sources referenced by the module's
    /// `tsp-location.yaml` into `TempTypeSpecFiles/`.
    pub async fn sync(&self, module_dir: &Path) -> Result<StepReport> {
        let module_dir = absolutize(module_dir);
        find_root(&module_dir.join(LOCATION_DESCRIPTOR), &[REPO_ROOT_MARKERS])?;
        StepSpan::new(Step::Sync.as_str(), &module_dir)
            .instrument(self.run_sync(&module_dir))
            .await
    }

    async fn run_sync(&self, module_dir: &Path) -> Result<StepReport> {
        let descriptor = module_dir.join(LOCATION_DESCRIPTOR);
        let report = if descriptor.is_file() {
            let invocation = self
                .invocation(&self.config.toolchain.tsp_client, module_dir)
                .args(["sync", "--debug", "--save-inputs"]);
            let result = self.runner.run(&invocation).await?;
            StepReport::from_process(Step::Sync, &result)
        } else {
            StepReport::failed(
                Step::Sync,
                format!(
                    "{} does not exist. Initialize the module first.\n",
                    descriptor.display()
                ),
            )
        };

        emit_step_finished(Step::Sync.as_str(), report.success);
        Ok(report)
    }

    /// Compile the synced specification into Java sources in `module_dir`.
    ///
    /// Installs the latest emitter next to the sources, then compiles
    /// `client.tsp` (or `main.tsp` when there is no `client.tsp`).
    pub async fn generate(&self, module_dir: &Path) -> Result<StepReport> {
        let module_dir = absolutize(module_dir);
        find_root(&module_dir.join(LOCATION_DESCRIPTOR), &[REPO_ROOT_MARKERS])?;
        StepSpan::new(Step::Generate.as_str(), &module_dir)
            .instrument(self.run_generate(&module_dir))
            .await
    }

    async fn run_generate(&self, module_dir: &Path) -> Result<StepReport> {
        let report = match source::find_spec_source(module_dir) {
            Some((source_dir, entry)) => {
                info!(source = %source_dir.display(), entry = entry, "compiling specification");
                self.compile(module_dir, &source_dir, entry).await?
            }
            None => StepReport::failed(
                Step::Generate,
                format!(
                    "No client.tsp or main.tsp found under {}. Synchronize the TypeSpec source first.\n",
                    module_dir.join(SPEC_SOURCE_DIR).display()
                ),
            ),
        };

        emit_step_finished(Step::Generate.as_str(), report.success);
        Ok(report)
    }

    async fn compile(&self, module_dir: &Path, source_dir: &Path, entry: &str) -> Result<StepReport> {
        let emitter = &self.config.emitter;

        let install = self
            .invocation(&self.config.toolchain.npm, source_dir)
            .args(["install".to_string(), format!("{emitter}@latest")]);
        let installed = self.runner.run(&install).await?;
        if !installed.success {
            return Ok(StepReport::from_process(Step::Generate, &installed)
                .with_note("\nInstalling the emitter failed.\n"));
        }

        let compile = self
            .invocation(&self.config.toolchain.tsp, source_dir)
            .args([
                "compile".to_string(),
                entry.to_string(),
                format!("--emit={emitter}"),
                format!(
                    "--option={emitter}.emitter-output-dir={}",
                    module_dir.display()
                ),
            ]);
        let result = self.runner.run(&compile).await?;
        let report = StepReport::from_process(Step::Generate, &result);
        if report.success {
            Ok(report)
        } else {
            Ok(report.with_note(
                "\nPlease check the above output for details on the failure. \
                 If it complains about a missing Java environment, prepare the environment first.\n",
            ))
        }
    }

    /// Build exactly one module plus the modules it depends on, from the
    /// repository root. On success the report's `path` is the built jar.
    pub async fn build(&self, module_dir: &Path, group_id: &str, artifact_id: &str) -> Result<StepReport> {
        let location = locate_module(&absolutize(module_dir).join(BUILD_DESCRIPTOR))?;
        StepSpan::new(Step::Build.as_str(), &location.module_root)
            .instrument(self.run_build(&location, group_id, artifact_id))
            .await
    }

    async fn run_build(
        &self,
        location: &ModuleLocation,
        group_id: &str,
        artifact_id: &str,
    ) -> Result<StepReport> {
        let mut args = vec![
            "--no-transfer-progress".to_string(),
            "clean".to_string(),
            "package".to_string(),
            "-f".to_string(),
            location.descriptor().to_string_lossy().into_owned(),
        ];
        args.extend(self.config.maven_skip_flags.iter().cloned());
        args.extend([
            "-pl".to_string(),
            format!("{group_id}:{artifact_id}"),
            "-am".to_string(),
        ]);

        let invocation = self
            .invocation(&self.config.toolchain.maven, &location.repo_root)
            .args(args);
        let result = self.runner.run(&invocation).await?;
        let mut report = StepReport::from_process(Step::Build, &result);

        if report.success {
            report = match find_built_jar(&location.module_root, artifact_id) {
                Some(jar) => {
                    let note = format!("Built artifact: {}\n", jar.display());
                    report.with_note(&note).with_path(Some(jar))
                }
                None => report.with_note("No built jar found under target/.\n"),
            };
        }

        emit_step_finished(Step::Build.as_str(), report.success);
        Ok(report)
    }

    /// Delete generated sources of a management-plane module.
    ///
    /// Any other module is left untouched and an advisory report is returned.
    pub async fn clean(&self, module_dir: &Path) -> Result<StepReport> {
        let module_dir =
            std::fs::canonicalize(module_dir).unwrap_or_else(|_| absolutize(module_dir));
        let report = StepSpan::new(Step::Clean.as_str(), &module_dir)
            .span()
            .in_scope(|| clean_module(&module_dir));
        Ok(report)
    }
}

/// The `clean` step for an absolute module directory.
fn clean_module(module_dir: &Path) -> StepReport {
    let module_name = module_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let report = if !is_management_plane(&module_name) {
        warn!(module = %module_name, "refusing to clean non management-plane module");
        StepReport::failed(
            Step::Clean,
            format!(
                "Refusing to clean '{module_name}': only management-plane modules \
                 (named with a '{MANAGEMENT_PLANE_SEGMENT}' segment) hold purely generated \
                 sources. Nothing was removed.\n"
            ),
        )
    } else {
        match clean::remove_generated_sources(module_dir) {
            Ok(removed) => {
                let mut text = String::from("Java source cleaned successfully.\n");
                for dir in &removed {
                    text.push_str(&format!("Removed {}\n", dir.display()));
                }
                StepReport::succeeded(Step::Clean, text)
            }
            Err(err) => StepReport::failed(
                Step::Clean,
                format!("Failed to clean {}: {err}\n", module_dir.display()),
            ),
        }
    };

    emit_step_finished(Step::Clean.as_str(), report.success);
    report
}

/// `target/<artifact>-<version>.jar`, skipping sources, javadoc and test jars.
pub fn find_built_jar(module_root: &Path, artifact_id: &str) -> Option<PathBuf> {
    let prefix = format!("{artifact_id}-");
    let mut jars: Vec<PathBuf> = std::fs::read_dir(module_root.join("target"))
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|name| {
                    name.starts_with(&prefix)
                        && name.ends_with(".jar")
                        && !["-sources.jar", "-javadoc.jar", "-tests.jar"]
                            .iter()
                            .any(|suffix| name.ends_with(suffix))
                })
        })
        .collect();
    jars.sort();
    jars.into_iter().next()
}
