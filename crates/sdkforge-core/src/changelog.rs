//! Changelog generation between two builds of the same library.
//!
//! [`ChangelogDriver::generate`] runs an external comparison tool over an old
//! and a new jar. [`ChangelogDriver::for_release`] fetches the old jar (the
//! latest stable release) from the registry first and owns the temporary
//! directory it lands in until the comparison has finished.

use crate::config::ForgeConfig;
use crate::error::{PipelineError, ProcessError};
use crate::paths::{find_root, REPO_ROOT_MARKERS};
use crate::process::{ProcessInvocation, ProcessRunner};
use maven_artifacts::{ArtifactVersion, RegistryClient};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Replaced by the old artifact path in [`DiffToolContext::args`].
pub const OLD_PLACEHOLDER: &str = "{old}";

/// Replaced by the new artifact path in [`DiffToolContext::args`].
pub const NEW_PLACEHOLDER: &str = "{new}";

/// How to invoke the comparison tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffToolContext {
    pub program: String,
    /// Argument template; `{old}` and `{new}` are substituted per call.
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    pub timeout: Duration,
}

impl DiffToolContext {
    pub fn new(program: impl Into<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: working_dir.into(),
            timeout: crate::process::DEFAULT_TIMEOUT,
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The repository's Maven changelog tool, run from `repo_root`.
    pub fn maven(config: &ForgeConfig, repo_root: &Path) -> Self {
        let descriptor = repo_root.join(&config.changelog_descriptor);
        Self::new(config.toolchain.maven.clone(), repo_root)
            .args([
                "--no-transfer-progress".to_string(),
                "clean".to_string(),
                "compile".to_string(),
                "exec:java".to_string(),
                "-q".to_string(),
                "-f".to_string(),
                descriptor.to_string_lossy().into_owned(),
                format!("-DOLD_JAR={OLD_PLACEHOLDER}"),
                format!("-DNEW_JAR={NEW_PLACEHOLDER}"),
            ])
            .timeout(config.timeout)
    }

    fn invocation(&self, old: &Path, new: &Path) -> ProcessInvocation {
        let old = old.to_string_lossy();
        let new = new.to_string_lossy();
        ProcessInvocation::new(self.program.clone(), self.working_dir.clone())
            .args(self.args.iter().map(|arg| {
                arg.replace(OLD_PLACEHOLDER, &old)
                    .replace(NEW_PLACEHOLDER, &new)
            }))
            .timeout(self.timeout)
    }
}

/// Comparison outcome. Failed comparisons still carry their diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangelogReport {
    pub success: bool,
    pub text: String,
    /// Release the new build was compared against, when one was resolved.
    pub baseline: Option<ArtifactVersion>,
}

impl ChangelogReport {
    fn failed(text: String) -> Self {
        Self {
            success: false,
            text,
            baseline: None,
        }
    }
}

/// Drives the comparison tool.
pub struct ChangelogDriver {
    config: ForgeConfig,
    runner: ProcessRunner,
    registry: RegistryClient,
    diff_tool: Option<DiffToolContext>,
}

impl ChangelogDriver {
    pub fn new(config: ForgeConfig, runner: ProcessRunner, registry: RegistryClient) -> Self {
        Self {
            config,
            runner,
            registry,
            diff_tool: None,
        }
    }

    /// Use `context` instead of the repository's Maven changelog tool.
    pub fn with_diff_tool(mut self, context: DiffToolContext) -> Self {
        self.diff_tool = Some(context);
        self
    }

    /// Compare `old` with `new`.
    ///
    /// A non-zero exit or a timeout still yields a report, holding the
    /// captured output. Only a tool that cannot be started is an error.
    pub async fn generate(
        &self,
        old: &Path,
        new: &Path,
        context: &DiffToolContext,
    ) -> Result<ChangelogReport, ProcessError> {
        let result = self.runner.run(&context.invocation(old, new)).await?;

        if result.success {
            return Ok(ChangelogReport {
                success: true,
                text: result.stdout,
                baseline: None,
            });
        }

        warn!(reason = %result.failure_reason(), "changelog tool failed");
        let mut text = format!(
            "Java SDK changelog failed with {}\n\nOld artifact: {}\nNew artifact: {}\n\n",
            result.failure_reason(),
            old.display(),
            new.display()
        );
        text.push_str(&result.render_output());
        Ok(ChangelogReport::failed(text))
    }

    /// Compare a freshly built jar with the latest stable release of
    /// `group_id:artifact_id`.
    ///
    /// The released jar is downloaded into a scoped temporary directory that
    /// is removed once the comparison has run, whatever its outcome.
    pub async fn for_release(
        &self,
        new_jar: &Path,
        group_id: &str,
        artifact_id: &str,
    ) -> Result<ChangelogReport, PipelineError> {
        let repo_root = find_root(new_jar, &[REPO_ROOT_MARKERS])?;

        let baseline = match self.registry.resolve_latest_stable(group_id, artifact_id).await {
            Ok(version) => version,
            Err(err) => {
                return Ok(ChangelogReport::failed(format!(
                    "Unable to resolve the latest release of {group_id}:{artifact_id}: {err}\n"
                )))
            }
        };

        let downloaded = match self.registry.download_artifact(&baseline).await {
            Ok(artifact) => artifact,
            Err(err) => {
                return Ok(ChangelogReport {
                    baseline: Some(baseline.clone()),
                    ..ChangelogReport::failed(format!("Unable to download {baseline}: {err}\n"))
                })
            }
        };

        info!(
            baseline = %baseline,
            new_jar = %new_jar.display(),
            "comparing against released artifact"
        );

        let context = self
            .diff_tool
            .clone()
            .unwrap_or_else(|| DiffToolContext::maven(&self.config, &repo_root));
        let outcome = self.generate(&downloaded.path, new_jar, &context).await;

        if let Err(err) = downloaded.release() {
            warn!(error = %err, "failed to clean up downloaded artifact");
        }

        let mut report = outcome?;
        report.baseline = Some(baseline);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders_are_substituted() {
        let ctx = DiffToolContext::new("diff-tool", "/repo").args(["--old={old}", "{new}", "-q"]);
        let inv = ctx.invocation(Path::new("/tmp/a.jar"), Path::new("/repo/target/b.jar"));
        assert_eq!(inv.args, ["--old=/tmp/a.jar", "/repo/target/b.jar", "-q"]);
        assert_eq!(inv.working_dir, PathBuf::from("/repo"));
    }

    #[test]
    fn test_maven_context() {
        let config = ForgeConfig::default().with_timeout(Duration::from_secs(42));
        let ctx = DiffToolContext::maven(&config, Path::new("/repo"));
        let inv = ctx.invocation(Path::new("/tmp/old.jar"), Path::new("/new.jar"));

        assert_eq!(inv.program, config.toolchain.maven);
        assert_eq!(inv.timeout, Duration::from_secs(42));
        assert!(inv.args.contains(&"-DOLD_JAR=/tmp/old.jar".to_string()));
        assert!(inv.args.contains(&"-DNEW_JAR=/new.jar".to_string()));
        assert!(inv
            .args
            .contains(&"/repo/eng/automation/changelog/pom.xml".to_string()));
    }
}
