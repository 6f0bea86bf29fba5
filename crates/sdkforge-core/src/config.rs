//! Runtime configuration, read from `SDKFORGE_*` environment variables.

use crate::process::DEFAULT_TIMEOUT;
use maven_artifacts::RegistryConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default TypeSpec emitter package.
pub const DEFAULT_EMITTER: &str = "@azure-tools/typespec-java";

/// Default changelog tool descriptor, relative to the repository root.
pub const DEFAULT_CHANGELOG_DESCRIPTOR: &str = "eng/automation/changelog/pom.xml";

/// Names (or paths) of the external executables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toolchain {
    pub maven: String,
    pub tsp: String,
    pub tsp_client: String,
    pub npm: String,
    pub git: String,
}

impl Default for Toolchain {
    fn default() -> Self {
        Toolchain {
            maven: env_or("SDKFORGE_MVN", "mvn"),
            tsp: env_or("SDKFORGE_TSP", "tsp"),
            tsp_client: env_or("SDKFORGE_TSP_CLIENT", "tsp-client"),
            npm: env_or("SDKFORGE_NPM", "npm"),
            git: env_or("SDKFORGE_GIT", "git"),
        }
    }
}

impl Toolchain {
    /// `(role, executable)` pairs.
    pub fn entries(&self) -> [(&'static str, &str); 5] {
        [
            ("maven", self.maven.as_str()),
            ("tsp", self.tsp.as_str()),
            ("tsp-client", self.tsp_client.as_str()),
            ("npm", self.npm.as_str()),
            ("git", self.git.as_str()),
        ]
    }
}

/// Pipeline and changelog configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForgeConfig {
    pub toolchain: Toolchain,
    pub registry: RegistryConfig,
    /// Ceiling for every external call.
    pub timeout: Duration,
    /// TypeSpec emitter package name.
    pub emitter: String,
    /// Changelog tool `pom.xml`, relative to the repository root.
    pub changelog_descriptor: String,
    /// `-D` flags that keep `build` to compilation and packaging.
    pub maven_skip_flags: Vec<String>,
}

impl Default for ForgeConfig {
    fn default() -> Self {
        ForgeConfig {
            toolchain: Toolchain::default(),
            registry: RegistryConfig::default(),
            timeout: std::env::var("SDKFORGE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_TIMEOUT),
            emitter: env_or("SDKFORGE_EMITTER", DEFAULT_EMITTER),
            changelog_descriptor: env_or("SDKFORGE_CHANGELOG_POM", DEFAULT_CHANGELOG_DESCRIPTOR),
            maven_skip_flags: [
                "-Dmaven.javadoc.skip",
                "-Dcodesnippet.skip",
                "-Dgpg.skip",
                "-Drevapi.skip",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl ForgeConfig {
    /// Create a config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_registry(mut self, registry: RegistryConfig) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_toolchain(mut self, toolchain: Toolchain) -> Self {
        self.toolchain = toolchain;
        self
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}
