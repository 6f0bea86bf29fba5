//! Maven registry client
//!
//! Fetches `maven-metadata.xml` documents and release jars over HTTP.

use crate::error::RegistryError;
use crate::metadata::MavenMetadata;
use crate::scoped::{DownloadedArtifact, ScopedTempDir};
use crate::version::{select_latest_stable, ArtifactVersion, Coordinates};
use crate::Result;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

/// Maven Central
pub const DEFAULT_REPOSITORY: &str = "https://repo1.maven.org/maven2";

const TEMP_PREFIX: &str = "java-sdk-changelog-";

/// Registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Repository base URL, without trailing slash
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Parent of download directories; the system temp dir when unset
    pub download_root: Option<PathBuf>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        RegistryConfig {
            base_url: std::env::var("SDKFORGE_MAVEN_REPOSITORY")
                .unwrap_or_else(|_| DEFAULT_REPOSITORY.to_string()),
            timeout: std::env::var("SDKFORGE_HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(Duration::from_secs(60)),
            download_root: None,
        }
    }
}

impl RegistryConfig {
    /// Create a config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Create config for a specific repository
    pub fn new(base_url: &str) -> Self {
        RegistryConfig {
            base_url: base_url.trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_download_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.download_root = Some(root.into());
        self
    }
}

/// Client for a Maven repository
#[derive(Debug, Clone)]
pub struct RegistryClient {
    config: RegistryConfig,
    http_client: reqwest::Client,
}

impl RegistryClient {
    /// Create a new registry client
    pub fn new(config: RegistryConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("sdkforge-maven-artifacts/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()
            .map_err(|e| RegistryError::Client(e.to_string()))?;

        Ok(RegistryClient {
            config,
            http_client,
        })
    }

    /// Create client from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(RegistryConfig::from_env())
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// `{registry}/{groupPath}/{artifactId}/maven-metadata.xml`
    pub fn metadata_url(&self, coordinates: &Coordinates) -> String {
        format!(
            "{}/{}/maven-metadata.xml",
            self.base(),
            coordinates.repository_path()
        )
    }

    /// `{registry}/{groupPath}/{artifactId}/{version}/{artifactId}-{version}.jar`
    pub fn artifact_url(&self, version: &ArtifactVersion) -> String {
        format!(
            "{}/{}/{}/{}",
            self.base(),
            version.coordinates().repository_path(),
            version.version,
            version.jar_file_name()
        )
    }

    fn base(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    /// Fetch and parse the metadata document for an artifact
    pub async fn fetch_metadata(&self, coordinates: &Coordinates) -> Result<MavenMetadata> {
        let url = self.metadata_url(coordinates);
        debug!(url = %url, "fetching maven metadata");

        let response = self.get(&url).await?;
        let body = response
            .text()
            .await
            .map_err(|e| RegistryError::request(&url, e))?;

        MavenMetadata::parse(&body)
    }

    /// Resolve the newest stable release of `group_id:artifact_id`
    pub async fn resolve_latest_stable(
        &self,
        group_id: &str,
        artifact_id: &str,
    ) -> Result<ArtifactVersion> {
        let coordinates = Coordinates::new(group_id, artifact_id);
        let metadata = self.fetch_metadata(&coordinates).await?;
        let version = select_latest_stable(&coordinates, &metadata)?;

        info!(
            coordinates = %coordinates,
            version = %version.version,
            stable = version.stable,
            "resolved latest release"
        );
        Ok(version)
    }

    /// Download the release jar into a fresh [`ScopedTempDir`]
    ///
    /// The bytes are written to a `.part` file and renamed into place, so the
    /// final name never refers to a partially written file. The returned
    /// [`DownloadedArtifact`] owns the directory.
    pub async fn download_artifact(&self, version: &ArtifactVersion) -> Result<DownloadedArtifact> {
        let url = self.artifact_url(version);
        let dir = match &self.config.download_root {
            Some(root) => ScopedTempDir::new_in(root, TEMP_PREFIX)?,
            None => ScopedTempDir::new(TEMP_PREFIX)?,
        };

        info!(url = %url, dir = %dir.path().display(), "downloading artifact");

        let response = self.get(&url).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| RegistryError::request(&url, e))?;

        let file_name = version.jar_file_name();
        let partial = dir.path().join(format!("{file_name}.part"));
        let target = dir.path().join(&file_name);

        tokio::fs::write(&partial, &bytes).await?;
        tokio::fs::rename(&partial, &target).await?;
        let path = tokio::fs::canonicalize(&target).await?;

        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let sha256 = hex::encode(hasher.finalize());

        debug!(path = %path.display(), sha256 = %&sha256[..12], size = bytes.len(), "artifact written");

        Ok(DownloadedArtifact::new(
            version.clone(),
            path,
            sha256,
            bytes.len() as u64,
            dir,
        ))
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| RegistryError::request(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RegistryError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}
