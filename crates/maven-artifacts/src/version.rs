//! Artifact coordinates and release selection

use crate::error::RegistryError;
use crate::metadata::MavenMetadata;
use crate::Result;
use serde::{Deserialize, Serialize};

/// `groupId:artifactId` pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinates {
    pub group_id: String,
    pub artifact_id: String,
}

impl Coordinates {
    pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>) -> Self {
        Coordinates {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
        }
    }

    /// Repository path of the artifact directory, e.g. `com/azure/azure-core`
    pub fn repository_path(&self) -> String {
        format!("{}/{}", self.group_id.replace('.', "/"), self.artifact_id)
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.group_id, self.artifact_id)
    }
}

/// A published version of an artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactVersion {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    /// `true` when the version carries no pre-release qualifier
    pub stable: bool,
}

impl ArtifactVersion {
    pub fn new(coordinates: &Coordinates, version: impl Into<String>) -> Self {
        let version = version.into();
        ArtifactVersion {
            group_id: coordinates.group_id.clone(),
            artifact_id: coordinates.artifact_id.clone(),
            stable: is_stable(&version),
            version,
        }
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.group_id.clone(), self.artifact_id.clone())
    }

    /// File name of the binary jar, `{artifactId}-{version}.jar`
    pub fn jar_file_name(&self) -> String {
        format!("{}-{}.jar", self.artifact_id, self.version)
    }
}

impl std::fmt::Display for ArtifactVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.version)
    }
}

/// A version is stable when it has no `-qualifier` suffix
/// (`1.2.0` is stable, `1.2.0-beta.1` is not).
pub fn is_stable(version: &str) -> bool {
    let version = version.trim();
    !version.is_empty() && !version.contains('-')
}

/// Pick the newest stable version declared in `metadata`.
///
/// The declared list is scanned newest-first. When every version is a
/// pre-release the registry's `latest` pointer is returned verbatim, even if
/// it is itself a pre-release; when that pointer is absent the last declared
/// version is used.
pub fn select_latest_stable(
    coordinates: &Coordinates,
    metadata: &MavenMetadata,
) -> Result<ArtifactVersion> {
    if let Some(stable) = metadata.versions().iter().rev().find(|v| is_stable(v)) {
        return Ok(ArtifactVersion::new(coordinates, stable.trim()));
    }

    let fallback = metadata
        .latest()
        .or_else(|| metadata.versions().last().map(String::as_str))
        .ok_or_else(|| RegistryError::NoVersions(coordinates.to_string()))?;

    tracing::debug!(
        coordinates = %coordinates,
        latest = fallback,
        "no stable release, using declared latest"
    );
    Ok(ArtifactVersion::new(coordinates, fallback.trim()))
}
