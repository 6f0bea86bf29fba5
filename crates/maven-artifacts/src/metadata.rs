//! `maven-metadata.xml` parsing
//!
//! The registry publishes one metadata document per artifact listing every
//! released version in publication order, together with `latest` and
//! `release` pointers maintained by the repository manager.

use crate::Result;
use serde::Deserialize;

/// Parsed `maven-metadata.xml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MavenMetadata {
    #[serde(rename = "groupId", default)]
    pub group_id: Option<String>,
    #[serde(rename = "artifactId", default)]
    pub artifact_id: Option<String>,
    #[serde(default)]
    pub versioning: Versioning,
}

/// The `<versioning>` block
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Versioning {
    /// Newest version of any kind, as declared by the registry
    #[serde(default)]
    pub latest: Option<String>,
    /// Newest non-snapshot version, as declared by the registry
    #[serde(default)]
    pub release: Option<String>,
    #[serde(default)]
    pub versions: VersionList,
    #[serde(rename = "lastUpdated", default)]
    pub last_updated: Option<String>,
}

/// The `<versions>` list, oldest first
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct VersionList {
    #[serde(rename = "version", default)]
    pub version: Vec<String>,
}

impl MavenMetadata {
    /// Parse a metadata document
    pub fn parse(xml: &str) -> Result<Self> {
        let metadata: MavenMetadata = quick_xml::de::from_str(xml)?;
        Ok(metadata)
    }

    /// Declared versions, oldest to newest
    pub fn versions(&self) -> &[String] {
        &self.versioning.versions.version
    }

    /// The registry's own `latest` pointer
    pub fn latest(&self) -> Option<&str> {
        self.versioning.latest.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<metadata modelVersion="1.1.0">
  <groupId>com.azure.resourcemanager</groupId>
  <artifactId>azure-resourcemanager-widgets</artifactId>
  <versioning>
    <latest>1.1.0</latest>
    <release>1.1.0</release>
    <versions>
      <version>1.0.0</version>
      <version>1.1.0-beta.1</version>
      <version>1.1.0</version>
    </versions>
    <lastUpdated>20240611093012</lastUpdated>
  </versioning>
</metadata>"#;

    #[test]
    fn test_parse_sample_metadata() {
        let metadata = MavenMetadata::parse(SAMPLE).unwrap();
        assert_eq!(
            metadata.group_id.as_deref(),
            Some("com.azure.resourcemanager")
        );
        assert_eq!(
            metadata.artifact_id.as_deref(),
            Some("azure-resourcemanager-widgets")
        );
        assert_eq!(metadata.latest(), Some("1.1.0"));
        assert_eq!(metadata.versions(), ["1.0.0", "1.1.0-beta.1", "1.1.0"]);
        assert_eq!(
            metadata.versioning.last_updated.as_deref(),
            Some("20240611093012")
        );
    }

    #[test]
    fn test_parse_without_versions_block() {
        let xml = "<metadata><groupId>g</groupId><artifactId>a</artifactId></metadata>";
        let metadata = MavenMetadata::parse(xml).unwrap();
        assert!(metadata.versions().is_empty());
        assert!(metadata.latest().is_none());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(MavenMetadata::parse("<metadata><versioning>").is_err());
    }
}
