//! Registry client tests against a mock Maven repository.

use std::time::Duration;

use maven_artifacts::{RegistryClient, RegistryConfig, RegistryError};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const WIDGETS_PATH: &str = "/com/azure/resourcemanager/azure-resourcemanager-widgets";

fn metadata_xml(latest: &str, versions: &[&str]) -> String {
    let list: String = versions
        .iter()
        .map(|v| format!("      <version>{v}</version>\n"))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<metadata>
  <groupId>com.azure.resourcemanager</groupId>
  <artifactId>azure-resourcemanager-widgets</artifactId>
  <versioning>
    <latest>{latest}</latest>
    <release>{latest}</release>
    <versions>
{list}    </versions>
  </versioning>
</metadata>"#
    )
}

fn client_for(server: &MockServer) -> RegistryClient {
    RegistryClient::new(RegistryConfig::new(&server.uri()).with_timeout(Duration::from_secs(5)))
        .expect("client")
}

#[tokio::test]
async fn resolves_newest_stable_and_skips_prerelease() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{WIDGETS_PATH}/maven-metadata.xml")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(metadata_xml("1.1.0", &["1.0.0", "1.1.0-beta.1", "1.1.0"])),
        )
        .mount(&server)
        .await;

    let version = client_for(&server)
        .resolve_latest_stable("com.azure.resourcemanager", "azure-resourcemanager-widgets")
        .await
        .unwrap();

    assert_eq!(version.version, "1.1.0");
    assert!(version.stable);
    assert_eq!(version.artifact_id, "azure-resourcemanager-widgets");
}

#[tokio::test]
async fn all_prerelease_returns_declared_latest() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{WIDGETS_PATH}/maven-metadata.xml")))
        .respond_with(ResponseTemplate::new(200).set_body_string(metadata_xml(
            "1.0.0-beta.2",
            &["1.0.0-beta.1", "1.0.0-beta.2"],
        )))
        .mount(&server)
        .await;

    let version = client_for(&server)
        .resolve_latest_stable("com.azure.resourcemanager", "azure-resourcemanager-widgets")
        .await
        .unwrap();

    assert_eq!(version.version, "1.0.0-beta.2");
    assert!(!version.stable);
}

#[tokio::test]
async fn missing_metadata_is_a_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .resolve_latest_stable("com.azure.resourcemanager", "azure-resourcemanager-widgets")
        .await
        .unwrap_err();

    assert!(matches!(err, RegistryError::Status { status: 404, .. }));
}

#[tokio::test]
async fn download_writes_file_into_scoped_directory() {
    let server = MockServer::start().await;
    let jar_bytes = b"PK\x03\x04fake-jar-contents".to_vec();
    Mock::given(method("GET"))
        .and(path(format!(
            "{WIDGETS_PATH}/1.1.0/azure-resourcemanager-widgets-1.1.0.jar"
        )))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(jar_bytes.clone()))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let version = maven_artifacts::ArtifactVersion::new(
        &maven_artifacts::Coordinates::new(
            "com.azure.resourcemanager",
            "azure-resourcemanager-widgets",
        ),
        "1.1.0",
    );

    let artifact = client.download_artifact(&version).await.unwrap();
    assert!(artifact.path.is_absolute());
    assert_eq!(std::fs::read(&artifact.path).unwrap(), jar_bytes);
    assert_eq!(artifact.size, jar_bytes.len() as u64);
    assert_eq!(artifact.sha256.len(), 64);
    assert_eq!(
        artifact.path.file_name().unwrap(),
        "azure-resourcemanager-widgets-1.1.0.jar"
    );

    let leftovers: Vec<_> = std::fs::read_dir(artifact.directory())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(leftovers, vec!["azure-resourcemanager-widgets-1.1.0.jar"]);

    let dir = artifact.directory().to_path_buf();
    artifact.release().unwrap();
    assert!(!dir.exists());
}

#[tokio::test]
async fn failed_download_is_a_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let version = maven_artifacts::ArtifactVersion::new(
        &maven_artifacts::Coordinates::new("com.azure", "azure-unknown"),
        "9.9.9",
    );
    let root = tempfile::tempdir().unwrap();
    let client = RegistryClient::new(
        RegistryConfig::new(&server.uri())
            .with_timeout(Duration::from_secs(5))
            .with_download_root(root.path()),
    )
    .unwrap();

    let err = client.download_artifact(&version).await.unwrap_err();

    assert!(matches!(err, RegistryError::Status { status: 500, .. }));
    // The directory created for the download is gone again.
    let left: Vec<_> = std::fs::read_dir(root.path()).unwrap().collect();
    assert!(left.is_empty(), "left behind: {left:?}");
}

#[tokio::test]
async fn unreachable_registry_leaves_no_download_dir() {
    // Nothing listens on port 1.
    let uri = "http://127.0.0.1:1";

    let root = tempfile::tempdir().unwrap();
    let client = RegistryClient::new(
        RegistryConfig::new(uri)
            .with_timeout(Duration::from_secs(5))
            .with_download_root(root.path()),
    )
    .unwrap();
    let version = maven_artifacts::ArtifactVersion::new(
        &maven_artifacts::Coordinates::new("com.azure", "azure-widgets"),
        "1.0.0",
    );

    let err = client.download_artifact(&version).await.unwrap_err();

    assert!(matches!(err, RegistryError::Request { .. }));
    assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
}
