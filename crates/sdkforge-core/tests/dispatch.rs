//! Tool registry wired to the real pipeline and changelog driver.

use maven_artifacts::{RegistryClient, RegistryConfig};
use sdkforge_core::dispatch::{
    CLEAN_JAVA_SOURCE, GET_JAVA_SDK_CHANGELOG, INSTRUCTION_MIGRATE_TYPESPEC,
    PREPARE_JAVA_SDK_ENVIRONMENT, UPDATE_CLIENT_NAME,
};
use sdkforge_core::{
    ChangelogDriver, DispatchError, ForgeConfig, GenerationPipeline, ProcessRunner, ToolRegistry,
};
use serde_json::json;
use std::sync::Arc;

fn registry() -> ToolRegistry {
    let config = ForgeConfig::default();
    let client = RegistryClient::new(RegistryConfig::new("http://127.0.0.1:9")).unwrap();
    let pipeline = Arc::new(GenerationPipeline::new(config.clone(), ProcessRunner::new()));
    let changelog = Arc::new(ChangelogDriver::new(config, ProcessRunner::new(), client));
    ToolRegistry::standard(pipeline, changelog)
}

#[test]
fn test_standard_registry_names() {
    assert_eq!(
        registry().names(),
        [
            "build_java_sdk",
            "clean_java_source",
            "generate_java_sdk",
            "get_java_sdk_changelog",
            "init_java_sdk",
            "instruction_migrate_typespec",
            "prepare_java_sdk_environment",
            "sync_java_sdk",
            "update_client_name",
        ]
    );
}

#[tokio::test]
async fn test_unknown_tool_is_an_error() {
    let err = registry().call("publish_java_sdk", json!({})).await.unwrap_err();
    assert_eq!(err.to_string(), "unknown tool: publish_java_sdk");
}

#[tokio::test]
async fn test_invalid_arguments() {
    let err = registry()
        .call(GET_JAVA_SDK_CHANGELOG, json!({"jarPath": "/tmp/a.jar"}))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DispatchError::InvalidArguments { ref tool_name, .. } if tool_name == GET_JAVA_SDK_CHANGELOG
    ));
}

#[tokio::test]
async fn test_cookbook_tools() {
    let registry = registry();

    let rename = registry
        .call(
            UPDATE_CLIENT_NAME,
            json!({"oldName": "MediaMessageContent.mediaUri", "newName": "mediaUrl"}),
        )
        .await
        .unwrap();
    assert!(rename.contains("MediaMessageContent.mediaUri"));
    assert!(rename.contains("mediaUrl"));

    let migration = registry
        .call(INSTRUCTION_MIGRATE_TYPESPEC, serde_json::Value::Null)
        .await
        .unwrap();
    assert!(migration.contains("Go to step 3"));
}

#[tokio::test]
async fn test_clean_tool_refuses_non_management_module() {
    let dir = tempfile::tempdir().unwrap();
    let module = dir.path().join("widgets-core");
    std::fs::create_dir_all(module.join("src/main")).unwrap();

    let text = registry()
        .call(CLEAN_JAVA_SOURCE, json!({"moduleDirectory": module}))
        .await
        .unwrap();

    assert!(text.contains("Refusing to clean 'widgets-core'"));
    assert!(module.join("src/main").exists());
}

#[tokio::test]
async fn test_environment_tool_lists_every_tool() {
    let dir = tempfile::tempdir().unwrap();
    let text = registry()
        .call(PREPARE_JAVA_SDK_ENVIRONMENT, json!({"cwd": dir.path()}))
        .await
        .unwrap();
    for role in ["maven", "tsp", "tsp-client", "npm", "git"] {
        assert!(text.contains(role), "{role} missing from {text}");
    }
}

#[tokio::test]
async fn test_changelog_outside_repository_is_a_pipeline_error() {
    let dir = tempfile::tempdir().unwrap();
    let jar = dir.path().join("widgets.jar");

    let err = registry()
        .call(
            GET_JAVA_SDK_CHANGELOG,
            json!({"jarPath": jar, "groupId": "com.azure", "artifactId": "widgets"}),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::Pipeline { .. }));
}
