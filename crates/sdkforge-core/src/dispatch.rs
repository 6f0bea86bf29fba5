//! Name-keyed tool registry for an assistant-style calling layer.
//!
//! Every tool takes a JSON object of camelCase arguments and returns report
//! text. An unsuccessful step is still `Ok`: the text explains the failure.
//! `Err` means the call itself was wrong (unknown tool, bad arguments) or hit
//! a misconfiguration.

use crate::changelog::ChangelogDriver;
use crate::cookbook;
use crate::environment::{check_environment, render_environment};
use crate::error::{DispatchError, PipelineError};
use crate::obs::emit_tool_called;
use crate::pipeline::GenerationPipeline;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

pub const INIT_JAVA_SDK: &str = "init_java_sdk";
pub const SYNC_JAVA_SDK: &str = "sync_java_sdk";
pub const GENERATE_JAVA_SDK: &str = "generate_java_sdk";
pub const BUILD_JAVA_SDK: &str = "build_java_sdk";
pub const CLEAN_JAVA_SOURCE: &str = "clean_java_source";
pub const GET_JAVA_SDK_CHANGELOG: &str = "get_java_sdk_changelog";
pub const UPDATE_CLIENT_NAME: &str = "update_client_name";
pub const INSTRUCTION_MIGRATE_TYPESPEC: &str = "instruction_migrate_typespec";
pub const PREPARE_JAVA_SDK_ENVIRONMENT: &str = "prepare_java_sdk_environment";

/// A callable tool.
#[async_trait]
pub trait ToolHandler: Send + Sync + 'static {
    async fn call(&self, args: Value) -> Result<String, DispatchError>;
}

#[derive(Clone)]
struct RegisteredTool {
    description: String,
    handler: Arc<dyn ToolHandler>,
}

/// Tool name to handler map.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, RegisteredTool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        handler: Arc<dyn ToolHandler>,
    ) -> Result<(), DispatchError> {
        let name = name.into();
        if self.tools.contains_key(&name) {
            return Err(DispatchError::DuplicateTool { tool_name: name });
        }
        self.tools.insert(
            name,
            RegisteredTool {
                description: description.into(),
                handler,
            },
        );
        Ok(())
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn description(&self, name: &str) -> Option<&str> {
        self.tools.get(name).map(|tool| tool.description.as_str())
    }

    pub async fn call(&self, name: &str, args: Value) -> Result<String, DispatchError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| DispatchError::UnknownTool {
                tool_name: name.to_string(),
            })?;
        emit_tool_called(name);
        tool.handler.call(args).await
    }

    /// Registry with every Java SDK tool.
    pub fn standard(pipeline: Arc<GenerationPipeline>, changelog: Arc<ChangelogDriver>) -> Self {
        let entries: [(&str, &str, Arc<dyn ToolHandler>); 9] = [
            (
                INIT_JAVA_SDK,
                "Initialize a Java SDK module from the URL of its tspconfig.yaml",
                Arc::new(InitTool(pipeline.clone())),
            ),
            (
                SYNC_JAVA_SDK,
                "Download the TypeSpec source referenced by tsp-location.yaml",
                Arc::new(SyncTool(pipeline.clone())),
            ),
            (
                GENERATE_JAVA_SDK,
                "Generate the Java SDK from the synced TypeSpec source",
                Arc::new(GenerateTool(pipeline.clone())),
            ),
            (
                BUILD_JAVA_SDK,
                "Build one Java SDK module and the modules it depends on",
                Arc::new(BuildTool(pipeline.clone())),
            ),
            (
                CLEAN_JAVA_SOURCE,
                "Delete generated sources of a management-plane module",
                Arc::new(CleanTool(pipeline.clone())),
            ),
            (
                GET_JAVA_SDK_CHANGELOG,
                "Compare a built jar with the latest stable release",
                Arc::new(ChangelogTool(changelog)),
            ),
            (
                UPDATE_CLIENT_NAME,
                "Instructions for renaming a model, operation or parameter",
                Arc::new(ClientRenameTool),
            ),
            (
                INSTRUCTION_MIGRATE_TYPESPEC,
                "Instructions for migrating a Java SDK module to TypeSpec",
                Arc::new(MigrationTool),
            ),
            (
                PREPARE_JAVA_SDK_ENVIRONMENT,
                "Check which toolchain executables are installed",
                Arc::new(EnvironmentTool(pipeline)),
            ),
        ];

        let tools = entries
            .into_iter()
            .map(|(name, description, handler)| {
                let tool = RegisteredTool {
                    description: description.to_string(),
                    handler,
                };
                (name.to_string(), tool)
            })
            .collect();
        Self { tools }
    }
}

fn parse_args<T: DeserializeOwned>(tool_name: &str, args: Value) -> Result<T, DispatchError> {
    serde_json::from_value(args).map_err(|err| DispatchError::InvalidArguments {
        tool_name: tool_name.to_string(),
        message: err.to_string(),
    })
}

fn pipeline_error(tool_name: &str) -> impl FnOnce(PipelineError) -> DispatchError + '_ {
    move |source| DispatchError::Pipeline {
        tool_name: tool_name.to_string(),
        source,
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InitArgs {
    cwd: PathBuf,
    tsp_config_url: String,
}

#[derive(Debug, Deserialize)]
struct ModuleArgs {
    /// Directory holding `tsp-location.yaml`.
    cwd: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BuildArgs {
    module_directory: PathBuf,
    group_id: String,
    artifact_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CleanArgs {
    module_directory: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChangelogArgs {
    jar_path: PathBuf,
    group_id: String,
    artifact_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenameArgs {
    old_name: String,
    new_name: String,
}

struct InitTool(Arc<GenerationPipeline>);

#[async_trait]
impl ToolHandler for InitTool {
    async fn call(&self, args: Value) -> Result<String, DispatchError> {
        let args: InitArgs = parse_args(INIT_JAVA_SDK, args)?;
        let report = self
            .0
            .init(&args.cwd, &args.tsp_config_url)
            .await
            .map_err(pipeline_error(INIT_JAVA_SDK))?;
        Ok(report.text)
    }
}

struct SyncTool(Arc<GenerationPipeline>);

#[async_trait]
impl ToolHandler for SyncTool {
    async fn call(&self, args: Value) -> Result<String, DispatchError> {
        let args: ModuleArgs = parse_args(SYNC_JAVA_SDK, args)?;
        let report = self
            .0
            .sync(&args.cwd)
            .await
            .map_err(pipeline_error(SYNC_JAVA_SDK))?;
        Ok(report.text)
    }
}

struct GenerateTool(Arc<GenerationPipeline>);

#[async_trait]
impl ToolHandler for GenerateTool {
    async fn call(&self, args: Value) -> Result<String, DispatchError> {
        let args: ModuleArgs = parse_args(GENERATE_JAVA_SDK, args)?;
        let report = self
            .0
            .generate(&args.cwd)
            .await
            .map_err(pipeline_error(GENERATE_JAVA_SDK))?;
        Ok(report.text)
    }
}

struct BuildTool(Arc<GenerationPipeline>);

#[async_trait]
impl ToolHandler for BuildTool {
    async fn call(&self, args: Value) -> Result<String, DispatchError> {
        let args: BuildArgs = parse_args(BUILD_JAVA_SDK, args)?;
        let report = self
            .0
            .build(&args.module_directory, &args.group_id, &args.artifact_id)
            .await
            .map_err(pipeline_error(BUILD_JAVA_SDK))?;
        Ok(report.text)
    }
}

struct CleanTool(Arc<GenerationPipeline>);

#[async_trait]
impl ToolHandler for CleanTool {
    async fn call(&self, args: Value) -> Result<String, DispatchError> {
        let args: CleanArgs = parse_args(CLEAN_JAVA_SOURCE, args)?;
        let report = self
            .0
            .clean(&args.module_directory)
            .await
            .map_err(pipeline_error(CLEAN_JAVA_SOURCE))?;
        Ok(report.text)
    }
}

struct ChangelogTool(Arc<ChangelogDriver>);

#[async_trait]
impl ToolHandler for ChangelogTool {
    async fn call(&self, args: Value) -> Result<String, DispatchError> {
        let args: ChangelogArgs = parse_args(GET_JAVA_SDK_CHANGELOG, args)?;
        let report = self
            .0
            .for_release(&args.jar_path, &args.group_id, &args.artifact_id)
            .await
            .map_err(pipeline_error(GET_JAVA_SDK_CHANGELOG))?;
        Ok(report.text)
    }
}

struct ClientRenameTool;

#[async_trait]
impl ToolHandler for ClientRenameTool {
    async fn call(&self, args: Value) -> Result<String, DispatchError> {
        let args: RenameArgs = parse_args(UPDATE_CLIENT_NAME, args)?;
        Ok(cookbook::client_rename(&args.old_name, &args.new_name))
    }
}

struct MigrationTool;

#[async_trait]
impl ToolHandler for MigrationTool {
    async fn call(&self, _args: Value) -> Result<String, DispatchError> {
        Ok(cookbook::typespec_migration())
    }
}

struct EnvironmentTool(Arc<GenerationPipeline>);

#[async_trait]
impl ToolHandler for EnvironmentTool {
    async fn call(&self, args: Value) -> Result<String, DispatchError> {
        let args: ModuleArgs = parse_args(PREPARE_JAVA_SDK_ENVIRONMENT, args)?;
        let tools = check_environment(&self.0.config().toolchain, &args.cwd);
        Ok(render_environment(&tools))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Echo;

    #[async_trait]
    impl ToolHandler for Echo {
        async fn call(&self, args: Value) -> Result<String, DispatchError> {
            Ok(args.to_string())
        }
    }

    #[tokio::test]
    async fn test_registered_tool_is_called() {
        let mut registry = ToolRegistry::new();
        registry.register("echo", "echoes", Arc::new(Echo)).unwrap();

        let out = registry.call("echo", json!({"a": 1})).await.unwrap();
        assert_eq!(out, r#"{"a":1}"#);
        assert_eq!(registry.description("echo"), Some("echoes"));
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let registry = ToolRegistry::new();
        let err = registry.call("deploy_java_sdk", Value::Null).await.unwrap_err();
        assert!(matches!(err, DispatchError::UnknownTool { tool_name } if tool_name == "deploy_java_sdk"));
    }

    #[test]
    fn test_duplicate_registration() {
        let mut registry = ToolRegistry::new();
        registry.register("echo", "", Arc::new(Echo)).unwrap();
        let err = registry.register("echo", "", Arc::new(Echo)).unwrap_err();
        assert!(matches!(err, DispatchError::DuplicateTool { .. }));
    }

    #[test]
    fn test_parse_args_reports_missing_field() {
        let err = parse_args::<RenameArgs>(UPDATE_CLIENT_NAME, json!({"oldName": "a"})).unwrap_err();
        match err {
            DispatchError::InvalidArguments { tool_name, message } => {
                assert_eq!(tool_name, UPDATE_CLIENT_NAME);
                assert!(message.contains("newName"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
