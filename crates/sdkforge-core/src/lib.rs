//! sdkforge Core Library
//!
//! Drives the external toolchain that turns a TypeSpec specification into a
//! built Java client library, and compares builds with published releases.

pub mod changelog;
pub mod config;
pub mod cookbook;
pub mod dispatch;
pub mod environment;
pub mod error;
pub mod obs;
pub mod paths;
pub mod pipeline;
pub mod process;
pub mod telemetry;

pub use changelog::{ChangelogDriver, ChangelogReport, DiffToolContext};

pub use config::{ForgeConfig, Toolchain, DEFAULT_EMITTER};

pub use cookbook::{client_rename, converge, typespec_migration, Convergence, Progress};

pub use dispatch::{ToolHandler, ToolRegistry};

pub use environment::{check_environment, render_environment, ToolAvailability};

pub use error::{DispatchError, PathError, PipelineError, ProcessError, Result};

pub use paths::{
    find_root, locate_module, locate_repo_root, ModuleLocation, MODULE_MARKERS, REPO_ROOT_MARKERS,
};

pub use pipeline::{is_management_plane, GenerationPipeline, Step, StepReport};

pub use process::{ProcessInvocation, ProcessResult, ProcessRunner, DEFAULT_TIMEOUT};

pub use maven_artifacts::{ArtifactVersion, RegistryClient, RegistryConfig, RegistryError};
