//! Error taxonomy for sdkforge.
//!
//! Only misconfiguration propagates as an `Err`: an executable that cannot be
//! started, or a start path with no qualifying ancestor. Non-zero exits,
//! timeouts and registry failures are folded into report text by the callers.

use std::path::PathBuf;

/// A process could not be started.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("executable '{program}' not found: {source}")]
    ExecutableNotFound {
        program: String,
        #[source]
        source: which::Error,
    },

    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Directory discovery failed.
#[derive(Debug, thiserror::Error)]
pub enum PathError {
    #[error("no ancestor of {} contains any of {markers}", start.display())]
    NotFound { start: PathBuf, markers: String },
}

/// Hard failures of a pipeline step.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error(transparent)]
    Path(#[from] PathError),
}

/// Errors surfaced by the tool registry.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("unknown tool: {tool_name}")]
    UnknownTool { tool_name: String },

    #[error("duplicate tool registration: {tool_name}")]
    DuplicateTool { tool_name: String },

    #[error("invalid arguments for tool '{tool_name}': {message}")]
    InvalidArguments { tool_name: String, message: String },

    #[error("tool '{tool_name}' failed: {source}")]
    Pipeline {
        tool_name: String,
        #[source]
        source: PipelineError,
    },
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
