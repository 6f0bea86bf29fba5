//! Structured observability hooks for sdkforge.
//!
//! This module provides:
//! - Step-scoped tracing spans via the `StepSpan` RAII guard
//! - Emission functions for process, step and tool-call lifecycle events
//!
//! Events are emitted at `info!` level (filter with `RUST_LOG`).

use std::future::Future;
use tracing::instrument::Instrumented;
use tracing::{info, Instrument};

/// Step-scoped tracing span.
///
/// Pipeline steps await external processes, so the span is attached to the
/// step future with [`StepSpan::instrument`] rather than entered on the
/// current thread.
///
/// # Example
///
/// ```ignore
/// StepSpan::new("build", &module_dir)
///     .instrument(self.run_build(&location, group_id, artifact_id))
///     .await
/// // every event logged while the future runs carries step = "build"
/// ```
#[derive(Debug, Clone)]
pub struct StepSpan {
    span: tracing::Span,
}

impl StepSpan {
    /// Create a span tagged with the step name and target directory.
    pub fn new(step: &str, target: &std::path::Path) -> Self {
        let span = tracing::info_span!("sdkforge.step", step = %step, target = %target.display());
        Self { span }
    }

    pub fn span(&self) -> &tracing::Span {
        &self.span
    }

    /// Run `future` inside the span; the span is entered only while it is polled.
    pub fn instrument<F: Future>(self, future: F) -> Instrumented<F> {
        future.instrument(self.span)
    }
}

/// Emit event: external process started.
pub fn emit_process_started(program: &str, command_line: &str, cwd: &std::path::Path) {
    info!(
        event = "process.started",
        program = %program,
        command = %command_line,
        cwd = %cwd.display(),
    );
}

/// Emit event: external process finished (exited or killed).
pub fn emit_process_finished(program: &str, exit_code: Option<i32>, timed_out: bool, duration_ms: u64) {
    if timed_out {
        tracing::warn!(
            event = "process.timed_out",
            program = %program,
            duration_ms = duration_ms,
        );
    } else {
        info!(
            event = "process.finished",
            program = %program,
            exit_code = ?exit_code,
            duration_ms = duration_ms,
        );
    }
}

/// Emit event: pipeline step completed.
pub fn emit_step_finished(step: &str, success: bool) {
    info!(event = "step.finished", step = %step, success = success);
}

/// Emit event: a tool was invoked through the registry.
pub fn emit_tool_called(tool_name: &str) {
    info!(event = "tool.called", tool = %tool_name);
}
