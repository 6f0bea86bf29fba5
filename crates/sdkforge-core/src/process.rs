//! External process execution with a bounded lifetime.
//!
//! [`ProcessRunner::run`] spawns one command, captures stdout and stderr in
//! full and returns a [`ProcessResult`]. A non-zero exit is an ordinary
//! result. On timeout the process and its process group are killed and the
//! result is marked `timed_out`. Only a failure to start the executable is an
//! `Err`.

use crate::error::ProcessError;
use crate::obs::{emit_process_finished, emit_process_started};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Ceiling applied to every external call unless overridden.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

/// How long to wait for output pipes to close once the process has exited
/// or been killed.
const KILL_GRACE: Duration = Duration::from_secs(5);

/// One external command to run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessInvocation {
    /// Executable name or path (resolved per call).
    pub program: String,
    pub args: Vec<String>,
    /// Directory the process starts in.
    pub working_dir: PathBuf,
    pub timeout: Duration,
    /// Run the joined command line through the platform shell.
    pub shell: bool,
}

impl ProcessInvocation {
    pub fn new(program: impl Into<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: working_dir.into(),
            timeout: DEFAULT_TIMEOUT,
            shell: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn shell(mut self, shell: bool) -> Self {
        self.shell = shell;
        self
    }

    /// Program and arguments joined by spaces.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Outcome of one external call.
///
/// `success == (exit_code == Some(0) && !timed_out)` always holds; build
/// values through [`ProcessResult::exited`] or [`ProcessResult::timed_out`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessResult {
    pub success: bool,
    /// `None` when the process was killed by a signal or timed out.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
    pub duration_ms: u64,
}

impl ProcessResult {
    pub fn exited(exit_code: Option<i32>, stdout: String, stderr: String, duration_ms: u64) -> Self {
        Self {
            success: exit_code == Some(0),
            exit_code,
            stdout,
            stderr,
            timed_out: false,
            duration_ms,
        }
    }

    pub fn timed_out(stdout: String, stderr: String, duration_ms: u64) -> Self {
        Self {
            success: false,
            exit_code: None,
            stdout,
            stderr,
            timed_out: true,
            duration_ms,
        }
    }

    /// Short description of why the call failed, e.g. `exit code 1`.
    pub fn failure_reason(&self) -> String {
        if self.timed_out {
            format!("timed out after {} ms", self.duration_ms)
        } else {
            match self.exit_code {
                Some(code) => format!("exit code {code}"),
                None => "terminated by signal".to_string(),
            }
        }
    }

    /// Captured output in the `Output:` / `Errors:` layout used by reports.
    pub fn render_output(&self) -> String {
        let mut text = String::new();
        if !self.stdout.is_empty() {
            text.push_str(&format!("Output:\n{}\n", self.stdout));
        }
        if !self.stderr.is_empty() {
            text.push_str(&format!("\nErrors:\n{}\n", self.stderr));
        }
        text
    }
}

/// Runs [`ProcessInvocation`]s.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    kill_grace: Duration,
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self {
            kill_grace: KILL_GRACE,
        }
    }
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait at most `grace` for output pipes after the process is gone.
    pub fn with_kill_grace(mut self, grace: Duration) -> Self {
        self.kill_grace = grace;
        self
    }

    /// Run one command to completion or timeout.
    pub async fn run(&self, invocation: &ProcessInvocation) -> Result<ProcessResult, ProcessError> {
        let started = Instant::now();
        let mut command = build_command(invocation)?;
        command
            .current_dir(&invocation.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        emit_process_started(
            &invocation.program,
            &invocation.command_line(),
            &invocation.working_dir,
        );

        let mut child = command.spawn().map_err(|source| ProcessError::Spawn {
            program: invocation.program.clone(),
            source,
        })?;
        let pid = child.id();
        let stdout_task = spawn_reader(child.stdout.take());
        let stderr_task = spawn_reader(child.stderr.take());

        // Only the process itself is bounded by the timeout. A background
        // grandchild holding a pipe open must not hide the exit status.
        let waited = tokio::time::timeout(invocation.timeout, child.wait()).await;

        let result = match waited {
            Ok(Ok(status)) => {
                let (stdout, stderr) = self.collect_output(stdout_task, stderr_task, pid).await;
                ProcessResult::exited(status.code(), stdout, stderr, elapsed_ms(started))
            }
            Ok(Err(err)) => {
                warn!(program = %invocation.program, error = %err, "failed to wait for process");
                terminate(&mut child, pid).await;
                let (stdout, mut stderr) = self.collect_output(stdout_task, stderr_task, pid).await;
                stderr.push_str(&format!("\nfailed to wait for process: {err}\n"));
                ProcessResult::exited(None, stdout, stderr, elapsed_ms(started))
            }
            Err(_elapsed) => {
                terminate(&mut child, pid).await;
                let (stdout, stderr) = self.collect_output(stdout_task, stderr_task, pid).await;
                ProcessResult::timed_out(stdout, stderr, elapsed_ms(started))
            }
        };

        emit_process_finished(
            &invocation.program,
            result.exit_code,
            result.timed_out,
            result.duration_ms,
        );
        Ok(result)
    }

    /// Captured stdout and stderr once the process is gone.
    ///
    /// Pipes still open after `kill_grace` belong to leftover members of the
    /// process group; the group is killed and the pipes drained once more.
    async fn collect_output(
        &self,
        mut stdout_task: JoinHandle<String>,
        mut stderr_task: JoinHandle<String>,
        pid: Option<u32>,
    ) -> (String, String) {
        let joined = tokio::time::timeout(self.kill_grace, async {
            let stdout = (&mut stdout_task).await.unwrap_or_default();
            let stderr = (&mut stderr_task).await.unwrap_or_default();
            (stdout, stderr)
        })
        .await;
        if let Ok(output) = joined {
            return output;
        }

        warn!(pid = ?pid, "output pipes still open after exit; killing process group");
        kill_process_group(pid);
        (
            drain(stdout_task, self.kill_grace).await,
            drain(stderr_task, self.kill_grace).await,
        )
    }
}

fn build_command(invocation: &ProcessInvocation) -> Result<Command, ProcessError> {
    if invocation.shell {
        return Ok(shell_command(&invocation.command_line()));
    }

    let executable = resolve_executable(&invocation.program, &invocation.working_dir)?;
    let mut command = Command::new(executable);
    command.args(&invocation.args);
    Ok(command)
}

/// Locate `program` on `PATH` (or relative to `cwd`), applying the
/// platform's executable suffixes such as `.cmd` on Windows.
pub fn resolve_executable(program: &str, cwd: &Path) -> Result<PathBuf, ProcessError> {
    let resolved = which::which_in(program, std::env::var_os("PATH"), cwd).map_err(|source| {
        ProcessError::ExecutableNotFound {
            program: program.to_string(),
            source,
        }
    })?;
    debug!(program = %program, resolved = %resolved.display(), "resolved executable");
    Ok(resolved)
}

#[cfg(not(windows))]
fn shell_command(line: &str) -> Command {
    let mut command = Command::new("sh");
    command.arg("-c").arg(line);
    command
}

#[cfg(windows)]
fn shell_command(line: &str) -> Command {
    let mut command = Command::new("cmd");
    command.arg("/C").arg(line);
    command
}

fn spawn_reader<R>(stream: Option<R>) -> JoinHandle<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut stream) = stream {
            if let Err(err) = stream.read_to_end(&mut buf).await {
                debug!(error = %err, "output pipe closed with error");
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

async fn drain(mut task: JoinHandle<String>, grace: Duration) -> String {
    match tokio::time::timeout(grace, &mut task).await {
        Ok(Ok(text)) => text,
        _ => {
            task.abort();
            String::new()
        }
    }
}

/// Kill the child and everything in its process group, then reap it.
async fn terminate(child: &mut Child, pid: Option<u32>) {
    kill_process_group(pid);

    if let Err(err) = child.kill().await {
        debug!(error = %err, "kill after timeout returned an error");
    }
}

#[cfg(unix)]
fn kill_process_group(pid: Option<u32>) {
    let Some(pid) = pid else { return };
    // The child was spawned with process_group(0), so its pid is the group id.
    // SAFETY: killpg only delivers a signal and touches no memory.
    let rc = unsafe { libc::killpg(pid as libc::pid_t, libc::SIGKILL) };
    if rc != 0 {
        debug!(pid = pid, error = %std::io::Error::last_os_error(), "killpg failed");
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>) {}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}
