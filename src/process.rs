//! External process execution
//!
//! Every external tool splvkit drives (the `CMake` configure and build steps,
//! the benchmark executable) goes through [`run`]: a command description in,
//! an exit code plus captured output back. Nothing else is shared between
//! calls.
//!
//! Calls block until the child exits. An optional timeout kills the child
//! and reports [`ProcessError::Timeout`] instead of hanging forever.

use std::ffi::{OsStr, OsString};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Poll interval while waiting on a child that has a timeout
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Errors from launching or waiting on an external process
///
/// A non-zero exit is not an error at this layer; callers decide what a
/// failed exit status means.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Failed to launch `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` timed out after {secs} seconds and was killed")]
    Timeout { command: String, secs: u64 },

    #[error("Failed waiting for `{command}`: {source}")]
    Wait {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// Description of one external command invocation
#[derive(Debug, Clone)]
pub struct ProcessSpec {
    program: PathBuf,
    args: Vec<OsString>,
    current_dir: Option<PathBuf>,
    env: Vec<(OsString, OsString)>,
    timeout: Option<Duration>,
    capture_output: bool,
}

impl ProcessSpec {
    /// Start describing an invocation of `program`
    ///
    /// Output is captured by default.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            env: Vec::new(),
            timeout: None,
            capture_output: true,
        }
    }

    /// Append one argument
    #[must_use]
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Append several arguments
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Run the child in `dir`
    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Set an environment variable for the child
    #[must_use]
    pub fn env(mut self, key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) -> Self {
        self.env
            .push((key.as_ref().to_os_string(), value.as_ref().to_os_string()));
        self
    }

    /// Kill the child if it runs longer than `timeout` (`None` waits forever)
    #[must_use]
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Let the child write straight to this process's stdout/stderr
    #[must_use]
    pub fn inherit_output(mut self) -> Self {
        self.capture_output = false;
        self
    }

    /// Program being run
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Arguments, in order
    pub fn arguments(&self) -> &[OsString] {
        &self.args
    }

    /// Working directory, if one was set
    pub fn working_dir(&self) -> Option<&Path> {
        self.current_dir.as_deref()
    }

    /// Shell-like rendering of the command, for logs and error messages
    ///
    /// Arguments containing whitespace are double-quoted so the line can be
    /// pasted back into a terminal.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_os_str())
            .chain(self.args.iter().map(OsString::as_os_str))
            .map(|part| {
                let text = part.to_string_lossy();
                if text.is_empty() || text.contains(char::is_whitespace) {
                    format!("\"{text}\"")
                } else {
                    text.into_owned()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }
        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        if self.capture_output {
            cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        } else {
            cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        }
        cmd.stdin(Stdio::null());
        cmd
    }
}

/// Result of a finished process
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// Exit code (`None` when the child was terminated by a signal)
    pub code: Option<i32>,
    /// Captured stdout (empty when output was inherited)
    pub stdout: String,
    /// Captured stderr (empty when output was inherited)
    pub stderr: String,
    /// Wall-clock time the child ran
    pub duration: Duration,
}

impl ProcessOutput {
    /// Whether the child exited with status zero
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Stdout followed by stderr, exactly as the tool wrote them
    pub fn combined(&self) -> String {
        let mut text = String::with_capacity(self.stdout.len() + self.stderr.len());
        text.push_str(&self.stdout);
        text.push_str(&self.stderr);
        text
    }

    /// Exit code rendered for messages ("signal" when there is none)
    pub fn code_display(&self) -> String {
        self.code
            .map_or_else(|| "signal".to_string(), |c| c.to_string())
    }
}

/// Run an external command to completion
///
/// Blocks the calling thread. Captured streams are drained on their own
/// threads so a chatty child cannot fill a pipe and stall.
pub fn run(spec: &ProcessSpec) -> Result<ProcessOutput, ProcessError> {
    let command_line = spec.command_line();
    crate::debug!("running: {command_line}");
    if let Some(dir) = spec.working_dir() {
        crate::debug!("  in: {}", dir.display());
    }

    let start = Instant::now();
    let mut child = spec.to_command().spawn().map_err(|source| ProcessError::Spawn {
        command: command_line.clone(),
        source,
    })?;

    let stdout_reader = child.stdout.take().map(spawn_reader);
    let stderr_reader = child.stderr.take().map(spawn_reader);

    let status = wait_with_timeout(&mut child, spec.timeout, &command_line)?;

    let output = ProcessOutput {
        code: status.code(),
        stdout: join_reader(stdout_reader),
        stderr: join_reader(stderr_reader),
        duration: start.elapsed(),
    };

    crate::debug!(
        "finished in {:.2?} with exit code {}",
        output.duration,
        output.code_display()
    );

    Ok(output)
}

fn spawn_reader<R: Read + Send + 'static>(mut stream: R) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Err(e) = stream.read_to_end(&mut buf) {
            crate::debug!("failed reading child output: {e}");
        }
        buf
    })
}

fn join_reader(reader: Option<JoinHandle<Vec<u8>>>) -> String {
    reader
        .and_then(|handle| handle.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

fn wait_with_timeout(
    child: &mut Child,
    timeout: Option<Duration>,
    command_line: &str,
) -> Result<ExitStatus, ProcessError> {
    let wait_error = |source| ProcessError::Wait {
        command: command_line.to_string(),
        source,
    };

    let Some(timeout) = timeout else {
        return child.wait().map_err(wait_error);
    };

    let start = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) => {
                if start.elapsed() > timeout {
                    if let Err(e) = child.kill() {
                        crate::debug!("failed to kill timed-out child: {e}");
                    }
                    if let Err(e) = child.wait() {
                        crate::debug!("failed to reap timed-out child: {e}");
                    }
                    // Reader threads are left detached: a grandchild may still
                    // hold the pipes open.
                    return Err(ProcessError::Timeout {
                        command: command_line.to_string(),
                        secs: timeout.as_secs(),
                    });
                }
                thread::sleep(POLL_INTERVAL);
            }
            Err(e) => return Err(wait_error(e)),
        }
    }
}
