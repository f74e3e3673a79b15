//! Subprocess gateway: process start/stop and raw line I/O.
//!
//! The stdio transport composes this behind a trait so it can be exercised
//! with a scripted fake instead of a real child process.

use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::transport::TransportError;

/// Grace period between asking a child to exit and force-killing it.
const TERMINATE_GRACE: Duration = Duration::from_secs(5);

/// Bounded wait when draining leftover stderr lines.
const STDERR_DRAIN_WAIT: Duration = Duration::from_millis(50);

/// Owns one child process's stdin/stdout/stderr streams.
///
/// At most one child at a time; the pid mapping is 1:1 for the gateway's
/// lifetime.
#[async_trait]
pub trait ProcessGateway: Send {
    /// Start the child with all three standard streams piped. Returns the
    /// process id.
    async fn start(&mut self, command: &[String]) -> Result<u32, TransportError>;

    fn is_running(&mut self) -> bool;

    /// Human-readable exit indication, if the child has terminated.
    fn exit_status(&mut self) -> Option<String>;

    /// Write `line` followed by the record separator, then flush.
    async fn write_line(&mut self, line: &str) -> Result<(), TransportError>;

    /// Read one line from the child's stdout, separator stripped. Fails with
    /// an end-of-stream condition when the stream closes.
    async fn read_line(&mut self) -> Result<String, TransportError>;

    /// Graceful-then-forced shutdown: close stdin, send a termination
    /// signal, wait a bounded time, force-kill on timeout, then close the
    /// remaining streams.
    async fn terminate(&mut self);

    /// Best-effort capture of buffered stderr output. Never fails.
    async fn drain_stderr(&mut self) -> String;
}

/// [`ProcessGateway`] backed by `tokio::process`.
#[derive(Default)]
pub struct ChildProcessGateway {
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stdout: Option<Lines<BufReader<ChildStdout>>>,
    stderr: Option<Lines<BufReader<ChildStderr>>>,
    status: Option<ExitStatus>,
    pid: Option<u32>,
}

impl ChildProcessGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn poll_status(&mut self) -> Option<ExitStatus> {
        if self.status.is_some() {
            return self.status;
        }
        if let Some(child) = self.child.as_mut() {
            if let Ok(Some(status)) = child.try_wait() {
                self.status = Some(status);
            }
        }
        self.status
    }
}

#[async_trait]
impl ProcessGateway for ChildProcessGateway {
    async fn start(&mut self, command: &[String]) -> Result<u32, TransportError> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| TransportError::Spawn("command cannot be empty".into()))?;

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| TransportError::Spawn(format!("command '{program}': {e}")))?;

        self.stdin = child.stdin.take();
        self.stdout = child.stdout.take().map(|s| BufReader::new(s).lines());
        self.stderr = child.stderr.take().map(|s| BufReader::new(s).lines());
        self.status = None;

        let pid = child.id().ok_or_else(|| {
            TransportError::Spawn(format!("command '{program}': exited before startup completed"))
        })?;
        self.pid = Some(pid);
        self.child = Some(child);
        debug!(pid, %program, "subprocess started");
        Ok(pid)
    }

    fn is_running(&mut self) -> bool {
        self.child.is_some() && self.poll_status().is_none()
    }

    fn exit_status(&mut self) -> Option<String> {
        self.poll_status().map(|s| s.to_string())
    }

    async fn write_line(&mut self, line: &str) -> Result<(), TransportError> {
        let stdin = self.stdin.as_mut().ok_or_else(|| {
            TransportError::ProcessUnavailable("stdin closed or not started".into())
        })?;
        stdin.write_all(line.as_bytes()).await?;
        stdin.write_all(b"\n").await?;
        stdin.flush().await?;
        Ok(())
    }

    async fn read_line(&mut self) -> Result<String, TransportError> {
        let stdout = self.stdout.as_mut().ok_or_else(|| {
            TransportError::ProcessUnavailable("stdout closed or not started".into())
        })?;
        match stdout.next_line().await? {
            Some(line) => Ok(line),
            None => Err(TransportError::EndOfStream {
                detail: "stdout closed".into(),
            }),
        }
    }

    async fn terminate(&mut self) {
        // Closing stdin asks a line-oriented server to exit on its own.
        self.stdin.take();

        if let Some(mut child) = self.child.take() {
            if self.status.is_none() {
                // Children that don't watch stdin still get a chance at
                // graceful cleanup before the kill.
                #[cfg(unix)]
                if let Some(pid) = child.id() {
                    debug!(pid, "sending SIGTERM to subprocess");
                    // Safety: pid comes from a child we own and have not
                    // reaped, so it cannot have been recycled.
                    unsafe {
                        libc::kill(pid as libc::pid_t, libc::SIGTERM);
                    }
                }
                match timeout(TERMINATE_GRACE, child.wait()).await {
                    Ok(Ok(status)) => self.status = Some(status),
                    Ok(Err(e)) => warn!(pid = ?self.pid, error = %e, "wait on subprocess failed"),
                    Err(_) => {
                        warn!(pid = ?self.pid, "subprocess ignored shutdown, killing");
                        if let Err(e) = child.kill().await {
                            warn!(pid = ?self.pid, error = %e, "kill failed");
                        }
                    }
                }
            }
        }

        self.stdout.take();
        self.stderr.take();
        debug!(pid = ?self.pid, "subprocess terminated");
    }

    async fn drain_stderr(&mut self) -> String {
        let Some(stderr) = self.stderr.as_mut() else {
            return String::new();
        };
        let mut out = String::new();
        while let Ok(Ok(Some(line))) = timeout(STDERR_DRAIN_WAIT, stderr.next_line()).await {
            out.push_str(&line);
            out.push('\n');
        }
        out
    }
}
