//! Process execution service for running the coverage command.
//!
//! Spawns the command under a shell, passes stderr straight through and
//! exposes stdout as a stream of lines.

use crate::error::{ProcessError, ProcessResult};
use std::io;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};

/// Forward-only line stream over a child's stdout.
///
/// Lines are split on raw `\n` bytes and decoded lossily, so bytes that are
/// not UTF-8 show up as U+FFFD instead of ending the stream.
#[derive(Debug)]
pub struct OutputLines<R = BufReader<ChildStdout>> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: AsyncBufRead + Unpin> OutputLines<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
        }
    }

    /// Next line without its `\n` or `\r\n` ending, `None` at end of output
    pub async fn next_line(&mut self) -> io::Result<Option<String>> {
        self.buf.clear();
        if self.reader.read_until(b'\n', &mut self.buf).await? == 0 {
            return Ok(None);
        }

        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
            if self.buf.last() == Some(&b'\r') {
                self.buf.pop();
            }
        }
        Ok(Some(String::from_utf8_lossy(&self.buf).into_owned()))
    }

    /// Read and discard the rest of the output, returning the bytes skipped
    pub async fn drain(&mut self) -> io::Result<u64> {
        tokio::io::copy_buf(&mut self.reader, &mut tokio::io::sink()).await
    }
}

/// Process handle for a running command
#[derive(Debug)]
pub struct ProcessHandle {
    /// Child process, killed if the handle is dropped before it is reaped
    child: Child,
    /// Stdout lines, until handed to a consumer
    stdout: Option<OutputLines>,
    /// Start time
    start_time: Instant,
}

impl ProcessHandle {
    /// OS process id, if the process has not been reaped yet
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Get elapsed time
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Take the stdout line stream. Only the first call returns it.
    pub fn take_lines(&mut self) -> Option<OutputLines> {
        self.stdout.take()
    }

    /// Kill the process and reap it
    pub async fn kill(&mut self) -> ProcessResult<()> {
        self.child.kill().await.map_err(ProcessError::Kill)?;
        tracing::debug!("Killed coverage command after {:?}", self.elapsed());
        Ok(())
    }

    /// Wait for the process to exit
    pub async fn wait(&mut self) -> ProcessResult<ExitStatus> {
        let status = self.child.wait().await.map_err(ProcessError::Wait)?;
        tracing::debug!(
            "Coverage command exited with {} after {:?}",
            status,
            self.elapsed()
        );
        Ok(status)
    }
}

/// Process execution service
#[derive(Debug, Clone)]
pub struct ProcessService {
    /// Shell interpreter used as `<shell> -c <command>`
    shell: String,
}

impl ProcessService {
    /// Create a new process service
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }

    /// Shell interpreter in use
    pub fn shell(&self) -> &str {
        &self.shell
    }

    /// Spawn a command line under the shell.
    ///
    /// Stdin is closed, stderr is inherited and stdout is piped.
    pub fn spawn_shell(&self, command: &str) -> ProcessResult<ProcessHandle> {
        if command.trim().is_empty() {
            return Err(ProcessError::EmptyCommand);
        }

        tracing::info!("Running coverage command: {}", command);

        let mut child = Command::new(&self.shell)
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ProcessError::Spawn {
                shell: self.shell.clone(),
                source,
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or(ProcessError::StdoutUnavailable)?;

        Ok(ProcessHandle {
            child,
            stdout: Some(OutputLines::new(BufReader::new(stdout))),
            start_time: Instant::now(),
        })
    }
}

impl Default for ProcessService {
    fn default() -> Self {
        Self::new("bash")
    }
}
