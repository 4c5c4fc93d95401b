use std::io;
use std::process::Stdio;

use flume::Receiver;
use lib_utils::cmdline::split_command_line;
use tokio::process::Command;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::instrument::WithSubscriber;

use crate::error::StreamError;

mod scanner;

/// Lines buffered between the stdout reader and the forwarding loop. The
/// reader blocks once this many lines are waiting.
pub const LINE_CONDUIT_CAPACITY: usize = 1;

/// A program and its arguments, split on whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    pub fn parse(line: &str) -> Result<Self, StreamError> {
        let (program, args) = split_command_line(line).ok_or(StreamError::EmptyCommand)?;
        Ok(CommandLine {
            program: program.to_string(),
            args: args.into_iter().map(String::from).collect(),
        })
    }

    /// Starts the process and begins scanning its stdout.
    ///
    /// Fails synchronously when the process cannot be started. Must be
    /// called from within a tokio runtime.
    pub fn spawn(&self) -> Result<CommandOutput, StreamError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| StreamError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        let stdout = child.stdout.take().ok_or_else(|| StreamError::Spawn {
            program: self.program.clone(),
            source: io::Error::other("stdout was not captured"),
        })?;

        let (tx, rx) = flume::bounded(LINE_CONDUIT_CAPACITY);
        let scanner = tokio::spawn(scanner::scan_lines(child, stdout, tx).with_current_subscriber());
        Ok(CommandOutput { lines: rx, scanner })
    }
}

/// The running command: its stdout lines and, once they run out, its exit result.
#[derive(Debug)]
pub struct CommandOutput {
    lines: Receiver<String>,
    scanner: JoinHandle<Result<(), StreamError>>,
}

impl CommandOutput {
    /// Closed once the command's stdout reaches end of stream.
    pub fn lines(&self) -> &Receiver<String> {
        &self.lines
    }

    /// Waits for the command to exit after its output has been drained.
    pub async fn finish(self) -> Result<(), StreamError> {
        drop(self.lines);
        match self.scanner.await {
            Ok(result) => result,
            Err(err) => Err(StreamError::Wait(io::Error::other(err))),
        }
    }

    /// Lets a caller kill the command while [`CommandOutput::finish`] is pending.
    pub fn abort_handle(&self) -> AbortHandle {
        self.scanner.abort_handle()
    }

    /// Stops reading and kills the command if it is still running.
    pub fn abandon(self) {
        self.scanner.abort();
    }
}
