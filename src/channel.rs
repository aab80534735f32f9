//! Duplex line channel to one participant
//!
//! Wraps the two pipes of a spawned participant process: the server writes
//! lines into the child's stdin and reads lines from the child's stdout.
//! The child's stderr is discarded.
//!
//! Rust programs ignore `SIGPIPE`, so writing to a peer that has exited
//! surfaces as an ordinary `ChannelError::Write` instead of killing the
//! server.

use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use crate::error::ChannelError;

type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Result of one read from the channel
///
/// End-of-stream is a separate variant so an empty line stays
/// distinguishable from no data at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    Line(String),
    EndOfStream,
}

/// Owned duplex pipe pair, optionally backed by a child process
pub struct Channel {
    reader: BufReader<BoxedReader>,
    writer: BoxedWriter,
    child: Option<Child>,
    label: String,
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("label", &self.label)
            .field("pid", &self.pid())
            .finish()
    }
}

impl Channel {
    /// Spawn `program argument` with piped stdin/stdout
    ///
    /// Failure to start the program is returned to the caller.
    pub fn spawn(program: &str, argument: &str) -> Result<Self, ChannelError> {
        let mut child = Command::new(program)
            .arg(argument)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ChannelError::Spawn {
                program: program.to_string(),
                source,
            })?;

        let stdin = child.stdin.take().ok_or(ChannelError::MissingPipe("stdin"))?;
        let stdout = child.stdout.take().ok_or(ChannelError::MissingPipe("stdout"))?;

        debug!("Spawned {} {} (pid {:?})", program, argument, child.id());

        let mut channel = Self::from_streams(stdout, stdin, format!("{}:{}", program, argument));
        channel.child = Some(child);
        Ok(channel)
    }

    /// Build a channel over arbitrary streams (no child process)
    pub fn from_streams<R, W>(reader: R, writer: W, label: impl Into<String>) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            reader: BufReader::new(Box::new(reader)),
            writer: Box::new(writer),
            child: None,
            label: label.into(),
        }
    }

    /// OS process id of the child, if still known
    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().and_then(Child::id)
    }

    /// Write one line (newline appended) and flush
    pub async fn send_line(&mut self, line: &str) -> Result<(), ChannelError> {
        let mut buf = String::with_capacity(line.len() + 1);
        buf.push_str(line);
        buf.push('\n');
        self.writer
            .write_all(buf.as_bytes())
            .await
            .map_err(ChannelError::Write)?;
        self.writer.flush().await.map_err(ChannelError::Write)
    }

    /// Read one line, blocking until a full line or end-of-stream
    ///
    /// The trailing `\n` is stripped. A final unterminated line before
    /// end-of-stream is still returned as a line.
    pub async fn receive_line(&mut self) -> Result<Incoming, ChannelError> {
        let mut buf = Vec::new();
        let n = self
            .reader
            .read_until(b'\n', &mut buf)
            .await
            .map_err(ChannelError::Read)?;
        if n == 0 {
            return Ok(Incoming::EndOfStream);
        }
        if buf.last() == Some(&b'\n') {
            buf.pop();
        }
        Ok(Incoming::Line(String::from_utf8_lossy(&buf).into_owned()))
    }

    /// Like `receive_line`, giving up after `limit` when one is set
    pub async fn receive_line_within(
        &mut self,
        limit: Option<Duration>,
    ) -> Result<Incoming, ChannelError> {
        match limit {
            None => self.receive_line().await,
            Some(limit) => tokio::time::timeout(limit, self.receive_line())
                .await
                .map_err(|_| ChannelError::TimedOut)?,
        }
    }

    /// Close both pipe ends and reap the child
    ///
    /// The child gets `grace` to exit on its own after seeing end-of-file,
    /// then it is killed.
    pub async fn close(self, grace: Duration) -> Option<ExitStatus> {
        let Channel {
            reader,
            writer,
            child,
            label,
        } = self;
        drop(writer);
        drop(reader);

        let mut child = child?;
        match tokio::time::timeout(grace, child.wait()).await {
            Ok(Ok(status)) => {
                debug!("{} exited with {}", label, status);
                Some(status)
            }
            Ok(Err(e)) => {
                warn!("Failed to wait for {}: {}", label, e);
                None
            }
            Err(_) => {
                debug!("{} still running after {:?}, killing", label, grace);
                if let Err(e) = child.kill().await {
                    warn!("Failed to kill {}: {}", label, e);
                }
                child.try_wait().ok().flatten()
            }
        }
    }
}
