//! Debugger process transport
//!
//! The driver speaks in request lines and output chunks. A [`Transport`]
//! carries them to a debugger, normally a spawned GDB in console mode.

use crate::gdb::config::GdbConfig;
use crate::gdb::error::{DriverError, Result};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Grace period for the debugger to exit once its input is closed
const EXIT_GRACE: Duration = Duration::from_secs(2);

#[async_trait]
pub trait Transport: Send {
    /// Write one request line; the newline is appended
    async fn send_line(&mut self, line: &str) -> Result<()>;

    /// Next chunk of output, `None` once the debugger closed its output
    async fn recv(&mut self) -> Result<Option<String>>;
}

/// A GDB child process with stdout and stderr merged into one stream
pub struct GdbProcess {
    id: Uuid,
    child: Child,
    stdin: Option<ChildStdin>,
    output_rx: UnboundedReceiver<String>,
    timeout_ms: u64,
}

impl GdbProcess {
    /// Start the debugger described by `config`
    pub fn spawn(config: &GdbConfig) -> Result<Self> {
        let id = Uuid::new_v4();
        let args = config.debugger_args();
        info!(%id, "Starting debugger: {} {:?}", config.gdb_path, args);

        let mut child = Command::new(&config.gdb_path)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| DriverError::Spawn {
                path: config.gdb_path.clone(),
                source,
            })?;

        let stdin = child.stdin.take().ok_or(DriverError::NotRunning)?;
        let stdout = child.stdout.take().ok_or(DriverError::NotRunning)?;
        let stderr = child.stderr.take().ok_or(DriverError::NotRunning)?;

        let (output_tx, output_rx) = mpsc::unbounded_channel();
        tokio::spawn(forward_output(stdout, output_tx.clone(), id, "stdout"));
        tokio::spawn(forward_output(stderr, output_tx, id, "stderr"));

        debug!(%id, pid = ?child.id(), "Debugger started");
        Ok(Self {
            id,
            child,
            stdin: Some(stdin),
            output_rx,
            timeout_ms: config.timeout_ms,
        })
    }

    /// Identifier used in log records for this process
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// OS process id, while the process is running
    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    /// Close the debugger's input and wait for it to exit, killing it if it
    /// does not
    pub async fn stop(&mut self) -> Result<()> {
        drop(self.stdin.take());
        match timeout(EXIT_GRACE, self.child.wait()).await {
            Ok(status) => {
                let status = status?;
                info!(id = %self.id, "Debugger exited with {}", status);
            }
            Err(_) => {
                warn!(id = %self.id, "Debugger did not exit, killing it");
                self.child.kill().await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Transport for GdbProcess {
    async fn send_line(&mut self, line: &str) -> Result<()> {
        let stdin = self.stdin.as_mut().ok_or(DriverError::NotRunning)?;
        debug!(id = %self.id, "> {}", line);
        stdin.write_all(format!("{}\n", line).as_bytes()).await?;
        stdin.flush().await?;
        Ok(())
    }

    async fn recv(&mut self) -> Result<Option<String>> {
        let wait = Duration::from_millis(self.timeout_ms);
        timeout(wait, self.output_rx.recv())
            .await
            .map_err(|_| DriverError::Timeout(self.timeout_ms))
    }
}

/// Forward everything `reader` produces as text chunks until it closes
async fn forward_output<R>(mut reader: R, tx: UnboundedSender<String>, id: Uuid, stream: &'static str)
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; 4096];
    let mut pending = Vec::new();
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                pending.extend_from_slice(&buf[..n]);
                let text = take_utf8(&mut pending);
                if !text.is_empty() && tx.send(text).is_err() {
                    break;
                }
            }
            Err(e) => {
                warn!(%id, stream, "Error reading debugger output: {}", e);
                break;
            }
        }
    }
    if !pending.is_empty() {
        let _ = tx.send(String::from_utf8_lossy(&pending).into_owned());
    }
    debug!(%id, stream, "Output reader stopped");
}

/// Decode the complete prefix of `pending`, leaving a trailing partial UTF-8
/// sequence in place for the next read
fn take_utf8(pending: &mut Vec<u8>) -> String {
    let complete = match std::str::from_utf8(pending) {
        Ok(_) => pending.len(),
        Err(e) if e.error_len().is_none() => e.valid_up_to(),
        Err(_) => pending.len(),
    };
    let rest = pending.split_off(complete);
    let text = String::from_utf8_lossy(pending).into_owned();
    *pending = rest;
    text
}
