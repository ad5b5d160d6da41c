//! Debugger Driver
//!
//! Owns the conversation with the debugger: which command is in flight, what
//! is queued behind it, and the output collected so far. The driver performs
//! no I/O. A [`Session`](crate::gdb::session::Session) moves request lines
//! and output chunks between it and a transport.

use crate::gdb::command::DebuggerCmd;
use crate::gdb::config::GdbConfig;
use crate::gdb::queue::CommandQueue;
use crate::gdb::types::Priority;
use std::sync::mpsc::{self, Receiver, Sender};
use tracing::{debug, info, warn};

/// Log entries produced while parsing replies
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverEvent {
    /// Shown to the user
    Log(String),
    /// Diagnostics only
    DebugLog(String),
}

pub struct Driver {
    config: GdbConfig,
    queue: CommandQueue,
    /// Command whose request has been sent and whose reply is pending
    current: Option<Box<dyn DebuggerCmd>>,
    /// Output received since the last prompt
    buffer: String,
    /// Frame address the disassembly view was last built for
    last_disassembly_frame: Option<String>,
    event_tx: Sender<DriverEvent>,
    event_rx: Option<Receiver<DriverEvent>>,
}

impl Driver {
    pub fn new(config: GdbConfig) -> Self {
        let (event_tx, event_rx) = mpsc::channel();
        Self {
            config,
            queue: CommandQueue::new(),
            current: None,
            buffer: String::new(),
            last_disassembly_frame: None,
            event_tx,
            event_rx: Some(event_rx),
        }
    }

    pub fn config(&self) -> &GdbConfig {
        &self.config
    }

    /// Queue a command behind every pending command of the same priority
    pub fn queue_command(&mut self, cmd: impl DebuggerCmd + 'static, priority: Priority) {
        self.queue_boxed(Box::new(cmd), priority);
    }

    pub fn queue_boxed(&mut self, cmd: Box<dyn DebuggerCmd>, priority: Priority) {
        debug!("Queued ({:?}): {}", priority, cmd.text());
        self.queue.push(cmd, priority);
    }

    /// Number of commands waiting to be sent
    pub fn pending_commands(&self) -> usize {
        self.queue.len()
    }

    /// Request texts waiting to be sent, in send order
    pub fn pending_texts(&self) -> Vec<&str> {
        self.queue.texts()
    }

    /// Drop everything not yet sent
    pub fn clear_queue(&mut self) {
        self.queue.clear();
    }

    /// Whether a reply is still expected
    pub fn is_busy(&self) -> bool {
        self.current.is_some()
    }

    pub fn current_command_text(&self) -> Option<&str> {
        self.current.as_ref().map(|c| c.text())
    }

    /// Make the next queued command current and return the line to send.
    ///
    /// Commands with an empty request are never sent; they are parsed on the
    /// spot with empty output. Returns `None` while a reply is pending or
    /// when the queue is empty.
    pub fn next_request(&mut self) -> Option<String> {
        if self.current.is_some() {
            return None;
        }

        while let Some(mut cmd) = self.queue.pop() {
            if cmd.text().is_empty() {
                debug!("Command has no request, parsing locally");
                cmd.parse_output("", self);
                continue;
            }

            let text = cmd.text().to_string();
            debug!("Sending command: {}", text);
            self.current = Some(cmd);
            return Some(text);
        }

        None
    }

    /// Feed raw debugger output.
    ///
    /// Every prompt found completes one reply. Returns how many prompts were
    /// consumed.
    pub fn feed_output(&mut self, chunk: &str) -> usize {
        if self.config.prompt.is_empty() {
            warn!("No prompt configured, output dropped");
            return 0;
        }
        self.buffer.push_str(chunk);

        let prompt_len = self.config.prompt.len();
        let mut prompts = 0;
        while let Some(pos) = self.buffer.find(self.config.prompt.as_str()) {
            let reply = self.buffer[..pos].replace("\r\n", "\n");
            self.buffer.drain(..pos + prompt_len);
            prompts += 1;
            self.deliver(reply.trim_end_matches('\n'));
        }
        prompts
    }

    fn deliver(&mut self, reply: &str) {
        match self.current.take() {
            Some(mut cmd) => {
                debug!("Reply to '{}': {:?}", cmd.text(), reply);
                cmd.parse_output(reply, self);
            }
            None => {
                if !reply.trim().is_empty() {
                    self.debug_log(reply);
                }
            }
        }
    }

    /// Forget the in-flight command without parsing a reply
    pub fn abandon_current(&mut self) -> Option<Box<dyn DebuggerCmd>> {
        self.buffer.clear();
        self.current.take()
    }

    /// User-visible log
    pub fn log(&self, message: impl Into<String>) {
        let message = message.into();
        info!("{}", message);
        let _ = self.event_tx.send(DriverEvent::Log(message));
    }

    /// Debug-only log
    pub fn debug_log(&self, message: impl Into<String>) {
        let message = message.into();
        debug!("{}", message);
        let _ = self.event_tx.send(DriverEvent::DebugLog(message));
    }

    /// Take the log receiver; it can be taken once
    pub fn event_receiver(&mut self) -> Option<Receiver<DriverEvent>> {
        self.event_rx.take()
    }

    pub fn last_disassembly_frame(&self) -> Option<&str> {
        self.last_disassembly_frame.as_deref()
    }

    pub fn set_last_disassembly_frame(&mut self, address: impl Into<String>) {
        self.last_disassembly_frame = Some(address.into());
    }

    /// Forget per-debuggee state, e.g. when the program is restarted
    pub fn reset_session_state(&mut self) {
        self.last_disassembly_frame = None;
    }
}
