//! Debugger Session
//!
//! Pumps a [`Driver`] against a [`Transport`]: sends the next request once
//! the previous reply is complete and feeds every output chunk back.

use crate::gdb::command::{DebuggerCmd, RawCmd};
use crate::gdb::config::GdbConfig;
use crate::gdb::driver::Driver;
use crate::gdb::error::{DriverError, Result};
use crate::gdb::transport::{GdbProcess, Transport};
use crate::gdb::types::Priority;
use tracing::{debug, info};

pub struct Session<T: Transport> {
    driver: Driver,
    transport: T,
}

impl<T: Transport> Session<T> {
    pub fn new(driver: Driver, transport: T) -> Self {
        Self { driver, transport }
    }

    pub fn driver(&self) -> &Driver {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut Driver {
        &mut self.driver
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Consume the startup banner up to the first prompt
    pub async fn wait_for_prompt(&mut self) -> Result<()> {
        loop {
            match self.transport.recv().await? {
                Some(chunk) => {
                    if self.driver.feed_output(&chunk) > 0 {
                        return Ok(());
                    }
                }
                None => return Err(DriverError::TransportClosed("startup".to_string())),
            }
        }
    }

    /// Send queued commands one at a time until the queue is drained.
    ///
    /// A debugger that closes its output in reply to `quit` ends the run
    /// normally; closing at any other point is an error.
    pub async fn run_until_idle(&mut self) -> Result<()> {
        loop {
            if !self.driver.is_busy() {
                match self.driver.next_request() {
                    Some(line) => self.transport.send_line(&line).await?,
                    None => return Ok(()),
                }
            }

            match self.transport.recv().await? {
                Some(chunk) => {
                    self.driver.feed_output(&chunk);
                }
                None => {
                    let pending = self
                        .driver
                        .abandon_current()
                        .map(|cmd| cmd.text().to_string())
                        .unwrap_or_default();
                    if pending == "quit" {
                        info!("Debugger exited");
                        self.driver.clear_queue();
                        return Ok(());
                    }
                    return Err(DriverError::TransportClosed(pending));
                }
            }
        }
    }

    /// Queue one command and run until the queue is drained
    pub async fn execute(&mut self, cmd: impl DebuggerCmd + 'static, priority: Priority) -> Result<()> {
        self.driver.queue_command(cmd, priority);
        self.run_until_idle().await
    }

    /// Drop whatever is pending and ask the debugger to exit
    pub async fn quit(&mut self) -> Result<()> {
        self.driver.clear_queue();
        self.execute(RawCmd::quit(), Priority::High).await
    }
}

impl Session<GdbProcess> {
    /// Spawn GDB, wait for its prompt and run the configured init commands
    pub async fn launch(config: GdbConfig) -> Result<Self> {
        let transport = GdbProcess::spawn(&config)?;
        let init_commands = config.init_commands.clone();
        let mut session = Self::new(Driver::new(config), transport);

        session.wait_for_prompt().await?;
        for cmd in init_commands {
            session.driver.queue_command(RawCmd::new(cmd), Priority::Normal);
        }
        session.run_until_idle().await?;
        debug!(id = %session.transport.id(), "Session ready");
        Ok(session)
    }

    /// Quit the debugger and reap its process
    pub async fn shutdown(mut self) -> Result<()> {
        self.quit().await?;
        self.transport.stop().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gdb::command::{
        AddBreakpoint, Backtrace, DisassemblyInit, FindWatchType, RemoveBreakpoint,
    };
    use crate::gdb::config::DEFAULT_PROMPT;
    use crate::gdb::driver::DriverEvent;
    use crate::gdb::sink::{RecordingViews, ViewEvent};
    use crate::gdb::types::{shared, Breakpoint, Watch, WatchFormat};
    use async_trait::async_trait;
    use std::collections::{HashMap, VecDeque};

    /// Replies to known request lines from a fixed script
    #[derive(Default)]
    struct ScriptedTransport {
        replies: HashMap<String, String>,
        output: VecDeque<Option<String>>,
        sent: Vec<String>,
    }

    impl ScriptedTransport {
        fn new(banner: &str) -> Self {
            let mut t = Self::default();
            t.output.push_back(Some(banner.to_string()));
            t
        }

        fn reply(mut self, request: &str, output: &str) -> Self {
            self.replies.insert(request.to_string(), output.to_string());
            self
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send_line(&mut self, line: &str) -> Result<()> {
            self.sent.push(line.to_string());
            if line == "quit" {
                self.output.push_back(None);
                return Ok(());
            }
            let reply = self.replies.get(line).cloned().unwrap_or_default();
            // Split the prompt off to exercise reassembly
            self.output.push_back(Some(reply));
            self.output.push_back(Some(DEFAULT_PROMPT.to_string()));
            Ok(())
        }

        async fn recv(&mut self) -> Result<Option<String>> {
            self.output.pop_front().ok_or(DriverError::Timeout(0))
        }
    }

    fn session(transport: ScriptedTransport) -> Session<ScriptedTransport> {
        Session::new(Driver::new(GdbConfig::default()), transport)
    }

    #[tokio::test]
    async fn test_scripted_debugging_session() {
        let transport = ScriptedTransport::new(&format!("GNU gdb (GDB) 14.2\n{}", DEFAULT_PROMPT))
            .reply("break main.cpp:8", "Breakpoint 1 at 0x401136: file main.cpp, line 8.\n")
            .reply("bt 30", "#0  main (argc=1, argv=0x7ffe) at main.cpp:8\n")
            .reply("whatis count", "type = int\n")
            .reply("output /x count", "0x2a")
            .reply(
                "info frame",
                "Stack level 0, frame at 0x7ffe10:\n rip = 0x401136 in main (main.cpp:8); saved rip 0x7f00\n",
            )
            .reply("disassemble", "Dump of assembler code for function main:\n=> 0x0000000000401136 <+0>:\tpush   %rbp\nEnd of assembler dump.\n");
        let mut session = session(transport);
        let rx = session.driver_mut().event_receiver().unwrap();
        session.wait_for_prompt().await.unwrap();

        let views = shared(RecordingViews::default());
        let bp = shared(Breakpoint::new("main.cpp", 7).with_condition("count > 3"));
        let watch = shared(Watch::new("count").with_format(WatchFormat::Hex));

        let driver = session.driver_mut();
        driver.queue_command(AddBreakpoint::new(bp.clone()), Priority::Normal);
        driver.queue_command(Backtrace::new(views.clone()), Priority::Normal);
        driver.queue_command(FindWatchType::new(views.clone(), watch.clone()), Priority::Normal);
        driver.queue_command(DisassemblyInit::new(views.clone()), Priority::Normal);
        session.run_until_idle().await.unwrap();

        assert_eq!(
            session.transport_mut().sent,
            vec![
                "break main.cpp:8",
                "condition 1 count > 3",
                "bt 30",
                "whatis count",
                "output /x count",
                "info frame",
                "disassemble",
            ]
        );
        assert_eq!(bp.lock().unwrap().number, 1);
        assert_eq!(watch.lock().unwrap().type_name.as_deref(), Some("int"));

        let v = views.lock().unwrap();
        assert_eq!(v.frames().len(), 1);
        assert_eq!(v.tree_texts(), vec!["count = 0x2a,\n"]);
        assert!(v.events.contains(&ViewEvent::ActiveAddress(0x401136)));
        assert!(v.events.contains(&ViewEvent::Assembly {
            address: 0x401136,
            text: "push   %rbp".to_string()
        }));
        drop(v);

        let events: Vec<DriverEvent> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![DriverEvent::DebugLog("GNU gdb (GDB) 14.2".to_string())]
        );
        assert!(!session.driver().is_busy());
    }

    #[test]
    fn test_empty_request_never_sent() {
        tokio_test::block_on(async {
            let mut session = session(ScriptedTransport::new(DEFAULT_PROMPT));
            session.wait_for_prompt().await.unwrap();

            let bp = shared(Breakpoint::new("main.cpp", 7));
            session
                .execute(RemoveBreakpoint::new(bp.clone()), Priority::Normal)
                .await
                .unwrap();
            assert!(session.transport_mut().sent.is_empty());
            assert_eq!(bp.lock().unwrap().number, -1);
        });
    }

    #[tokio::test]
    async fn test_quit_ends_cleanly() {
        let mut session = session(ScriptedTransport::new(DEFAULT_PROMPT));
        session.wait_for_prompt().await.unwrap();
        session.driver_mut().queue_command(RawCmd::new("bt 30"), Priority::Normal);

        session.quit().await.unwrap();
        assert_eq!(session.transport_mut().sent, vec!["quit"]);
        assert!(!session.driver().is_busy());
        assert_eq!(session.driver().pending_commands(), 0);
    }

    #[tokio::test]
    async fn test_unexpected_close_is_an_error() {
        let mut session = session(ScriptedTransport::new(DEFAULT_PROMPT));
        session.wait_for_prompt().await.unwrap();

        session.transport_mut().replies.clear();
        session.driver_mut().queue_command(RawCmd::new("run"), Priority::Normal);
        session.driver_mut().next_request();
        session.transport_mut().output.push_back(Some("Starting program".to_string()));
        session.transport_mut().output.push_back(None);

        match session.run_until_idle().await {
            Err(DriverError::TransportClosed(cmd)) => assert_eq!(cmd, "run"),
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
        assert!(!session.driver().is_busy());
    }

    #[tokio::test]
    async fn test_closed_before_prompt() {
        let mut transport = ScriptedTransport::default();
        transport.output.push_back(Some("gdb: unrecognized option".to_string()));
        transport.output.push_back(None);
        let mut session = session(transport);
        assert!(matches!(
            session.wait_for_prompt().await,
            Err(DriverError::TransportClosed(_))
        ));
    }
}
