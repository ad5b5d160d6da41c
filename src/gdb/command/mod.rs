//! Debugger Commands
//!
//! A command is one request line plus the routine that interprets the text
//! the debugger prints in reply. Parse routines report through the driver's
//! log and the views they were given, and may queue follow-up commands.

mod breakpoint;
mod frame;
mod setup;
mod tooltip;
mod watch;

pub use breakpoint::{AddBreakpoint, RemoveBreakpoint};
pub use frame::{Backtrace, Disassembly, DisassemblyInit, InfoRegisters, BACKTRACE_DEPTH};
pub use setup::{AddSourceDir, AddSymbolFile, AttachToProcess, Detach, SetArguments, SetDebuggee};
pub use tooltip::{FindTooltipType, TooltipEvaluation};
pub use watch::{FindWatchType, InfoArguments, InfoLocals, WatchValue};

use crate::gdb::driver::Driver;

pub trait DebuggerCmd: Send {
    /// Line sent to the debugger. Empty means nothing is sent and
    /// [`parse_output`](Self::parse_output) runs with empty output.
    fn text(&self) -> &str;

    /// Handle everything the debugger printed before its next prompt.
    ///
    /// Runs exactly once. The default logs non-empty output.
    fn parse_output(&mut self, output: &str, driver: &mut Driver) {
        if !output.is_empty() {
            driver.log(output);
        }
    }
}

/// Command with a fixed request and no parsing of its own
#[derive(Debug, Clone)]
pub struct RawCmd {
    text: String,
}

impl RawCmd {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn quit() -> Self {
        Self::new("quit")
    }
}

impl DebuggerCmd for RawCmd {
    fn text(&self) -> &str {
        &self.text
    }
}

/// Wrap reply lines as `label = {line,line,}` for a watch tree
pub(crate) fn wrap_as_structure(label: &str, lines: &[&str]) -> String {
    let mut text = format!("{} = {{", label);
    for line in lines {
        text.push_str(line);
        text.push(',');
    }
    text.push_str("}\n");
    text
}
