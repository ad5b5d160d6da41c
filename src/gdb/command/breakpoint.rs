//! Breakpoint commands

use super::{DebuggerCmd, RawCmd};
use crate::gdb::driver::Driver;
use crate::gdb::parser::{gdb_file_path, parse_breakpoint_confirmation};
use crate::gdb::sink::lock;
use crate::gdb::types::{Breakpoint, Priority, Shared};

/// `break`/`tbreak` for a breakpoint.
///
/// Condition and ignore count need the number the debugger assigns, so they
/// are sent as separate high priority commands once the reply arrives.
pub struct AddBreakpoint {
    text: String,
    bp: Shared<Breakpoint>,
}

impl AddBreakpoint {
    /// A disabled breakpoint produces no request
    pub fn new(bp: Shared<Breakpoint>) -> Self {
        let text = {
            let mut b = lock(&bp);
            if b.enabled {
                b.already_set = true;
                let verb = if b.temporary { "tbreak" } else { "break" };
                match b.function.as_deref().filter(|f| !f.is_empty()) {
                    // Line breakpoints on constructors are unreliable in GDB
                    Some(function) => format!("{} {}", verb, function),
                    None => format!("{} {}:{}", verb, gdb_file_path(&b.file), b.line + 1),
                }
            } else {
                String::new()
            }
        };
        Self { text, bp }
    }
}

impl DebuggerCmd for AddBreakpoint {
    fn text(&self) -> &str {
        &self.text
    }

    fn parse_output(&mut self, output: &str, driver: &mut Driver) {
        if self.text.is_empty() {
            return;
        }

        // Breakpoint 1 at 0x4013d6: file main.cpp, line 8.
        // No line 100 in file "main.cpp".
        // No source file named main2.cpp.
        let Some((number, address)) = parse_breakpoint_confirmation(output) else {
            driver.log(output);
            return;
        };

        let (by_function, condition, ignore_count) = {
            let mut bp = lock(&self.bp);
            bp.number = number;
            bp.address = Some(address);
            (
                bp.function.as_deref().is_some_and(|f| !f.is_empty()),
                bp.condition.clone().filter(|c| !c.is_empty()),
                bp.ignore_count.filter(|&n| n > 0),
            )
        };

        if by_function {
            driver.debug_log("(work-around for constructors activated)");
        }
        if let Some(condition) = condition {
            driver.queue_command(
                RawCmd::new(format!("condition {} {}", number, condition)),
                Priority::High,
            );
        }
        if let Some(count) = ignore_count {
            driver.queue_command(
                RawCmd::new(format!("ignore {} {}", number, count)),
                Priority::High,
            );
        }
    }
}

/// `delete`, for one breakpoint or all of them
pub struct RemoveBreakpoint {
    text: String,
    bp: Option<Shared<Breakpoint>>,
}

impl RemoveBreakpoint {
    /// Only a breakpoint that is enabled and known to the debugger produces
    /// a request
    pub fn new(bp: Shared<Breakpoint>) -> Self {
        let text = {
            let b = lock(&bp);
            if b.enabled && b.number > 0 {
                format!("delete {}", b.number)
            } else {
                String::new()
            }
        };
        Self { text, bp: Some(bp) }
    }

    pub fn all() -> Self {
        Self {
            text: "delete".to_string(),
            bp: None,
        }
    }
}

impl DebuggerCmd for RemoveBreakpoint {
    fn text(&self) -> &str {
        &self.text
    }

    fn parse_output(&mut self, output: &str, driver: &mut Driver) {
        let Some(bp) = &self.bp else {
            return;
        };
        lock(bp).number = -1;
        if !output.is_empty() {
            driver.log(output);
        }
    }
}
