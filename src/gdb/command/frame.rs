//! Stack, register and disassembly inspection

use super::DebuggerCmd;
use crate::gdb::driver::Driver;
use crate::gdb::parser::{
    parse_backtrace_line, parse_disassembly_line, parse_frame_info, parse_register_line,
    split_lines,
};
use crate::gdb::sink::{lock, BacktraceView, DisassemblyView, RegistersView};
use crate::gdb::types::{register_index, Priority, Shared, StackFrame};
use tracing::debug;

/// Deepest frame requested by [`Backtrace`]
pub const BACKTRACE_DEPTH: u32 = 30;

/// `bt 30`
pub struct Backtrace {
    text: String,
    view: Shared<dyn BacktraceView>,
}

impl Backtrace {
    pub fn new(view: Shared<dyn BacktraceView>) -> Self {
        Self {
            text: format!("bt {}", BACKTRACE_DEPTH),
            view,
        }
    }
}

impl DebuggerCmd for Backtrace {
    fn text(&self) -> &str {
        &self.text
    }

    fn parse_output(&mut self, output: &str, _driver: &mut Driver) {
        let mut view = lock(&self.view);
        view.clear();
        for frame in output.lines().filter_map(parse_backtrace_line) {
            view.add_frame(frame);
        }
    }
}

/// `info registers`
pub struct InfoRegisters {
    view: Shared<dyn RegistersView>,
}

impl InfoRegisters {
    pub fn new(view: Shared<dyn RegistersView>) -> Self {
        Self { view }
    }
}

impl DebuggerCmd for InfoRegisters {
    fn text(&self) -> &str {
        "info registers"
    }

    fn parse_output(&mut self, output: &str, _driver: &mut Driver) {
        // eax            0x40e66666       1088841318
        // eflags         0x247    583
        let mut view = lock(&self.view);
        for reg in split_lines(output).into_iter().filter_map(parse_register_line) {
            match register_index(&reg.name) {
                Some(index) => view.set_register_value(index, reg.value),
                None => debug!("Skipping unknown register {}", reg.name),
            }
        }
    }
}

/// `disassemble` for the selected frame
pub struct Disassembly {
    view: Shared<dyn DisassemblyView>,
}

impl Disassembly {
    pub fn new(view: Shared<dyn DisassemblyView>) -> Self {
        Self { view }
    }
}

impl DebuggerCmd for Disassembly {
    fn text(&self) -> &str {
        "disassemble"
    }

    fn parse_output(&mut self, output: &str, _driver: &mut Driver) {
        // Dump of assembler code for function main:
        // 0x00401390 <main+0>:	push   ebp
        // End of assembler dump.
        let mut view = lock(&self.view);
        for line in output.lines().filter_map(parse_disassembly_line) {
            view.add_line(line.address, &line.text);
        }
    }
}

/// `info frame`, then a [`Disassembly`] when the frame has moved.
///
/// Use this rather than [`Disassembly`] directly so that stepping within one
/// function does not rebuild the view.
pub struct DisassemblyInit {
    view: Shared<dyn DisassemblyView>,
}

impl DisassemblyInit {
    pub fn new(view: Shared<dyn DisassemblyView>) -> Self {
        Self { view }
    }
}

impl DebuggerCmd for DisassemblyInit {
    fn text(&self) -> &str {
        "info frame"
    }

    fn parse_output(&mut self, output: &str, driver: &mut Driver) {
        let Some(info) = parse_frame_info(output) else {
            return;
        };
        if driver.last_disassembly_frame() == Some(info.frame_address.as_str()) {
            return;
        }
        driver.set_last_disassembly_frame(info.frame_address.as_str());

        let frame = StackFrame {
            address: info.frame_address_value(),
            function: info
                .active
                .as_ref()
                .map(|(_, function)| function.clone())
                .unwrap_or_default(),
            valid: true,
            ..Default::default()
        };
        {
            let mut view = lock(&self.view);
            view.clear(&frame);
            if let Some((address, _)) = info.active {
                view.set_active_address(address);
            }
        }
        driver.queue_command(Disassembly::new(self.view.clone()), Priority::High);
    }
}
