//! Commands preparing the debuggee: paths, symbols, arguments, attaching

use super::{DebuggerCmd, RawCmd};
use crate::gdb::driver::Driver;
use crate::gdb::parser::split_lines;
use crate::gdb::types::Priority;

/// `directory <dir>`: add a source search directory
pub struct AddSourceDir {
    text: String,
}

impl AddSourceDir {
    /// An empty `dir` resets the search path to `$cdir:$cwd`
    pub fn new(dir: &str) -> Self {
        Self {
            text: format!("directory {}", dir).trim_end().to_string(),
        }
    }
}

impl DebuggerCmd for AddSourceDir {
    fn text(&self) -> &str {
        &self.text
    }

    fn parse_output(&mut self, output: &str, driver: &mut Driver) {
        // Warning: C:\Devel\tmp\console\111: No such file or directory.
        // Source directories searched: <dir>;$cdir;$cwd
        if output.starts_with("Warning: ") {
            driver.log(output.lines().next().unwrap_or_default());
        }
    }
}

/// `file <path>`: select the program to debug
pub struct SetDebuggee {
    text: String,
}

impl SetDebuggee {
    pub fn new(file: &str) -> Self {
        Self {
            text: format!("file {}", file),
        }
    }
}

impl DebuggerCmd for SetDebuggee {
    fn text(&self) -> &str {
        &self.text
    }

    fn parse_output(&mut self, output: &str, driver: &mut Driver) {
        // Reading symbols from C:\Devel\tmp\console/console.exe...done.
        // console.exe: No such file or directory.
        if let Some(first) = output.lines().next().filter(|l| !l.is_empty()) {
            driver.log(first);
        }
    }
}

/// `add-symbol-file <path>`
pub struct AddSymbolFile {
    text: String,
}

impl AddSymbolFile {
    pub fn new(file: &str) -> Self {
        Self {
            text: format!("add-symbol-file {}", file),
        }
    }
}

impl DebuggerCmd for AddSymbolFile {
    fn text(&self) -> &str {
        &self.text
    }

    fn parse_output(&mut self, output: &str, driver: &mut Driver) {
        // The first line only echoes "add symbol table from file ..."
        if let Some((_, rest)) = output.split_once('\n') {
            let rest = rest.trim();
            if !rest.is_empty() {
                driver.log(rest);
            }
        }
    }
}

/// `set args <args>`
pub struct SetArguments {
    text: String,
}

impl SetArguments {
    pub fn new(args: &str) -> Self {
        Self {
            text: format!("set args {}", args).trim_end().to_string(),
        }
    }
}

impl DebuggerCmd for SetArguments {
    fn text(&self) -> &str {
        &self.text
    }

    fn parse_output(&mut self, _output: &str, _driver: &mut Driver) {}
}

/// `attach <pid>`. Failing to attach ends the session.
pub struct AttachToProcess {
    text: String,
}

impl AttachToProcess {
    pub fn new(pid: u32) -> Self {
        Self {
            text: format!("attach {}", pid),
        }
    }
}

impl DebuggerCmd for AttachToProcess {
    fn text(&self) -> &str {
        &self.text
    }

    fn parse_output(&mut self, output: &str, driver: &mut Driver) {
        for line in split_lines(output) {
            if line.starts_with("Attaching") {
                driver.log(line);
            } else if line.starts_with("Can't ") {
                driver.log(line);
                driver.queue_command(RawCmd::quit(), Priority::High);
            }
        }
    }
}

/// `detach`
pub struct Detach;

impl DebuggerCmd for Detach {
    fn text(&self) -> &str {
        "detach"
    }

    fn parse_output(&mut self, output: &str, driver: &mut Driver) {
        for line in split_lines(output) {
            if line.starts_with("Detaching") {
                driver.log(line);
            }
        }
    }
}
